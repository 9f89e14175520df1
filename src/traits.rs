use crate::errors::Result;
use image::DynamicImage;
use ndarray::prelude::*;

/// A loaded pretrained classifier.
///
/// The classification flow depends on this trait rather than on a concrete runtime so it
/// can be exercised with a stub. Dropping the value releases the model.
pub trait ProbabilityModel {
    /// NHWC shape the model expects, batch dimension included.
    fn input_shape(&self) -> [usize; 4];

    /// Runs one forward pass and returns the probability of the positive class.
    fn predict(&self, tensor: ArrayView4<f32>) -> Result<f32>;
}

/// Opens a fresh model instance for each classification.
pub trait ModelProvider {
    type Model: ProbabilityModel;

    fn open(&self) -> Result<Self::Model>;
}

/// Where a photo comes from: a stored file, a captured stream.
pub trait ImageSource {
    /// Human-readable origin used in messages.
    fn describe(&self) -> String;

    /// `Ok(None)` means the user produced no image, e.g. a cancelled capture.
    fn acquire(&mut self) -> Result<Option<DynamicImage>>;
}
