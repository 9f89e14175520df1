//! Turns an arbitrary photo into the classifier's input tensor.
//!
//! The constants here were matched against the frozen model weights and must not change:
//! desaturate, `x * 1.8 + 50`, stretch to 150x150, take the red channel, divide by 255.

use image::{imageops, imageops::FilterType, DynamicImage, GenericImageView, RgbaImage};
use ndarray::prelude::*;

use crate::colorops::{ApplyColorMatrix, ColorMatrix};
use crate::errors::{PneumoniaError, Result};

/// Side length of the square image the model consumes.
pub const TARGET_SIZE: u32 = 150;
/// Multiplier applied to every color channel after desaturation.
pub const CONTRAST: f32 = 1.8;
/// Offset added after the contrast multiplier, in 0-255 pixel space.
pub const BRIGHTNESS: f32 = 50.0;
/// Number of values in one input tensor.
pub const TENSOR_LEN: usize = (TARGET_SIZE * TARGET_SIZE) as usize;
/// NHWC shape of one input tensor: batch 1, single channel.
pub const TENSOR_SHAPE: [usize; 4] = [1, TARGET_SIZE as usize, TARGET_SIZE as usize, 1];

/// Flattened, normalized, single-channel 150x150 image in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct InputTensor(Array4<f32>);

impl InputTensor {
    pub fn view(&self) -> ArrayView4<'_, f32> {
        self.0.view()
    }

    pub fn shape(&self) -> [usize; 4] {
        let dim = self.0.dim();
        [dim.0, dim.1, dim.2, dim.3]
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Values in row-major pixel order.
    pub fn values(&self) -> impl Iterator<Item = f32> + '_ {
        self.0.iter().copied()
    }

    pub fn into_inner(self) -> Array4<f32> {
        self.0
    }
}

pub fn preprocess(image: &DynamicImage) -> Result<InputTensor> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(PneumoniaError::invalid_image(format!(
            "image has no pixels ({width}x{height})"
        )));
    }

    let grayscale = to_grayscale(&image.to_rgba8());
    let adjusted = adjust_for_inference(&grayscale);
    let resized = resize_to_target(&adjusted);
    to_tensor(&resized)
}

/// Removes color saturation while preserving luminance, so that R = G = B.
pub fn to_grayscale(image: &RgbaImage) -> RgbaImage {
    image.apply_color_matrix(&ColorMatrix::saturation(0.0))
}

pub fn adjust_for_inference(image: &RgbaImage) -> RgbaImage {
    image.apply_color_matrix(&ColorMatrix::contrast_brightness(CONTRAST, BRIGHTNESS))
}

/// Stretches to `TARGET_SIZE` square with bilinear smoothing. Aspect ratio is not kept.
pub fn resize_to_target(image: &RgbaImage) -> RgbaImage {
    imageops::resize(image, TARGET_SIZE, TARGET_SIZE, FilterType::Triangle)
}

/// Reads the red channel of an already resized image into a tensor in `[0, 1]`.
pub fn to_tensor(image: &RgbaImage) -> Result<InputTensor> {
    let (width, height) = image.dimensions();
    if (width, height) != (TARGET_SIZE, TARGET_SIZE) {
        return Err(PneumoniaError::Validation {
            field: "image dimensions".to_string(),
            reason: format!("must be {TARGET_SIZE}x{TARGET_SIZE}, got {width}x{height}"),
        });
    }

    let values: Vec<f32> = image
        .pixels()
        .map(|p| f32::from(p[0]) / 255.0)
        .collect();
    let tensor = Array4::from_shape_vec(
        (1, TARGET_SIZE as usize, TARGET_SIZE as usize, 1),
        values,
    )?;
    Ok(InputTensor(tensor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba};

    fn gradient(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            Rgb([
                (x * 255 / width.max(1)) as u8,
                (y * 255 / height.max(1)) as u8,
                ((x + y) % 256) as u8,
            ])
        }))
    }

    #[test]
    fn test_tensor_length_and_range() -> Result<()> {
        for (w, h) in [(1, 1), (37, 412), (150, 150), (640, 480), (1024, 77)] {
            let tensor = preprocess(&gradient(w, h))?;
            assert_eq!(tensor.len(), TENSOR_LEN);
            assert_eq!(tensor.shape(), TENSOR_SHAPE);
            assert!(tensor.values().all(|v| (0.0..=1.0).contains(&v)));
        }
        Ok(())
    }

    #[test]
    fn test_preprocess_is_deterministic() -> Result<()> {
        let image = gradient(317, 211);
        let first = preprocess(&image)?;
        let second = preprocess(&image)?;
        let first_bits: Vec<u32> = first.values().map(f32::to_bits).collect();
        let second_bits: Vec<u32> = second.values().map(f32::to_bits).collect();
        assert_eq!(first_bits, second_bits);
        Ok(())
    }

    #[test]
    fn test_resize_stretches_without_cropping() {
        let tall = RgbaImage::from_pixel(300, 600, Rgba([10, 10, 10, 255]));
        let resized = resize_to_target(&tall);
        assert_eq!(resized.dimensions(), (TARGET_SIZE, TARGET_SIZE));

        let wide = RgbaImage::from_pixel(900, 20, Rgba([10, 10, 10, 255]));
        assert_eq!(resize_to_target(&wide).dimensions(), (TARGET_SIZE, TARGET_SIZE));
    }

    #[test]
    fn test_zero_sized_image_is_invalid() {
        for image in [DynamicImage::new_rgb8(0, 10), DynamicImage::new_rgba8(10, 0)] {
            let err = preprocess(&image).unwrap_err();
            assert!(matches!(err, PneumoniaError::InvalidImage { .. }));
        }
    }

    #[test]
    fn test_adjustment_constants_are_pinned() {
        assert_eq!(CONTRAST, 1.8);
        assert_eq!(BRIGHTNESS, 50.0);
    }

    #[test]
    fn test_black_image_maps_to_brightness_offset() -> Result<()> {
        let tensor = preprocess(&DynamicImage::new_rgb8(64, 48))?;
        let expected = 50.0 / 255.0;
        assert!(tensor.values().all(|v| v == expected));
        Ok(())
    }

    #[test]
    fn test_white_image_saturates() -> Result<()> {
        let white = DynamicImage::ImageRgb8(RgbImage::from_pixel(20, 20, Rgb([255, 255, 255])));
        let tensor = preprocess(&white)?;
        assert!(tensor.values().all(|v| v == 1.0));
        Ok(())
    }

    #[test]
    fn test_pure_red_follows_luminance_then_adjustment() -> Result<()> {
        let red = RgbaImage::from_pixel(5, 5, Rgba([255, 0, 0, 255]));
        let gray = to_grayscale(&red);
        assert_eq!(gray.get_pixel(0, 0), &Rgba([54, 54, 54, 255]));

        // 54 * 1.8 + 50 = 147.2
        let adjusted = adjust_for_inference(&gray);
        assert_eq!(adjusted.get_pixel(0, 0), &Rgba([147, 147, 147, 255]));

        let tensor = preprocess(&DynamicImage::ImageRgba8(red))?;
        assert!(tensor.values().all(|v| v == 147.0 / 255.0));
        Ok(())
    }

    #[test]
    fn test_tensor_is_row_major() -> Result<()> {
        let mut image = RgbaImage::from_pixel(TARGET_SIZE, TARGET_SIZE, Rgba([0, 0, 0, 255]));
        image.put_pixel(3, 0, Rgba([255, 255, 255, 255]));
        image.put_pixel(0, 2, Rgba([51, 51, 51, 255]));

        let tensor = to_tensor(&image)?;
        let values: Vec<f32> = tensor.values().collect();
        assert_eq!(values[3], 1.0);
        assert_eq!(values[2 * TARGET_SIZE as usize], 0.2);
        assert_eq!(tensor.view()[[0, 2, 0, 0]], 0.2);
        assert_eq!(values.iter().filter(|v| **v != 0.0).count(), 2);
        Ok(())
    }

    #[test]
    fn test_to_tensor_rejects_wrong_size() {
        let image = RgbaImage::new(149, 150);
        assert!(matches!(
            to_tensor(&image),
            Err(PneumoniaError::Validation { .. })
        ));
    }
}
