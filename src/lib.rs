pub mod colorops;
pub mod config;
pub mod decision;
pub mod errors;
pub mod model;
pub mod preprocess;
pub mod source;
pub mod traits;

pub mod mocks;

use image::DynamicImage;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;
use walkdir::WalkDir;

pub use config::Config;
pub use decision::{decide, Label, Prediction};
pub use errors::{PneumoniaError, Result};
pub use model::{OnnxModel, OnnxModelProvider};
pub use preprocess::{preprocess, InputTensor};
pub use source::{is_supported_image_format, FileImageSource, ReaderImageSource};
pub use traits::*;

/// Runs photos through preprocessing, the model and the decision rule.
///
/// Holds no state between calls: every classification opens its own model instance and
/// releases it before returning.
pub struct Classifier<P: ModelProvider> {
    provider: P,
}

impl<P: ModelProvider> Classifier<P> {
    pub const fn new(provider: P) -> Self {
        Self { provider }
    }

    pub const fn provider(&self) -> &P {
        &self.provider
    }

    pub fn classify(&self, image: &DynamicImage) -> Result<Prediction> {
        let started = Instant::now();
        let tensor = preprocess(image)?;

        let probability = {
            let model = self.provider.open()?;
            let expected = model.input_shape();
            if tensor.shape() != expected {
                return Err(PneumoniaError::model(
                    "input tensor check",
                    format!(
                        "model expects {expected:?}, preprocessing produced {:?}",
                        tensor.shape()
                    ),
                ));
            }
            model.predict(tensor.view())?
        };

        if !probability.is_finite() {
            return Err(PneumoniaError::model(
                "model output",
                format!("probability is not a finite number: {probability}"),
            ));
        }

        let prediction = decide(probability);
        tracing::debug!(
            probability,
            label = %prediction.label,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "classified image"
        );
        Ok(prediction)
    }

    pub fn classify_source(&self, source: &mut dyn ImageSource) -> Result<Prediction> {
        let image = source.acquire()?.ok_or_else(|| {
            PneumoniaError::invalid_image(format!("no image data from {}", source.describe()))
        })?;
        self.classify(&image)
    }

    pub fn classify_path(&self, path: &Path) -> Result<Prediction> {
        self.classify_source(&mut FileImageSource::new(path))
    }

    /// Classifies every supported image under `input_dir`, one after another.
    ///
    /// A file that fails, or an entry the walk cannot read, does not stop the run; its
    /// error is returned in its slot.
    pub fn classify_directory(&self, input_dir: &Path) -> Result<Vec<(PathBuf, Result<Prediction>)>> {
        if !input_dir.is_dir() {
            return Err(PneumoniaError::FileSystem {
                path: input_dir.to_path_buf(),
                operation: "directory existence check".to_string(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "input directory does not exist",
                ),
            });
        }

        let image_files = collect_image_files(input_dir);
        if image_files.is_empty() {
            tracing::info!(dir = %input_dir.display(), "no image files found");
            return Ok(Vec::new());
        }

        let pb = ProgressBar::new(image_files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
                )
                .map_err(|e| PneumoniaError::Configuration {
                    message: e.to_string(),
                })?
                .progress_chars("#>-"),
        );

        let results = image_files
            .into_iter()
            .map(|entry| {
                let path = entry_path(&entry).to_path_buf();
                let result = entry.and_then(|file| self.classify_path(&file));
                if let Err(e) = &result {
                    tracing::warn!(path = %path.display(), error = %e, "classification failed");
                }
                pb.inc(1);
                (path, result)
            })
            .collect();

        pb.finish_and_clear();
        Ok(results)
    }
}

/// Supported image files under `input_dir`, sorted by path.
///
/// Entries the walk could not read are kept as `FileSystem` errors so they are reported
/// alongside the classified files instead of vanishing.
pub fn collect_image_files(input_dir: &Path) -> Vec<Result<PathBuf>> {
    let mut entries: Vec<Result<PathBuf>> = WalkDir::new(input_dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) if e.file_type().is_file() && is_supported_image_format(e.path()) => {
                Some(Ok(e.into_path()))
            }
            Ok(_) => None,
            Err(e) => {
                let path = e
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| input_dir.to_path_buf());
                tracing::warn!(path = %path.display(), error = %e, "could not read directory entry");
                Some(Err(PneumoniaError::FileSystem {
                    path,
                    operation: "walk directory".to_string(),
                    source: e.into(),
                }))
            }
        })
        .collect();
    entries.sort_by(|a, b| entry_path(a).cmp(entry_path(b)));
    entries
}

fn entry_path(entry: &Result<PathBuf>) -> &Path {
    match entry {
        Ok(path) | Err(PneumoniaError::FileSystem { path, .. }) => path,
        Err(_) => Path::new(""),
    }
}

impl Classifier<OnnxModelProvider> {
    pub fn with_onnx_model(config: &Config) -> Self {
        Self::new(OnnxModelProvider::new(&config.model_path, config.device_id))
    }
}
