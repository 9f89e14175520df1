use std::io::Read;
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageReader};

use crate::errors::{PneumoniaError, Result};
use crate::traits::ImageSource;

/// Extensions accepted when walking a directory, limited to the decoders compiled in.
pub fn supported_extensions() -> Vec<&'static str> {
    let mut extensions = Vec::new();
    if cfg!(feature = "image") {
        extensions.extend(["jpg", "jpeg", "png", "webp"]);
    }
    if cfg!(feature = "image-extra") {
        extensions.extend(["bmp", "gif", "tif", "tiff"]);
    }
    if cfg!(feature = "image-avif") {
        extensions.push("avif");
    }
    extensions
}

pub fn is_supported_image_format(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_lowercase();
            supported_extensions().contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// A photo selected from storage.
#[derive(Debug, Clone)]
pub struct FileImageSource {
    path: PathBuf,
}

impl FileImageSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ImageSource for FileImageSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn acquire(&mut self) -> Result<Option<DynamicImage>> {
        let reader = ImageReader::open(&self.path)
            .and_then(|r| r.with_guessed_format())
            .map_err(|e| PneumoniaError::FileSystem {
                path: self.path.clone(),
                operation: "open image".to_string(),
                source: e,
            })?;

        let image = reader.decode().map_err(|e| {
            PneumoniaError::invalid_image(format!("{}: {e}", self.path.display()))
        })?;

        Ok(Some(image))
    }
}

/// A photo streamed in as encoded bytes, such as a capture piped to stdin.
pub struct ReaderImageSource<R> {
    name: String,
    reader: R,
}

impl<R: Read> ReaderImageSource<R> {
    pub fn new(name: impl Into<String>, reader: R) -> Self {
        Self {
            name: name.into(),
            reader,
        }
    }
}

impl ReaderImageSource<std::io::Stdin> {
    pub fn stdin() -> Self {
        Self::new("<stdin>", std::io::stdin())
    }
}

impl<R: Read> ImageSource for ReaderImageSource<R> {
    fn describe(&self) -> String {
        self.name.clone()
    }

    fn acquire(&mut self) -> Result<Option<DynamicImage>> {
        let mut bytes = Vec::new();
        self.reader
            .read_to_end(&mut bytes)
            .map_err(|e| PneumoniaError::FileSystem {
                path: PathBuf::from(&self.name),
                operation: "read image stream".to_string(),
                source: e,
            })?;

        if bytes.is_empty() {
            tracing::debug!(source = %self.name, "image stream was empty");
            return Ok(None);
        }

        let image = image::load_from_memory(&bytes)
            .map_err(|e| PneumoniaError::invalid_image(format!("{}: {e}", self.name)))?;
        Ok(Some(image))
    }
}
