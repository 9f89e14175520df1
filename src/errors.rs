use std::path::PathBuf;
use thiserror::Error;

type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Structured error types for the pneumonia classifier.
///
/// # Why structured errors
///
/// Each variant captures context specific to its error domain (filesystem, image decoding,
/// model operations, etc.) so callers can react to the kind of failure without parsing
/// error strings. Every failure is terminal for the single classification that raised it;
/// nothing in the crate retries.
#[derive(Error, Debug)]
pub enum PneumoniaError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Filesystem error: {operation} failed for {path:?}")]
    FileSystem {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid image: {reason}")]
    InvalidImage { reason: String },

    #[error("Model error: {operation} failed")]
    Model {
        operation: String,
        #[source]
        source: BoxedError,
    },

    #[error("Validation error: {field} {reason}")]
    Validation { field: String, reason: String },
}

pub type Result<T> = std::result::Result<T, PneumoniaError>;

impl PneumoniaError {
    pub fn invalid_image(reason: impl Into<String>) -> Self {
        Self::InvalidImage {
            reason: reason.into(),
        }
    }

    /// Model failure that has no underlying library error to carry.
    pub fn model(operation: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Model {
            operation: operation.into(),
            source: Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                detail.into(),
            )),
        }
    }

    /// True when the failure came from the operating system refusing access,
    /// the command-line analog of a denied camera or storage permission.
    pub fn is_permission_denied(&self) -> bool {
        matches!(
            self,
            Self::FileSystem { source, .. } if source.kind() == std::io::ErrorKind::PermissionDenied
        )
    }
}

/// Convert I/O errors to filesystem errors.
///
/// Code that knows the path and operation should construct `PneumoniaError::FileSystem`
/// directly; this conversion is the fallback.
impl From<std::io::Error> for PneumoniaError {
    fn from(err: std::io::Error) -> Self {
        Self::FileSystem {
            path: PathBuf::from("unknown"),
            operation: "unknown".to_string(),
            source: err,
        }
    }
}

/// Convert ONNX Runtime errors to model errors.
impl From<ort::Error> for PneumoniaError {
    fn from(err: ort::Error) -> Self {
        Self::Model {
            operation: "ort operation".to_string(),
            source: Box::new(err),
        }
    }
}

/// Convert ndarray shape errors to model errors.
///
/// Shape errors only happen while building or reading tensors, so they are categorized as
/// model errors rather than a separate tensor error type.
impl From<ndarray::ShapeError> for PneumoniaError {
    fn from(err: ndarray::ShapeError) -> Self {
        Self::Model {
            operation: "tensor shape conversion".to_string(),
            source: Box::new(err),
        }
    }
}
