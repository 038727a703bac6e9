// Error types for the layout core.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for layout operations
pub type Result<T> = std::result::Result<T, LayoutError>;

#[derive(Error, Debug)]
pub enum LayoutError {
    /// Source image is missing or could not be decoded
    #[error("Input image not found or unreadable: {}", path.display())]
    InputNotFound { path: PathBuf },

    /// A configuration value is out of its valid range
    #[error("Invalid config: {parameter} {reason}")]
    InvalidConfig { parameter: String, reason: String },

    /// Image has the wrong shape or pixel type for the operation
    #[error("Invalid image: {reason}")]
    InvalidImage { reason: String },

    /// OpenCV operation failed
    #[error("OpenCV error during {operation}")]
    OpenCv {
        operation: String,
        #[source]
        source: opencv::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl LayoutError {
    pub fn invalid_config(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    /// Wrap an OpenCV error with the name of the failing operation
    pub fn opencv(operation: impl Into<String>, source: opencv::Error) -> Self {
        Self::OpenCv {
            operation: operation.into(),
            source,
        }
    }
}

/// Attach an operation name to an OpenCV result.
pub trait OpenCvContext<T> {
    fn op(self, operation: &str) -> Result<T>;
}

impl<T> OpenCvContext<T> for opencv::Result<T> {
    fn op(self, operation: &str) -> Result<T> {
        self.map_err(|e| LayoutError::opencv(operation, e))
    }
}
