use thiserror::Error;

/// Structured error types for the leaf identification pipeline.
///
/// Only `InvalidInput` is produced by the analysis core itself; the remaining
/// variants cover the surrounding surfaces (image decoding, the optional
/// segmentation model). Degraded-but-valid conditions (no contour found,
/// GLCM unavailable, no leaf region detected) are deliberately not errors:
/// they are absorbed into the result with a logged warning, per the
/// pipeline's propagation policy.
#[derive(Error, Debug)]
pub enum LeafIdError {
    #[error("invalid input image: {reason}")]
    InvalidInput { reason: String },

    #[error("image processing error: {operation} failed")]
    ImageProcessing {
        operation: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("model error: {operation} failed")]
    Model {
        operation: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl LeafIdError {
    /// Invalid-input constructor used by the analyzers' preconditions.
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LeafIdError>;

/// Convert image crate errors (decode failures and the I/O errors they wrap)
/// to image processing errors.
impl From<image::ImageError> for LeafIdError {
    fn from(err: image::ImageError) -> Self {
        Self::ImageProcessing {
            operation: "image decoding".to_string(),
            source: Box::new(err),
        }
    }
}

/// Convert ONNX Runtime errors to model errors.
#[cfg(feature = "onnx")]
impl From<ort::Error> for LeafIdError {
    fn from(err: ort::Error) -> Self {
        Self::Model {
            operation: "ort operation".to_string(),
            source: Box::new(err),
        }
    }
}
