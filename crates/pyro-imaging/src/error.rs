//! Error types for image ingestion.

use thiserror::Error;

/// Result type for imaging operations.
pub type ImagingResult<T> = Result<T, DecodeError>;

/// Errors raised while turning upload bytes into a pixel buffer.
///
/// These are user-input faults and surface as client errors before any
/// detector runs.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Empty image payload")]
    Empty,

    #[error("Unrecognized image format")]
    UnknownFormat,

    #[error("Failed to decode image: {0}")]
    Undecodable(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
