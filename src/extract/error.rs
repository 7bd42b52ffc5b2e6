//! Extraction error types

use thiserror::Error;

/// Errors raised while pulling images out of a PDF
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The bytes could not be opened as a PDF
    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    /// The scan succeeded but the document holds no extractable images
    #[error("no images found")]
    NoImagesFound,

    /// The image uses an encoding or colour space the decoder does not handle
    #[error("Unsupported image: {0}")]
    UnsupportedImage(String),

    /// The image stream could not be decoded into pixels
    #[error("Image decode error: {0}")]
    Decode(String),

    /// Page or object lookup failed inside the document
    #[error("PDF engine error: {0}")]
    Engine(String),

    /// Encoding the output raster failed
    #[error("Image encode error: {0}")]
    Encode(#[from] image::ImageError),

    /// Blocking task could not be joined
    #[error("Task join error: {0}")]
    TaskJoin(String),
}

/// Result type alias for extraction operations
pub type ExtractResult<T> = std::result::Result<T, ExtractError>;

impl From<lopdf::Error> for ExtractError {
    fn from(err: lopdf::Error) -> Self {
        ExtractError::Engine(err.to_string())
    }
}
