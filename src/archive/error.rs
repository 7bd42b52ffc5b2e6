//! Archive error types

use thiserror::Error;

/// Errors raised while building a ZIP download
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// A request item is not `name|base64`
    #[error("Malformed item #{index}: {reason}")]
    MalformedItem { index: usize, reason: String },

    /// An entry name could escape the extraction directory
    #[error("Unsafe entry name: {0}")]
    UnsafeName(String),

    /// Two entries share a name
    #[error("Duplicate entry name: {0}")]
    DuplicateName(String),

    /// The ZIP writer rejected an entry or failed to finish
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Blocking task could not be joined
    #[error("Task join error: {0}")]
    TaskJoin(String),
}

/// Result type alias for archive operations
pub type ArchiveResult<T> = std::result::Result<T, ArchiveError>;
