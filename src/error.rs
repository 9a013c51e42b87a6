//! Error types for Filedrop.

use thiserror::Error;

/// Common error type for Filedrop.
#[derive(Error, Debug)]
pub enum FiledropError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Validation error for caller input (file names, destination folders).
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Archive creation error.
    ///
    /// Raised by the zip writer while adding entries or finalizing the archive.
    #[error("archive error: {0}")]
    Archive(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<zip::result::ZipError> for FiledropError {
    fn from(e: zip::result::ZipError) -> Self {
        FiledropError::Archive(e.to_string())
    }
}

impl From<walkdir::Error> for FiledropError {
    fn from(e: walkdir::Error) -> Self {
        match e.into_io_error() {
            Some(io) => FiledropError::Io(io),
            None => FiledropError::Io(std::io::Error::other("filesystem loop detected")),
        }
    }
}

impl From<tokio::task::JoinError> for FiledropError {
    fn from(e: tokio::task::JoinError) -> Self {
        FiledropError::Io(std::io::Error::other(format!("blocking task failed: {e}")))
    }
}

/// Result type alias for Filedrop operations.
pub type Result<T> = std::result::Result<T, FiledropError>;
