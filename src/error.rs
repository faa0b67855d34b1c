//! Error types for dailies.

use thiserror::Error;

/// Common error type for dailies.
#[derive(Error, Debug)]
pub enum DailiesError {
    /// Entity or stored file absent.
    #[error("{0} not found")]
    NotFound(String),

    /// Access gate denied the request.
    #[error("permission denied: {0}")]
    Forbidden(String),

    /// Missing file field, or bytes that do not decode as an image.
    #[error("invalid upload: {0}")]
    InvalidUpload(String),

    /// I/O error on the content store.
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for dailies operations.
pub type Result<T> = std::result::Result<T, DailiesError>;
