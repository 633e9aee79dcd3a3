//! Symbol source error types.

use thiserror::Error;

/// Symbol source probe errors.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid artifact path: {0}")]
    InvalidPath(String),

    #[error("upstream returned status {status}")]
    UpstreamStatus { status: u16 },

    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type for source operations.
pub type SourceResult<T> = std::result::Result<T, SourceError>;
