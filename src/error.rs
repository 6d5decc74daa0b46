//! Error types for apicenter-chat

use thiserror::Error;

/// Result type alias for apicenter-chat operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while dispatching chat commands
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    /// The catalog could not return its specifications.
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// The completion stream failed to open or broke mid-stream.
    #[error("Completion error: {0}")]
    Completion(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}
