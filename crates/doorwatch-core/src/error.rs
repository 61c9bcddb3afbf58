//! Error types for the door monitor
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for doorwatch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the door monitor
#[derive(Error, Debug)]
pub enum Error {
    /// Sensor probe errors (hardware missing, read failure, timeout)
    #[error("probe error: {0}")]
    Probe(String),

    /// Outbound message transport errors (carrier API)
    #[error("transport error: {0}")]
    Transport(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O errors (sysfs reads, subprocess spawning)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a probe error
    pub fn probe(msg: impl Into<String>) -> Self {
        Self::Probe(msg.into())
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
