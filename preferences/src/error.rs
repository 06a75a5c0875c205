//! Error types for the preferences subsystem
//!
//! All errors use thiserror for structured error handling.
//! Recoverable failures are logged where they happen and still returned,
//! so callers decide whether to ignore, retry or propagate them.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Could not determine the application config directory")]
    ConfigDirUnavailable,

    #[error("Invalid preference: {0}")]
    InvalidPreference(String),

    #[error("{0}")]
    Usage(String),
}

pub type Result<T> = std::result::Result<T, AppError>;
