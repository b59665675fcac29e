//! Error types for project loading and saving.

use thiserror::Error;

/// Errors that can occur while reading or writing project files.
#[derive(Debug, Error)]
pub enum ProjectError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The manifest parsed but does not have the expected shape.
    #[error("invalid manifest: {0}")]
    InvalidManifest(String),
}

/// Convenience alias for results with [`ProjectError`].
pub type Result<T> = std::result::Result<T, ProjectError>;
