//! Error types for the artifact store.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while reading or publishing artifacts.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Artifact not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to publish artifact to {path}: {message}")]
    PublishFailed { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    pub fn publish_failed(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::PublishFailed {
            path: path.into(),
            message: message.into(),
        }
    }
}
