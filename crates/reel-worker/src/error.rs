//! Pipeline error taxonomy.

use thiserror::Error;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors a job can fail with.
///
/// Tool stderr is carried verbatim inside the message so the job record's
/// `error` field holds the real diagnostic. Failures are never retried
/// within a run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("fetch failed: {0}")]
    Fetch(String),

    #[error("no transcript available: {0}")]
    TranscriptUnavailable(String),

    #[error("alignment failed: {0}")]
    Alignment(String),

    #[error("caption generation failed: {0}")]
    Caption(String),

    #[error("render failed: {0}")]
    Render(String),

    #[error("cancelled")]
    Cancelled,

    #[error(transparent)]
    Store(#[from] reel_store::StoreError),

    #[error(transparent)]
    Media(#[from] reel_media::MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    pub fn fetch(message: impl Into<String>) -> Self {
        Self::Fetch(message.into())
    }

    pub fn transcript_unavailable(message: impl Into<String>) -> Self {
        Self::TranscriptUnavailable(message.into())
    }

    pub fn alignment(message: impl Into<String>) -> Self {
        Self::Alignment(message.into())
    }

    pub fn render(message: impl Into<String>) -> Self {
        Self::Render(message.into())
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
