//! Job definitions for pipeline processing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use crate::utils::extract_youtube_id;

/// Unique identifier for a job, derived from the source URL.
///
/// The same URL always maps to the same id, which is what makes artifact
/// lookups across batch runs possible.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Derive a stable id from a source URL.
    ///
    /// YouTube URLs use the 11-character video id directly so artifacts are
    /// keyed the same way the platform keys videos. Anything else falls back
    /// to a 16-hex-char SHA-256 prefix of the trimmed URL.
    pub fn from_url(url: &str) -> Self {
        if let Ok(id) = extract_youtube_id(url) {
            return Self(id);
        }
        let digest = Sha256::digest(url.trim().as_bytes());
        let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
        Self(hex[..16].to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One pipeline stage. Stages run strictly in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Fetch,
    Transcript,
    Align,
    Caption,
    Render,
    Done,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Fetch => "fetch",
            Stage::Transcript => "transcript",
            Stage::Align => "align",
            Stage::Caption => "caption",
            Stage::Render => "render",
            Stage::Done => "done",
        }
    }

    /// The stage that follows this one, if any.
    pub fn next(&self) -> Option<Stage> {
        match self {
            Stage::Fetch => Some(Stage::Transcript),
            Stage::Transcript => Some(Stage::Align),
            Stage::Align => Some(Stage::Caption),
            Stage::Caption => Some(Stage::Render),
            Stage::Render => Some(Stage::Done),
            Stage::Done => None,
        }
    }

    /// All executable stages in pipeline order (`Done` is not executable).
    pub fn pipeline() -> [Stage; 5] {
        [
            Stage::Fetch,
            Stage::Transcript,
            Stage::Align,
            Stage::Caption,
            Stage::Render,
        ]
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Job status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Job is waiting for a worker slot
    #[default]
    Queued,
    /// Job is being processed
    Running,
    /// All stages completed
    Succeeded,
    /// A stage failed; `error` holds the cause
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Succeeded => "succeeded",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One timestamped line in a job's append-only log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogLine {
    pub at: DateTime<Utc>,
    pub message: String,
}

impl LogLine {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            at: Utc::now(),
            message: message.into(),
        }
    }
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.at.format("%Y-%m-%dT%H:%M:%S%.3fZ"), self.message)
    }
}

/// One unit of work: a single source URL's traversal through the pipeline.
///
/// Mutated exclusively by the job runner executing it. Terminal once
/// `status` reaches `Succeeded` or `Failed`; never deleted automatically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    /// Stable identifier derived from the source URL
    pub id: JobId,

    /// Input URL
    pub source_url: String,

    /// Current position in the pipeline
    pub stage: Stage,

    /// Job status
    pub status: JobStatus,

    /// Append-only, timestamped log lines
    pub log: Vec<LogLine>,

    /// Artifact paths per completed stage
    pub artifacts: BTreeMap<Stage, Vec<PathBuf>>,

    /// Failure description, set only when `status == Failed`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl JobRecord {
    /// Create a queued job for a source URL.
    pub fn new(source_url: impl Into<String>) -> Self {
        let source_url = source_url.into();
        let now = Utc::now();
        Self {
            id: JobId::from_url(&source_url),
            source_url,
            stage: Stage::Fetch,
            status: JobStatus::Queued,
            log: Vec::new(),
            artifacts: BTreeMap::new(),
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Mark the job as running.
    pub fn start(&mut self) {
        self.status = JobStatus::Running;
        self.updated_at = Utc::now();
    }

    /// Append a log line. Lines are never truncated mid-run.
    pub fn log_line(&mut self, message: impl Into<String>) {
        self.log.push(LogLine::new(message));
        self.updated_at = Utc::now();
    }

    /// Record a completed stage's artifacts and advance to the next stage.
    pub fn complete_stage(&mut self, stage: Stage, artifacts: Vec<PathBuf>) {
        self.artifacts.insert(stage, artifacts);
        if let Some(next) = stage.next() {
            self.stage = next;
        }
        if self.stage == Stage::Done {
            self.status = JobStatus::Succeeded;
        }
        self.updated_at = Utc::now();
    }

    /// Mark the job as failed at the given stage.
    pub fn fail(&mut self, stage: Stage, cause: impl Into<String>) {
        let cause = cause.into();
        self.status = JobStatus::Failed;
        self.error = Some(format!("{}: {}", stage, cause));
        self.updated_at = Utc::now();
    }

    /// Rendered output paths, if the job reached the render stage.
    pub fn outputs(&self) -> Vec<PathBuf> {
        self.artifacts.get(&Stage::Render).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_id_from_youtube_url() {
        let a = JobId::from_url("https://youtube.com/watch?v=abc123def45");
        let b = JobId::from_url("https://youtu.be/abc123def45");
        assert_eq!(a.as_str(), "abc123def45");
        assert_eq!(a, b);
    }

    #[test]
    fn test_job_id_fallback_is_stable() {
        let a = JobId::from_url("https://example.com/talks/42");
        let b = JobId::from_url("  https://example.com/talks/42  ");
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 16);
        assert_ne!(a, JobId::from_url("https://example.com/talks/43"));
    }

    #[test]
    fn test_stage_order() {
        let mut stage = Stage::Fetch;
        let mut seen = vec![stage];
        while let Some(next) = stage.next() {
            seen.push(next);
            stage = next;
        }
        assert_eq!(
            seen,
            vec![
                Stage::Fetch,
                Stage::Transcript,
                Stage::Align,
                Stage::Caption,
                Stage::Render,
                Stage::Done
            ]
        );
    }

    #[test]
    fn test_job_stage_completion_advances() {
        let mut job = JobRecord::new("https://youtu.be/abc123def45");
        job.start();
        assert_eq!(job.status, JobStatus::Running);

        job.complete_stage(Stage::Fetch, vec![PathBuf::from("raw/abc.mp4")]);
        assert_eq!(job.stage, Stage::Transcript);
        assert!(job.artifacts.contains_key(&Stage::Fetch));
    }

    #[test]
    fn test_job_succeeds_after_render() {
        let mut job = JobRecord::new("https://youtu.be/abc123def45");
        job.start();
        for stage in Stage::pipeline() {
            job.complete_stage(stage, vec![]);
        }
        assert_eq!(job.stage, Stage::Done);
        assert_eq!(job.status, JobStatus::Succeeded);
        assert!(job.status.is_terminal());
    }

    #[test]
    fn test_job_failure_sets_error() {
        let mut job = JobRecord::new("https://youtu.be/abc123def45");
        job.start();
        job.fail(Stage::Fetch, "yt-dlp failed: 404");
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.error.as_deref(), Some("fetch: yt-dlp failed: 404"));
    }

    #[test]
    fn test_log_is_append_only() {
        let mut job = JobRecord::new("https://youtu.be/abc123def45");
        job.log_line("first");
        job.log_line("second");
        assert_eq!(job.log.len(), 2);
        assert_eq!(job.log[0].message, "first");
        assert!(job.log[0].at <= job.log[1].at);
    }
}
