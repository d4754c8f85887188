//! Pull-based job status snapshots.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::RwLock;

use reel_models::{JobId, JobRecord, JobStatus, Stage};

/// How many log lines a snapshot carries.
const LOG_TAIL_LEN: usize = 10;

/// Immutable view of a job's progress.
///
/// Readers get a clone and never block the runner.
#[derive(Debug, Clone)]
pub struct JobSnapshot {
    pub id: JobId,
    pub source_url: String,
    pub status: JobStatus,
    pub stage: Stage,
    pub log_tail: Vec<String>,
    pub outputs: Vec<PathBuf>,
    pub error: Option<String>,
}

impl JobSnapshot {
    fn from_record(record: &JobRecord) -> Self {
        let skip = record.log.len().saturating_sub(LOG_TAIL_LEN);
        Self {
            id: record.id.clone(),
            source_url: record.source_url.clone(),
            status: record.status,
            stage: record.stage,
            log_tail: record.log[skip..].iter().map(|l| l.to_string()).collect(),
            outputs: record.outputs(),
            error: record.error.clone(),
        }
    }
}

/// Registry the runner publishes snapshots into at every stage boundary.
#[derive(Debug, Clone, Default)]
pub struct StatusRegistry {
    inner: Arc<RwLock<HashMap<JobId, JobSnapshot>>>,
}

impl StatusRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a fresh snapshot of a job.
    pub async fn publish(&self, record: &JobRecord) {
        let snapshot = JobSnapshot::from_record(record);
        self.inner.write().await.insert(snapshot.id.clone(), snapshot);
    }

    /// Snapshot of one job, if known.
    pub async fn get(&self, id: &JobId) -> Option<JobSnapshot> {
        self.inner.read().await.get(id).cloned()
    }

    /// Snapshots of all known jobs.
    pub async fn all(&self) -> Vec<JobSnapshot> {
        self.inner.read().await.values().cloned().collect()
    }
}
