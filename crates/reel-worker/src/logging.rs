//! Structured job logging.
//!
//! Every line goes to two places: the tracing subscriber for operators,
//! and the job's append-only log file in the artifact store for later
//! inspection. Log write failures never fail the job.

use tracing::{error, info, warn};

use reel_models::JobId;
use reel_store::ArtifactStore;

/// Job logger with consistent formatting across both sinks.
#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: JobId,
    store: ArtifactStore,
}

impl JobLogger {
    pub fn new(job_id: JobId, store: ArtifactStore) -> Self {
        Self { job_id, store }
    }

    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    pub async fn info(&self, message: &str) {
        info!(job_id = %self.job_id, "{}", message);
        self.append(message).await;
    }

    pub async fn warn(&self, message: &str) {
        warn!(job_id = %self.job_id, "{}", message);
        self.append(&format!("WARN {}", message)).await;
    }

    pub async fn error(&self, message: &str) {
        error!(job_id = %self.job_id, "{}", message);
        self.append(&format!("ERROR {}", message)).await;
    }

    async fn append(&self, message: &str) {
        let line = format!(
            "{} {}",
            chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ"),
            message
        );
        if let Err(e) = self.store.append_log_line(&self.job_id, &line).await {
            warn!(job_id = %self.job_id, "Failed to append job log line: {}", e);
        }
    }
}
