//! Batch driver: many URLs, bounded parallel jobs, one report.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{mpsc, watch, Semaphore};
use tracing::{info, warn};

use reel_models::{JobRecord, JobStatus};
use reel_store::ArtifactStore;

use crate::collab::Collaborators;
use crate::config::PipelineConfig;
use crate::error::PipelineResult;
use crate::runner::JobRunner;
use crate::status::StatusRegistry;

/// Outcome of one batch run.
#[derive(Debug)]
pub struct BatchReport {
    pub succeeded: usize,
    pub failed: usize,
    pub jobs: Vec<JobRecord>,
}

/// One line in `outputs/manifest.jsonl`, appended per succeeded job.
#[derive(Debug, Serialize)]
struct ManifestRecord {
    job_id: String,
    title: Option<String>,
    output: String,
    duration: Option<f64>,
}

/// Drives a batch of URLs through the pipeline.
///
/// Each URL becomes one job. A semaphore bounds how many jobs run at once;
/// a permit is held for a job's whole lifetime. Jobs never retry and never
/// touch each other's artifacts.
pub struct BatchDriver {
    store: ArtifactStore,
    config: PipelineConfig,
    collab: Collaborators,
    status: StatusRegistry,
    cancel_rx: watch::Receiver<bool>,
}

impl BatchDriver {
    pub fn new(
        store: ArtifactStore,
        config: PipelineConfig,
        collab: Collaborators,
        status: StatusRegistry,
        cancel_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            store,
            config,
            collab,
            status,
            cancel_rx,
        }
    }

    pub async fn run(&self, urls: Vec<String>) -> PipelineResult<BatchReport> {
        self.store.init().await?;

        let total = urls.len();
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency.max(1)));
        let (result_tx, mut result_rx) = mpsc::channel::<JobRecord>(total.max(1));

        info!(
            jobs = total,
            max_concurrency = self.config.max_concurrency,
            "Starting batch"
        );

        for url in urls {
            // Stop launching new jobs once cancellation is signalled.
            if *self.cancel_rx.borrow() {
                warn!(url = %url, "Batch cancelled, not starting job");
                let mut record = JobRecord::new(url);
                let stage = record.stage;
                record.fail(stage, "cancelled");
                self.status.publish(&record).await;
                if result_tx.send(record).await.is_err() {
                    break;
                }
                continue;
            }

            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .expect("semaphore never closed");

            let runner = JobRunner::new(
                self.store.clone(),
                self.config.clone(),
                self.collab.clone(),
                self.status.clone(),
                self.cancel_rx.clone(),
            );
            let tx = result_tx.clone();

            tokio::spawn(async move {
                let _permit = permit;
                let mut record = JobRecord::new(url);

                if let Err(e) = runner.run(&mut record).await {
                    warn!(job_id = %record.id, error = %e, "Job failed");
                }

                let _ = tx.send(record).await;
            });
        }
        drop(result_tx);

        // The collection loop is the manifest's only writer, so records
        // from concurrent jobs never interleave.
        let mut jobs = Vec::with_capacity(total);
        while let Some(record) = result_rx.recv().await {
            if let Err(e) = append_manifest(&self.store, &record).await {
                // The clip rendered fine; a manifest hiccup is not a
                // job failure.
                warn!(job_id = %record.id, error = %e, "Failed to append manifest record");
            }
            jobs.push(record);
        }
        // Deterministic report order regardless of completion order.
        jobs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        let succeeded = jobs
            .iter()
            .filter(|j| j.status == JobStatus::Succeeded)
            .count();
        let failed = jobs.len() - succeeded;

        info!(succeeded, failed, "Batch complete");
        Ok(BatchReport {
            succeeded,
            failed,
            jobs,
        })
    }
}

/// Append a succeeded job to the batch manifest.
async fn append_manifest(store: &ArtifactStore, record: &JobRecord) -> PipelineResult<()> {
    if record.status != JobStatus::Succeeded {
        return Ok(());
    }

    let output = store.output_path(&record.id);
    let title = match store
        .read_json::<reel_models::VideoMetadata>(&store.meta_path(&record.id))
        .await
    {
        Ok(meta) => meta.title,
        Err(_) => None,
    };
    // Rendered duration, when ffprobe is around to report it.
    let duration = reel_media::probe::probe_duration(&output).await.ok();

    store
        .append_manifest(&ManifestRecord {
            job_id: record.id.to_string(),
            title,
            output: output.to_string_lossy().to_string(),
            duration,
        })
        .await?;
    Ok(())
}
