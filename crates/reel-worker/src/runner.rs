//! Per-job pipeline state machine.
//!
//! Stages run strictly in order; a stage whose artifacts already exist is
//! skipped unless the run is forced. All stage outputs are written to the
//! store's temp area and atomically published, so a crash or cancellation
//! mid-stage never leaves a partial artifact behind.

use std::path::PathBuf;

use tokio::sync::watch;

use reel_media::MediaError;
use reel_models::{EncoderPath, JobRecord, Stage, TranscriptSegment, WordTiming};
use reel_store::ArtifactStore;

use crate::align::finalize_word_timings;
use crate::captions::build_ass_document;
use crate::collab::Collaborators;
use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::logging::JobLogger;
use crate::resolver::resolve_transcript;
use crate::status::StatusRegistry;

/// Runs one job through the pipeline.
pub struct JobRunner {
    store: ArtifactStore,
    config: PipelineConfig,
    collab: Collaborators,
    status: StatusRegistry,
    cancel_rx: watch::Receiver<bool>,
}

impl JobRunner {
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

    /// Drive a job to a terminal state.
    ///
    /// On failure the record is marked failed at the offending stage and
    /// the error is returned; other jobs are unaffected.
    pub async fn run(&self, record: &mut JobRecord) -> PipelineResult<()> {
        let logger = JobLogger::new(record.id.clone(), self.store.clone());

        record.start();
        record.log_line("job started");
        self.status.publish(record).await;

        for stage in Stage::pipeline() {
            // Cancellation takes effect at stage boundaries only; a stage
            // already executing finishes its temp write first.
            if *self.cancel_rx.borrow() {
                record.fail(stage, "cancelled");
                logger.warn("job cancelled").await;
                self.status.publish(record).await;
                return Err(PipelineError::Cancelled);
            }

            let paths = self.store.stage_paths(&record.id, stage);
            if !self.config.force && self.store.stage_complete(&record.id, stage) {
                let msg = format!("stage {} skipped, artifacts exist", stage);
                logger.info(&msg).await;
                record.log_line(msg);
                record.complete_stage(stage, paths);
                self.status.publish(record).await;
                continue;
            }

            let result = match stage {
                Stage::Fetch => self.run_fetch(record, &logger).await,
                Stage::Transcript => self.run_transcript(record, &logger).await,
                Stage::Align => self.run_align(record, &logger).await,
                Stage::Caption => self.run_caption(record, &logger).await,
                Stage::Render => self.run_render(record, &logger).await,
                Stage::Done => Ok(()),
            };

            match result {
                Ok(()) => {
                    let msg = format!("stage {} complete", stage);
                    logger.info(&msg).await;
                    record.log_line(msg);
                    record.complete_stage(stage, paths);
                    self.status.publish(record).await;
                }
                Err(e) => {
                    record.fail(stage, e.to_string());
                    logger.error(&format!("stage {} failed: {}", stage, e)).await;
                    self.status.publish(record).await;
                    return Err(e);
                }
            }
        }

        record.log_line("job succeeded");
        logger.info("job succeeded").await;
        self.status.publish(record).await;
        Ok(())
    }

    async fn stage_workdir(&self, name: &str) -> PipelineResult<PathBuf> {
        let dir = self.store.temp_path(name);
        tokio::fs::create_dir_all(&dir).await?;
        Ok(dir)
    }

    async fn run_fetch(&self, record: &JobRecord, logger: &JobLogger) -> PipelineResult<()> {
        let workdir = self.stage_workdir("fetch").await?;
        let video_tmp = workdir.join("video.mp4");
        let audio_tmp = workdir.join("audio.wav");

        let metadata = self
            .collab
            .downloader
            .fetch(
                &record.source_url,
                &video_tmp,
                &audio_tmp,
                self.config.sample_rate,
            )
            .await
            .map_err(|e| PipelineError::fetch(describe_media_error(&e)))?;

        if let Some(title) = &metadata.title {
            logger.info(&format!("fetched \"{}\"", title)).await;
        }

        self.store
            .write_json_atomic(&self.store.meta_path(&record.id), &metadata)
            .await?;
        self.store
            .publish(&video_tmp, &self.store.video_path(&record.id))
            .await?;
        self.store
            .publish(&audio_tmp, &self.store.audio_path(&record.id))
            .await?;

        let _ = tokio::fs::remove_dir_all(&workdir).await;
        Ok(())
    }

    async fn run_transcript(&self, record: &JobRecord, logger: &JobLogger) -> PipelineResult<()> {
        let workdir = self.stage_workdir("transcript").await?;
        let wav = self.store.audio_path(&record.id);

        let (segments, source) = resolve_transcript(
            self.collab.caption_provider.as_ref(),
            self.collab.transcriber.as_ref(),
            &record.source_url,
            &wav,
            &workdir,
            &self.config,
        )
        .await?;

        logger
            .info(&format!(
                "transcript source: {}, {} segments",
                source,
                segments.len()
            ))
            .await;

        self.store
            .write_json_atomic(&self.store.segments_path(&record.id), &segments)
            .await?;
        self.store
            .write_json_atomic(&self.store.transcript_source_path(&record.id), &source)
            .await?;

        let _ = tokio::fs::remove_dir_all(&workdir).await;
        Ok(())
    }

    async fn run_align(&self, record: &JobRecord, logger: &JobLogger) -> PipelineResult<()> {
        let workdir = self.stage_workdir("align").await?;
        let wav = self.store.audio_path(&record.id);

        let segments: Vec<TranscriptSegment> = self
            .store
            .read_json(&self.store.segments_path(&record.id))
            .await?;

        let raw = self
            .collab
            .aligner
            .align(&wav, &segments, &self.config.language, &workdir)
            .await
            .map_err(|e| PipelineError::alignment(describe_media_error(&e)))?;

        let total = raw.len();
        let words = finalize_word_timings(
            raw,
            &segments,
            self.config.unplaced_word_policy,
            self.config.overlap_tolerance_s,
        );

        if words.is_empty() {
            return Err(PipelineError::alignment(
                "alignment produced no usable word timings",
            ));
        }
        if words.len() < total {
            logger
                .warn(&format!(
                    "kept {} of {} aligned words (policy: {})",
                    words.len(),
                    total,
                    self.config.unplaced_word_policy.as_str()
                ))
                .await;
        }

        self.store
            .write_json_atomic(&self.store.words_path(&record.id), &words)
            .await?;

        let _ = tokio::fs::remove_dir_all(&workdir).await;
        Ok(())
    }

    async fn run_caption(&self, record: &JobRecord, _logger: &JobLogger) -> PipelineResult<()> {
        let words: Vec<WordTiming> = self
            .store
            .read_json(&self.store.words_path(&record.id))
            .await?;

        let document = build_ass_document(&words, &self.config)?;

        let staged = self.store.temp_path("captions.ass");
        tokio::fs::write(&staged, document.as_bytes()).await?;
        self.store
            .publish(&staged, &self.store.captions_path(&record.id))
            .await?;
        Ok(())
    }

    async fn run_render(&self, record: &JobRecord, logger: &JobLogger) -> PipelineResult<()> {
        let workdir = self.stage_workdir("render").await?;
        let video = self.store.video_path(&record.id);
        let captions = self.store.captions_path(&record.id);
        let output_tmp = workdir.join("output.mp4");

        let mut encoder_path = self.collab.encoder.detect(&workdir).await;
        logger
            .info(&format!("encoder path: {}", encoder_path))
            .await;

        let mut result = self
            .collab
            .encoder
            .render(&video, &captions, &output_tmp, encoder_path)
            .await;

        // A probe can pass and the real encode still fail; fall back once.
        if result.is_err() && encoder_path == EncoderPath::Hardware {
            let cause = result
                .as_ref()
                .err()
                .map(|e| describe_media_error(e))
                .unwrap_or_default();
            logger
                .warn(&format!(
                    "hardware encode failed, retrying with software path: {}",
                    cause
                ))
                .await;
            encoder_path = EncoderPath::Software;
            result = self
                .collab
                .encoder
                .render(&video, &captions, &output_tmp, encoder_path)
                .await;
        }

        result.map_err(|e| PipelineError::render(describe_media_error(&e)))?;

        self.store
            .publish(&output_tmp, &self.store.output_path(&record.id))
            .await?;
        logger
            .info(&format!("rendered with {} encoder", encoder_path))
            .await;

        let _ = tokio::fs::remove_dir_all(&workdir).await;
        Ok(())
    }
}

/// Flatten a media error into a message that keeps raw tool stderr.
fn describe_media_error(e: &MediaError) -> String {
    match e {
        MediaError::FfmpegFailed {
            message,
            stderr: Some(stderr),
            ..
        } => format!("{}: {}", message, stderr),
        MediaError::FfprobeFailed {
            message,
            stderr: Some(stderr),
        } => format!("{}: {}", message, stderr),
        other => other.to_string(),
    }
}
