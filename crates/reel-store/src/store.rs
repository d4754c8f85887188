//! Artifact layout and atomic publishing.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use reel_models::{JobId, Stage};

use crate::error::{StoreError, StoreResult};

/// Content-keyed artifact store rooted at a data directory.
///
/// Layout (one file set per job id):
/// - `raw/<id>.mp4`, `raw/<id>.meta.json` — fetched video + metadata
/// - `audio/<id>.wav` — extracted audio for ASR/alignment
/// - `transcripts/<id>.segments.json`, `transcripts/<id>.source.json`
/// - `aligned/<id>.words.json` — word timings
/// - `captions/<id>.ass` — karaoke subtitle artifact
/// - `outputs/<id>.mp4` — rendered clip
/// - `logs/<id>.log` — append-only job log
/// - `tmp/` — staging area for atomic publishes
///
/// Writes are isolated per job id, so concurrent workers never contend for
/// the same final path.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the directory tree. Idempotent.
    pub async fn init(&self) -> StoreResult<()> {
        for dir in [
            "raw", "audio", "transcripts", "aligned", "captions", "outputs", "logs", "tmp",
        ] {
            fs::create_dir_all(self.root.join(dir)).await?;
        }
        Ok(())
    }

    pub fn video_path(&self, id: &JobId) -> PathBuf {
        self.root.join("raw").join(format!("{}.mp4", id))
    }

    pub fn meta_path(&self, id: &JobId) -> PathBuf {
        self.root.join("raw").join(format!("{}.meta.json", id))
    }

    pub fn audio_path(&self, id: &JobId) -> PathBuf {
        self.root.join("audio").join(format!("{}.wav", id))
    }

    pub fn segments_path(&self, id: &JobId) -> PathBuf {
        self.root
            .join("transcripts")
            .join(format!("{}.segments.json", id))
    }

    pub fn transcript_source_path(&self, id: &JobId) -> PathBuf {
        self.root
            .join("transcripts")
            .join(format!("{}.source.json", id))
    }

    pub fn words_path(&self, id: &JobId) -> PathBuf {
        self.root.join("aligned").join(format!("{}.words.json", id))
    }

    pub fn captions_path(&self, id: &JobId) -> PathBuf {
        self.root.join("captions").join(format!("{}.ass", id))
    }

    pub fn output_path(&self, id: &JobId) -> PathBuf {
        self.root.join("outputs").join(format!("{}.mp4", id))
    }

    pub fn log_path(&self, id: &JobId) -> PathBuf {
        self.root.join("logs").join(format!("{}.log", id))
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join("outputs").join("manifest.jsonl")
    }

    /// Final artifact paths a stage must produce for a job.
    pub fn stage_paths(&self, id: &JobId, stage: Stage) -> Vec<PathBuf> {
        match stage {
            Stage::Fetch => vec![
                self.video_path(id),
                self.audio_path(id),
                self.meta_path(id),
            ],
            Stage::Transcript => vec![
                self.segments_path(id),
                self.transcript_source_path(id),
            ],
            Stage::Align => vec![self.words_path(id)],
            Stage::Caption => vec![self.captions_path(id)],
            Stage::Render => vec![self.output_path(id)],
            Stage::Done => Vec::new(),
        }
    }

    /// Whether all of a stage's artifacts already exist.
    pub fn stage_complete(&self, id: &JobId, stage: Stage) -> bool {
        let paths = self.stage_paths(id, stage);
        !paths.is_empty() && paths.iter().all(|p| p.exists())
    }

    /// A fresh staging path in `tmp/`, on the same filesystem as the final
    /// artifact directories so a publish is a single rename.
    pub fn temp_path(&self, suffix: &str) -> PathBuf {
        self.root
            .join("tmp")
            .join(format!("{}-{}", Uuid::new_v4(), suffix))
    }

    /// Atomically publish a staged file to its final path.
    ///
    /// Fast rename first; on EXDEV (cross-device) fall back to copying to a
    /// sibling temp file and renaming that, so the final path never holds a
    /// partial write.
    pub async fn publish(&self, staged: &Path, dest: &Path) -> StoreResult<()> {
        if let Some(parent) = dest.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).await?;
            }
        }

        match fs::rename(staged, dest).await {
            Ok(()) => Ok(()),
            Err(e) if is_cross_device_error(&e) => {
                tracing::debug!(
                    "Cross-device rename detected, falling back to copy+rename: {} -> {}",
                    staged.display(),
                    dest.display()
                );
                copy_then_rename(staged, dest).await
            }
            Err(e) => Err(StoreError::publish_failed(dest, e.to_string())),
        }
    }

    /// Serialize a value to JSON and publish it atomically at `dest`.
    pub async fn write_json_atomic<T: Serialize>(&self, dest: &Path, value: &T) -> StoreResult<()> {
        let staged = self.temp_path(
            dest.file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "artifact.json".to_string())
                .as_str(),
        );
        let bytes = serde_json::to_vec_pretty(value)?;
        fs::write(&staged, bytes).await?;
        self.publish(&staged, dest).await
    }

    /// Read a JSON artifact.
    pub async fn read_json<T: DeserializeOwned>(&self, path: &Path) -> StoreResult<T> {
        if !path.exists() {
            return Err(StoreError::NotFound(path.to_path_buf()));
        }
        let bytes = fs::read(path).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Append one line to a job's log file. Creates the file on first use.
    pub async fn append_log_line(&self, id: &JobId, line: &str) -> StoreResult<()> {
        let path = self.log_path(id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.write_all(b"\n").await?;
        Ok(())
    }

    /// Read the last `tail` lines of a job's log, oldest first.
    pub async fn read_log_tail(&self, id: &JobId, tail: usize) -> StoreResult<Vec<String>> {
        let path = self.log_path(id);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&path).await?;
        let lines: Vec<String> = content.lines().map(str::to_string).collect();
        let skip = lines.len().saturating_sub(tail);
        Ok(lines[skip..].to_vec())
    }

    /// Append one record to the batch manifest.
    ///
    /// The record and its newline go out in a single append write so a
    /// manifest line is never split.
    pub async fn append_manifest<T: Serialize>(&self, record: &T) -> StoreResult<()> {
        let path = self.manifest_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        file.write_all(line.as_bytes()).await?;
        Ok(())
    }
}

/// EXDEV is error code 18 on Linux/macOS.
fn is_cross_device_error(e: &std::io::Error) -> bool {
    e.raw_os_error() == Some(18)
}

/// Copy to a sibling temp file on the destination filesystem, then rename.
async fn copy_then_rename(src: &Path, dst: &Path) -> StoreResult<()> {
    let tmp_dst = dst.with_extension("publish.tmp");

    fs::copy(src, &tmp_dst)
        .await
        .map_err(|e| StoreError::publish_failed(dst, e.to_string()))?;

    if let Err(e) = fs::rename(&tmp_dst, dst).await {
        let _ = fs::remove_file(&tmp_dst).await;
        return Err(StoreError::publish_failed(dst, e.to_string()));
    }

    if let Err(e) = fs::remove_file(src).await {
        tracing::warn!(
            "Failed to remove staged file after publish: {}: {}",
            src.display(),
            e
        );
    }

    Ok(())
}
