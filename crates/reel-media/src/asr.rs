//! Speech-to-text and word alignment via the whisper/whisperx CLIs.

use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

use reel_models::{normalize_segments, RawWordTiming, TranscriptSegment};

use crate::error::{MediaError, MediaResult};

#[derive(Debug, Deserialize)]
struct WhisperOutput {
    #[serde(default)]
    segments: Vec<WhisperSegment>,
}

#[derive(Debug, Deserialize)]
struct WhisperSegment {
    start: f64,
    end: f64,
    text: String,
}

#[derive(Debug, Deserialize)]
struct WhisperXOutput {
    #[serde(default)]
    word_segments: Vec<WhisperXWord>,
}

#[derive(Debug, Deserialize)]
struct WhisperXWord {
    word: String,
    start: Option<f64>,
    end: Option<f64>,
}

/// Transcribe a wav file with the whisper CLI.
///
/// Whisper writes `<stem>.json` into the output directory; segments are
/// normalized before returning.
pub async fn run_whisper(
    wav: impl AsRef<Path>,
    model: &str,
    language: &str,
    workdir: impl AsRef<Path>,
) -> MediaResult<Vec<TranscriptSegment>> {
    let wav = wav.as_ref();
    let workdir = workdir.as_ref();

    if !wav.exists() {
        return Err(MediaError::FileNotFound(wav.to_path_buf()));
    }
    which::which("whisper").map_err(|_| MediaError::tool_not_found("whisper"))?;

    info!(wav = %wav.display(), model, language, "Running whisper transcription");

    let output = Command::new("whisper")
        .arg(wav)
        .args(["--model", model])
        .args(["--language", language])
        .args(["--task", "transcribe"])
        .args(["--output_format", "json"])
        .arg("--output_dir")
        .arg(workdir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        debug!("whisper stderr: {}", stderr);
        return Err(MediaError::transcription_failed(format!(
            "whisper failed: {}",
            stderr.lines().last().unwrap_or("Unknown error")
        )));
    }

    let stem = wav
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "audio".to_string());
    let json_path = workdir.join(format!("{}.json", stem));
    if !json_path.exists() {
        return Err(MediaError::transcription_failed(format!(
            "whisper produced no output at {}",
            json_path.display()
        )));
    }

    let bytes = tokio::fs::read(&json_path).await?;
    let parsed: WhisperOutput = serde_json::from_slice(&bytes)?;
    let segments = parsed
        .segments
        .into_iter()
        .map(|s| TranscriptSegment::new(s.start, s.end, s.text))
        .collect();

    Ok(normalize_segments(segments))
}

/// Align transcript segments to word-level timings with the whisperx CLI.
///
/// The input segments are written next to the audio so the run is
/// reproducible from the artifact directory alone. Words the engine could
/// not place come back with `None` timings; the caller's policy decides
/// whether to drop or interpolate them.
pub async fn run_whisperx_align(
    wav: impl AsRef<Path>,
    segments: &[TranscriptSegment],
    language: &str,
    workdir: impl AsRef<Path>,
) -> MediaResult<Vec<RawWordTiming>> {
    let wav = wav.as_ref();
    let workdir = workdir.as_ref();

    if !wav.exists() {
        return Err(MediaError::FileNotFound(wav.to_path_buf()));
    }
    if segments.is_empty() {
        return Err(MediaError::alignment_failed("no transcript segments to align"));
    }
    which::which("whisperx").map_err(|_| MediaError::tool_not_found("whisperx"))?;

    let segments_path = workdir.join("align-input.segments.json");
    let bytes = serde_json::to_vec(segments)?;
    tokio::fs::write(&segments_path, bytes).await?;

    info!(
        wav = %wav.display(),
        segments = segments.len(),
        language,
        "Running whisperx alignment"
    );

    let output = Command::new("whisperx")
        .arg(wav)
        .args(["--language", language])
        .args(["--output_format", "json"])
        .arg("--output_dir")
        .arg(workdir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        debug!("whisperx stderr: {}", stderr);
        return Err(MediaError::alignment_failed(format!(
            "whisperx failed: {}",
            stderr.lines().last().unwrap_or("Unknown error")
        )));
    }

    let stem = wav
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "audio".to_string());
    let json_path = workdir.join(format!("{}.json", stem));
    if !json_path.exists() {
        return Err(MediaError::alignment_failed(format!(
            "whisperx produced no output at {}",
            json_path.display()
        )));
    }

    let bytes = tokio::fs::read(&json_path).await?;
    let parsed: WhisperXOutput = serde_json::from_slice(&bytes)?;

    Ok(parsed
        .word_segments
        .into_iter()
        .map(|w| RawWordTiming::new(w.word, w.start, w.end))
        .collect())
}
