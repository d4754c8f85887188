//! Video, metadata, and caption download using yt-dlp.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, warn};

use reel_models::VideoMetadata;

use crate::error::{MediaError, MediaResult};

/// Minimum size for a download to be considered complete.
const MIN_VIDEO_FILE_SIZE: u64 = 1024;

/// Download a video from a URL using yt-dlp.
///
/// An existing file at `output_path` is reused; a suspiciously small one is
/// removed and re-downloaded.
pub async fn download_video(url: &str, output_path: impl AsRef<Path>) -> MediaResult<()> {
    let output_path = output_path.as_ref();

    if output_path.exists() {
        if let Ok(metadata) = output_path.metadata() {
            if metadata.len() > MIN_VIDEO_FILE_SIZE {
                info!("Using existing video file: {}", output_path.display());
                return Ok(());
            }
            warn!(
                "Existing file {} is too small ({} bytes), re-downloading",
                output_path.display(),
                metadata.len()
            );
            tokio::fs::remove_file(output_path).await?;
        }
    }

    which::which("yt-dlp").map_err(|_| MediaError::YtDlpNotFound)?;

    info!("Downloading video from {} to {}", url, output_path.display());

    let output_path_str = output_path.to_string_lossy();
    let args = [
        "-f",
        "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best",
        "--no-playlist",
        "-o",
        &output_path_str,
        url,
    ];

    let output = Command::new("yt-dlp")
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        debug!("yt-dlp stderr: {}", stderr);
        let error_msg = stderr.lines().last().unwrap_or("Unknown error");
        return Err(MediaError::download_failed(format!(
            "yt-dlp failed: {}",
            error_msg
        )));
    }

    if !output_path.exists() {
        return Err(MediaError::download_failed("Output file not created"));
    }

    let file_size = output_path.metadata()?.len();
    info!(
        output = %output_path.display(),
        size_mb = file_size as f64 / (1024.0 * 1024.0),
        "Downloaded video successfully"
    );

    Ok(())
}

/// Fetch source metadata via `yt-dlp --dump-json` without downloading.
pub async fn fetch_metadata(url: &str) -> MediaResult<VideoMetadata> {
    which::which("yt-dlp").map_err(|_| MediaError::YtDlpNotFound)?;

    let output = Command::new("yt-dlp")
        .args(["--dump-json", "--skip-download", "--no-playlist", url])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        debug!("yt-dlp metadata stderr: {}", stderr);
        return Err(MediaError::download_failed(format!(
            "yt-dlp metadata fetch failed: {}",
            stderr.lines().last().unwrap_or("Unknown error")
        )));
    }

    let raw: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    Ok(VideoMetadata {
        title: raw.get("title").and_then(|v| v.as_str()).map(str::to_string),
        duration: raw.get("duration").and_then(|v| v.as_f64()),
    })
}

/// Download platform captions as a VTT file into `workdir`.
///
/// Tries uploader subtitles first, then auto-generated ones. Returns the
/// path of the written `.vtt`, or `None` when the platform has no captions
/// in the requested language. Unavailability is not an error here; the
/// caller decides whether to fall back to local transcription.
pub async fn download_captions_vtt(
    url: &str,
    lang: &str,
    workdir: impl AsRef<Path>,
) -> MediaResult<Option<PathBuf>> {
    let workdir = workdir.as_ref();
    which::which("yt-dlp").map_err(|_| MediaError::YtDlpNotFound)?;

    let template = workdir.join("captions.%(ext)s");
    let template_str = template.to_string_lossy();

    let output = Command::new("yt-dlp")
        .args([
            "--skip-download",
            "--no-playlist",
            "--write-subs",
            "--write-auto-subs",
            "--sub-langs",
            lang,
            "--sub-format",
            "vtt",
            "--convert-subs",
            "vtt",
            "-o",
            &template_str,
            url,
        ])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        debug!("yt-dlp subtitle stderr: {}", stderr);
        return Err(MediaError::download_failed(format!(
            "yt-dlp subtitle fetch failed: {}",
            stderr.lines().last().unwrap_or("Unknown error")
        )));
    }

    // yt-dlp writes captions.<lang>.vtt; pick the first vtt it produced.
    let mut entries = tokio::fs::read_dir(workdir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "vtt") {
            info!(path = %path.display(), "Fetched platform captions");
            return Ok(Some(path));
        }
    }

    info!(url = %url, lang = %lang, "No platform captions available");
    Ok(None)
}

/// Check if a URL is a supported video platform.
pub fn is_supported_url(url: &str) -> bool {
    let supported_domains = [
        "youtube.com",
        "youtu.be",
        "vimeo.com",
        "twitter.com",
        "x.com",
        "twitch.tv",
        "tiktok.com",
    ];

    supported_domains.iter().any(|domain| url.contains(domain))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_supported_url() {
        assert!(is_supported_url("https://youtube.com/watch?v=abc"));
        assert!(is_supported_url("https://youtu.be/abc"));
        assert!(is_supported_url("https://vimeo.com/123"));
        assert!(!is_supported_url("https://example.com/video"));
    }
}
