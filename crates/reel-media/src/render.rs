//! Vertical rendering with burned-in captions.

use std::path::Path;
use tracing::info;

use reel_models::EncoderPath;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::encoder::encoder_args;
use crate::error::{MediaError, MediaResult};

/// Center-crop framing for 1080x1920 vertical output.
const VERTICAL_CROP_FILTER: &str = "scale=-2:1920,crop=1080:1920";

/// Escape a path for use inside an ffmpeg filter argument.
///
/// The filter graph parser treats `\`, `:` and `'` specially, so each gets
/// a backslash escape before the whole value is quoted.
pub fn escape_filter_path(path: &Path) -> String {
    let raw = path.to_string_lossy();
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            ':' => escaped.push_str("\\:"),
            '\'' => escaped.push_str("\\'"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Build the video filter chain: vertical framing then subtitle burn.
pub fn build_vertical_filter(captions: &Path) -> String {
    format!(
        "{},subtitles='{}'",
        VERTICAL_CROP_FILTER,
        escape_filter_path(captions)
    )
}

/// Render the final vertical clip with captions burned in.
///
/// Audio is stream-copied; only video is re-encoded. The caller picks the
/// encoder path (and retries with the software path if hardware encoding
/// fails at runtime).
pub async fn render_vertical(
    input: impl AsRef<Path>,
    captions: impl AsRef<Path>,
    output: impl AsRef<Path>,
    encoder: EncoderPath,
) -> MediaResult<()> {
    let input = input.as_ref();
    let captions = captions.as_ref();

    if !input.exists() {
        return Err(MediaError::FileNotFound(input.to_path_buf()));
    }
    if !captions.exists() {
        return Err(MediaError::FileNotFound(captions.to_path_buf()));
    }

    let cmd = FfmpegCommand::new(input, output.as_ref())
        .video_filter(build_vertical_filter(captions))
        .output_args(encoder_args(encoder))
        .audio_codec("copy");

    FfmpegRunner::new().run(&cmd).await?;

    info!(
        output = %output.as_ref().display(),
        encoder = %encoder,
        "Rendered vertical clip"
    );
    Ok(())
}
