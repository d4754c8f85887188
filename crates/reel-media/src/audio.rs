//! Audio extraction for ASR.

use std::path::Path;
use tracing::info;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Extract the audio track without re-encoding.
pub async fn extract_audio(video: impl AsRef<Path>, m4a: impl AsRef<Path>) -> MediaResult<()> {
    let video = video.as_ref();
    if !video.exists() {
        return Err(MediaError::FileNotFound(video.to_path_buf()));
    }

    let cmd = FfmpegCommand::new(video, m4a.as_ref())
        .no_video()
        .audio_codec("copy");
    FfmpegRunner::new().run(&cmd).await?;
    info!(audio = %m4a.as_ref().display(), "Extracted audio track");
    Ok(())
}

/// Convert audio to mono wav at the given sample rate, the shape speech
/// models expect.
pub async fn convert_to_wav(
    audio: impl AsRef<Path>,
    wav: impl AsRef<Path>,
    sample_rate: u32,
) -> MediaResult<()> {
    let audio = audio.as_ref();
    if !audio.exists() {
        return Err(MediaError::FileNotFound(audio.to_path_buf()));
    }

    let cmd = FfmpegCommand::new(audio, wav.as_ref())
        .mono()
        .sample_rate(sample_rate);
    FfmpegRunner::new().run(&cmd).await?;
    info!(wav = %wav.as_ref().display(), sample_rate, "Converted audio to wav");
    Ok(())
}
