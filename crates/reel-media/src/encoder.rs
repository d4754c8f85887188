//! Encoder selection with hardware probe and software fallback.

use std::path::Path;
use tracing::{info, warn};

use reel_models::EncoderPath;

use crate::command::{FfmpegCommand, FfmpegRunner};

/// Probe whether the hardware encoder actually works on this host.
///
/// A codec listed by `ffmpeg -encoders` can still fail at runtime (no GPU,
/// driver mismatch), so the probe is a tiny test encode of a synthetic
/// source. Returns the path the renderer should use.
pub async fn detect_encoder(workdir: impl AsRef<Path>) -> EncoderPath {
    let probe_output = workdir.as_ref().join("encoder-probe.mp4");

    let cmd = FfmpegCommand::lavfi("color=c=black:s=256x256:d=0.2", &probe_output)
        .video_codec(EncoderPath::Hardware.codec())
        .output_arg("-frames:v")
        .output_arg("5");

    let result = FfmpegRunner::new().with_timeout(30).run(&cmd).await;
    let _ = tokio::fs::remove_file(&probe_output).await;

    match result {
        Ok(()) => {
            info!(codec = EncoderPath::Hardware.codec(), "Hardware encoder available");
            EncoderPath::Hardware
        }
        Err(e) => {
            warn!(
                codec = EncoderPath::Hardware.codec(),
                error = %e,
                "Hardware encoder unavailable, using software path"
            );
            EncoderPath::Software
        }
    }
}

/// Quality/preset arguments for an encoder path.
///
/// nvenc rejects `-crf`; it takes `-cq` for constant quality.
pub fn encoder_args(path: EncoderPath) -> Vec<String> {
    match path {
        EncoderPath::Hardware => vec![
            "-c:v".to_string(),
            path.codec().to_string(),
            "-preset".to_string(),
            "p5".to_string(),
            "-cq".to_string(),
            "23".to_string(),
        ],
        EncoderPath::Software => vec![
            "-c:v".to_string(),
            path.codec().to_string(),
            "-preset".to_string(),
            "veryfast".to_string(),
            "-crf".to_string(),
            "23".to_string(),
        ],
    }
}
