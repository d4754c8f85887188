//! Video metadata and encoder selection.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Minimal metadata the downloader reports for a source video.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VideoMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Duration in seconds, when the platform reports one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

/// Which encoder path rendered the output.
///
/// Selection happens at run time (hardware probe, software fallback); the
/// chosen path is tagged in the job log rather than hidden in control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncoderPath {
    /// Hardware-accelerated encoder (h264_nvenc)
    Hardware,
    /// Software encoder (libx264)
    Software,
}

impl EncoderPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            EncoderPath::Hardware => "hardware",
            EncoderPath::Software => "software",
        }
    }

    /// FFmpeg codec name for this path.
    pub fn codec(&self) -> &'static str {
        match self {
            EncoderPath::Hardware => "h264_nvenc",
            EncoderPath::Software => "libx264",
        }
    }
}

impl fmt::Display for EncoderPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
