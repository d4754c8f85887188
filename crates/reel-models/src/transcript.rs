//! Normalized transcripts.
//!
//! Platform captions and local transcription both reduce to the same
//! segment shape; downstream stages never branch on where a transcript
//! came from.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One transcript segment: a span of text with start/end in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl TranscriptSegment {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }
}

/// Which path produced the transcript.
///
/// An explicit tag rather than implicit control flow so the chosen path is
/// observable in job logs and testable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranscriptSource {
    /// Platform-supplied captions (cheap, authoritative when available)
    PlatformCaptions,
    /// Local speech-to-text fallback
    LocalTranscription,
}

impl TranscriptSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TranscriptSource::PlatformCaptions => "platform_captions",
            TranscriptSource::LocalTranscription => "local_transcription",
        }
    }
}

impl fmt::Display for TranscriptSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Normalize raw segments into the canonical transcript shape.
///
/// Drops empty text, clamps `end >= start`, and sorts by start so the
/// monotonicity invariant holds regardless of which path produced them.
pub fn normalize_segments(segments: Vec<TranscriptSegment>) -> Vec<TranscriptSegment> {
    let mut out: Vec<TranscriptSegment> = segments
        .into_iter()
        .filter_map(|mut seg| {
            seg.text = seg.text.trim().to_string();
            if seg.text.is_empty() {
                return None;
            }
            if !seg.start.is_finite() || seg.start < 0.0 {
                seg.start = 0.0;
            }
            if !seg.end.is_finite() || seg.end < seg.start {
                seg.end = seg.start;
            }
            Some(seg)
        })
        .collect();
    out.sort_by(|a, b| a.start.total_cmp(&b.start));
    out
}
