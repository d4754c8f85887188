//! Caption cues with karaoke-style per-word timing.

use serde::{Deserialize, Serialize};

use crate::timing::WordTiming;

/// A displayable caption line grouping consecutive word timings.
///
/// Invariants: `start` equals the first word's start, `end` equals the last
/// word's end, and consecutive cues never overlap. Each word keeps its own
/// start/end for per-word highlight rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionCue {
    pub start: f64,
    pub end: f64,
    pub words: Vec<WordTiming>,
}

impl CaptionCue {
    pub fn from_words(words: Vec<WordTiming>) -> Option<Self> {
        let first = words.first()?;
        let last = words.last()?;
        Some(Self {
            start: first.start,
            end: last.end,
            words,
        })
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Readability bounds for a single cue.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CueLimits {
    /// Maximum cue duration in seconds before a forced split
    pub max_duration_s: f64,
    /// Maximum word count before a forced split
    pub max_words: usize,
}

impl Default for CueLimits {
    fn default() -> Self {
        Self {
            max_duration_s: 5.0,
            max_words: 7,
        }
    }
}

/// Group word timings into ordered, non-overlapping caption cues.
///
/// A new cue starts when the silence gap since the previous word's end
/// exceeds `min_gap_s`, or when adding the word would push the current cue
/// past the `limits`. Every input word lands in exactly one cue.
pub fn group_words_into_cues(
    words: &[WordTiming],
    min_gap_s: f64,
    limits: CueLimits,
) -> Vec<CaptionCue> {
    let mut cues = Vec::new();
    let mut current: Vec<WordTiming> = Vec::new();
    let mut last_end: Option<f64> = None;

    for word in words {
        let gap_split = last_end.is_some_and(|end| word.start - end > min_gap_s);
        let bound_split = !current.is_empty()
            && (current.len() >= limits.max_words
                || word.end - current[0].start > limits.max_duration_s);

        if (gap_split || bound_split) && !current.is_empty() {
            // Sanitized words may still overlap within the tolerance; a
            // forced split between such a pair must not carry the overlap
            // across the cue boundary.
            if let Some(last) = current.last_mut() {
                if last.end > word.start {
                    last.end = word.start.max(last.start);
                }
            }
            if let Some(cue) = CaptionCue::from_words(std::mem::take(&mut current)) {
                cues.push(cue);
            }
        }

        current.push(word.clone());
        last_end = Some(word.end);
    }

    if let Some(cue) = CaptionCue::from_words(current) {
        cues.push(cue);
    }

    cues
}
