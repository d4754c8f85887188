//! Word-level timings produced by alignment.

use serde::{Deserialize, Serialize};

/// One aligned word with start/end in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordTiming {
    pub word: String,
    pub start: f64,
    pub end: f64,
}

impl WordTiming {
    pub fn new(word: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            word: word.into(),
            start,
            end,
        }
    }
}

/// An aligned word as reported by the alignment engine.
///
/// Engines sometimes fail to place a word; those arrive with `None`
/// timings and an unplaced-word policy decides their fate downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawWordTiming {
    pub word: String,
    pub start: Option<f64>,
    pub end: Option<f64>,
}

impl RawWordTiming {
    pub fn new(word: impl Into<String>, start: Option<f64>, end: Option<f64>) -> Self {
        Self {
            word: word.into(),
            start,
            end,
        }
    }

    pub fn placed(word: impl Into<String>, start: f64, end: f64) -> Self {
        Self::new(word, Some(start), Some(end))
    }

    pub fn unplaced(word: impl Into<String>) -> Self {
        Self::new(word, None, None)
    }

    pub fn is_placed(&self) -> bool {
        self.start.is_some() && self.end.is_some()
    }
}

/// What to do with words the alignment engine could not place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UnplacedWordPolicy {
    /// Drop the word and log a warning.
    Drop,
    /// Interpolate a timing bounded by the enclosing segment's start/end.
    #[default]
    Interpolate,
}

impl UnplacedWordPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnplacedWordPolicy::Drop => "drop",
            UnplacedWordPolicy::Interpolate => "interpolate",
        }
    }
}

impl std::str::FromStr for UnplacedWordPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "drop" => Ok(UnplacedWordPolicy::Drop),
            "interpolate" => Ok(UnplacedWordPolicy::Interpolate),
            other => Err(format!("unknown unplaced-word policy: {}", other)),
        }
    }
}

/// Enforce ordering and overlap invariants on aligned words.
///
/// Words stay in their input order (alignment never reorders); starts are
/// made non-decreasing and a word overlapping its successor by more than
/// `tolerance_s` is clipped to the successor's start. Words with empty text
/// are removed.
pub fn sanitize_word_timings(words: Vec<WordTiming>, tolerance_s: f64) -> Vec<WordTiming> {
    let mut out: Vec<WordTiming> = words
        .into_iter()
        .filter_map(|mut w| {
            w.word = w.word.trim().to_string();
            if w.word.is_empty() {
                return None;
            }
            if !w.start.is_finite() || w.start < 0.0 {
                w.start = 0.0;
            }
            if !w.end.is_finite() || w.end < w.start {
                w.end = w.start;
            }
            Some(w)
        })
        .collect();

    for i in 0..out.len() {
        if i > 0 && out[i].start < out[i - 1].start {
            out[i].start = out[i - 1].start;
            if out[i].end < out[i].start {
                out[i].end = out[i].start;
            }
        }
        if i + 1 < out.len() {
            let next_start = out[i + 1].start;
            if out[i].end > next_start + tolerance_s {
                out[i].end = next_start.max(out[i].start);
            }
        }
    }

    out
}
