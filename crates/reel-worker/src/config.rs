//! Pipeline configuration.

use std::path::PathBuf;

use reel_media::AssStyle;
use reel_models::{CueLimits, UnplacedWordPolicy};

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Root directory for all artifacts
    pub data_dir: PathBuf,
    /// Maximum jobs in flight at once
    pub max_concurrency: usize,
    /// Re-run stages even when their artifacts exist
    pub force: bool,
    /// Preferred caption/transcription language
    pub language: String,
    /// Whisper model name for the local transcription fallback
    pub whisper_model: String,
    /// Sample rate for extracted ASR audio
    pub sample_rate: u32,
    /// Seconds the last word of a cue stays highlighted past its end
    pub pad_end_s: f64,
    /// Silence gap that starts a new caption cue
    pub min_gap_s: f64,
    /// Readability bounds for a single cue
    pub cue_limits: CueLimits,
    /// Word overlap beyond this is clipped during sanitation
    pub overlap_tolerance_s: f64,
    /// What to do with words the aligner could not place
    pub unplaced_word_policy: UnplacedWordPolicy,
    /// Timeout for platform caption fetches, seconds
    pub caption_timeout_secs: u64,
    /// Caption visual style
    pub ass_style: AssStyle,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            max_concurrency: 2,
            force: false,
            language: "en".to_string(),
            whisper_model: "small".to_string(),
            sample_rate: 16000,
            pad_end_s: 0.04,
            min_gap_s: 0.3,
            cue_limits: CueLimits::default(),
            overlap_tolerance_s: 0.05,
            unplaced_word_policy: UnplacedWordPolicy::default(),
            caption_timeout_secs: 20,
            ass_style: AssStyle::default(),
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            data_dir: std::env::var("AUTOREEL_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            max_concurrency: env_parse("AUTOREEL_MAX_CONCURRENCY", defaults.max_concurrency),
            force: std::env::var("AUTOREEL_FORCE")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(defaults.force),
            language: std::env::var("AUTOREEL_LANG").unwrap_or(defaults.language),
            whisper_model: std::env::var("AUTOREEL_WHISPER_MODEL")
                .unwrap_or(defaults.whisper_model),
            sample_rate: env_parse("AUTOREEL_SAMPLE_RATE", defaults.sample_rate),
            pad_end_s: env_parse("AUTOREEL_PAD_END_S", defaults.pad_end_s),
            min_gap_s: env_parse("AUTOREEL_MIN_GAP_S", defaults.min_gap_s),
            cue_limits: CueLimits {
                max_duration_s: env_parse(
                    "AUTOREEL_MAX_CUE_DURATION_S",
                    defaults.cue_limits.max_duration_s,
                ),
                max_words: env_parse("AUTOREEL_MAX_CUE_WORDS", defaults.cue_limits.max_words),
            },
            overlap_tolerance_s: env_parse(
                "AUTOREEL_OVERLAP_TOLERANCE_S",
                defaults.overlap_tolerance_s,
            ),
            unplaced_word_policy: std::env::var("AUTOREEL_UNPLACED_WORD_POLICY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.unplaced_word_policy),
            caption_timeout_secs: env_parse(
                "AUTOREEL_CAPTION_TIMEOUT_SECS",
                defaults.caption_timeout_secs,
            ),
            ass_style: AssStyle {
                font_family: std::env::var("AUTOREEL_FONT_FAMILY")
                    .unwrap_or(defaults.ass_style.font_family),
                font_size: env_parse("AUTOREEL_FONT_SIZE", defaults.ass_style.font_size),
                outline: env_parse("AUTOREEL_OUTLINE", defaults.ass_style.outline),
                margin_v: env_parse("AUTOREEL_MARGIN_V", defaults.ass_style.margin_v),
            },
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.max_concurrency, 2);
        assert!(!config.force);
        assert!((config.pad_end_s - 0.04).abs() < 1e-9);
        assert!((config.min_gap_s - 0.3).abs() < 1e-9);
        assert_eq!(config.cue_limits.max_words, 7);
        assert_eq!(config.sample_rate, 16000);
        assert_eq!(config.unplaced_word_policy, UnplacedWordPolicy::Interpolate);
    }
}
