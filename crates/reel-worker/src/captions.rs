//! Caption stage: word timings to an ASS document.

use reel_media::write_ass;
use reel_models::{group_words_into_cues, CaptionCue, WordTiming};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};

/// Group sanitized word timings into cues.
pub fn build_cues(words: &[WordTiming], config: &PipelineConfig) -> PipelineResult<Vec<CaptionCue>> {
    if words.is_empty() {
        return Err(PipelineError::Caption(
            "no word timings to caption".to_string(),
        ));
    }
    Ok(group_words_into_cues(
        words,
        config.min_gap_s,
        config.cue_limits,
    ))
}

/// Render the full ASS caption document for a job.
pub fn build_ass_document(
    words: &[WordTiming],
    config: &PipelineConfig,
) -> PipelineResult<String> {
    let cues = build_cues(words, config)?;
    Ok(write_ass(&cues, &config.ass_style, config.pad_end_s))
}
