//! Word timing post-processing for the align stage.

use tracing::warn;

use reel_models::{
    sanitize_word_timings, RawWordTiming, TranscriptSegment, UnplacedWordPolicy, WordTiming,
};

/// Turn raw aligner output into sanitized word timings.
///
/// Unplaced words are handled per policy, then ordering and overlap
/// invariants are enforced.
pub fn finalize_word_timings(
    raw: Vec<RawWordTiming>,
    segments: &[TranscriptSegment],
    policy: UnplacedWordPolicy,
    overlap_tolerance_s: f64,
) -> Vec<WordTiming> {
    let words = match policy {
        UnplacedWordPolicy::Drop => drop_unplaced(raw),
        UnplacedWordPolicy::Interpolate => interpolate_unplaced(raw, segments),
    };
    sanitize_word_timings(words, overlap_tolerance_s)
}

fn drop_unplaced(raw: Vec<RawWordTiming>) -> Vec<WordTiming> {
    let total = raw.len();
    let placed: Vec<WordTiming> = raw
        .into_iter()
        .filter_map(|w| match (w.start, w.end) {
            (Some(start), Some(end)) => Some(WordTiming::new(w.word, start, end)),
            _ => None,
        })
        .collect();
    if placed.len() < total {
        warn!(
            dropped = total - placed.len(),
            "Dropped words without alignment timings"
        );
    }
    placed
}

/// Spread each run of unplaced words evenly across the gap between its
/// placed neighbors.
///
/// Runs with no placed neighbor on one side are bounded by the transcript's
/// overall span; if nothing at all is placed, every word is dropped.
fn interpolate_unplaced(
    raw: Vec<RawWordTiming>,
    segments: &[TranscriptSegment],
) -> Vec<WordTiming> {
    if !raw.iter().any(RawWordTiming::is_placed) {
        if !raw.is_empty() {
            warn!(
                words = raw.len(),
                "Alignment placed no words at all, dropping them"
            );
        }
        return Vec::new();
    }

    let transcript_start = segments.first().map(|s| s.start).unwrap_or(0.0);
    let transcript_end = segments
        .last()
        .map(|s| s.end)
        .unwrap_or(transcript_start);

    let mut out: Vec<WordTiming> = Vec::with_capacity(raw.len());
    let mut i = 0;

    while i < raw.len() {
        if let (Some(start), Some(end)) = (raw[i].start, raw[i].end) {
            out.push(WordTiming::new(raw[i].word.clone(), start, end));
            i += 1;
            continue;
        }

        // Run of consecutive unplaced words.
        let run_start = i;
        while i < raw.len() && !raw[i].is_placed() {
            i += 1;
        }
        let run = &raw[run_start..i];

        let left = out.last().map(|w| w.end).unwrap_or(transcript_start);
        let right = raw[i..]
            .iter()
            .find_map(|w| w.start)
            .unwrap_or(transcript_end)
            .max(left);

        let slot = (right - left) / run.len() as f64;
        for (offset, word) in run.iter().enumerate() {
            let start = left + slot * offset as f64;
            out.push(WordTiming::new(word.word.clone(), start, start + slot));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segments() -> Vec<TranscriptSegment> {
        vec![TranscriptSegment::new(0.0, 4.0, "hello there general kenobi")]
    }

    #[test]
    fn test_drop_policy_removes_unplaced() {
        let raw = vec![
            RawWordTiming::placed("hello", 0.0, 0.4),
            RawWordTiming::unplaced("um"),
            RawWordTiming::placed("there", 1.0, 1.4),
        ];
        let words = finalize_word_timings(raw, &segments(), UnplacedWordPolicy::Drop, 0.05);
        assert_eq!(words.len(), 2);
        assert_eq!(words[0].word, "hello");
        assert_eq!(words[1].word, "there");
    }

    #[test]
    fn test_interpolate_fills_gap_between_neighbors() {
        let raw = vec![
            RawWordTiming::placed("hello", 0.0, 1.0),
            RawWordTiming::unplaced("um"),
            RawWordTiming::placed("there", 2.0, 2.4),
        ];
        let words =
            finalize_word_timings(raw, &segments(), UnplacedWordPolicy::Interpolate, 0.05);
        assert_eq!(words.len(), 3);
        assert!((words[1].start - 1.0).abs() < 1e-9);
        assert!((words[1].end - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_interpolate_splits_run_evenly() {
        let raw = vec![
            RawWordTiming::placed("a", 0.0, 1.0),
            RawWordTiming::unplaced("b"),
            RawWordTiming::unplaced("c"),
            RawWordTiming::placed("d", 3.0, 3.5),
        ];
        let words =
            finalize_word_timings(raw, &segments(), UnplacedWordPolicy::Interpolate, 0.05);
        assert_eq!(words.len(), 4);
        assert!((words[1].start - 1.0).abs() < 1e-9);
        assert!((words[1].end - 2.0).abs() < 1e-9);
        assert!((words[2].start - 2.0).abs() < 1e-9);
        assert!((words[2].end - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_interpolate_leading_run_bounded_by_transcript_start() {
        let raw = vec![
            RawWordTiming::unplaced("first"),
            RawWordTiming::placed("second", 2.0, 2.5),
        ];
        let words =
            finalize_word_timings(raw, &segments(), UnplacedWordPolicy::Interpolate, 0.05);
        assert_eq!(words.len(), 2);
        assert!((words[0].start - 0.0).abs() < 1e-9);
        assert!((words[0].end - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_nothing_placed_drops_all() {
        let raw = vec![RawWordTiming::unplaced("a"), RawWordTiming::unplaced("b")];
        let words =
            finalize_word_timings(raw, &segments(), UnplacedWordPolicy::Interpolate, 0.05);
        assert!(words.is_empty());
    }

    #[test]
    fn test_result_is_sanitized() {
        // Overlapping placed words get clipped by sanitation.
        let raw = vec![
            RawWordTiming::placed("fast", 0.0, 0.9),
            RawWordTiming::placed("talk", 0.4, 1.0),
        ];
        let words = finalize_word_timings(raw, &segments(), UnplacedWordPolicy::Drop, 0.05);
        assert!((words[0].end - 0.4).abs() < 1e-9);
    }
}
