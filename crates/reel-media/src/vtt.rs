//! WebVTT caption parsing.
//!
//! Platform captions arrive as VTT; auto-generated tracks carry inline
//! word timing tags and rolling duplicate lines, both of which are
//! stripped so the result is a clean segment list.

use regex::Regex;
use std::sync::OnceLock;

use reel_models::{normalize_segments, TranscriptSegment};

use crate::error::{MediaError, MediaResult};

fn cue_timing_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(?:(\d+):)?(\d{2}):(\d{2})[.,](\d{3})\s+-->\s+(?:(\d+):)?(\d{2}):(\d{2})[.,](\d{3})",
        )
        .expect("valid cue timing regex")
    })
}

fn inline_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("valid tag regex"))
}

fn parse_timestamp(
    hours: Option<&str>,
    minutes: &str,
    seconds: &str,
    millis: &str,
) -> MediaResult<f64> {
    let parse = |s: &str| {
        s.parse::<f64>()
            .map_err(|_| MediaError::SubtitleParse(format!("bad timestamp component: {}", s)))
    };
    let h = match hours {
        Some(h) => parse(h)?,
        None => 0.0,
    };
    Ok(h * 3600.0 + parse(minutes)? * 60.0 + parse(seconds)? + parse(millis)? / 1000.0)
}

/// Parse a VTT document into normalized transcript segments.
pub fn parse_vtt(content: &str) -> MediaResult<Vec<TranscriptSegment>> {
    let timing_re = cue_timing_re();
    let tag_re = inline_tag_re();

    let mut segments: Vec<TranscriptSegment> = Vec::new();
    let mut lines = content.lines().peekable();

    while let Some(line) = lines.next() {
        let Some(caps) = timing_re.captures(line.trim()) else {
            continue;
        };

        let start = parse_timestamp(
            caps.get(1).map(|m| m.as_str()),
            &caps[2],
            &caps[3],
            &caps[4],
        )?;
        let end = parse_timestamp(
            caps.get(5).map(|m| m.as_str()),
            &caps[6],
            &caps[7],
            &caps[8],
        )?;

        let mut text_lines: Vec<String> = Vec::new();
        while let Some(next) = lines.peek() {
            let trimmed = next.trim();
            if trimmed.is_empty() || timing_re.is_match(trimmed) {
                break;
            }
            let cleaned = tag_re.replace_all(trimmed, "").trim().to_string();
            if !cleaned.is_empty() {
                text_lines.push(cleaned);
            }
            lines.next();
        }

        let text = text_lines.join(" ");
        if text.is_empty() {
            continue;
        }

        // Auto-generated tracks repeat the previous line as it scrolls;
        // fold those into the earlier cue instead of duplicating text.
        if let Some(prev) = segments.last_mut() {
            if prev.text == text {
                prev.end = prev.end.max(end);
                continue;
            }
        }

        segments.push(TranscriptSegment::new(start, end, text));
    }

    Ok(normalize_segments(segments))
}
