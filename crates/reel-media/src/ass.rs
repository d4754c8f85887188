//! ASS karaoke caption generation.
//!
//! Each cue becomes one Dialogue event; per-word `\k` tags carry the
//! highlight timing in centiseconds. A word highlights until the next
//! word starts, and the last word of a cue holds until a small pad after
//! its end, clamped so it never runs into the next cue.

use reel_models::{CaptionCue, WordTiming};

/// Visual style knobs rendered into the ASS header.
#[derive(Debug, Clone)]
pub struct AssStyle {
    pub font_family: String,
    pub font_size: u32,
    pub outline: u32,
    pub margin_v: u32,
}

impl Default for AssStyle {
    fn default() -> Self {
        Self {
            font_family: "Montserrat".to_string(),
            font_size: 64,
            outline: 4,
            margin_v: 120,
        }
    }
}

/// Format seconds as an ASS timestamp (`H:MM:SS.mmm`).
pub fn format_ass_timestamp(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    let hours = (seconds / 3600.0) as u64;
    let minutes = ((seconds % 3600.0) / 60.0) as u64;
    let secs = seconds % 60.0;
    format!("{}:{:02}:{:06.3}", hours, minutes, secs)
}

/// Highlight duration for one word as a `\k` centisecond count.
///
/// Never zero: a zero-length tag makes libass skip the highlight.
fn k_tag_centiseconds(start: f64, end: f64) -> u32 {
    let duration = (end - start).max(0.01);
    ((duration * 100.0).round() as u32).max(1)
}

/// Render the karaoke text of one cue and return it with the cue's final
/// display end.
///
/// `pad_end_s` extends the last word's highlight past its spoken end so
/// the line does not vanish on the final syllable; `next_cue_start` clamps
/// that pad so consecutive cues never overlap on screen.
pub fn render_dialogue(
    words: &[WordTiming],
    pad_end_s: f64,
    next_cue_start: Option<f64>,
) -> (String, f64) {
    let mut tokens: Vec<String> = Vec::new();
    let mut final_end = words.last().map(|w| w.end).unwrap_or(0.0);

    for (index, word) in words.iter().enumerate() {
        let token = word.word.trim();
        if token.is_empty() {
            continue;
        }

        let duration_cs = if index + 1 < words.len() {
            // Highlight runs until the next word begins.
            k_tag_centiseconds(word.start, words[index + 1].start)
        } else {
            let mut target_end = word.end + pad_end_s;
            if let Some(next_start) = next_cue_start {
                if next_start < word.end {
                    target_end = word.end;
                } else {
                    target_end = target_end.min(next_start);
                }
            }
            final_end = target_end;
            k_tag_centiseconds(word.start, target_end)
        };

        tokens.push(format!("{{\\k{}}}{}", duration_cs, token));
    }

    (tokens.join(" "), final_end)
}

/// Render a full ASS document from grouped cues.
pub fn write_ass(cues: &[CaptionCue], style: &AssStyle, pad_end_s: f64) -> String {
    let mut dialogue_lines: Vec<String> = Vec::new();

    for (idx, cue) in cues.iter().enumerate() {
        if cue.words.is_empty() {
            continue;
        }
        let next_cue_start = cues.get(idx + 1).map(|next| next.start);
        let (text, final_end) = render_dialogue(&cue.words, pad_end_s, next_cue_start);
        if text.is_empty() {
            continue;
        }
        dialogue_lines.push(format!(
            "Dialogue: 0,{},{},Karo,,0,0,{},,{}",
            format_ass_timestamp(cue.start),
            format_ass_timestamp(final_end),
            style.margin_v,
            text
        ));
    }

    format!(
        "[Script Info]\n\
         Title: AutoReel captions\n\
         ScriptType: v4.00+\n\
         PlayResX: 1080\n\
         PlayResY: 1920\n\
         WrapStyle: 0\n\
         ScaledBorderAndShadow: yes\n\
         \n\
         [V4+ Styles]\n\
         Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding\n\
         Style: Karo,{font},{size},&H00FFFFFF,&H0000D7FF,&H00101010,&H64000000,-1,0,0,0,100,100,0,0,1,{outline},0,2,60,60,{margin_v},1\n\
         \n\
         [Events]\n\
         Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text\n\
         {dialogue}\n",
        font = style.font_family,
        size = style.font_size,
        outline = style.outline,
        margin_v = style.margin_v,
        dialogue = dialogue_lines.join("\n"),
    )
}
