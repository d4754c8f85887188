//! Media tooling for the AutoReel pipeline.
//!
//! Thin async wrappers around the external tools the pipeline drives:
//! yt-dlp for downloads and platform captions, ffmpeg/ffprobe for audio
//! extraction, probing and rendering, whisper/whisperx for transcription
//! and word alignment. Tool stderr is captured and surfaced verbatim in
//! errors so job logs carry the real diagnostic.

pub mod asr;
pub mod ass;
pub mod audio;
pub mod command;
pub mod download;
pub mod encoder;
pub mod error;
pub mod probe;
pub mod render;
pub mod vtt;

pub use ass::{format_ass_timestamp, render_dialogue, write_ass, AssStyle};
pub use command::{check_ffmpeg, check_ffprobe, check_ytdlp, FfmpegCommand, FfmpegRunner};
pub use encoder::{detect_encoder, encoder_args};
pub use error::{MediaError, MediaResult};
pub use render::{build_vertical_filter, render_vertical};
pub use vtt::parse_vtt;
