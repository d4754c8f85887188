//! Shared data models for the AutoReel pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Jobs, pipeline stages and job status
//! - Normalized transcript segments and their source tag
//! - Word timings and the sanitation rules they obey
//! - Caption cues and the grouping algorithm that builds them
//! - Video metadata and encoder path selection

pub mod caption;
pub mod job;
pub mod timing;
pub mod transcript;
pub mod utils;
pub mod video;

// Re-export common types
pub use caption::{group_words_into_cues, CaptionCue, CueLimits};
pub use job::{JobId, JobRecord, JobStatus, LogLine, Stage};
pub use timing::{sanitize_word_timings, RawWordTiming, UnplacedWordPolicy, WordTiming};
pub use transcript::{normalize_segments, TranscriptSegment, TranscriptSource};
pub use utils::{extract_youtube_id, YoutubeIdError};
pub use video::{EncoderPath, VideoMetadata};
