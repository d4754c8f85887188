//! Batch pipeline worker for AutoReel.
//!
//! Orchestrates the fetch, transcript, align, caption and render stages
//! over a set of source URLs, with resumable artifacts, bounded
//! concurrency and per-job isolation.

pub mod align;
pub mod batch;
pub mod captions;
pub mod collab;
pub mod config;
pub mod error;
pub mod logging;
pub mod resolver;
pub mod runner;
pub mod status;

pub use batch::{BatchDriver, BatchReport};
pub use collab::{Aligner, CaptionProvider, Collaborators, Downloader, Encoder, Transcriber};
pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult};
pub use runner::JobRunner;
pub use status::{JobSnapshot, StatusRegistry};
