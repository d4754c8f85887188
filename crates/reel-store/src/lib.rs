//! Filesystem artifact store for the AutoReel pipeline.
//!
//! Stage outputs are keyed by `(job_id, stage)` in a deterministic directory
//! layout, written to temporary paths and atomically published so an
//! artifact is either absent or complete. This is what makes batch re-runs
//! idempotent and failures resumable.

pub mod error;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use store::ArtifactStore;
