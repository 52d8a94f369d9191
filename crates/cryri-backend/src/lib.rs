//! Job submission backends for cryri.
//!
//! A [`SubmitBackend`] receives the fully prepared [`JobRequest`] (normalized
//! container config, cloud placement, snapshot path, description) and hands it
//! to whatever actually runs the job. The default `manifest` backend writes
//! the request as JSON for an external dispatcher; the `mock` backend records
//! requests in memory for tests.

pub mod backend;
pub mod manifest;
pub mod mock;

pub use backend::{select_backend, JobRequest, SubmitBackend, SubmitReceipt};
pub use manifest::ManifestBackend;
pub use mock::MockBackend;

use std::path::Path;
use thiserror::Error;

/// Fsync a directory so that a preceding `rename()` is durable. POSIX does
/// not guarantee rename durability without it on every filesystem.
pub(crate) fn fsync_dir(dir: &Path) -> Result<(), std::io::Error> {
    let f = std::fs::File::open(dir)?;
    f.sync_all()
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize job request: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("unknown backend: {0}")]
    UnknownBackend(String),
    #[error("submit failed: {0}")]
    SubmitFailed(String),
}
