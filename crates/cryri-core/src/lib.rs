//! Run preparation engine for cryri.
//!
//! Ties the schema layer to the submission backends: run naming
//! (`next_run_name`), workspace snapshots (`create_run_copy`), job
//! descriptions (`create_job_description`), and the submit pipeline
//! (`plan_job` / `submit_job`).

pub mod describe;
pub mod run_name;
pub mod snapshot;
pub mod submit;

pub use describe::create_job_description;
pub use run_name::{next_run_name, run_name_at};
pub use snapshot::create_run_copy;
pub use submit::{plan_job, submit_job, PlannedJob, SubmitOutcome};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("config error: {0}")]
    Config(#[from] cryri_schema::ConfigError),
    #[error("backend error: {0}")]
    Backend(#[from] cryri_backend::BackendError),
    #[error("container.cry_copy_dir is not set")]
    CopyDirUnset,
    #[error("invalid exclude pattern '{pattern}': {source}")]
    InvalidExcludePattern {
        pattern: String,
        source: glob::PatternError,
    },
    #[error("run directory already exists: {}", .0.display())]
    RunCollision(PathBuf),
    #[error("cry_copy_dir {} is inside the tree being snapshotted", .0.display())]
    SnapshotInsideSource(PathBuf),
    #[error("snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),
}
