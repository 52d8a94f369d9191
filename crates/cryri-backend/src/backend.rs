use crate::BackendError;
use cryri_schema::{CloudSection, ContainerConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Everything a backend needs to dispatch one job: the normalized container
/// config, cloud placement, the snapshot path (when one was made), and the
/// derived description.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobRequest {
    pub description: String,
    pub container: ContainerConfig,
    pub cloud: CloudSection,
    #[serde(default)]
    pub run_copy: Option<String>,
}

/// Proof of hand-off returned by a backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubmitReceipt {
    pub backend: String,
    /// RFC 3339 timestamp of the hand-off.
    pub submitted_at: String,
    /// Where the request ended up, for backends that write one somewhere.
    #[serde(default)]
    pub location: Option<String>,
}

pub trait SubmitBackend: Send + Sync {
    fn name(&self) -> &str;

    fn submit(&self, request: &JobRequest) -> Result<SubmitReceipt, BackendError>;
}

pub fn select_backend(
    name: &str,
    manifest_out: &Path,
) -> Result<Box<dyn SubmitBackend>, BackendError> {
    match name {
        "manifest" => Ok(Box::new(crate::manifest::ManifestBackend::new(
            manifest_out,
        ))),
        "mock" => Ok(Box::new(crate::mock::MockBackend::new())),
        other => Err(BackendError::UnknownBackend(other.to_owned())),
    }
}
