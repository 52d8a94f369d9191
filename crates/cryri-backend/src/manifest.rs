use crate::backend::{JobRequest, SubmitBackend, SubmitReceipt};
use crate::{fsync_dir, BackendError};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Writes each submission as pretty JSON for an external dispatcher to pick
/// up. The write is atomic: temp file in the target directory, then rename,
/// so a reader never sees a half-written manifest.
pub struct ManifestBackend {
    path: PathBuf,
}

/// On-disk shape: the hand-off timestamp followed by the request fields.
#[derive(Serialize)]
struct ManifestDocument<'a> {
    submitted_at: &'a str,
    #[serde(flatten)]
    job: &'a JobRequest,
}

impl ManifestBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SubmitBackend for ManifestBackend {
    fn name(&self) -> &str {
        "manifest"
    }

    fn submit(&self, request: &JobRequest) -> Result<SubmitReceipt, BackendError> {
        let submitted_at = chrono::Utc::now().to_rfc3339();
        let document = ManifestDocument {
            submitted_at: &submitted_at,
            job: request,
        };
        let json = serde_json::to_string_pretty(&document)?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| BackendError::Io(e.error))?;
        fsync_dir(dir)?;

        debug!("wrote job manifest to {}", self.path.display());

        Ok(SubmitReceipt {
            backend: self.name().to_owned(),
            submitted_at,
            location: Some(self.path.to_string_lossy().into_owned()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cryri_schema::{CloudSection, ContainerConfig};

    fn sample_request() -> JobRequest {
        JobRequest {
            description: "nightly sweep #perception".to_owned(),
            container: ContainerConfig {
                image: Some("base:latest".to_owned()),
                command: Some("python train.py".to_owned()),
                environment: None,
                work_dir: "/srv/proj/train".to_owned(),
                cry_copy_dir: None,
                exclude_from_copy: Vec::new(),
                run_from_copy: false,
            },
            cloud: CloudSection::default(),
            run_copy: Some("/srv/copies/run_2024_06_01_0910_ab12cd".to_owned()),
        }
    }

    #[test]
    fn writes_request_with_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("job.json");
        let backend = ManifestBackend::new(&out);

        let receipt = backend.submit(&sample_request()).unwrap();
        assert_eq!(receipt.backend, "manifest");
        assert_eq!(receipt.location.as_deref(), out.to_str());

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(written["description"], "nightly sweep #perception");
        assert_eq!(written["container"]["work_dir"], "/srv/proj/train");
        assert_eq!(
            written["run_copy"],
            "/srv/copies/run_2024_06_01_0910_ab12cd"
        );
        assert!(written["submitted_at"].is_string());
    }

    #[test]
    fn resubmit_replaces_the_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("job.json");
        let backend = ManifestBackend::new(&out);

        backend.submit(&sample_request()).unwrap();
        let mut second = sample_request();
        second.description = "second".to_owned();
        backend.submit(&second).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(written["description"], "second");
    }

    #[test]
    fn creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("deep/nested/job.json");
        let backend = ManifestBackend::new(&out);

        backend.submit(&sample_request()).unwrap();
        assert!(out.exists());
    }

    #[test]
    fn manifest_round_trips_through_serde() {
        let request = sample_request();
        let json = serde_json::to_string(&request).unwrap();
        let back: JobRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, request);
    }
}
