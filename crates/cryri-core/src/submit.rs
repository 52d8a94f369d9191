use crate::describe::create_job_description;
use crate::snapshot::create_run_copy;
use crate::CoreError;
use cryri_backend::{JobRequest, SubmitBackend, SubmitReceipt};
use cryri_schema::{CryConfig, VarSource};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A fully prepared submission that has not touched the filesystem.
#[derive(Debug, Clone)]
pub struct PlannedJob {
    pub config: CryConfig,
    pub request: JobRequest,
}

/// Result of a completed submission.
#[derive(Debug)]
pub struct SubmitOutcome {
    pub config: CryConfig,
    pub description: String,
    pub run_copy: Option<PathBuf>,
    pub receipt: SubmitReceipt,
}

/// Normalize and describe without snapshotting or contacting any backend.
pub fn plan_job(cfg: &CryConfig, vars: &dyn VarSource) -> Result<PlannedJob, CoreError> {
    let config = cfg.normalized(vars)?;
    let description = create_job_description(&config, vars);
    let request = JobRequest {
        description,
        container: config.container.clone(),
        cloud: config.cloud.clone(),
        run_copy: None,
    };
    Ok(PlannedJob { config, request })
}

/// Run the whole pipeline: normalize, describe, snapshot when
/// `container.run_from_copy` is set, then hand the request to `backend`.
pub fn submit_job(
    cfg: &CryConfig,
    vars: &dyn VarSource,
    backend: &dyn SubmitBackend,
) -> Result<SubmitOutcome, CoreError> {
    let mut config = cfg.normalized(vars)?;
    // Derived before any rebase, so run_from_copy does not change the name
    // a job shows up under.
    let description = create_job_description(&config, vars);

    let run_copy = if config.container.run_from_copy {
        let dest = create_run_copy(&config.container)?;
        config.container.work_dir = rebased_work_dir(&config.container.work_dir, &dest);
        info!("running from copy: {}", config.container.work_dir);
        Some(dest)
    } else {
        None
    };

    let request = JobRequest {
        description: description.clone(),
        container: config.container.clone(),
        cloud: config.cloud.clone(),
        run_copy: run_copy
            .as_ref()
            .map(|path| path.to_string_lossy().into_owned()),
    };

    debug!("submitting via {} backend", backend.name());
    let receipt = backend.submit(&request)?;

    Ok(SubmitOutcome {
        config,
        description,
        run_copy,
        receipt,
    })
}

/// The snapshot holds the parent of `work_dir`, so the rebased path is
/// `<dest>/<basename of work_dir>`.
fn rebased_work_dir(work_dir: &str, dest: &Path) -> String {
    match Path::new(work_dir).file_name() {
        Some(name) => dest.join(name).to_string_lossy().into_owned(),
        None => dest.to_string_lossy().into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cryri_backend::MockBackend;
    use cryri_schema::{parse_config_str, StaticVars};
    use std::fs;

    fn fixture(root: &Path) -> (CryConfig, StaticVars) {
        let proj = root.join("proj");
        fs::create_dir_all(proj.join("train")).unwrap();
        fs::write(proj.join("train/main.py"), "print('hi')\n").unwrap();
        fs::write(proj.join("train/cache.pyc"), b"\x00").unwrap();
        fs::write(proj.join("notes.md"), "notes\n").unwrap();
        // Sanitization expects the copy root to exist already.
        fs::create_dir(root.join("copies")).unwrap();

        let cfg = parse_config_str(
            r#"
container:
  work_dir: $PROJ/train
  cry_copy_dir: $COPIES
  exclude_from_copy:
    - "*.pyc"
  run_from_copy: true
cloud:
  description: sweep
"#,
        )
        .unwrap();
        let vars = StaticVars::default()
            .with("PROJ", proj.to_str().unwrap())
            .with("COPIES", root.join("copies").to_str().unwrap());
        (cfg, vars)
    }

    #[test]
    fn plan_makes_no_filesystem_changes() {
        let dir = tempfile::tempdir().unwrap();
        let (cfg, vars) = fixture(dir.path());

        let planned = plan_job(&cfg, &vars).unwrap();
        assert_eq!(planned.request.description, "sweep");
        assert!(planned.request.run_copy.is_none());
        assert_eq!(fs::read_dir(dir.path().join("copies")).unwrap().count(), 0);
    }

    #[test]
    fn submit_rebases_work_dir_into_the_copy() {
        let dir = tempfile::tempdir().unwrap();
        let (cfg, vars) = fixture(dir.path());
        let backend = MockBackend::new();

        let outcome = submit_job(&cfg, &vars, &backend).unwrap();
        let run_copy = outcome.run_copy.expect("snapshot created");

        assert_eq!(
            run_copy.parent().unwrap(),
            dir.path().join("copies").canonicalize().unwrap()
        );
        assert!(run_copy.join("train/main.py").exists());
        assert!(!run_copy.join("train/cache.pyc").exists());
        assert_eq!(
            outcome.config.container.work_dir,
            run_copy.join("train").to_string_lossy()
        );

        let seen = backend.submitted();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].container.work_dir, outcome.config.container.work_dir);
        assert_eq!(
            seen[0].run_copy.as_deref(),
            run_copy.to_str()
        );
    }

    #[test]
    fn submit_without_run_from_copy_keeps_work_dir() {
        let dir = tempfile::tempdir().unwrap();
        let (mut cfg, vars) = fixture(dir.path());
        cfg.container.run_from_copy = false;
        let backend = MockBackend::new();

        let outcome = submit_job(&cfg, &vars, &backend).unwrap();
        assert!(outcome.run_copy.is_none());
        assert_eq!(fs::read_dir(dir.path().join("copies")).unwrap().count(), 0);
        assert!(outcome.config.container.work_dir.ends_with("proj/train"));
    }

    #[test]
    fn description_is_stable_across_rebase() {
        let dir = tempfile::tempdir().unwrap();
        let (mut cfg, vars) = fixture(dir.path());
        cfg.cloud.description = None;
        let backend = MockBackend::new();

        let outcome = submit_job(&cfg, &vars, &backend).unwrap();
        // Derived from the original work_dir, not the copy.
        let expected = dir
            .path()
            .canonicalize()
            .unwrap()
            .join("proj/train")
            .to_string_lossy()
            .replace('/', "-");
        assert_eq!(outcome.description, expected);
    }
}
