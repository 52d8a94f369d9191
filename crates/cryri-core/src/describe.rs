use cryri_schema::{resolve_path, CryConfig, VarSource};
use std::path::PathBuf;

/// Variable consulted for the team suffix.
const TEAM_NAME_VAR: &str = "TEAM_NAME";
/// Notebook home prefix stripped from derived descriptions.
const HOME_PREFIX: &str = "/home/jovyan/";

/// Build the human-readable description for a job.
///
/// The base is `cloud.description` when set, otherwise the resolved
/// `work_dir` with the notebook home prefix stripped and separators turned
/// into hyphens. A `TEAM_NAME` from `container.environment` (falling back to
/// the variable source) is appended as ` #<team>`. Never fails: a work dir
/// that cannot be resolved is used as written.
pub fn create_job_description(cfg: &CryConfig, vars: &dyn VarSource) -> String {
    let team = cfg
        .container
        .environment
        .as_ref()
        .and_then(|env| env.get(TEAM_NAME_VAR).cloned())
        .or_else(|| vars.get(TEAM_NAME_VAR));

    let description = match &cfg.cloud.description {
        Some(description) => description.clone(),
        None => {
            let resolved = resolve_path(&cfg.container.work_dir)
                .unwrap_or_else(|_| PathBuf::from(&cfg.container.work_dir));
            let text = resolved.to_string_lossy();
            text.strip_prefix(HOME_PREFIX)
                .unwrap_or(&text)
                .replace('/', "-")
        }
    };

    match team {
        Some(team) => format!("{description} #{team}"),
        None => description,
    }
}
