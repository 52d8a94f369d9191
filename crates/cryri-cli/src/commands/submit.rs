use super::{json_pretty, load_config, spin_fail, spin_ok, spinner, EXIT_SUCCESS};
use cryri_backend::select_backend;
use cryri_core::{plan_job, submit_job};
use cryri_schema::ProcessEnv;
use std::path::Path;
use tracing::debug;

pub fn run(
    config_path: &Path,
    backend_name: &str,
    out: &Path,
    dry_run: bool,
    json: bool,
) -> Result<u8, String> {
    let cfg = load_config(config_path)?;
    let vars = ProcessEnv;

    if dry_run {
        let planned = plan_job(&cfg, &vars).map_err(|e| e.to_string())?;
        if json {
            println!("{}", json_pretty(&planned.request)?);
        } else {
            println!("description: {}", planned.request.description);
            println!("work_dir:    {}", planned.request.container.work_dir);
            println!("dry run, nothing submitted");
        }
        return Ok(EXIT_SUCCESS);
    }

    let backend = select_backend(backend_name, out).map_err(|e| e.to_string())?;
    debug!("submitting {} via {backend_name} backend", config_path.display());

    let pb = if json {
        None
    } else {
        Some(spinner("submitting job..."))
    };
    let outcome = match submit_job(&cfg, &vars, backend.as_ref()) {
        Ok(outcome) => {
            if let Some(ref pb) = pb {
                spin_ok(pb, "job submitted");
            }
            outcome
        }
        Err(e) => {
            if let Some(ref pb) = pb {
                spin_fail(pb, "submit failed");
            }
            return Err(e.to_string());
        }
    };

    if json {
        let payload = serde_json::json!({
            "description": outcome.description,
            "backend": outcome.receipt.backend,
            "submitted_at": outcome.receipt.submitted_at,
            "location": outcome.receipt.location,
            "run_copy": outcome.run_copy,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!(
            "submitted '{}' via {} backend",
            outcome.description, outcome.receipt.backend
        );
        if let Some(run_copy) = &outcome.run_copy {
            println!("run copy: {}", run_copy.display());
        }
        if let Some(location) = &outcome.receipt.location {
            println!("manifest: {location}");
        }
    }
    Ok(EXIT_SUCCESS)
}
