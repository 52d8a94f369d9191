use super::{json_pretty, load_config, spin_fail, spin_ok, spinner, EXIT_SUCCESS};
use cryri_core::create_run_copy;
use cryri_schema::ProcessEnv;
use std::path::Path;

pub fn run(config_path: &Path, json: bool) -> Result<u8, String> {
    let cfg = load_config(config_path)?;
    let normalized = cfg.normalized(&ProcessEnv).map_err(|e| e.to_string())?;

    let pb = if json {
        None
    } else {
        Some(spinner("copying workspace..."))
    };
    let run_copy = match create_run_copy(&normalized.container) {
        Ok(path) => {
            if let Some(ref pb) = pb {
                spin_ok(pb, "workspace copied");
            }
            path
        }
        Err(e) => {
            if let Some(ref pb) = pb {
                spin_fail(pb, "copy failed");
            }
            return Err(e.to_string());
        }
    };

    if json {
        let payload = serde_json::json!({ "run_copy": run_copy });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!("run copy: {}", run_copy.display());
    }
    Ok(EXIT_SUCCESS)
}
