use super::{json_pretty, load_config, EXIT_SUCCESS};
use cryri_core::create_job_description;
use cryri_schema::ProcessEnv;
use std::path::Path;

pub fn run(config_path: &Path, json: bool) -> Result<u8, String> {
    let cfg = load_config(config_path)?;
    let vars = ProcessEnv;
    let description = create_job_description(&cfg.expanded(&vars), &vars);

    if json {
        let payload = serde_json::json!({ "description": description });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!("{description}");
    }
    Ok(EXIT_SUCCESS)
}
