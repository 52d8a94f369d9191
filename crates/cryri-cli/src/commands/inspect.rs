use super::{annotate_dir, json_pretty, load_config, EXIT_SUCCESS};
use cryri_core::create_job_description;
use cryri_schema::ProcessEnv;
use std::path::Path;

pub fn run(config_path: &Path, json: bool) -> Result<u8, String> {
    let cfg = load_config(config_path)?;
    let vars = ProcessEnv;
    let normalized = cfg.normalized(&vars).map_err(|e| e.to_string())?;
    let description = create_job_description(&normalized, &vars);

    if json {
        let payload = serde_json::json!({
            "config": normalized,
            "description": description,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        let container = &normalized.container;
        println!(
            "image:         {}",
            container.image.as_deref().unwrap_or("(none)")
        );
        println!(
            "command:       {}",
            container.command.as_deref().unwrap_or("(none)")
        );
        println!("work_dir:      {}", annotate_dir(&container.work_dir));
        println!(
            "copy_root:     {}",
            container
                .cry_copy_dir
                .as_deref()
                .map_or_else(|| "(unset)".to_owned(), annotate_dir)
        );
        println!("run_from_copy: {}", container.run_from_copy);
        println!(
            "excludes:      {}",
            if container.exclude_from_copy.is_empty() {
                "(none)".to_owned()
            } else {
                container.exclude_from_copy.join(", ")
            }
        );
        println!(
            "environment:   {} vars",
            container.environment.as_ref().map_or(0, |env| env.len())
        );
        println!("description:   {description}");
    }
    Ok(EXIT_SUCCESS)
}
