pub mod completions;
pub mod describe;
pub mod inspect;
pub mod snapshot;
pub mod submit;

use cryri_schema::{parse_config_file, CryConfig};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_CONFIG_ERROR: u8 = 2;
pub const EXIT_SNAPSHOT_ERROR: u8 = 3;

/// Exit code for a failed command, keyed on the error-message prefix.
///
/// Config-layer failures exit with [`EXIT_CONFIG_ERROR`], snapshot failures
/// (including copy-phase I/O) with [`EXIT_SNAPSHOT_ERROR`], anything else
/// with [`EXIT_FAILURE`].
#[must_use]
pub fn exit_code_for_message(msg: &str) -> u8 {
    if msg.starts_with("failed to read config")
        || msg.starts_with("failed to parse config")
        || msg.starts_with("no existing ancestor")
        || msg.starts_with("config error:")
    {
        EXIT_CONFIG_ERROR
    } else if msg.starts_with("invalid exclude pattern")
        || msg.starts_with("run directory already exists")
        || msg.starts_with("container.cry_copy_dir")
        || msg.starts_with("cry_copy_dir")
        || msg.starts_with("snapshot I/O error")
    {
        EXIT_SNAPSHOT_ERROR
    } else {
        EXIT_FAILURE
    }
}

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

pub fn load_config(path: &Path) -> Result<CryConfig, String> {
    parse_config_file(path).map_err(|e| e.to_string())
}

pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .expect("valid template")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(msg.to_owned());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

pub fn spin_ok(pb: &ProgressBar, msg: &str) {
    pb.set_style(ProgressStyle::with_template("{msg}").expect("valid template"));
    pb.finish_with_message(format!("✓ {msg}"));
}

pub fn spin_fail(pb: &ProgressBar, msg: &str) {
    pb.set_style(ProgressStyle::with_template("{msg}").expect("valid template"));
    pb.finish_with_message(format!("✗ {msg}"));
}

/// A path as shown by `inspect`: normalized paths can point at directories
/// that do not exist yet, so mark those.
pub fn annotate_dir(path: &str) -> String {
    use console::Style;
    if Path::new(path).is_dir() {
        path.to_owned()
    } else {
        format!("{path} {}", Style::new().yellow().apply_to("(missing)"))
    }
}
