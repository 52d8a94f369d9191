//! Configuration schema, expansion, and path sanitization for cryri.
//!
//! This crate defines the config layer: YAML config parsing (`CryConfig`),
//! recursive `$VAR`/`~` expansion over nested values (`ExpandVars`), directory
//! path canonicalization (`sanitize_dir_path`), and the variable-lookup seam
//! (`VarSource`) shared by expansion and job description.

pub mod config;
pub mod expand;
pub mod sanitize;

pub use config::{
    parse_config_file, parse_config_str, CloudSection, ConfigError, ContainerConfig, CryConfig,
};
pub use expand::{ExpandVars, ProcessEnv, StaticVars, VarSource};
pub use sanitize::{resolve_path, sanitize_dir_path};
