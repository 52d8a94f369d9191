use crate::expand::{ExpandVars, VarSource};
use crate::sanitize::sanitize_dir_path;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    ParseYaml(#[from] serde_yaml::Error),
    #[error("no existing ancestor directory for path '{0}'")]
    MissingPath(String),
}

/// Top-level configuration: the container to run and its cloud placement.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CryConfig {
    pub container: ContainerConfig,
    #[serde(default)]
    pub cloud: CloudSection,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ContainerConfig {
    /// Image reference, forwarded to the backend untouched.
    #[serde(default)]
    pub image: Option<String>,
    /// Command line executed inside the container.
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub environment: Option<BTreeMap<String, String>>,
    pub work_dir: String,
    /// Root under which run snapshots are created.
    #[serde(default)]
    pub cry_copy_dir: Option<String>,
    /// Glob patterns matched against entry names at every level of the copy.
    #[serde(default)]
    pub exclude_from_copy: Vec<String>,
    /// Snapshot the workspace and run from the copy instead of the live tree.
    #[serde(default)]
    pub run_from_copy: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CloudSection {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub instance_type: Option<String>,
}

impl ContainerConfig {
    /// Expand `$VAR` and `~` in the path-bearing fields.
    ///
    /// `image` and `command` are left alone: variable references in them are
    /// meant for the remote container environment, not this machine.
    #[must_use]
    pub fn expanded(&self, vars: &dyn VarSource) -> Self {
        Self {
            image: self.image.clone(),
            command: self.command.clone(),
            environment: self.environment.expand_vars(vars),
            work_dir: self.work_dir.expand_vars(vars),
            cry_copy_dir: self.cry_copy_dir.expand_vars(vars),
            exclude_from_copy: self.exclude_from_copy.expand_vars(vars),
            run_from_copy: self.run_from_copy,
        }
    }

    /// Expand, then canonicalize `work_dir` and `cry_copy_dir` to existing
    /// directories.
    pub fn normalized(&self, vars: &dyn VarSource) -> Result<Self, ConfigError> {
        let mut normalized = self.expanded(vars);
        normalized.work_dir = path_to_string(sanitize_dir_path(&normalized.work_dir)?);
        normalized.cry_copy_dir = normalized
            .cry_copy_dir
            .as_deref()
            .map(|path| sanitize_dir_path(path).map(path_to_string))
            .transpose()?;
        Ok(normalized)
    }
}

impl CryConfig {
    /// Expand variables without touching the filesystem.
    #[must_use]
    pub fn expanded(&self, vars: &dyn VarSource) -> Self {
        Self {
            container: self.container.expanded(vars),
            cloud: self.cloud.clone(),
        }
    }

    /// Return a normalized copy of the whole config. The receiver is left
    /// untouched.
    pub fn normalized(&self, vars: &dyn VarSource) -> Result<Self, ConfigError> {
        Ok(Self {
            container: self.container.normalized(vars)?,
            cloud: self.cloud.clone(),
        })
    }
}

fn path_to_string(path: PathBuf) -> String {
    path.to_string_lossy().into_owned()
}

pub fn parse_config_str(input: &str) -> Result<CryConfig, ConfigError> {
    Ok(serde_yaml::from_str(input)?)
}

pub fn parse_config_file(path: impl AsRef<Path>) -> Result<CryConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config_str(&content)
}
