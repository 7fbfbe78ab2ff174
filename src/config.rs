//! Configuration loading.
//!
//! Reads `config.toml` from, in order: an explicit path, the `SIZING_CONFIG`
//! environment variable, or the platform config directory. A missing file
//! means defaults.

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::history::DEFAULT_HISTORY_LIMIT;
use crate::model::TimeUnit;
use crate::schedule::Rules;

pub const CONFIG_ENV: &str = "SIZING_CONFIG";
const CONFIG_FILE: &str = "config.toml";

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Unit for newly created projects
    #[serde(default)]
    pub unit: TimeUnit,

    /// Number of undo steps kept
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Where saved projects and the autosave slot live
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Write the autosave slot after every change
    #[serde(default = "default_auto_save")]
    pub auto_save: bool,

    /// Task validation limits
    #[serde(default)]
    pub rules: Rules,
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

fn default_auto_save() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            unit: TimeUnit::default(),
            history_limit: default_history_limit(),
            data_dir: None,
            auto_save: default_auto_save(),
            rules: Rules::default(),
        }
    }
}

impl Config {
    /// Load from an explicit path; the file must exist.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Load from `explicit`, else the default location if present.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from_path(path);
        }
        match default_config_path() {
            Some(path) if path.is_file() => Self::load_from_path(path),
            _ => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.history_limit == 0 {
            return Err(Error::InvalidConfig(
                "history_limit must be >= 1 (got 0)".to_string(),
            ));
        }
        if self.rules.min_name_len == 0 {
            return Err(Error::InvalidConfig(
                "[rules].min_name_len must be >= 1 (got 0)".to_string(),
            ));
        }
        if !(self.rules.max_duration.is_finite() && self.rules.max_duration > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "[rules].max_duration must be positive (got {})",
                self.rules.max_duration
            )));
        }
        Ok(())
    }

    /// Directory for saved projects, falling back to the platform data dir
    /// and finally the working directory.
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .or_else(|| project_dirs().map(|dirs| dirs.data_dir().to_path_buf()))
            .unwrap_or_else(|| PathBuf::from(".sizing"))
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "rust-sizing-app")
}

/// `SIZING_CONFIG` if set, else `config.toml` in the platform config dir.
pub fn default_config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return Some(PathBuf::from(path));
    }
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}
