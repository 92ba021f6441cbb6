use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config_merge::merge_toml_values;
use crate::paths::{PROJECT_CONFIG_FILE, user_config_path};

/// Environment switch that turns on the debug log file.
pub const DEBUG_ENV: &str = "MNEMO_DEBUG";

/// Store directory the project config is read from. Fixed, since the
/// config itself may rename the store directory.
const PROJECT_DIR_NAME: &str = ".mnemo";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MnemoConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub init: InitConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_dir_name")]
    pub dir_name: String,
    #[serde(default = "default_file_name")]
    pub file_name: String,
    #[serde(default = "default_lock_file_name")]
    pub lock_file_name: String,
    /// 0 waits until the lock is free.
    #[serde(default = "default_lock_timeout_secs")]
    pub lock_timeout_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir_name: default_dir_name(),
            file_name: default_file_name(),
            lock_file_name: default_lock_file_name(),
            lock_timeout_secs: default_lock_timeout_secs(),
        }
    }
}

impl StorageConfig {
    pub fn lock_timeout(&self) -> Option<Duration> {
        (self.lock_timeout_secs > 0).then(|| Duration::from_secs(self.lock_timeout_secs))
    }
}

fn default_dir_name() -> String {
    PROJECT_DIR_NAME.to_string()
}

fn default_file_name() -> String {
    "memory.md".to_string()
}

fn default_lock_file_name() -> String {
    ".memory.lock".to_string()
}

fn default_lock_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitConfig {
    #[serde(default)]
    pub yes: bool,
    /// Local template bundle; empty means none.
    #[serde(default)]
    pub template_dir: String,
}

impl InitConfig {
    pub fn template_dir(&self) -> Option<PathBuf> {
        let dir = self.template_dir.trim();
        (!dir.is_empty()).then(|| PathBuf::from(dir))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default)]
    pub debug: bool,
}

impl MnemoConfig {
    /// Load user config merged with `<project_root>/.mnemo/config.toml`.
    ///
    /// Missing files fall back to defaults.
    pub fn load(project_root: &Path) -> Result<Self> {
        let project_path = Self::project_config_path(project_root);
        let user_path = user_config_path();
        Self::load_with_paths(user_path.as_deref(), &project_path)
    }

    pub fn project_config_path(project_root: &Path) -> PathBuf {
        project_root.join(PROJECT_DIR_NAME).join(PROJECT_CONFIG_FILE)
    }

    /// Load config from explicit paths. Testable without global filesystem state.
    pub fn load_with_paths(user_path: Option<&Path>, project_path: &Path) -> Result<Self> {
        let user = match user_path {
            Some(path) => read_toml(path)?,
            None => None,
        };
        let project = read_toml(project_path)?;

        let merged = match (user, project) {
            (None, None) => return Ok(Self::default()),
            (Some(value), None) | (None, Some(value)) => value,
            (Some(base), Some(overlay)) => merge_toml_values(base, overlay),
        };

        // Roundtrip through string for reliable deserialization
        let merged_str = toml::to_string(&merged).context("Failed to serialize merged config")?;
        toml::from_str(&merged_str).context("Failed to deserialize merged config")
    }

    /// Debug log file enabled by config or by `MNEMO_DEBUG=true`.
    pub fn debug_enabled(&self) -> bool {
        self.log.debug
            || std::env::var(DEBUG_ENV)
                .map(|value| value.eq_ignore_ascii_case("true"))
                .unwrap_or(false)
    }
}

fn read_toml(path: &Path) -> Result<Option<toml::Value>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    let value = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config: {}", path.display()))?;
    debug!(path = %path.display(), "loaded config");
    Ok(Some(value))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
