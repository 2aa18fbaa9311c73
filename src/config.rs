//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/orgtree/orgtree.toml`
//! 3. Explicit config file (when the caller passes one)
//! 4. Environment variables: `ORGTREE_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ResolveError;

/// Unified configuration for orgtree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Name of the group set used for classification (default: unset)
    pub group_set_name: String,
    /// Intrinsic level at which facilities sit (default: 4)
    pub facility_level: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            group_set_name: String::new(),
            facility_level: 4,
        }
    }
}

/// Raw settings for intermediate parsing (fields are Option to detect
/// "not specified" during layered merging).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub group_set_name: Option<String>,
    pub facility_level: Option<u32>,
}

/// Get the XDG config directory for orgtree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "orgtree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("orgtree.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ResolveError> {
    let content = std::fs::read_to_string(path).map_err(|e| ResolveError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ResolveError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Merge overlay config onto self (base): overlay wins if specified,
    /// otherwise keep base.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            group_set_name: overlay
                .group_set_name
                .clone()
                .unwrap_or_else(|| self.group_set_name.clone()),
            facility_level: overlay.facility_level.unwrap_or(self.facility_level),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `config_file` - Optional explicit config file
    ///
    /// # Precedence (lowest to highest)
    /// 1. Compiled defaults
    /// 2. Global config: `$XDG_CONFIG_HOME/orgtree/orgtree.toml`
    /// 3. Explicit config file (must exist when passed)
    /// 4. Environment variables: `ORGTREE_*` prefix
    pub fn load(config_file: Option<&Path>) -> Result<Self, ResolveError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Load global config
        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        // 3. Load and merge the explicit config file
        if let Some(path) = config_file {
            let raw = load_raw_settings(path)?;
            current = current.merge_with(&raw);
        }

        // 4. Apply environment variables (explicit override)
        current = Self::apply_env_overrides(current)?;

        Ok(current)
    }

    /// Apply ORGTREE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ResolveError> {
        // Use config crate just for env var parsing
        let builder = Config::builder().add_source(Environment::with_prefix("ORGTREE"));
        let config = builder.build().map_err(config_err)?;

        if let Ok(val) = config.get_string("group_set_name") {
            settings.group_set_name = val;
        }
        if let Ok(val) = config.get_int("facility_level") {
            settings.facility_level = u32::try_from(val).map_err(|e| ResolveError::Config {
                message: format!("facility_level out of range: {e}"),
            })?;
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ResolveError> {
        toml::to_string_pretty(self).map_err(|e| ResolveError::Config {
            message: format!("serialize config: {e}"),
        })
    }
}

fn config_err(e: ConfigError) -> ResolveError {
    ResolveError::Config {
        message: e.to_string(),
    }
}
