use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Configuration from ~/.config/roost/config.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Database location; defaults to the platform data dir
    #[serde(default)]
    pub db_path: Option<PathBuf>,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UiConfig {
    /// Hex color overrides, e.g. `highlight = "#FB4196"`
    #[serde(default)]
    pub colors: HashMap<String, String>,
    /// Show the key-hint line at the bottom of the screen
    #[serde(default)]
    pub show_key_hints: bool,
}

impl Config {
    /// Load config from the default location; a missing file yields defaults,
    /// a malformed file is an error (silently ignoring typos hides them).
    pub fn load() -> Result<Self, ConfigError> {
        match Self::config_file() {
            Some(path) if path.exists() => {
                let raw = std::fs::read_to_string(&path)
                    .map_err(|e| ConfigError::Read(path.clone(), e))?;
                toml::from_str(&raw).map_err(|e| ConfigError::Parse(path, e))
            }
            _ => Ok(Self::default()),
        }
    }

    fn config_file() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("roost").join("config.toml"))
    }

    /// Resolve the database path: explicit override wins, then the config
    /// file, then `<data dir>/roost/roost.db`.
    pub fn resolve_db_path(&self, override_path: Option<&Path>) -> PathBuf {
        if let Some(path) = override_path {
            return path.to_path_buf();
        }
        if let Some(path) = &self.db_path {
            return path.clone();
        }
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("roost")
            .join("roost.db")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read config {0}: {1}")]
    Read(PathBuf, #[source] std::io::Error),
    #[error("could not parse config {0}: {1}")]
    Parse(PathBuf, #[source] toml::de::Error),
}
