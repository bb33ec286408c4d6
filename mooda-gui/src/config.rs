//! Application configuration.
//!
//! Read from the JSON file named by `MOODA_GUI_CONFIG`, or `mooda-gui.json`
//! in the working directory. A missing file means defaults; a malformed
//! one is reported with a warning and ignored.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use mooda_access::ApiConfig;
use serde::{Deserialize, Serialize};

/// Environment variable overriding the configuration path.
pub const CONFIG_ENV: &str = "MOODA_GUI_CONFIG";

const DEFAULT_CONFIG_FILE: &str = "mooda-gui.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// EMSODEV DMP API endpoint and login.
    pub api: ApiConfig,
    pub window_title: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            window_title: "MOODA".to_string(),
        }
    }
}

impl AppConfig {
    /// Configuration path from the environment or the default file name.
    pub fn path() -> PathBuf {
        std::env::var_os(CONFIG_ENV).map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from)
    }

    /// Loads the configuration, falling back to defaults.
    pub fn load() -> Self {
        let path = Self::path();
        if !path.exists() {
            log::debug!("No configuration at {}, using defaults", path.display());
            return Self::default();
        }
        match Self::from_file(&path) {
            Ok(config) => {
                log::info!("Configuration loaded from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("Ignoring configuration: {e:#}");
                Self::default()
            }
        }
    }

    /// Reads a configuration file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))
    }
}
