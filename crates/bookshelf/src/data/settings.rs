//! Application settings management
//!
//! User preferences read from `settings.json` in the config directory.

use crate::config::providers::GOOGLE_BOOKS_DEFAULT_SERVER;
use crate::config::storage::SETTINGS_FILE;
use crate::data::storage;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings file format version
const SETTINGS_VERSION: u32 = 1;

/// Application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// File format version, informational only (nothing migrates on it)
    #[serde(default = "default_version")]
    pub version: u32,

    // === Search ===
    /// Base URL of the Google Books API
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Optional Google Books API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    // === Storage ===
    /// Directory holding the favorites file (platform data dir if unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    // === Logging ===
    /// Default log filter when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_version() -> u32 {
    SETTINGS_VERSION
}

fn default_api_base_url() -> String {
    GOOGLE_BOOKS_DEFAULT_SERVER.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            api_base_url: default_api_base_url(),
            api_key: None,
            data_dir: None,
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    /// Load settings from the default config location
    pub fn load() -> Result<Self> {
        let path = storage::config_path(SETTINGS_FILE)?;
        Self::load_from(&path)
    }

    /// Load settings from a specific path, defaults if the file is missing
    pub fn load_from(path: &Path) -> Result<Self> {
        match storage::load_from::<Settings>(path)? {
            Some(settings) => Ok(settings),
            None => Ok(Self::default()),
        }
    }

    /// Save settings to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        storage::save_to(path, self)
    }

    /// Directory for the favorites file
    pub fn resolved_data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => storage::data_dir(),
        }
    }
}
