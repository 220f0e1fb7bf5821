//! Application configuration management.
//!
//! Two sources feed the configuration:
//! - `Settings`, read from the environment (`VITE_API_URL`,
//!   `VITE_API_GOOGLE_CLIENT_ID`, `MONGODB_URI`), usually via a `.env` file
//! - `Config`, a small JSON file remembering the last email used to log in,
//!   stored at `~/.config/novel-hub/config.json`

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "novel-hub";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const API_URL_VAR: &str = "VITE_API_URL";
pub const GOOGLE_CLIENT_ID_VAR: &str = "VITE_API_GOOGLE_CLIENT_ID";
pub const MONGODB_URI_VAR: &str = "MONGODB_URI";

/// Deployment settings taken from the environment.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub api_url: Option<String>,
    pub google_client_id: Option<String>,
    pub mongodb_uri: Option<String>,
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        Self {
            api_url: get(API_URL_VAR),
            google_client_id: get(GOOGLE_CLIENT_ID_VAR),
            mongodb_uri: get(MONGODB_URI_VAR),
        }
    }

    pub fn api_url(&self) -> Result<&str> {
        self.api_url
            .as_deref()
            .ok_or_else(|| anyhow!("{} is not set", API_URL_VAR))
    }

    pub fn mongodb_uri(&self) -> Result<&str> {
        self.mongodb_uri
            .as_deref()
            .ok_or_else(|| anyhow!("{} is not set", MONGODB_URI_VAR))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub last_email: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory holding the session jar
    pub fn cache_dir() -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }
}
