//! Client configuration management.
//!
//! This module handles loading and saving the client configuration: the API
//! base URL, timeouts, the inactivity window, where the token is kept and
//! the page routes used by the redirect policy.
//!
//! Configuration is stored at `~/.config/nutri-client/config.json`.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::api::API_BASE_URL;
use crate::navigation::Routes;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "nutri-client";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Minutes without user activity before an authenticated session is ended.
const INACTIVITY_MINUTES: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TokenStorage {
    #[default]
    File,
    Keyring,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub inactivity_minutes: u64,
    pub token_storage: TokenStorage,
    pub routes: Routes,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: API_BASE_URL.to_string(),
            request_timeout_secs: REQUEST_TIMEOUT_SECS,
            inactivity_minutes: INACTIVITY_MINUTES,
            token_storage: TokenStorage::default(),
            routes: Routes::default(),
        }
    }
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
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Inactivity window; never shorter than one minute.
    pub fn inactivity_window(&self) -> Duration {
        Duration::from_secs(self.inactivity_minutes.max(1) * 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api_base_url, "https://wpback.boramae.dev/api");
        assert_eq!(config.inactivity_window(), Duration::from_secs(30 * 60));
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.token_storage, TokenStorage::File);
        assert_eq!(config.routes.login, "/login.html");
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: Config = serde_json::from_str(
            r#"{"inactivity_minutes": 5, "token_storage": "keyring", "routes": {"landing": "/dashboard.html"}}"#,
        )
        .unwrap();
        assert_eq!(config.inactivity_window(), Duration::from_secs(300));
        assert_eq!(config.token_storage, TokenStorage::Keyring);
        assert_eq!(config.routes.landing, "/dashboard.html");
        assert_eq!(config.routes.login, "/login.html");
        assert_eq!(config.api_base_url, API_BASE_URL);
    }

    #[test]
    fn test_zero_inactivity_is_clamped() {
        let config = Config {
            inactivity_minutes: 0,
            ..Default::default()
        };
        assert_eq!(config.inactivity_window(), Duration::from_secs(60));
    }
}
