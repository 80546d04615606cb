//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which includes the API base URL, request timeout, where tokens are kept,
//! and the last used username.
//!
//! Configuration is stored at `~/.config/tasklist/config.json`. The
//! `TASKLIST_API_URL` and `TASKLIST_TOKEN_STORAGE` environment variables
//! override the file.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::auth::{FileTokenBackend, KeyringTokenBackend, MemoryTokenBackend, TokenStore};

/// Application name used for config/data directory paths
const APP_NAME: &str = "tasklist";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Token file name in the data directory
const TOKEN_FILE: &str = "tokens.json";

/// Default API location for a local development server
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

const ENV_API_URL: &str = "TASKLIST_API_URL";
const ENV_TOKEN_STORAGE: &str = "TASKLIST_TOKEN_STORAGE";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenStorage {
    /// JSON file in the user's data directory
    #[default]
    File,
    /// OS keychain
    Keyring,
    /// Nothing persisted; tokens last until the process exits
    Memory,
}

impl std::str::FromStr for TokenStorage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(TokenStorage::File),
            "keyring" => Ok(TokenStorage::Keyring),
            "memory" => Ok(TokenStorage::Memory),
            other => Err(format!("unknown token storage '{}'", other)),
        }
    }
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub token_storage: TokenStorage,
    #[serde(default)]
    pub last_username: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            token_storage: TokenStorage::default(),
            last_username: None,
        }
    }
}

impl Config {
    /// Load the config file (or defaults) and apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents).context("Failed to parse config file")?
        } else {
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
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

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            debug!(url = %url, "API URL overridden from environment");
            self.api_base_url = url;
        }
        if let Some(storage) = lookup(ENV_TOKEN_STORAGE) {
            self.token_storage = storage
                .parse::<TokenStorage>()
                .map_err(|e: String| anyhow::anyhow!("{}: {}", ENV_TOKEN_STORAGE, e))?;
        }
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn token_path(&self) -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME).join(TOKEN_FILE))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Open the token store on the configured backend.
    pub fn open_token_store(&self) -> Result<TokenStore> {
        Ok(match self.token_storage {
            TokenStorage::File => TokenStore::open(FileTokenBackend::new(self.token_path()?)),
            TokenStorage::Keyring => TokenStore::open(KeyringTokenBackend::new()),
            TokenStorage::Memory => TokenStore::open(MemoryTokenBackend::default()),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config: Config = serde_json::from_str(r#"{"last_username": "ana"}"#).unwrap();
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.token_storage, TokenStorage::File);
        assert_eq!(config.last_username.as_deref(), Some("ana"));
    }

    #[test]
    fn environment_overrides_file() {
        let mut config = Config::default();
        config
            .apply_overrides(env(&[
                ("TASKLIST_API_URL", "https://todo.example.com/api"),
                ("TASKLIST_TOKEN_STORAGE", "keyring"),
            ]))
            .unwrap();
        assert_eq!(config.api_base_url, "https://todo.example.com/api");
        assert_eq!(config.token_storage, TokenStorage::Keyring);
    }

    #[test]
    fn rejects_unknown_storage() {
        let mut config = Config::default();
        assert!(config
            .apply_overrides(env(&[("TASKLIST_TOKEN_STORAGE", "cloud")]))
            .is_err());
    }

    #[test]
    fn storage_names_round_trip_through_json() {
        let json = serde_json::to_string(&TokenStorage::Keyring).unwrap();
        assert_eq!(json, r#""keyring""#);
    }
}
