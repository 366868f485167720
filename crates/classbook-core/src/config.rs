//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which includes the last used username, where tokens are persisted, and
//! how far ahead bookings are listed.
//!
//! Configuration is stored at `~/.config/classbook/config.json`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::client::{DEFAULT_BOOKING_WINDOW_DAYS, MAX_BOOKING_WINDOW_DAYS};
use crate::auth::{FileTokenStore, KeychainTokenStore, MemoryTokenStore, TokenStore};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "classbook";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Where login tokens are persisted between runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TokenStorage {
    #[default]
    File,
    Keyring,
    /// Never persist; log in on every run
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub last_username: Option<String>,
    #[serde(default)]
    pub token_storage: TokenStorage,
    #[serde(default)]
    pub booking_window_days: Option<i64>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path).context("Failed to read config file")?;
            serde_json::from_str(&contents).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
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

    /// Days ahead to list bookings for. Non-positive values fall back to the
    /// default and oversized ones are capped.
    pub fn booking_window_days(&self) -> i64 {
        self.booking_window_days
            .filter(|d| *d > 0)
            .map(|d| d.min(MAX_BOOKING_WINDOW_DAYS))
            .unwrap_or(DEFAULT_BOOKING_WINDOW_DAYS)
    }

    /// Build the configured token store.
    pub fn token_store(&self, cache_dir: &Path) -> Arc<dyn TokenStore> {
        match self.token_storage {
            TokenStorage::File => Arc::new(FileTokenStore::new(cache_dir)),
            TokenStorage::Keyring => Arc::new(KeychainTokenStore),
            TokenStorage::Memory => Arc::new(MemoryTokenStore::new()),
        }
    }
}
