//! Persisted token storage.
//!
//! The store is a plain key-value map that survives restarts. Only the
//! bootstrapper writes to it, and only after a successful login.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use super::session::Session;

pub const ACCESS_TOKEN: &str = "access_token";
pub const ID_TOKEN: &str = "id_token";
pub const USERNAME: &str = "username";
pub const REFRESH_TOKEN: &str = "refresh_token";

/// Token file name in cache directory
const TOKEN_FILE: &str = "tokens.json";

/// Durable key-value storage for renewable tokens.
pub trait TokenStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;

    /// Name of this storage backend, for logs.
    fn name(&self) -> &str {
        "unknown"
    }
}

/// The full set of persisted values needed to log in without a password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTokens {
    pub username: String,
    pub access_token: String,
    pub id_token: String,
    pub refresh_token: Option<String>,
}

impl PersistedTokens {
    /// Load tokens, treating read failures and partial sets as absent.
    pub fn load(store: &dyn TokenStore) -> Option<Self> {
        let read = |key: &str| -> Option<String> {
            match store.get(key) {
                Ok(value) => value.filter(|v| !v.trim().is_empty()),
                Err(e) => {
                    warn!(store = store.name(), key, error = %e, "Failed to read token store");
                    None
                }
            }
        };

        let access_token = read(ACCESS_TOKEN);
        let id_token = read(ID_TOKEN);
        let username = read(USERNAME);

        match (access_token, id_token, username) {
            (Some(access_token), Some(id_token), Some(username)) => Some(Self {
                username,
                access_token,
                id_token,
                refresh_token: read(REFRESH_TOKEN),
            }),
            (None, None, None) => None,
            _ => {
                debug!(store = store.name(), "Incomplete token set in store, ignoring");
                None
            }
        }
    }

    pub fn from_session(session: &Session) -> Self {
        Self {
            username: session.username.clone(),
            access_token: session.tokens.access_token.clone(),
            id_token: session.tokens.id_token.clone(),
            refresh_token: session.tokens.refresh_token.clone(),
        }
    }

    /// Write every value, replacing whatever was stored before.
    pub fn save(&self, store: &dyn TokenStore) -> Result<()> {
        store.set(ACCESS_TOKEN, &self.access_token)?;
        store.set(ID_TOKEN, &self.id_token)?;
        store.set(USERNAME, &self.username)?;
        match self.refresh_token {
            Some(ref token) => store.set(REFRESH_TOKEN, token)?,
            None => store.remove(REFRESH_TOKEN)?,
        }
        Ok(())
    }

    /// Remove all persisted values (log out).
    pub fn clear(store: &dyn TokenStore) -> Result<()> {
        for key in [ACCESS_TOKEN, ID_TOKEN, USERNAME, REFRESH_TOKEN] {
            store.remove(key)?;
        }
        Ok(())
    }
}

/// JSON file in the cache directory, readable only by the owner.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(cache_dir: &Path) -> Self {
        Self {
            path: cache_dir.join(TOKEN_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents =
            std::fs::read_to_string(&self.path).context("Failed to read token file")?;
        serde_json::from_str(&contents).context("Failed to parse token file")
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(map)?;
        std::fs::write(&self.path, contents).context("Failed to write token file")?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }

    /// Current contents, starting over when the file is unreadable.
    fn map_for_update(&self) -> BTreeMap<String, String> {
        self.read_map().unwrap_or_else(|e| {
            warn!(error = %e, path = ?self.path, "Discarding unreadable token file");
            BTreeMap::new()
        })
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_map()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut map = self.map_for_update();
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map)
    }

    fn remove(&self, key: &str) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }
        let mut map = self.map_for_update();
        if map.remove(key).is_some() {
            self.write_map(&map)?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "file"
    }
}

/// Process-local store; nothing survives a restart.
#[derive(Default)]
pub struct MemoryTokenStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_values<'a>(values: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let store = Self::new();
        {
            let mut map = store.values.lock().unwrap_or_else(PoisonError::into_inner);
            for (k, v) in values {
                map.insert(k.to_string(), v.to_string());
            }
        }
        store
    }

    /// Snapshot of all stored values.
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
