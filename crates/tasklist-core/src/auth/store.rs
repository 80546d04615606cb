//! Durable holder of the access/refresh token pair.
//!
//! `TokenStore` keeps an in-memory copy of the pair so reads are cheap and a
//! write is visible to the next read immediately. Every write goes through to
//! a `TokenBackend` so the pair survives restarts. Backend failures are logged
//! and swallowed: callers only ever see the in-memory view.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, RwLock, RwLockWriteGuard};

use anyhow::{Context, Result};
use keyring::Entry;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Keychain service name for the keyring backend
const SERVICE_NAME: &str = "tasklist";

/// Storage key for the access token
pub const ACCESS_KEY: &str = "access";

/// Storage key for the refresh token
pub const REFRESH_KEY: &str = "refresh";

/// A complete pair as issued by the login endpoint.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access", &"<redacted>")
            .field("refresh", &"<redacted>")
            .finish()
    }
}

/// Whatever is currently persisted. Either half may be missing.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredTokens {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh: Option<String>,
}

impl StoredTokens {
    pub fn is_empty(&self) -> bool {
        self.access.is_none() && self.refresh.is_none()
    }

    pub fn has_refresh(&self) -> bool {
        self.refresh.is_some()
    }
}

impl std::fmt::Debug for StoredTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredTokens")
            .field("has_access", &self.access.is_some())
            .field("has_refresh", &self.refresh.is_some())
            .finish()
    }
}

impl From<TokenPair> for StoredTokens {
    fn from(pair: TokenPair) -> Self {
        Self {
            access: Some(pair.access),
            refresh: Some(pair.refresh),
        }
    }
}

/// Durable storage behind the token store.
pub trait TokenBackend: Send + Sync {
    fn load(&self) -> Result<StoredTokens>;
    fn save(&self, tokens: &StoredTokens) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

// ============================================================================
// Token Store
// ============================================================================

struct Inner {
    current: RwLock<StoredTokens>,
    backend: Box<dyn TokenBackend>,
}

/// Shared token holder. Clone is cheap and every clone sees the same pair.
#[derive(Clone)]
pub struct TokenStore {
    inner: Arc<Inner>,
}

impl TokenStore {
    /// Open the store, loading whatever the backend has persisted.
    /// Unreadable storage is treated as empty.
    pub fn open(backend: impl TokenBackend + 'static) -> Self {
        let current = match backend.load() {
            Ok(tokens) => tokens,
            Err(e) => {
                warn!(error = %e, "Failed to load stored tokens, starting signed out");
                StoredTokens::default()
            }
        };
        debug!(?current, "Token store opened");

        Self {
            inner: Arc::new(Inner {
                current: RwLock::new(current),
                backend: Box::new(backend),
            }),
        }
    }

    /// Store that never touches disk.
    pub fn in_memory() -> Self {
        Self::open(MemoryTokenBackend::default())
    }

    pub fn get(&self) -> StoredTokens {
        self.inner
            .current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn access_token(&self) -> Option<String> {
        self.get().access
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.get().refresh
    }

    /// Replace the whole pair.
    pub fn set(&self, pair: TokenPair) {
        self.replace(pair.into());
    }

    /// Remove both tokens.
    pub fn clear(&self) {
        let mut current = self.write();
        *current = StoredTokens::default();
        if let Err(e) = self.inner.backend.clear() {
            warn!(error = %e, "Failed to clear persisted tokens");
        }
        debug!("Token store cleared");
    }

    /// Replace the pair only if the stored refresh token is still `spent`.
    ///
    /// Returns false, leaving the store as it is, when the pair was cleared or
    /// replaced in the meantime.
    pub fn rotate(&self, spent: &str, pair: TokenPair) -> bool {
        let mut current = self.write();
        if current.refresh.as_deref() != Some(spent) {
            return false;
        }
        self.persist(&mut current, pair.into());
        true
    }

    fn replace(&self, tokens: StoredTokens) {
        let mut current = self.write();
        self.persist(&mut current, tokens);
    }

    // Memory and backend change under the same guard
    fn persist(&self, current: &mut StoredTokens, tokens: StoredTokens) {
        if let Err(e) = self.inner.backend.save(&tokens) {
            warn!(error = %e, "Failed to persist tokens");
        }
        *current = tokens;
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoredTokens> {
        self.inner.current.write().unwrap_or_else(|e| e.into_inner())
    }
}

// ============================================================================
// Backends
// ============================================================================

/// Volatile backend; state lives only as long as the process.
#[derive(Default)]
pub struct MemoryTokenBackend {
    tokens: Mutex<StoredTokens>,
}

impl MemoryTokenBackend {
    pub fn with_tokens(tokens: StoredTokens) -> Self {
        Self {
            tokens: Mutex::new(tokens),
        }
    }
}

impl TokenBackend for MemoryTokenBackend {
    fn load(&self) -> Result<StoredTokens> {
        Ok(self.tokens.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn save(&self, tokens: &StoredTokens) -> Result<()> {
        *self.tokens.lock().unwrap_or_else(|e| e.into_inner()) = tokens.clone();
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.tokens.lock().unwrap_or_else(|e| e.into_inner()) = StoredTokens::default();
        Ok(())
    }
}

/// Tokens kept in a JSON file, `{"access": ..., "refresh": ...}`.
pub struct FileTokenBackend {
    path: PathBuf,
}

impl FileTokenBackend {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl TokenBackend for FileTokenBackend {
    fn load(&self) -> Result<StoredTokens> {
        if !self.path.exists() {
            return Ok(StoredTokens::default());
        }
        let contents = std::fs::read_to_string(&self.path)
            .context("Failed to read token file")?;
        serde_json::from_str(&contents).context("Failed to parse token file")
    }

    fn save(&self, tokens: &StoredTokens) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(tokens)?;
        std::fs::write(&self.path, contents).context("Failed to write token file")?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path).context("Failed to remove token file")?;
        }
        Ok(())
    }
}

/// Tokens kept in the OS keychain, one entry per storage key.
pub struct KeyringTokenBackend {
    service: String,
}

impl KeyringTokenBackend {
    pub fn new() -> Self {
        Self {
            service: SERVICE_NAME.to_string(),
        }
    }

    fn entry(&self, key: &str) -> Result<Entry> {
        Entry::new(&self.service, key).context("Failed to create keyring entry")
    }

    fn read(&self, key: &str) -> Result<Option<String>> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to read token from keychain"),
        }
    }

    fn write(&self, key: &str, value: Option<&str>) -> Result<()> {
        let entry = self.entry(key)?;
        match value {
            Some(value) => entry
                .set_password(value)
                .context("Failed to store token in keychain"),
            None => match entry.delete_credential() {
                Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
                Err(e) => Err(e).context("Failed to delete token from keychain"),
            },
        }
    }
}

impl Default for KeyringTokenBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenBackend for KeyringTokenBackend {
    fn load(&self) -> Result<StoredTokens> {
        Ok(StoredTokens {
            access: self.read(ACCESS_KEY)?,
            refresh: self.read(REFRESH_KEY)?,
        })
    }

    fn save(&self, tokens: &StoredTokens) -> Result<()> {
        self.write(ACCESS_KEY, tokens.access.as_deref())?;
        self.write(REFRESH_KEY, tokens.refresh.as_deref())
    }

    fn clear(&self) -> Result<()> {
        self.write(ACCESS_KEY, None)?;
        self.write(REFRESH_KEY, None)
    }
}
