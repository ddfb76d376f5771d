//! Where the bearer token comes from.
//!
//! The client only sees a [`CredentialProvider`]. The stock provider,
//! [`StoredCredentials`], reads the token from a key-value [`TokenStore`]
//! under several key names, because older releases saved it under different
//! keys.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tracing::{debug, warn};

/// Token keys, checked in priority order.
pub const TOKEN_KEYS: [&str; 3] = ["accessToken", "authToken", "token"];

/// Every key removed when a session ends.
pub const AUTH_KEYS: [&str; 5] = ["accessToken", "authToken", "token", "refreshToken", "user"];

/// Supplies the bearer token for outgoing requests.
pub trait CredentialProvider: Send + Sync + fmt::Debug {
    /// The current token, if the learner is logged in.
    fn token(&self) -> Option<String>;

    /// Forgets every stored credential.
    fn clear(&self);
}

/// Persistent string key-value storage.
///
/// Operations are infallible from the caller's point of view; backends log
/// and swallow their own I/O failures.
pub trait TokenStore: Send + Sync + fmt::Debug {
    /// Reads a value.
    fn get(&self, key: &str) -> Option<String>;

    /// Writes a value.
    fn set(&self, key: &str, value: &str);

    /// Deletes a value.
    fn remove(&self, key: &str);
}

// ============================================================================
// StoredCredentials
// ============================================================================

/// [`CredentialProvider`] over a [`TokenStore`].
#[derive(Debug)]
pub struct StoredCredentials<S> {
    store: S,
}

impl<S: TokenStore> StoredCredentials<S> {
    /// Wraps a store.
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// The underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }
}

impl<S: TokenStore> CredentialProvider for StoredCredentials<S> {
    fn token(&self) -> Option<String> {
        TOKEN_KEYS.iter().find_map(|key| {
            self.store
                .get(key)
                .filter(|token| !token.trim().is_empty())
        })
    }

    fn clear(&self) {
        for key in AUTH_KEYS {
            self.store.remove(key);
        }
        debug!("Stored credentials cleared");
    }
}

// ============================================================================
// MemoryTokenStore
// ============================================================================

/// In-process [`TokenStore`].
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryTokenStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding `entries`.
    #[must_use]
    pub fn with_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: Mutex::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}

// ============================================================================
// FileTokenStore
// ============================================================================

/// [`TokenStore`] persisted as a flat JSON object on disk.
///
/// The file is re-read on every access so that a login performed by another
/// process is picked up. A missing file reads as empty.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl FileTokenStore {
    /// Uses the JSON file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// The backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> HashMap<String, String> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return HashMap::new(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read token store");
                return HashMap::new();
            }
        };
        serde_json::from_str(&contents).unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "Token store is not valid JSON; treating as empty");
            HashMap::new()
        })
    }

    fn write(&self, entries: &HashMap<String, String>) {
        let result = serde_json::to_string_pretty(entries)
            .map_err(std::io::Error::from)
            .and_then(|json| {
                if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(&self.path, json)
            });
        if let Err(e) = result {
            warn!(path = %self.path.display(), error = %e, "Failed to write token store");
        }
    }

    fn update(&self, change: impl FnOnce(&mut HashMap<String, String>) -> bool) {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.read();
        if change(&mut entries) {
            self.write(&entries);
        }
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self, key: &str) -> Option<String> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.read().remove(key)
    }

    fn set(&self, key: &str, value: &str) {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
            true
        });
    }

    fn remove(&self, key: &str) {
        self.update(|entries| entries.remove(key).is_some());
    }
}
