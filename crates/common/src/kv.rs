//! Durable key/value storage slot
//!
//! A single JSON file mapping string keys to arbitrary JSON values. Backs the
//! bearer token slot, the response cache records and the cached profile
//! fields — the client's one flat storage namespace. All writes use atomic
//! temp-file + rename to prevent corruption on crash, and a tokio Mutex
//! serializes writers.
//!
//! A missing file is a cold start (created as `{}`); an unreadable or corrupt
//! file is logged and treated as empty, so storage damage degrades to a
//! logged-out, cold-cache state instead of a startup failure.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

/// Thread-safe durable key/value store.
///
/// The Mutex serializes all access. Reads acquire the lock briefly to clone
/// the requested value, so callers never hold the lock across I/O of their own.
pub struct DurableKv {
    path: PathBuf,
    state: Mutex<HashMap<String, Value>>,
}

impl DurableKv {
    /// Load the store from the given file path.
    ///
    /// If the file doesn't exist, creates it as `{}`. If it exists but cannot
    /// be read or parsed, starts empty and logs the problem.
    pub async fn load(path: PathBuf) -> Result<Self> {
        let state = if path.exists() {
            match tokio::fs::read_to_string(&path).await {
                Ok(contents) => match serde_json::from_str::<HashMap<String, Value>>(&contents) {
                    Ok(entries) => {
                        info!(path = %path.display(), keys = entries.len(), "loaded durable storage");
                        entries
                    }
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "corrupt storage file, starting empty");
                        HashMap::new()
                    }
                },
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "unreadable storage file, starting empty");
                    HashMap::new()
                }
            }
        } else {
            info!(path = %path.display(), "storage file not found, starting with empty store");
            let state = HashMap::new();
            // Create the empty file so future loads don't need the cold-start path
            write_atomic(&path, &state).await?;
            state
        };

        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    /// Get a clone of the value stored under `key`.
    pub async fn get(&self, key: &str) -> Option<Value> {
        let state = self.state.lock().await;
        state.get(key).cloned()
    }

    /// Store a value under `key` and persist to disk.
    pub async fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut state = self.state.lock().await;
        state.insert(key.to_string(), value);
        debug!(key, "stored durable value");
        write_atomic(&self.path, &state).await
    }

    /// Remove a key and persist to disk.
    ///
    /// Returns the removed value if it existed. Removing an absent key is a
    /// no-op that skips the disk write.
    pub async fn remove(&self, key: &str) -> Result<Option<Value>> {
        let mut state = self.state.lock().await;
        let removed = state.remove(key);
        if removed.is_some() {
            debug!(key, "removed durable value");
            write_atomic(&self.path, &state).await?;
        }
        Ok(removed)
    }

    /// Snapshot of all stored keys.
    pub async fn keys(&self) -> Vec<String> {
        let state = self.state.lock().await;
        state.keys().cloned().collect()
    }

    /// Number of stored keys.
    pub async fn len(&self) -> usize {
        let state = self.state.lock().await;
        state.len()
    }

    /// Whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Write the store contents to a file atomically.
///
/// Writes to a temporary file in the same directory, then renames it over
/// the target. Sets file permissions to 0600 (owner read/write only) since
/// the store holds the bearer token.
async fn write_atomic(path: &Path, data: &HashMap<String, Value>) -> Result<()> {
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| Error::Parse(format!("serializing storage: {e}")))?;

    let dir = path
        .parent()
        .ok_or_else(|| Error::Config("storage path has no parent directory".into()))?;

    let tmp_path = dir.join(format!(".storage.tmp.{}", std::process::id()));

    tokio::fs::write(&tmp_path, json.as_bytes()).await?;

    // Set 0600 permissions (unix only)
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        tokio::fs::set_permissions(&tmp_path, perms).await?;
    }

    tokio::fs::rename(&tmp_path, path).await?;

    debug!(path = %path.display(), "persisted durable storage");
    Ok(())
}
