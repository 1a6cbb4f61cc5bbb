//! Durable TTL cache over the storage slot
//!
//! Entries are wrapped in a `CacheRecord` envelope carrying the write time
//! and time-to-live in unix milliseconds. An entry is live iff
//! `now - written_at <= ttl`; an expired entry is evicted on the read that
//! discovers it. `clear_expired` sweeps the whole storage namespace once at
//! application start, skipping anything not shaped like a cache record
//! (the token slot, profile fields, feature caches).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use common::DurableKv;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::memo::MemoEntry;

/// Persisted cache envelope.
///
/// `written_at` and `ttl` are unix milliseconds. Presence of both fields is
/// what makes a stored value recognizable as a cache record during sweeps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheRecord {
    pub data: Value,
    pub written_at: u64,
    pub ttl: u64,
}

impl CacheRecord {
    fn is_expired(&self, now: u64) -> bool {
        now.saturating_sub(self.written_at) > self.ttl
    }
}

/// TTL cache backed by durable storage, plus the in-memory request memo.
pub struct CacheStore {
    storage: Arc<DurableKv>,
    pub(crate) memo: Mutex<HashMap<String, MemoEntry>>,
}

impl CacheStore {
    pub fn new(storage: Arc<DurableKv>) -> Self {
        Self {
            storage,
            memo: Mutex::new(HashMap::new()),
        }
    }

    /// Persist a cache record. Write failures are logged and swallowed.
    pub async fn set(&self, key: &str, data: Value, ttl: Duration) {
        let record = CacheRecord {
            data,
            written_at: now_millis(),
            ttl: ttl.as_millis() as u64,
        };
        let value = match serde_json::to_value(&record) {
            Ok(v) => v,
            Err(e) => {
                warn!(key, error = %e, "failed to serialize cache record");
                return;
            }
        };
        if let Err(e) = self.storage.set(key, value).await {
            warn!(key, error = %e, "cache write failed");
        }
    }

    /// Read a cached value.
    ///
    /// Returns `None` for missing or unrecognizable entries. An expired
    /// entry is evicted and `None` is returned. Read errors never propagate.
    pub async fn get(&self, key: &str) -> Option<Value> {
        let raw = self.storage.get(key).await?;
        let record: CacheRecord = serde_json::from_value(raw).ok()?;

        if record.is_expired(now_millis()) {
            debug!(key, "cache entry expired, evicting");
            self.remove(key).await;
            return None;
        }
        Some(record.data)
    }

    /// Best-effort delete.
    pub async fn remove(&self, key: &str) {
        if let Err(e) = self.storage.remove(key).await {
            warn!(key, error = %e, "cache delete failed");
        }
    }

    /// Sweep the storage namespace, evicting every expired cache record.
    ///
    /// Values that don't parse as cache records are left untouched, and
    /// per-key failures don't abort the sweep. Invoked once at application
    /// start.
    pub async fn clear_expired(&self) {
        let now = now_millis();
        let mut evicted = 0usize;

        for key in self.storage.keys().await {
            let Some(raw) = self.storage.get(&key).await else {
                continue;
            };
            let Ok(record) = serde_json::from_value::<CacheRecord>(raw) else {
                continue;
            };
            if record.is_expired(now) {
                self.remove(&key).await;
                evicted += 1;
            }
        }

        debug!(evicted, "expired cache sweep complete");
    }
}

/// Current wall-clock time as unix milliseconds.
pub(crate) fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
