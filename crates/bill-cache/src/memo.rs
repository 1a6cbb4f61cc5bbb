//! In-memory request memoization with stale-on-error fallback
//!
//! Short-TTL deduplication for expensive asynchronous producers. Unlike the
//! durable cache this layer is never persisted, and an expired value is kept
//! around as a fallback: when the producer fails and an old value exists,
//! callers get the old value instead of the failure.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use crate::store::{CacheStore, now_millis};

/// Memoized value plus its write time (unix milliseconds).
pub(crate) struct MemoEntry {
    pub(crate) data: Value,
    pub(crate) written_at: u64,
}

impl CacheStore {
    /// Memoized wrapper around an asynchronous producer.
    ///
    /// A live memoized value is returned without invoking the producer.
    /// Otherwise the producer runs and its result is memoized with the
    /// current timestamp. If the producer fails and a (possibly expired)
    /// memoized value exists, the stale value is returned instead of the
    /// failure; with no memoized value the failure propagates.
    pub async fn request_with_cache<F, Fut, E>(
        &self,
        key: &str,
        ttl: Duration,
        producer: F,
    ) -> Result<Value, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, E>>,
        E: fmt::Display,
    {
        let ttl_millis = ttl.as_millis() as u64;
        {
            let memo = self.memo.lock().await;
            if let Some(entry) = memo.get(key) {
                if now_millis().saturating_sub(entry.written_at) < ttl_millis {
                    debug!(key, "request memo hit");
                    return Ok(entry.data.clone());
                }
            }
        }

        match producer().await {
            Ok(data) => {
                self.memo.lock().await.insert(
                    key.to_string(),
                    MemoEntry {
                        data: data.clone(),
                        written_at: now_millis(),
                    },
                );
                Ok(data)
            }
            Err(e) => {
                let memo = self.memo.lock().await;
                if let Some(stale) = memo.get(key) {
                    warn!(key, error = %e, "request failed, returning stale memoized value");
                    return Ok(stale.data.clone());
                }
                Err(e)
            }
        }
    }

    /// Drop every memoized value.
    pub async fn clear_memoized(&self) {
        self.memo.lock().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::DurableKv;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn test_cache(dir: &tempfile::TempDir) -> CacheStore {
        let kv = Arc::new(
            DurableKv::load(dir.path().join("storage.json"))
                .await
                .unwrap(),
        );
        CacheStore::new(kv)
    }

    #[tokio::test]
    async fn live_memo_skips_the_producer() {
        let dir = tempfile::tempdir().unwrap();
        let cache = test_cache(&dir).await;
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let calls = calls.clone();
            let result: Result<Value, String> = cache
                .request_with_cache("rates", Duration::from_secs(30), move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(json!({"usd": 7.1}))
                })
                .await;
            assert_eq!(result.unwrap(), json!({"usd": 7.1}));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1, "producer runs once");
    }

    #[tokio::test]
    async fn expired_memo_reruns_the_producer() {
        let dir = tempfile::tempdir().unwrap();
        let cache = test_cache(&dir).await;
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let calls = calls.clone();
            let _: Result<Value, String> = cache
                .request_with_cache("k", Duration::from_millis(20), move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(json!(1))
                })
                .await;
            tokio::time::sleep(Duration::from_millis(40)).await;
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn stale_value_wins_over_producer_failure() {
        let dir = tempfile::tempdir().unwrap();
        let cache = test_cache(&dir).await;

        let first: Result<Value, String> = cache
            .request_with_cache("k", Duration::from_millis(20), || async {
                Ok(json!({"v": "original"}))
            })
            .await;
        assert!(first.is_ok());

        // Let the memo expire, then fail the producer
        tokio::time::sleep(Duration::from_millis(40)).await;
        let second: Result<Value, String> = cache
            .request_with_cache("k", Duration::from_millis(20), || async {
                Err("backend down".to_string())
            })
            .await;

        assert_eq!(second.unwrap(), json!({"v": "original"}));
    }

    #[tokio::test]
    async fn failure_with_no_memo_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let cache = test_cache(&dir).await;

        let result: Result<Value, String> = cache
            .request_with_cache("k", Duration::from_secs(30), || async {
                Err("backend down".to_string())
            })
            .await;

        assert_eq!(result.unwrap_err(), "backend down");
    }

    #[tokio::test]
    async fn clear_memoized_forces_a_rerun() {
        let dir = tempfile::tempdir().unwrap();
        let cache = test_cache(&dir).await;
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let calls = calls.clone();
            let _: Result<Value, String> = cache
                .request_with_cache("k", Duration::from_secs(30), move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(json!(1))
                })
                .await;
            cache.clear_memoized().await;
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn memo_is_not_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let kv = Arc::new(
            DurableKv::load(dir.path().join("storage.json"))
                .await
                .unwrap(),
        );
        let cache = CacheStore::new(kv.clone());

        let _: Result<Value, String> = cache
            .request_with_cache("k", Duration::from_secs(30), || async { Ok(json!(1)) })
            .await;

        assert!(kv.get("k").await.is_none(), "memo must stay in memory");
    }
}
