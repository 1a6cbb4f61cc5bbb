//! Per-period AI insight text cache
//!
//! Generated insight text is expensive to produce and stable for a given
//! period+date, so it lives in the durable slot under bespoke
//! `ai_insight_<period>_<date>` keys — plain text, no TTL envelope, manual
//! invalidation only (the insight page refreshes on explicit user action).

use std::sync::Arc;

use common::DurableKv;
use serde_json::Value;
use tracing::warn;

use crate::endpoints::InsightPeriod;

/// Long-lived cache for generated insight text.
pub struct InsightCache {
    storage: Arc<DurableKv>,
}

impl InsightCache {
    pub fn new(storage: Arc<DurableKv>) -> Self {
        Self { storage }
    }

    fn key(period: InsightPeriod, date: &str) -> String {
        format!("ai_insight_{}_{date}", period.as_str())
    }

    /// Cached insight text for a period+date, if any.
    pub async fn get(&self, period: InsightPeriod, date: &str) -> Option<String> {
        match self.storage.get(&Self::key(period, date)).await {
            Some(Value::String(text)) => Some(text),
            _ => None,
        }
    }

    /// Store insight text. Best effort; write failures are logged.
    pub async fn put(&self, period: InsightPeriod, date: &str, text: &str) {
        let key = Self::key(period, date);
        if let Err(e) = self.storage.set(&key, Value::String(text.to_string())).await {
            warn!(key, error = %e, "failed to cache insight text");
        }
    }

    /// Drop the cached text for a period+date.
    pub async fn invalidate(&self, period: InsightPeriod, date: &str) {
        let key = Self::key(period, date);
        if let Err(e) = self.storage.remove(&key).await {
            warn!(key, error = %e, "failed to invalidate insight text");
        }
    }
}
