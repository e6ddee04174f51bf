use crate::storage::KvStore;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

pub fn financial_key(symbol: &str) -> String {
    format!("financial_{symbol}")
}

/// Stored shape: the value plus when it was written and how long it stays valid (milliseconds).
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry<T> {
    data: T,
    timestamp: i64,
    ttl: u64,
}

/// Expiring values on top of a [`KvStore`]. Expired entries are deleted when read; nothing
/// sweeps in the background.
#[derive(Clone)]
pub struct TtlCache {
    store: Arc<dyn KvStore>,
}

impl TtlCache {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get_at(key, Utc::now()).await
    }

    /// Returns the value if `now - timestamp <= ttl`. Store errors and unparseable entries are
    /// misses.
    pub async fn get_at<T: DeserializeOwned>(&self, key: &str, now: DateTime<Utc>) -> Option<T> {
        let raw = match self.store.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                tracing::warn!(%key, error = %err, "cache read failed; treating as miss");
                return None;
            }
        };

        let entry = match serde_json::from_str::<CacheEntry<T>>(&raw) {
            Ok(entry) => entry,
            Err(err) => {
                tracing::debug!(%key, error = %err, "malformed cache entry; treating as miss");
                return None;
            }
        };

        let age_ms = now.timestamp_millis().saturating_sub(entry.timestamp);
        let ttl_ms = i64::try_from(entry.ttl).unwrap_or(i64::MAX);
        if age_ms > ttl_ms {
            if let Err(err) = self.store.remove(key).await {
                tracing::warn!(%key, error = %err, "failed to evict expired cache entry");
            }
            tracing::debug!(%key, age_ms, ttl_ms, "cache entry expired");
            return None;
        }

        Some(entry.data)
    }

    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) -> anyhow::Result<()> {
        self.set_at(key, value, ttl, Utc::now()).await
    }

    pub async fn set_at<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        let entry = CacheEntry {
            data: value,
            timestamp: now.timestamp_millis(),
            ttl: u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX),
        };
        let raw = serde_json::to_string(&entry)?;
        self.store.set(key, &raw).await
    }
}
