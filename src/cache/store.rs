//! Subscription cache port and its in-process implementations.
//!
//! Entries are JSON-encoded `SubscriptionRecord`s keyed by the string form of
//! the subscription id. Every entry carries the store's fixed TTL; expired
//! entries read as misses.

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lru::LruCache;
use thiserror::Error;

use crate::domain::entities::SubscriptionRecord;

use super::keys::SubscriptionKeys;
use super::lock::mutex_lock;

const SOURCE: &str = "cache::store";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache connection error: {0}")]
    Connection(String),
    #[error("cache payload could not be encoded or decoded: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Key-value cache for subscriptions with per-entry expiry.
#[async_trait]
pub trait SubscriptionCache: Send + Sync {
    /// `Ok(None)` on a miss or an expired entry.
    async fn get(&self, id: i64) -> Result<Option<SubscriptionRecord>, CacheError>;

    async fn set(&self, record: &SubscriptionRecord) -> Result<(), CacheError>;

    async fn delete(&self, id: i64) -> Result<(), CacheError>;
}

/// Cache that stores nothing. Every read misses and every write succeeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSubscriptionCache;

#[async_trait]
impl SubscriptionCache for NoopSubscriptionCache {
    async fn get(&self, _id: i64) -> Result<Option<SubscriptionRecord>, CacheError> {
        Ok(None)
    }

    async fn set(&self, _record: &SubscriptionRecord) -> Result<(), CacheError> {
        Ok(())
    }

    async fn delete(&self, _id: i64) -> Result<(), CacheError> {
        Ok(())
    }
}

struct MemoryEntry {
    payload: String,
    /// `None` when the TTL reaches past what `Instant` can represent.
    expires_at: Option<Instant>,
}

impl MemoryEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }
}

/// Bounded in-process cache with TTL expiry and LRU eviction.
pub struct MemorySubscriptionCache {
    entries: Mutex<LruCache<String, MemoryEntry>>,
    keys: SubscriptionKeys,
    ttl: Duration,
}

impl MemorySubscriptionCache {
    pub fn new(capacity: NonZeroUsize, ttl: Duration, keys: SubscriptionKeys) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            keys,
            ttl,
        }
    }

    /// Number of stored entries, expired ones included until they are read.
    pub fn len(&self) -> usize {
        mutex_lock(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SubscriptionCache for MemorySubscriptionCache {
    async fn get(&self, id: i64) -> Result<Option<SubscriptionRecord>, CacheError> {
        let key = self.keys.key(id);
        let payload = {
            let now = Instant::now();
            let mut entries = mutex_lock(&self.entries, SOURCE, "get");
            let fresh = entries
                .get(&key)
                .map(|entry| (!entry.is_expired(now)).then(|| entry.payload.clone()));
            match fresh {
                Some(Some(payload)) => Some(payload),
                Some(None) => {
                    entries.pop(&key);
                    None
                }
                None => None,
            }
        };

        payload
            .map(|payload| serde_json::from_str(&payload).map_err(CacheError::from))
            .transpose()
    }

    async fn set(&self, record: &SubscriptionRecord) -> Result<(), CacheError> {
        let payload = serde_json::to_string(record)?;
        let entry = MemoryEntry {
            payload,
            expires_at: Instant::now().checked_add(self.ttl),
        };
        mutex_lock(&self.entries, SOURCE, "set").put(self.keys.key(record.id), entry);
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), CacheError> {
        mutex_lock(&self.entries, SOURCE, "delete").pop(&self.keys.key(id));
        Ok(())
    }
}
