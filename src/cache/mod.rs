//! Subscription cache
//!
//! The cache is a pure performance layer in front of Postgres. Three backends
//! implement [`SubscriptionCache`]:
//!
//! - **Redis**: shared across processes, entries expire via `SETEX`
//! - **Memory**: per-process LRU with the same TTL semantics
//! - **Noop**: always misses; used when caching is disabled or Redis is down
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! backend = "redis"          # redis | memory | disabled
//! redis_url = "redis://127.0.0.1:6379/0"
//! ttl_seconds = 3600
//! key_prefix = "subscription:"
//! ```

mod keys;
mod lock;
mod redis;
mod store;

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::{CacheBackend, CacheSettings};

pub use self::redis::RedisSubscriptionCache;
pub use keys::{DEFAULT_KEY_PREFIX, SubscriptionKeys};
pub use store::{CacheError, MemorySubscriptionCache, NoopSubscriptionCache, SubscriptionCache};

/// Build the configured cache. An unreachable Redis degrades to the no-op
/// cache instead of failing startup.
pub async fn connect(settings: &CacheSettings) -> Arc<dyn SubscriptionCache> {
    let keys = SubscriptionKeys::new(settings.key_prefix.clone());

    match &settings.backend {
        CacheBackend::Disabled => {
            info!(target = "subscriptions::cache", "Cache disabled");
            Arc::new(NoopSubscriptionCache)
        }
        CacheBackend::Memory { capacity } => {
            info!(
                target = "subscriptions::cache",
                capacity = capacity.get(),
                ttl_seconds = settings.ttl.as_secs(),
                "Using in-process cache"
            );
            Arc::new(MemorySubscriptionCache::new(*capacity, settings.ttl, keys))
        }
        CacheBackend::Redis { url } => {
            match RedisSubscriptionCache::connect(url, settings.ttl, keys).await {
                Ok(cache) => {
                    info!(
                        target = "subscriptions::cache",
                        ttl_seconds = settings.ttl.as_secs(),
                        "Connected to redis"
                    );
                    Arc::new(cache)
                }
                Err(err) => {
                    warn!(
                        target = "subscriptions::cache",
                        error = %err,
                        "Redis not available; continuing without cache"
                    );
                    Arc::new(NoopSubscriptionCache)
                }
            }
        }
    }
}
