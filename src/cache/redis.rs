//! Redis-backed subscription cache.

use std::time::Duration;

use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};

use crate::domain::entities::SubscriptionRecord;

use super::keys::SubscriptionKeys;
use super::store::{CacheError, SubscriptionCache};

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        Self::Connection(err.to_string())
    }
}

/// Shares one multiplexed connection; `ConnectionManager` reconnects on its own.
#[derive(Clone)]
pub struct RedisSubscriptionCache {
    connection: ConnectionManager,
    keys: SubscriptionKeys,
    ttl_seconds: u64,
}

impl RedisSubscriptionCache {
    /// Open a managed connection and verify it with `PING`.
    pub async fn connect(
        url: &str,
        ttl: Duration,
        keys: SubscriptionKeys,
    ) -> Result<Self, CacheError> {
        let client = Client::open(url)?;
        let mut connection = ConnectionManager::new(client).await?;
        let _: String = redis::cmd("PING").query_async(&mut connection).await?;

        Ok(Self {
            connection,
            keys,
            ttl_seconds: ttl.as_secs().max(1),
        })
    }
}

#[async_trait]
impl SubscriptionCache for RedisSubscriptionCache {
    async fn get(&self, id: i64) -> Result<Option<SubscriptionRecord>, CacheError> {
        let mut connection = self.connection.clone();
        let payload: Option<String> = connection.get(self.keys.key(id)).await?;

        payload
            .map(|payload| serde_json::from_str(&payload).map_err(CacheError::from))
            .transpose()
    }

    async fn set(&self, record: &SubscriptionRecord) -> Result<(), CacheError> {
        let payload = serde_json::to_string(record)?;
        let mut connection = self.connection.clone();
        let _: () = connection
            .set_ex(self.keys.key(record.id), payload, self.ttl_seconds)
            .await?;
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), CacheError> {
        let mut connection = self.connection.clone();
        let _: () = connection.del(self.keys.key(id)).await?;
        Ok(())
    }
}
