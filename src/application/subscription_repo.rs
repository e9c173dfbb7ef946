//! Caching repository: the single access path for subscription persistence.
//!
//! Postgres is the source of truth. The cache is consulted and refreshed
//! around store access, and every cache failure is logged and swallowed.
//!
//! Ordering rules:
//! - reads try the cache first and populate it after a store hit;
//! - updates drop the cache entry before writing the store and repopulate it
//!   only after the store write succeeded, so a failed update leaves a miss;
//! - deletes touch the cache only after the store confirmed a removed row;
//! - bulk listing and aggregates never use the cache.

use std::sync::Arc;

use metrics::counter;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::application::repos::{
    CreateSubscriptionParams, RepoError, SubscriptionTotalFilter, SubscriptionsStore,
};
use crate::application::total_query::TotalQuery;
use crate::cache::SubscriptionCache;
use crate::domain::entities::SubscriptionRecord;

pub const METRIC_CACHE_HIT: &str = "subscriptions_cache_hit_total";
pub const METRIC_CACHE_MISS: &str = "subscriptions_cache_miss_total";
pub const METRIC_CACHE_ERROR: &str = "subscriptions_cache_error_total";

#[derive(Debug, Error)]
pub enum SubscriptionRepoError {
    #[error("subscription {id} not found")]
    NotFound { id: i64 },
    #[error("failed to {operation} subscription: {source}")]
    Store {
        operation: &'static str,
        id: Option<i64>,
        #[source]
        source: RepoError,
    },
}

impl SubscriptionRepoError {
    fn store(operation: &'static str, id: Option<i64>, source: RepoError) -> Self {
        match source {
            RepoError::NotFound => match id {
                Some(id) => Self::NotFound { id },
                None => Self::Store {
                    operation,
                    id,
                    source,
                },
            },
            source => Self::Store {
                operation,
                id,
                source,
            },
        }
    }
}

#[derive(Clone)]
pub struct SubscriptionRepository {
    store: Arc<dyn SubscriptionsStore>,
    cache: Arc<dyn SubscriptionCache>,
}

impl SubscriptionRepository {
    pub fn new(store: Arc<dyn SubscriptionsStore>, cache: Arc<dyn SubscriptionCache>) -> Self {
        Self { store, cache }
    }

    /// Insert and return the store-assigned id. The cache is primed with the
    /// created record.
    pub async fn create(
        &self,
        params: CreateSubscriptionParams,
    ) -> Result<i64, SubscriptionRepoError> {
        let record = self
            .store
            .insert_subscription(params)
            .await
            .map_err(|err| {
                warn!(error = %err, "Failed to create subscription");
                SubscriptionRepoError::store("create", None, err)
            })?;

        info!(subscription_id = record.id, "Subscription created");
        self.cache_set(&record, "create").await;
        Ok(record.id)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<SubscriptionRecord, SubscriptionRepoError> {
        match self.cache.get(id).await {
            Ok(Some(record)) => {
                counter!(METRIC_CACHE_HIT).increment(1);
                debug!(subscription_id = id, "Subscription loaded from cache");
                return Ok(record);
            }
            Ok(None) => {
                counter!(METRIC_CACHE_MISS).increment(1);
            }
            Err(err) => {
                counter!(METRIC_CACHE_ERROR, "op" => "get").increment(1);
                debug!(
                    subscription_id = id,
                    error = %err,
                    "Cache lookup failed; falling back to database"
                );
            }
        }

        let record = self
            .store
            .find_subscription(id)
            .await
            .map_err(|err| SubscriptionRepoError::store("load", Some(id), err))?
            .ok_or(SubscriptionRepoError::NotFound { id })?;

        self.cache_set(&record, "get").await;
        debug!(subscription_id = id, "Subscription loaded from database");
        Ok(record)
    }

    /// Replace every mutable field of the stored subscription with `record`.
    pub async fn update(&self, record: &SubscriptionRecord) -> Result<(), SubscriptionRepoError> {
        let id = record.id;
        self.cache_delete(id, "update").await;

        let updated = self
            .store
            .update_subscription(record)
            .await
            .map_err(|err| {
                warn!(subscription_id = id, error = %err, "Failed to update subscription");
                SubscriptionRepoError::store("update", Some(id), err)
            })?
            .ok_or(SubscriptionRepoError::NotFound { id })?;

        self.cache_set(&updated, "update").await;
        info!(subscription_id = id, "Subscription updated");
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> Result<(), SubscriptionRepoError> {
        let removed = self
            .store
            .delete_subscription(id)
            .await
            .map_err(|err| {
                warn!(subscription_id = id, error = %err, "Failed to delete subscription");
                SubscriptionRepoError::store("delete", Some(id), err)
            })?;

        if removed == 0 {
            return Err(SubscriptionRepoError::NotFound { id });
        }

        self.cache_delete(id, "delete").await;
        info!(subscription_id = id, "Subscription deleted");
        Ok(())
    }

    pub async fn list_all(&self) -> Result<Vec<SubscriptionRecord>, SubscriptionRepoError> {
        self.store
            .list_subscriptions()
            .await
            .map_err(|err| SubscriptionRepoError::store("list", None, err))
    }

    /// Sum of prices across matching subscriptions; no match sums to zero.
    pub async fn sum_total(
        &self,
        filter: &SubscriptionTotalFilter,
    ) -> Result<i64, SubscriptionRepoError> {
        let query = TotalQuery::for_filter(filter);
        let total = self
            .store
            .sum_prices(query)
            .await
            .map_err(|err| SubscriptionRepoError::store("sum", None, err))?;

        Ok(total.unwrap_or(0))
    }

    pub async fn health_check(&self) -> Result<(), RepoError> {
        self.store.health_check().await
    }

    async fn cache_set(&self, record: &SubscriptionRecord, op: &'static str) {
        if let Err(err) = self.cache.set(record).await {
            counter!(METRIC_CACHE_ERROR, "op" => "set").increment(1);
            warn!(
                subscription_id = record.id,
                op,
                error = %err,
                "Failed to write subscription to cache"
            );
        }
    }

    async fn cache_delete(&self, id: i64, op: &'static str) {
        match self.cache.delete(id).await {
            Ok(()) => debug!(subscription_id = id, op, "Subscription removed from cache"),
            Err(err) => {
                counter!(METRIC_CACHE_ERROR, "op" => "delete").increment(1);
                warn!(
                    subscription_id = id,
                    op,
                    error = %err,
                    "Failed to remove subscription from cache"
                );
            }
        }
    }
}
