//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use time::Date;
use uuid::Uuid;

use crate::application::total_query::TotalQuery;
use crate::domain::entities::SubscriptionRecord;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateSubscriptionParams {
    pub service_name: String,
    pub price: i32,
    pub user_id: Uuid,
    pub start_date: Date,
    pub end_date: Option<Date>,
}

impl CreateSubscriptionParams {
    /// The record this insert produces once the store assigns `id`.
    pub fn into_record(self, id: i64) -> SubscriptionRecord {
        SubscriptionRecord {
            id,
            service_name: self.service_name,
            price: self.price,
            user_id: self.user_id,
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }
}

/// Optional filters for the price aggregate. Values are already validated
/// and normalized: dates as ISO `YYYY-MM-DD`, user ids as hyphenated UUIDs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionTotalFilter {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub user_id: Option<String>,
    pub service_name: Option<String>,
}

/// Relational store for subscriptions.
#[async_trait]
pub trait SubscriptionsStore: Send + Sync {
    async fn insert_subscription(
        &self,
        params: CreateSubscriptionParams,
    ) -> Result<SubscriptionRecord, RepoError>;

    async fn find_subscription(&self, id: i64) -> Result<Option<SubscriptionRecord>, RepoError>;

    /// Overwrite every mutable column. `None` means no row has this id.
    async fn update_subscription(
        &self,
        record: &SubscriptionRecord,
    ) -> Result<Option<SubscriptionRecord>, RepoError>;

    /// Returns the number of rows removed.
    async fn delete_subscription(&self, id: i64) -> Result<u64, RepoError>;

    async fn list_subscriptions(&self) -> Result<Vec<SubscriptionRecord>, RepoError>;

    /// Execute a built aggregate query. `None` when no row matched.
    async fn sum_prices(&self, query: TotalQuery) -> Result<Option<i64>, RepoError>;

    async fn health_check(&self) -> Result<(), RepoError>;
}
