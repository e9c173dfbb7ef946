//! In-memory store shared by the integration tests that do not need Postgres.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use subscriptions::application::repos::{
    CreateSubscriptionParams, RepoError, SubscriptionsStore,
};
use subscriptions::application::total_query::TotalQuery;
use subscriptions::domain::entities::SubscriptionRecord;

#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<BTreeMap<i64, SubscriptionRecord>>,
    next_id: Mutex<i64>,
    pub queries: Mutex<Vec<(String, Vec<String>)>>,
}

#[allow(dead_code)]
impl MemoryStore {
    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl SubscriptionsStore for MemoryStore {
    async fn insert_subscription(
        &self,
        params: CreateSubscriptionParams,
    ) -> Result<SubscriptionRecord, RepoError> {
        let id = {
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            *next
        };
        let record = params.into_record(id);
        self.rows.lock().unwrap().insert(id, record.clone());
        Ok(record)
    }

    async fn find_subscription(&self, id: i64) -> Result<Option<SubscriptionRecord>, RepoError> {
        Ok(self.rows.lock().unwrap().get(&id).cloned())
    }

    async fn update_subscription(
        &self,
        record: &SubscriptionRecord,
    ) -> Result<Option<SubscriptionRecord>, RepoError> {
        let mut rows = self.rows.lock().unwrap();
        Ok(rows.get_mut(&record.id).map(|row| {
            *row = record.clone();
            row.clone()
        }))
    }

    async fn delete_subscription(&self, id: i64) -> Result<u64, RepoError> {
        Ok(self.rows.lock().unwrap().remove(&id).map_or(0, |_| 1))
    }

    async fn list_subscriptions(&self) -> Result<Vec<SubscriptionRecord>, RepoError> {
        Ok(self.rows.lock().unwrap().values().cloned().collect())
    }

    /// Only understands the `service_name` filter; others are recorded but ignored.
    async fn sum_prices(&self, query: TotalQuery) -> Result<Option<i64>, RepoError> {
        let service = query
            .sql()
            .contains("service_name")
            .then(|| query.args().last().cloned())
            .flatten();
        self.queries.lock().unwrap().push(query.build());

        let rows = self.rows.lock().unwrap();
        let matching: Vec<i64> = rows
            .values()
            .filter(|row| service.as_ref().is_none_or(|name| &row.service_name == name))
            .map(|row| i64::from(row.price))
            .collect();
        Ok((!matching.is_empty()).then(|| matching.iter().sum()))
    }

    async fn health_check(&self) -> Result<(), RepoError> {
        Ok(())
    }
}
