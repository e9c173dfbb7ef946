use thiserror::Error;
use time::Date;
use tracing::warn;
use uuid::Uuid;

use crate::application::repos::{CreateSubscriptionParams, RepoError, SubscriptionTotalFilter};
use crate::application::subscription_repo::{SubscriptionRepoError, SubscriptionRepository};
use crate::domain::entities::{SubscriptionRecord, ensure_period};
use crate::domain::error::DomainError;
use crate::domain::month::{iso_date, parse_iso_date, parse_month_year};

#[derive(Debug, Error)]
pub enum SubscriptionServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("subscription {id} not found")]
    NotFound { id: i64 },
    #[error(transparent)]
    Repo(SubscriptionRepoError),
}

impl From<SubscriptionRepoError> for SubscriptionServiceError {
    fn from(err: SubscriptionRepoError) -> Self {
        match err {
            SubscriptionRepoError::NotFound { id } => Self::NotFound { id },
            other => Self::Repo(other),
        }
    }
}

impl From<DomainError> for SubscriptionServiceError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation { message } | DomainError::Invariant { message } => {
                Self::Validation(message)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateSubscriptionCommand {
    pub service_name: String,
    pub price: i64,
    pub user_id: String,
    pub start_date: String,
    pub end_date: Option<String>,
}

/// Absent or empty fields leave the stored value unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateSubscriptionCommand {
    pub service_name: Option<String>,
    pub price: Option<i64>,
    pub user_id: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SubscriptionTotalQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub user_id: Option<String>,
    pub service_name: Option<String>,
}

#[derive(Clone)]
pub struct SubscriptionService {
    repo: SubscriptionRepository,
}

impl SubscriptionService {
    pub fn new(repo: SubscriptionRepository) -> Self {
        Self { repo }
    }

    pub async fn create(
        &self,
        command: CreateSubscriptionCommand,
    ) -> Result<SubscriptionRecord, SubscriptionServiceError> {
        let service_name = required_text(&command.service_name, "service_name")?;
        let price = parse_price(command.price)?;
        let user_id = parse_user_id(&command.user_id)?;
        let start_date = parse_month_year(&command.start_date)?;
        let end_date = provided(command.end_date.as_deref())
            .map(parse_month_year)
            .transpose()?;
        ensure_period(start_date, end_date)?;

        let params = CreateSubscriptionParams {
            service_name,
            price,
            user_id,
            start_date,
            end_date,
        };
        let id = self.repo.create(params.clone()).await?;

        match self.repo.get_by_id(id).await {
            Ok(record) => Ok(record),
            Err(err) => {
                warn!(
                    subscription_id = id,
                    error = %err,
                    "Created subscription could not be re-read; returning written state"
                );
                Ok(params.into_record(id))
            }
        }
    }

    pub async fn get(&self, id: i64) -> Result<SubscriptionRecord, SubscriptionServiceError> {
        Ok(self.repo.get_by_id(id).await?)
    }

    /// Merge the supplied fields into the stored subscription and return the
    /// re-read result.
    pub async fn update(
        &self,
        id: i64,
        command: UpdateSubscriptionCommand,
    ) -> Result<SubscriptionRecord, SubscriptionServiceError> {
        let mut record = self.repo.get_by_id(id).await?;

        if let Some(name) = provided(command.service_name.as_deref()) {
            record.service_name = name.to_string();
        }
        if let Some(price) = command.price {
            record.price = parse_price(price)?;
        }
        if let Some(user_id) = provided(command.user_id.as_deref()) {
            record.user_id = parse_user_id(user_id)?;
        }
        if let Some(start) = provided(command.start_date.as_deref()) {
            record.start_date = parse_month_year(start)?;
        }
        if let Some(end) = provided(command.end_date.as_deref()) {
            record.end_date = Some(parse_month_year(end)?);
        }
        ensure_period(record.start_date, record.end_date)?;

        self.repo.update(&record).await?;
        Ok(self.repo.get_by_id(id).await?)
    }

    pub async fn delete(&self, id: i64) -> Result<(), SubscriptionServiceError> {
        Ok(self.repo.delete(id).await?)
    }

    pub async fn list(&self) -> Result<Vec<SubscriptionRecord>, SubscriptionServiceError> {
        Ok(self.repo.list_all().await?)
    }

    pub async fn total(
        &self,
        query: SubscriptionTotalQuery,
    ) -> Result<i64, SubscriptionServiceError> {
        let filter = normalize_total_query(&query)?;
        Ok(self.repo.sum_total(&filter).await?)
    }

    pub async fn health_check(&self) -> Result<(), RepoError> {
        self.repo.health_check().await
    }
}

/// Validate the raw filters and convert them to the forms the store binds:
/// ISO dates and hyphenated UUIDs.
pub fn normalize_total_query(
    query: &SubscriptionTotalQuery,
) -> Result<SubscriptionTotalFilter, SubscriptionServiceError> {
    let date = |value: &Option<String>| -> Result<Option<String>, SubscriptionServiceError> {
        provided(value.as_deref())
            .map(|raw| parse_filter_date(raw).map(iso_date))
            .transpose()
    };

    Ok(SubscriptionTotalFilter {
        start_date: date(&query.start_date)?,
        end_date: date(&query.end_date)?,
        user_id: provided(query.user_id.as_deref())
            .map(|raw| parse_user_id(raw).map(|id| id.hyphenated().to_string()))
            .transpose()?,
        service_name: provided(query.service_name.as_deref()).map(str::to_string),
    })
}

/// Filters take the canonical `MM-YYYY` month and also accept `YYYY-MM-DD`.
fn parse_filter_date(raw: &str) -> Result<Date, SubscriptionServiceError> {
    parse_month_year(raw).or_else(|err| {
        parse_iso_date(raw).map_err(|_| SubscriptionServiceError::from(err))
    })
}

fn provided(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn required_text(value: &str, field: &'static str) -> Result<String, SubscriptionServiceError> {
    provided(Some(value))
        .map(str::to_string)
        .ok_or_else(|| SubscriptionServiceError::Validation(format!("{field} must not be empty")))
}

fn parse_price(value: i64) -> Result<i32, SubscriptionServiceError> {
    i32::try_from(value)
        .ok()
        .filter(|price| *price > 0)
        .ok_or_else(|| {
            SubscriptionServiceError::Validation(format!(
                "price must be a positive integer up to {}, got {value}",
                i32::MAX
            ))
        })
}

fn parse_user_id(value: &str) -> Result<Uuid, SubscriptionServiceError> {
    Uuid::parse_str(value.trim()).map_err(|err| {
        SubscriptionServiceError::Validation(format!("user_id `{value}` is not a UUID: {err}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use time::Month;

    use crate::application::repos::SubscriptionsStore;
    use crate::application::total_query::TotalQuery;
    use crate::cache::NoopSubscriptionCache;

    const USER_A: &str = "60601fee-2bf1-4721-ae6f-7636e79a0cba";

    #[derive(Default)]
    struct MemoryStore {
        rows: Mutex<BTreeMap<i64, SubscriptionRecord>>,
        queries: Mutex<Vec<(String, Vec<String>)>>,
        hide_reads: bool,
    }

    #[async_trait]
    impl SubscriptionsStore for MemoryStore {
        async fn insert_subscription(
            &self,
            params: CreateSubscriptionParams,
        ) -> Result<SubscriptionRecord, RepoError> {
            let mut rows = self.rows.lock().unwrap();
            let id = rows.len() as i64 + 1;
            let record = params.into_record(id);
            rows.insert(id, record.clone());
            Ok(record)
        }

        async fn find_subscription(
            &self,
            id: i64,
        ) -> Result<Option<SubscriptionRecord>, RepoError> {
            if self.hide_reads {
                return Err(RepoError::Timeout);
            }
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

        async fn sum_prices(&self, query: TotalQuery) -> Result<Option<i64>, RepoError> {
            self.queries.lock().unwrap().push(query.build());
            let rows = self.rows.lock().unwrap();
            let sum: i64 = rows.values().map(|row| i64::from(row.price)).sum();
            Ok((!rows.is_empty()).then_some(sum))
        }

        async fn health_check(&self) -> Result<(), RepoError> {
            Ok(())
        }
    }

    fn service_with(store: MemoryStore) -> (SubscriptionService, Arc<MemoryStore>) {
        let store = Arc::new(store);
        let repo = SubscriptionRepository::new(store.clone(), Arc::new(NoopSubscriptionCache));
        (SubscriptionService::new(repo), store)
    }

    fn netflix() -> CreateSubscriptionCommand {
        CreateSubscriptionCommand {
            service_name: "Netflix".to_string(),
            price: 999,
            user_id: USER_A.to_string(),
            start_date: "09-2024".to_string(),
            end_date: None,
        }
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let (service, _) = service_with(MemoryStore::default());

        let created = service.create(netflix()).await.unwrap();
        assert_eq!(created.id, 1);
        assert_eq!(
            created.start_date,
            Date::from_calendar_date(2024, Month::September, 1).unwrap()
        );
        assert_eq!(created.end_date, None);

        assert_eq!(service.get(created.id).await.unwrap(), created);
    }

    #[tokio::test]
    async fn create_returns_written_state_when_reread_fails() {
        let (service, store) = service_with(MemoryStore {
            hide_reads: true,
            ..Default::default()
        });

        let created = service.create(netflix()).await.unwrap();
        assert_eq!(created.id, 1);
        assert_eq!(created.service_name, "Netflix");
        assert_eq!(store.rows.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn create_validates_input() {
        let (service, store) = service_with(MemoryStore::default());

        let cases = [
            CreateSubscriptionCommand {
                service_name: "  ".into(),
                ..netflix()
            },
            CreateSubscriptionCommand {
                price: 0,
                ..netflix()
            },
            CreateSubscriptionCommand {
                price: i64::from(i32::MAX) + 1,
                ..netflix()
            },
            CreateSubscriptionCommand {
                user_id: "not-a-uuid".into(),
                ..netflix()
            },
            CreateSubscriptionCommand {
                start_date: "2024-09-01".into(),
                ..netflix()
            },
            CreateSubscriptionCommand {
                end_date: Some("08-2024".into()),
                ..netflix()
            },
        ];

        for command in cases {
            let err = service.create(command.clone()).await.unwrap_err();
            assert!(
                matches!(err, SubscriptionServiceError::Validation(_)),
                "{command:?} -> {err:?}"
            );
        }
        assert!(store.rows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_merges_only_supplied_fields() {
        let (service, _) = service_with(MemoryStore::default());
        let created = service.create(netflix()).await.unwrap();

        let updated = service
            .update(
                created.id,
                UpdateSubscriptionCommand {
                    price: Some(1299),
                    service_name: Some(String::new()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.price, 1299);
        assert_eq!(updated.service_name, "Netflix");
        assert_eq!(updated.user_id, created.user_id);
        assert_eq!(service.get(created.id).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn update_sets_end_date_with_canonical_format() {
        let (service, _) = service_with(MemoryStore::default());
        let created = service.create(netflix()).await.unwrap();

        let updated = service
            .update(
                created.id,
                UpdateSubscriptionCommand {
                    end_date: Some("12-2024".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(
            updated.end_date,
            Some(Date::from_calendar_date(2024, Month::December, 1).unwrap())
        );

        let err = service
            .update(
                created.id,
                UpdateSubscriptionCommand {
                    start_date: Some("01-2025".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SubscriptionServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn missing_subscription_is_not_found() {
        let (service, _) = service_with(MemoryStore::default());

        assert!(matches!(
            service.get(42).await,
            Err(SubscriptionServiceError::NotFound { id: 42 })
        ));
        assert!(matches!(
            service.update(42, UpdateSubscriptionCommand::default()).await,
            Err(SubscriptionServiceError::NotFound { id: 42 })
        ));
        assert!(matches!(
            service.delete(42).await,
            Err(SubscriptionServiceError::NotFound { id: 42 })
        ));
    }

    #[tokio::test]
    async fn total_normalizes_filters() {
        let (service, store) = service_with(MemoryStore::default());
        service.create(netflix()).await.unwrap();

        let total = service
            .total(SubscriptionTotalQuery {
                start_date: Some("01-2024".into()),
                end_date: Some("2024-12-01".into()),
                user_id: Some(USER_A.to_uppercase()),
                service_name: Some(" Netflix ".into()),
            })
            .await
            .unwrap();
        assert_eq!(total, 999);

        let queries = store.queries.lock().unwrap();
        let (_, args) = queries.last().unwrap();
        assert_eq!(args, &["2024-01-01", "2024-12-01", USER_A, "Netflix"]);
    }

    #[tokio::test]
    async fn total_without_rows_is_zero() {
        let (service, _) = service_with(MemoryStore::default());
        let total = service
            .total(SubscriptionTotalQuery::default())
            .await
            .unwrap();
        assert_eq!(total, 0);
    }

    #[test]
    fn total_rejects_malformed_filters() {
        for query in [
            SubscriptionTotalQuery {
                start_date: Some("September".into()),
                ..Default::default()
            },
            SubscriptionTotalQuery {
                user_id: Some("42".into()),
                ..Default::default()
            },
        ] {
            assert!(matches!(
                normalize_total_query(&query),
                Err(SubscriptionServiceError::Validation(_))
            ));
        }
    }
}
