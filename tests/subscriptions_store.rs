use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use time::{Date, Month};
use uuid::Uuid;

use subscriptions::application::repos::{
    CreateSubscriptionParams, RepoError, SubscriptionTotalFilter, SubscriptionsStore,
};
use subscriptions::application::subscription_repo::{
    SubscriptionRepoError, SubscriptionRepository,
};
use subscriptions::application::subscriptions::{
    CreateSubscriptionCommand, SubscriptionService, SubscriptionTotalQuery,
    UpdateSubscriptionCommand,
};
use subscriptions::application::total_query::TotalQuery;
use subscriptions::cache::{MemorySubscriptionCache, SubscriptionCache, SubscriptionKeys};
use subscriptions::infra::db::PostgresRepositories;

const USER_A: &str = "60601fee-2bf1-4721-ae6f-7636e79a0cba";
const USER_B: &str = "1c2a9a8e-7d55-4f0e-9d38-3c4f3f0b8a11";

fn month(year: i32, month: Month) -> Date {
    Date::from_calendar_date(year, month, 1).unwrap()
}

fn params(
    service: &str,
    price: i32,
    user: &str,
    start: Date,
    end: Option<Date>,
) -> CreateSubscriptionParams {
    CreateSubscriptionParams {
        service_name: service.to_string(),
        price,
        user_id: Uuid::parse_str(user).unwrap(),
        start_date: start,
        end_date: end,
    }
}

fn memory_cache() -> Arc<MemorySubscriptionCache> {
    Arc::new(MemorySubscriptionCache::new(
        NonZeroUsize::new(64).unwrap(),
        Duration::from_secs(3600),
        SubscriptionKeys::default(),
    ))
}

#[sqlx::test(migrations = "./migrations")]
async fn store_round_trips_and_reports_missing_rows(pool: PgPool) {
    let store = PostgresRepositories::new(pool);

    let record = store
        .insert_subscription(params(
            "Netflix",
            999,
            USER_A,
            month(2024, Month::September),
            Some(month(2025, Month::August)),
        ))
        .await
        .expect("insert");
    assert!(record.id > 0);

    let found = store
        .find_subscription(record.id)
        .await
        .expect("find")
        .expect("row exists");
    assert_eq!(found, record);

    assert_eq!(store.find_subscription(record.id + 1000).await.expect("find"), None);

    let mut missing = record.clone();
    missing.id += 1000;
    assert_eq!(store.update_subscription(&missing).await.expect("update"), None);

    assert_eq!(store.delete_subscription(record.id).await.expect("delete"), 1);
    assert_eq!(store.delete_subscription(record.id).await.expect("delete"), 0);
    store.health_check().await.expect("health");
}

#[sqlx::test(migrations = "./migrations")]
async fn store_rejects_period_ending_before_start(pool: PgPool) {
    let store = PostgresRepositories::new(pool);

    let err = store
        .insert_subscription(params(
            "Netflix",
            999,
            USER_A,
            month(2024, Month::September),
            Some(month(2024, Month::January)),
        ))
        .await
        .expect_err("check constraint");
    assert!(matches!(err, RepoError::Integrity { .. }), "{err:?}");
}

#[sqlx::test(migrations = "./migrations")]
async fn built_totals_bind_against_typed_columns(pool: PgPool) {
    let store = PostgresRepositories::new(pool);
    for (service, price, user, start, end) in [
        (
            "Netflix",
            999,
            USER_A,
            month(2024, Month::January),
            Some(month(2024, Month::June)),
        ),
        (
            "Netflix",
            500,
            USER_B,
            month(2024, Month::March),
            Some(month(2024, Month::December)),
        ),
        (
            "Spotify",
            299,
            USER_A,
            month(2024, Month::February),
            None,
        ),
    ] {
        store
            .insert_subscription(params(service, price, user, start, end))
            .await
            .expect("insert");
    }

    let sum = |query: TotalQuery| {
        let store = store.clone();
        async move { store.sum_prices(query).await.expect("sum") }
    };

    assert_eq!(sum(TotalQuery::new()).await, Some(1798));
    assert_eq!(
        sum(TotalQuery::new().with_service_name(Some("Netflix"))).await,
        Some(1499)
    );
    assert_eq!(sum(TotalQuery::new().with_user_id(Some(USER_A))).await, Some(1298));
    assert_eq!(
        sum(TotalQuery::new().with_start_date(Some("2024-02-01"))).await,
        Some(799)
    );
    // Open-ended rows never satisfy an end-date bound.
    assert_eq!(
        sum(TotalQuery::new().with_end_date(Some("2024-06-01"))).await,
        Some(999)
    );
    assert_eq!(
        sum(TotalQuery::new().with_service_name(Some("Kinopoisk"))).await,
        None
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn caching_repository_against_postgres(pool: PgPool) {
    let store = Arc::new(PostgresRepositories::new(pool));
    let cache = memory_cache();
    let repo = SubscriptionRepository::new(store.clone(), cache.clone());

    let id = repo
        .create(params("Netflix", 999, USER_A, month(2024, Month::September), None))
        .await
        .expect("create");
    let cached = cache.get(id).await.expect("cache").expect("primed");
    assert_eq!(cached.price, 999);

    let mut record = repo.get_by_id(id).await.expect("get");
    record.price = 1299;
    repo.update(&record).await.expect("update");
    assert_eq!(repo.get_by_id(id).await.expect("get").price, 1299);
    assert_eq!(
        store.find_subscription(id).await.expect("find").map(|r| r.price),
        Some(1299)
    );

    assert_eq!(
        repo.sum_total(&SubscriptionTotalFilter {
            service_name: Some("Netflix".into()),
            ..Default::default()
        })
        .await
        .expect("sum"),
        1299
    );

    repo.delete(id).await.expect("delete");
    assert!(cache.get(id).await.expect("cache").is_none());
    assert!(matches!(
        repo.get_by_id(id).await,
        Err(SubscriptionRepoError::NotFound { .. })
    ));
    assert!(matches!(
        repo.delete(id).await,
        Err(SubscriptionRepoError::NotFound { .. })
    ));
}

#[sqlx::test(migrations = "./migrations")]
async fn empty_table_totals_zero(pool: PgPool) {
    let repo = SubscriptionRepository::new(
        Arc::new(PostgresRepositories::new(pool)),
        memory_cache(),
    );
    let total = repo
        .sum_total(&SubscriptionTotalFilter::default())
        .await
        .expect("sum");
    assert_eq!(total, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn netflix_scenario_through_the_service(pool: PgPool) {
    let repo = SubscriptionRepository::new(
        Arc::new(PostgresRepositories::new(pool)),
        memory_cache(),
    );
    let service = SubscriptionService::new(repo);

    let created = service
        .create(CreateSubscriptionCommand {
            service_name: "Netflix".into(),
            price: 999,
            user_id: USER_A.into(),
            start_date: "09-2024".into(),
            end_date: None,
        })
        .await
        .expect("create");
    assert!(created.id > 0);
    assert_eq!(created.start_date, month(2024, Month::September));
    assert_eq!(created.end_date, None);

    let updated = service
        .update(
            created.id,
            UpdateSubscriptionCommand {
                price: Some(1299),
                ..Default::default()
            },
        )
        .await
        .expect("update");
    assert_eq!(updated.service_name, "Netflix");
    assert_eq!(updated.price, 1299);

    let total = service
        .total(SubscriptionTotalQuery {
            service_name: Some("Netflix".into()),
            ..Default::default()
        })
        .await
        .expect("total");
    assert_eq!(total, 1299);
}
