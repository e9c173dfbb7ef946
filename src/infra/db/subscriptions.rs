use async_trait::async_trait;
use time::Date;
use uuid::Uuid;

use crate::{
    application::repos::{CreateSubscriptionParams, RepoError, SubscriptionsStore},
    application::total_query::TotalQuery,
    domain::entities::SubscriptionRecord,
};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct SubscriptionRow {
    id: i64,
    service_name: String,
    price: i32,
    user_id: Uuid,
    start_date: Date,
    end_date: Option<Date>,
}

impl From<SubscriptionRow> for SubscriptionRecord {
    fn from(row: SubscriptionRow) -> Self {
        Self {
            id: row.id,
            service_name: row.service_name,
            price: row.price,
            user_id: row.user_id,
            start_date: row.start_date,
            end_date: row.end_date,
        }
    }
}

#[async_trait]
impl SubscriptionsStore for PostgresRepositories {
    async fn insert_subscription(
        &self,
        params: CreateSubscriptionParams,
    ) -> Result<SubscriptionRecord, RepoError> {
        let row = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            INSERT INTO subscriptions (service_name, price, user_id, start_date, end_date)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, service_name, price, user_id, start_date, end_date
            "#,
        )
        .bind(&params.service_name)
        .bind(params.price)
        .bind(params.user_id)
        .bind(params.start_date)
        .bind(params.end_date)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn find_subscription(&self, id: i64) -> Result<Option<SubscriptionRecord>, RepoError> {
        let row = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            SELECT id, service_name, price, user_id, start_date, end_date
            FROM subscriptions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(SubscriptionRecord::from))
    }

    async fn update_subscription(
        &self,
        record: &SubscriptionRecord,
    ) -> Result<Option<SubscriptionRecord>, RepoError> {
        let row = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            UPDATE subscriptions
            SET service_name = $2,
                price = $3,
                user_id = $4,
                start_date = $5,
                end_date = $6
            WHERE id = $1
            RETURNING id, service_name, price, user_id, start_date, end_date
            "#,
        )
        .bind(record.id)
        .bind(&record.service_name)
        .bind(record.price)
        .bind(record.user_id)
        .bind(record.start_date)
        .bind(record.end_date)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(SubscriptionRecord::from))
    }

    async fn delete_subscription(&self, id: i64) -> Result<u64, RepoError> {
        let result = sqlx::query("DELETE FROM subscriptions WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }

    async fn list_subscriptions(&self) -> Result<Vec<SubscriptionRecord>, RepoError> {
        let rows = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            SELECT id, service_name, price, user_id, start_date, end_date
            FROM subscriptions
            ORDER BY id
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(SubscriptionRecord::from).collect())
    }

    async fn sum_prices(&self, query: TotalQuery) -> Result<Option<i64>, RepoError> {
        let (sql, args) = query.build();

        let mut statement = sqlx::query_scalar::<_, Option<i64>>(&sql);
        for arg in args {
            statement = statement.bind(arg);
        }

        statement
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn health_check(&self) -> Result<(), RepoError> {
        self.ping().await.map_err(map_sqlx_error)
    }
}
