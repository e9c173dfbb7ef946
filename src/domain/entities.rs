//! Domain entities mirrored from persistent storage.

use serde::{Deserialize, Serialize};
use time::Date;
use uuid::Uuid;

use crate::domain::error::DomainError;
use crate::domain::month;

/// A stored subscription. Dates carry month granularity and are always the
/// first day of their month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    pub id: i64,
    pub service_name: String,
    pub price: i32,
    pub user_id: Uuid,
    #[serde(with = "month::serde_month_year")]
    pub start_date: Date,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "month::serde_month_year::option"
    )]
    pub end_date: Option<Date>,
}

/// A subscription period may be open-ended but never ends before it starts.
pub fn ensure_period(start_date: Date, end_date: Option<Date>) -> Result<(), DomainError> {
    match end_date {
        Some(end) if end < start_date => Err(DomainError::invariant(format!(
            "end_date {} precedes start_date {}",
            month::format_month_year(end),
            month::format_month_year(start_date)
        ))),
        _ => Ok(()),
    }
}
