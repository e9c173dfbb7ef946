//! Parameterized `SUM(price)` query over subscriptions with optional filters.
//!
//! Every filter appends one `AND` clause to a `WHERE 1=1` base, so no clause
//! is special-cased as the first one. Placeholder numbers are derived from the
//! argument list, which keeps `$n` and `args[n - 1]` in lockstep. Applying the
//! same filter twice appends two clauses; nothing is deduplicated.

use crate::application::repos::SubscriptionTotalFilter;

pub const TOTAL_BASE_QUERY: &str = "SELECT SUM(price) FROM subscriptions WHERE 1=1";

#[derive(Debug, Clone, Copy)]
enum Filter {
    StartDate,
    EndDate,
    UserId,
    ServiceName,
}

impl Filter {
    /// Column and comparison, plus the cast that lets a text argument bind
    /// against the typed column.
    fn predicate(self) -> (&'static str, &'static str, &'static str) {
        match self {
            Filter::StartDate => ("start_date", ">=", "::date"),
            Filter::EndDate => ("end_date", "<=", "::date"),
            Filter::UserId => ("user_id", "=", "::uuid"),
            Filter::ServiceName => ("service_name", "=", ""),
        }
    }
}

/// Staged query value. Each `with_*` consumes the query and returns the
/// extended one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TotalQuery {
    sql: String,
    args: Vec<String>,
}

impl Default for TotalQuery {
    fn default() -> Self {
        Self::new()
    }
}

impl TotalQuery {
    pub fn new() -> Self {
        Self {
            sql: TOTAL_BASE_QUERY.to_string(),
            args: Vec::new(),
        }
    }

    /// Apply every filter in the fixed order start, end, user, service.
    pub fn for_filter(filter: &SubscriptionTotalFilter) -> Self {
        Self::new()
            .with_start_date(filter.start_date.as_deref())
            .with_end_date(filter.end_date.as_deref())
            .with_user_id(filter.user_id.as_deref())
            .with_service_name(filter.service_name.as_deref())
    }

    pub fn with_start_date(self, value: Option<&str>) -> Self {
        self.with(Filter::StartDate, value)
    }

    pub fn with_end_date(self, value: Option<&str>) -> Self {
        self.with(Filter::EndDate, value)
    }

    pub fn with_user_id(self, value: Option<&str>) -> Self {
        self.with(Filter::UserId, value)
    }

    pub fn with_service_name(self, value: Option<&str>) -> Self {
        self.with(Filter::ServiceName, value)
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn build(self) -> (String, Vec<String>) {
        (self.sql, self.args)
    }

    fn with(mut self, filter: Filter, value: Option<&str>) -> Self {
        let Some(value) = value.filter(|value| !value.is_empty()) else {
            return self;
        };

        let (column, op, cast) = filter.predicate();
        let placeholder = self.args.len() + 1;
        self.sql.push_str(&format!(" AND {column} {op} ${placeholder}{cast}"));
        self.args.push(value.to_string());
        self
    }
}
