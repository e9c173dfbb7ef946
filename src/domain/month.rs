//! Month-granularity dates exchanged in the canonical `MM-YYYY` form.

use time::{Date, format_description::FormatItem, macros::format_description};

use super::error::DomainError;

pub const MONTH_YEAR_FORMAT: &[FormatItem<'static>] =
    format_description!("[month padding:zero]-[year]");
pub const ISO_DATE_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month padding:zero]-[day padding:zero]");
const DAY_MONTH_YEAR_FORMAT: &[FormatItem<'static>] =
    format_description!("[day padding:zero]-[month padding:zero]-[year]");

/// Parse `MM-YYYY` (for example `09-2024`) into the first day of that month.
pub fn parse_month_year(input: &str) -> Result<Date, DomainError> {
    let trimmed = input.trim();
    // `[year]` tolerates a sign, which a month never carries.
    if !trimmed.bytes().filter(|b| !b.is_ascii_digit()).eq([b'-']) {
        return Err(DomainError::validation(format!(
            "`{trimmed}` is not a MM-YYYY month"
        )));
    }

    Date::parse(&format!("01-{trimmed}"), DAY_MONTH_YEAR_FORMAT).map_err(|err| {
        DomainError::validation(format!("`{trimmed}` is not a MM-YYYY month: {err}"))
    })
}

/// Parse an ISO `YYYY-MM-DD` calendar date.
pub fn parse_iso_date(input: &str) -> Result<Date, DomainError> {
    let trimmed = input.trim();
    Date::parse(trimmed, ISO_DATE_FORMAT).map_err(|err| {
        DomainError::validation(format!("`{trimmed}` is not a YYYY-MM-DD date: {err}"))
    })
}

/// Render a date as `MM-YYYY`, discarding the day.
pub fn format_month_year(date: Date) -> String {
    date.format(MONTH_YEAR_FORMAT).expect("valid month-year")
}

/// ISO `YYYY-MM-DD` rendering used when a month is bound as a SQL `date`.
pub fn iso_date(date: Date) -> String {
    date.format(ISO_DATE_FORMAT).expect("valid calendar date")
}

/// Serde adapter for `Date` fields stored as `MM-YYYY`.
pub mod serde_month_year {
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};
    use time::Date;

    pub fn serialize<S>(date: &Date, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_month_year(*date))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Date, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_month_year(&raw).map_err(D::Error::custom)
    }

    pub mod option {
        use serde::{Deserialize, Deserializer, Serializer, de::Error as _};
        use time::Date;

        pub fn serialize<S>(date: &Option<Date>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match date {
                Some(date) => serializer.serialize_some(&super::super::format_month_year(*date)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Date>, D::Error>
        where
            D: Deserializer<'de>,
        {
            let raw = Option::<String>::deserialize(deserializer)?;
            raw.filter(|value| !value.trim().is_empty())
                .map(|value| super::super::parse_month_year(&value).map_err(D::Error::custom))
                .transpose()
        }
    }
}
