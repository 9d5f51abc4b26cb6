use std::convert::TryFrom;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

pub fn to_usize(value: i64, field: &str) -> Result<usize> {
    usize::try_from(value).map_err(|_| anyhow!("{field} contains negative value {value}"))
}

/// Fixed-width RFC 3339 so that text ordering in SQLite matches time ordering.
pub fn format_datetime(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn format_day(value: &NaiveDate) -> String {
    value.format("%Y-%m-%d").to_string()
}

pub fn parse_datetime(value: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("failed to parse {field}"))
}

/// Surfaces a parse failure from inside a `query_map` row closure.
pub fn conversion_error(err: anyhow::Error) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        rusqlite::types::Type::Text,
        Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            err.to_string(),
        )),
    )
}
