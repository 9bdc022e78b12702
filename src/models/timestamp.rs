//! ISO 8601 timestamps as the frontend sends them: with or without a zone
//! offset, with or without seconds, or as a bare date.
//!
//! The serde helpers below are used through `deserialize_with` on request
//! bodies; each one names its wire field so a bad value is reported as
//! `"<field> must be a valid ISO 8601 date string"`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{de, Deserialize, Deserializer};

use crate::error::AppError;

/// Accepts RFC 3339 timestamps, zone-less `YYYY-MM-DDTHH:MM[:SS[.fff]]`
/// (read as UTC) and bare `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_date_bound(field: &str, raw: &str) -> Result<DateTime<Utc>, AppError> {
    let raw = raw.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }

    Err(AppError::Validation(format!(
        "{field} must be a valid ISO 8601 date string"
    )))
}

fn field<'de, D>(deserializer: D, name: &str) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date_bound(name, &raw).map_err(de::Error::custom)
}

fn optional_field<'de, D>(deserializer: D, name: &str) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) => parse_date_bound(name, &raw)
            .map(Some)
            .map_err(de::Error::custom),
        None => Ok(None),
    }
}

pub(crate) fn start_time<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    field(deserializer, "startTime")
}

pub(crate) fn end_time<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    field(deserializer, "endTime")
}

pub(crate) fn optional_start_time<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    optional_field(deserializer, "startTime")
}

pub(crate) fn optional_end_time<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    optional_field(deserializer, "endTime")
}
