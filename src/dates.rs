//! Lenient parsing of the dates the API sends.
//!
//! Depending on the server's Jackson settings a date arrives as `yyyy-MM-dd`,
//! as an ISO-8601 date-time, or as epoch milliseconds. Payments keep the raw
//! value and parse on demand, so a malformed date only drops that payment
//! from date-based computations.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer};

/// Parses an API date into a calendar date in the local time zone.
/// Returns `None` when the value is unparseable.
pub fn parse_api_date(raw: &str) -> Option<NaiveDate> {
    parse_api_date_in(raw, &Local)
}

/// Parses an API date, placing instants (epoch millis, date-times with an offset) in `tz`.
/// Plain dates and date-times without an offset are taken as they are.
pub fn parse_api_date_in<Tz: TimeZone>(raw: &str, tz: &Tz) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if raw.bytes().all(|b| b.is_ascii_digit()) {
        let millis: i64 = raw.parse().ok()?;
        return DateTime::<Utc>::from_timestamp_millis(millis)
            .map(|dt| dt.with_timezone(tz).date_naive());
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(tz).date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt.with_timezone(tz).date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.date());
    }

    None
}

/// Deserializes a date field that may be a string, a number of milliseconds or null.
/// Any other shape deserializes to an empty string, which never parses as a date.
pub(crate) fn raw_date<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawDate {
        Text(String),
        Millis(i64),
        Float(f64),
        Missing(()),
        Other(IgnoredAny),
    }

    Ok(match RawDate::deserialize(deserializer)? {
        RawDate::Text(text) => text,
        RawDate::Millis(millis) => millis.to_string(),
        RawDate::Float(millis) if millis.is_finite() && millis >= 0.0 => {
            (millis.trunc() as i64).to_string()
        }
        RawDate::Float(_) | RawDate::Missing(()) | RawDate::Other(_) => String::new(),
    })
}
