//! Date attribute parsing.
//!
//! Accepted forms of a `date` attribute, all read in the build time zone:
//!
//! | Value | Meaning |
//! |-------|---------|
//! | `"2024-01-15T10:00:00+02:00"` | RFC 3339, converted into the zone |
//! | `"2024-01-15 10:00:00"` / `"2024-01-15T10:00:00"` | Local time in the zone |
//! | `"2024-01-15"` | Local midnight in the zone |
//! | `1705312800` | Unix timestamp |

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use serde_json::Value;

const LOCAL_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Parse a date attribute value into `tz`. Unknown shapes yield `None`.
pub fn parse_date(value: &Value, tz: Tz) -> Option<DateTime<Tz>> {
    match value {
        Value::String(s) => parse_date_str(s.trim(), tz),
        Value::Number(n) => n
            .as_i64()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .map(|utc| utc.with_timezone(&tz)),
        _ => None,
    }
}

fn parse_date_str(s: &str, tz: Tz) -> Option<DateTime<Tz>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&tz));
    }

    let naive = LOCAL_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })?;

    tz.from_local_datetime(&naive).earliest()
}
