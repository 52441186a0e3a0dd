//! Record identifiers and timestamps.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use uuid::Uuid;

/// A UTC instant. Serialized as RFC 3339 with a `Z` suffix.
pub type Timestamp = DateTime<Utc>;

/// Returns the current instant.
pub fn now() -> Timestamp {
    Utc::now()
}

/// Returns the Unix epoch, used as the timestamp of records that carry none.
pub fn epoch() -> Timestamp {
    DateTime::<Utc>::default()
}

/// Generates a record id of the form `{prefix}-{base36 millis}{suffix}`.
///
/// The millisecond part keeps ids roughly time-ordered; the random suffix
/// makes two ids generated in the same millisecond collision-improbable.
pub fn generate_id(prefix: &str) -> String {
    let millis = u64::try_from(now().timestamp_millis()).unwrap_or_default();
    let random = Uuid::new_v4().simple().to_string();
    format!("{prefix}-{}{}", to_base36(millis), &random[..6])
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    out.into_iter().map(char::from).collect()
}

/// Parses a stored or remote timestamp.
///
/// Accepts RFC 3339 with any offset, timestamps without an offset (taken as
/// UTC, as Postgres `timestamp` columns are returned) and bare dates.
pub fn parse_timestamp(input: &str) -> Option<Timestamp> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(input) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Formats a timestamp the way it is stored.
pub fn format_timestamp(ts: &Timestamp) -> String {
    ts.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
