use chrono::{DateTime, NaiveDateTime, Utc};
use thiserror::Error;

/// Watermark used when no entry has ever been published.
pub const MIN_TIMESTAMP: DateTime<Utc> = DateTime::<Utc>::MIN_UTC;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimestampError {
    #[error("entry has no updated timestamp")]
    Missing,
    #[error("unparseable timestamp {0:?}")]
    Invalid(String),
}

/// Offset-less layouts, read as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// Parse a feed or state-file timestamp into UTC.
///
/// Accepts RFC 3339 / ISO 8601 (Atom, state file) and RFC 2822 (RSS). A
/// timestamp without an offset is taken to be UTC so every value stays
/// comparable with the watermark.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, TimestampError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(TimestampError::Missing);
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Ok(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = DateTime::parse_from_rfc2822(text) {
        return Ok(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = DateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Ok(parsed.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = chrono::NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }

    Err(TimestampError::Invalid(text.to_string()))
}
