//! Date/time utilities for filevault.
//!
//! Timestamps are stored by SQLite as UTC text (`YYYY-MM-DD HH:MM:SS`) and
//! handed to callers in that same layout.

use chrono::{DateTime, NaiveDateTime, Utc};

/// Storage and wire format for timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse a stored timestamp (SQLite format or RFC3339) as UTC.
pub fn parse_timestamp(datetime_str: &str) -> Option<DateTime<Utc>> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(datetime_str, TIMESTAMP_FORMAT) {
        return Some(naive.and_utc());
    }

    // Fractional seconds, as written by strftime('%f')
    if let Ok(naive) = NaiveDateTime::parse_from_str(datetime_str, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(naive.and_utc());
    }

    DateTime::parse_from_rfc3339(datetime_str)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Normalize a stored timestamp to `YYYY-MM-DD HH:MM:SS`.
///
/// Returns the input unchanged if it cannot be parsed.
pub fn format_timestamp(datetime_str: &str) -> String {
    parse_timestamp(datetime_str)
        .map(|dt| dt.format(TIMESTAMP_FORMAT).to_string())
        .unwrap_or_else(|| datetime_str.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_sqlite_timestamp() {
        let dt = parse_timestamp("2024-01-15 10:30:00").unwrap();
        assert_eq!(dt.year(), 2024);
        assert_eq!(dt.hour(), 10);
        assert_eq!(dt.minute(), 30);
    }

    #[test]
    fn test_parse_rfc3339_timestamp() {
        let dt = parse_timestamp("2024-01-15T10:30:00+09:00").unwrap();
        assert_eq!(dt.hour(), 1);
    }

    #[test]
    fn test_parse_invalid_timestamp() {
        assert!(parse_timestamp("not a date").is_none());
    }

    #[test]
    fn test_format_timestamp_drops_fraction() {
        assert_eq!(
            format_timestamp("2024-01-15 10:30:00.123"),
            "2024-01-15 10:30:00"
        );
        assert_eq!(format_timestamp("2024-01-15 10:30:00"), "2024-01-15 10:30:00");
    }

    #[test]
    fn test_format_timestamp_invalid_passthrough() {
        assert_eq!(format_timestamp("garbage"), "garbage");
    }
}
