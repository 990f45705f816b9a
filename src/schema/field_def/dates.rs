//! Module for handling timestamp parsing for date fields.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::config::DateFormatConfig;

/// Parse an ISO-8601 style timestamp with multiple format attempts
///
/// RFC 3339 is tried first, then the configured naive date-time formats
/// (read as UTC), then the plain date formats (read as midnight UTC).
#[must_use]
pub fn parse_timestamp(s: &str, config: &DateFormatConfig) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(s) {
        return Some(parsed.with_timezone(&Utc));
    }

    for format in &config.datetime_formats {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(s, format) {
            return Some(Utc.from_utc_datetime(&parsed));
        }
    }

    for format in &config.date_formats {
        if let Some(date) = parse_date(s, format) {
            return Some(date);
        }
    }

    if config.enable_format_detection {
        if let Some(detected_format) = detect_date_format(s) {
            return parse_date(s, detected_format);
        }
    }

    None
}

fn parse_date(s: &str, format: &str) -> Option<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(s, format).ok()?;
    Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?))
}

/// Try to detect the date format based on string patterns
#[must_use]
pub fn detect_date_format(s: &str) -> Option<&'static str> {
    // Year-first with slashes (YYYY/MM/DD)
    if s.len() == 10 && s.chars().nth(4) == Some('/') && s.chars().nth(7) == Some('/') {
        return Some("%Y/%m/%d");
    }

    // Dotted day-first (DD.MM.YYYY)
    if s.contains('.') {
        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() == 3 && parts[2].len() == 4 {
            return Some("%d.%m.%Y");
        }
    }

    // No recognized format
    None
}
