//! Time parsing utilities for scheduler output.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;
use thiserror::Error;

/// Timestamp format used by SLURM (`2024-01-15T10:30:00`).
pub const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// `[days-]HH:MM:SS`, days optional.
static DURATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:(\d+)-)?(\d+):(\d{2}):(\d{2})$").expect("valid regex"));

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimeParseError {
    #[error("Malformed date: {0:?}")]
    MalformedDate(String),
    #[error("Malformed duration: {0:?}")]
    MalformedDuration(String),
}

/// Parse a SLURM timestamp (YYYY-MM-DDTHH:MM:SS), read as UTC.
pub fn parse_date(s: &str) -> Result<DateTime<Utc>, TimeParseError> {
    NaiveDateTime::parse_from_str(s.trim(), DATE_FORMAT)
        .ok()
        .and_then(|dt| Utc.from_local_datetime(&dt).single())
        .ok_or_else(|| TimeParseError::MalformedDate(s.to_string()))
}

/// Parse a timestamp field that may hold a placeholder.
///
/// Returns `Ok(None)` for "N/A", "Unknown", "None" and empty strings; any
/// other value must be a well-formed date.
pub fn parse_optional_date(s: &str) -> Result<Option<DateTime<Utc>>, TimeParseError> {
    if crate::is_placeholder(s.trim()) {
        return Ok(None);
    }
    parse_date(s).map(Some)
}

/// Format a timestamp the way SLURM prints it.
pub fn format_date(dt: &DateTime<Utc>) -> String {
    dt.format(DATE_FORMAT).to_string()
}

/// Parse a SLURM duration (`[days-]HH:MM:SS`).
///
/// The day prefix is optional and may have any number of digits.
pub fn parse_duration(s: &str) -> Result<Duration, TimeParseError> {
    let caps = DURATION_RE
        .captures(s.trim())
        .ok_or_else(|| TimeParseError::MalformedDuration(s.to_string()))?;

    let field = |i: usize| -> Result<u64, TimeParseError> {
        caps.get(i)
            .map_or(Ok(0), |m| m.as_str().parse::<u64>())
            .map_err(|_| TimeParseError::MalformedDuration(s.to_string()))
    };

    let (days, hours, mins, secs) = (field(1)?, field(2)?, field(3)?, field(4)?);
    if mins >= 60 || secs >= 60 {
        return Err(TimeParseError::MalformedDuration(s.to_string()));
    }

    days.checked_mul(86400)
        .zip(hours.checked_mul(3600))
        .and_then(|(d, h)| d.checked_add(h))
        .and_then(|total| total.checked_add(mins * 60 + secs))
        .map(Duration::from_secs)
        .ok_or_else(|| TimeParseError::MalformedDuration(s.to_string()))
}

/// Format seconds as human-readable duration (e.g., "1d 02:30:00", "01:30:00", "05:30").
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let mins = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours >= 24 {
        let days = hours / 24;
        let hours = hours % 24;
        format!("{}d {:02}:{:02}:{:02}", days, hours, mins, secs)
    } else if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, mins, secs)
    } else {
        format!("{:02}:{:02}", mins, secs)
    }
}

/// Format seconds as SLURM duration format (D-HH:MM:SS).
pub fn format_duration_slurm(seconds: u64) -> String {
    let days = seconds / 86400;
    let hours = (seconds % 86400) / 3600;
    let mins = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if days > 0 {
        format!("{}-{:02}:{:02}:{:02}", days, hours, mins, secs)
    } else {
        format!("{:02}:{:02}:{:02}", hours, mins, secs)
    }
}
