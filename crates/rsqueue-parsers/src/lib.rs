//! Shared parsing utilities for scheduler output and simulation logs.
//!
//! This crate holds the leaf pieces used by the scheduler and progress
//! crates: timestamp/duration parsing, bounded file reads, byte-size
//! formatting and subprocess execution.

pub mod command;
pub mod size;
pub mod tail;
pub mod time;

pub use command::{CommandError, run_command, run_command_with_timeout};
pub use size::to_human;
pub use tail::{Head, head, tail};
pub use time::{
    DATE_FORMAT, TimeParseError, format_date, format_duration, format_duration_slurm, parse_date,
    parse_duration, parse_optional_date,
};

/// Filter helper for optional string fields.
/// Returns None if the string is empty or a placeholder value.
pub fn non_empty_string(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if is_placeholder(trimmed) {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Whether a scheduler field holds one of its "no value" markers.
pub fn is_placeholder(s: &str) -> bool {
    matches!(s, "" | "-" | "N/A" | "Unknown" | "None" | "(null)")
}
