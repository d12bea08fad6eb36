//! Shared utility functions for AQI crates.

/// Hourly timestamp utility functions
pub mod dates {
    use chrono::{Datelike, NaiveDateTime, Timelike};

    /// Hourly timestamp format used by the upstream providers and the
    /// feature store: "YYYY-MM-DDTHH:MM"
    pub const HOUR_FORMAT: &str = "%Y-%m-%dT%H:%M";

    /// Format a timestamp as "YYYY-MM-DDTHH:MM"
    pub fn format_hour(timestamp: &NaiveDateTime) -> String {
        timestamp.format(HOUR_FORMAT).to_string()
    }

    /// Parse a timestamp string in "YYYY-MM-DDTHH:MM" format.
    ///
    /// A trailing seconds component ("YYYY-MM-DDTHH:MM:SS") is accepted too,
    /// which is how some providers report the same instant.
    pub fn parse_hour(s: &str) -> anyhow::Result<NaiveDateTime> {
        let trimmed = s.trim();
        match NaiveDateTime::parse_from_str(trimmed, HOUR_FORMAT) {
            Ok(ts) => Ok(ts),
            Err(_) => Ok(NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S")?),
        }
    }

    /// Calendar fields (hour, day, month) of a timestamp.
    ///
    /// hour is in 0..=23, day in 1..=31, month in 1..=12.
    pub fn calendar_fields(timestamp: &NaiveDateTime) -> (u32, u32, u32) {
        (timestamp.hour(), timestamp.day(), timestamp.month())
    }

}
