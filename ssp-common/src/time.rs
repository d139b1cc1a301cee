//! Timestamp utilities

use chrono::{DateTime, Utc};

/// Timestamp format used in external store rows
///
/// Matches the sheet's existing column convention; timestamps are UTC.
pub const ROW_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Format a timestamp for an external store row (`YYYY-MM-DD HH:MM:SS`, UTC)
pub fn format_row_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format(ROW_TIMESTAMP_FORMAT).to_string()
}

/// Convert milliseconds to duration
pub fn millis_to_duration(millis: u64) -> std::time::Duration {
    std::time::Duration::from_millis(millis)
}
