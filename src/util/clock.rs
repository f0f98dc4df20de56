//! Wall-clock helpers shared by the queue, the poller and job handlers.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Format used for completion timestamps: date, time and milliseconds.
pub const TIMESTAMP_FORMAT: &str = "%F - %H:%M:%S%.3f";

/// Current UTC time.
#[must_use]
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Render a timestamp with millisecond precision.
#[must_use]
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Add a std duration to a timestamp, saturating at the maximum representable time.
#[must_use]
pub fn add_duration(at: DateTime<Utc>, delay: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(delay)
        .ok()
        .and_then(|d| at.checked_add_signed(d))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
