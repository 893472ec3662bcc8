//! Clock-style time formatting for status displays
//!
//! Provides consistent `mm:ss` display of track positions and lengths.

use std::time::Duration;

/// Format seconds as `mm:ss`.
///
/// Minutes are zero-padded to two digits and grow past 99 for very long
/// tracks. Fractions are truncated. Negative and non-finite input is shown
/// as `00:00`.
///
/// # Examples
///
/// ```
/// use jukebot_common::human_time::format_clock;
///
/// assert_eq!(format_clock(0.0), "00:00");
/// assert_eq!(format_clock(65.9), "01:05");
/// assert_eq!(format_clock(3600.0), "60:00");
/// assert_eq!(format_clock(-3.0), "00:00");
/// ```
pub fn format_clock(total_seconds: f64) -> String {
    let total = if total_seconds.is_finite() && total_seconds > 0.0 {
        total_seconds.floor() as u64
    } else {
        0
    };
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// Convert milliseconds to duration
pub fn millis_to_duration(millis: u64) -> Duration {
    Duration::from_millis(millis)
}
