//! Timestamp utilities

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Convert fractional seconds to a duration; negative and NaN inputs yield zero
pub fn secs_to_duration(seconds: f64) -> Duration {
    if seconds.is_finite() && seconds > 0.0 {
        Duration::from_secs_f64(seconds)
    } else {
        Duration::ZERO
    }
}

/// True when two presentation times are within `tolerance` seconds
pub fn within(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() < tolerance
}

/// Format presentation seconds for log lines (`M:SS.mmm`, or `live` for infinity)
pub fn format_position(seconds: f64) -> String {
    if !seconds.is_finite() {
        return "live".to_string();
    }
    let sign = if seconds < 0.0 { "-" } else { "" };
    let total_ms = (seconds.abs() * 1000.0).round() as u64;
    let minutes = total_ms / 60_000;
    let secs = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;
    format!("{}{}:{:02}.{:03}", sign, minutes, secs, millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_returns_valid_timestamp() {
        let timestamp = now();
        // Should be a reasonable timestamp (after year 2000)
        assert!(timestamp.timestamp() > 946_684_800);
    }

    #[test]
    fn test_secs_to_duration() {
        assert_eq!(secs_to_duration(0.25), Duration::from_millis(250));
        assert_eq!(secs_to_duration(-1.0), Duration::ZERO);
        assert_eq!(secs_to_duration(f64::NAN), Duration::ZERO);
    }

    #[test]
    fn test_within() {
        assert!(within(1.0, 1.0005, 0.001));
        assert!(!within(1.0, 1.002, 0.001));
    }

    #[test]
    fn test_format_position() {
        assert_eq!(format_position(0.0), "0:00.000");
        assert_eq!(format_position(75.25), "1:15.250");
        assert_eq!(format_position(-2.5), "-0:02.500");
        assert_eq!(format_position(f64::INFINITY), "live");
    }
}
