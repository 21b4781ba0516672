//! Time formatting and duration conversion utilities.

use std::time::Duration;

/// Format a playback position as `MM:SS`.
///
/// Seconds are floor-truncated, never rounded. Both fields are zero-padded
/// to two digits; minutes grow past two digits for songs over an hour
/// (`6000s` renders as `"100:00"`).
#[must_use]
pub fn format_timestamp(position: Duration) -> String {
    let total_secs = position.as_secs();
    let minutes = total_secs / 60;
    let seconds = total_secs % 60;
    format!("{minutes:02}:{seconds:02}")
}

/// Extension trait for safe Duration construction from wire values.
pub trait DurationExt {
    /// Build a duration from fractional seconds, sanitizing invalid input.
    ///
    /// NaN, infinite, and negative values all clamp to zero.
    fn from_secs_sanitized(secs: f64) -> Duration;
}

impl DurationExt for Duration {
    fn from_secs_sanitized(secs: f64) -> Duration {
        if secs.is_finite() && secs > 0.0 {
            Duration::from_secs_f64(secs)
        } else {
            Duration::ZERO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_timestamp_zero() {
        assert_eq!(format_timestamp(Duration::ZERO), "00:00");
    }

    #[test]
    fn test_format_timestamp_minutes_and_seconds() {
        assert_eq!(format_timestamp(Duration::from_secs(65)), "01:05");
    }

    #[test]
    fn test_format_timestamp_last_second_of_hour() {
        assert_eq!(format_timestamp(Duration::from_secs(3599)), "59:59");
    }

    #[test]
    fn test_format_timestamp_truncates_fraction() {
        // 5.9s floors to 5, never rounds to 6
        assert_eq!(format_timestamp(Duration::from_millis(5900)), "00:05");
    }

    #[test]
    fn test_format_timestamp_over_an_hour() {
        assert_eq!(format_timestamp(Duration::from_secs(6000)), "100:00");
    }

    #[test]
    fn test_from_secs_sanitized_valid() {
        assert_eq!(
            Duration::from_secs_sanitized(2.5),
            Duration::from_millis(2500)
        );
    }

    #[test]
    fn test_from_secs_sanitized_invalid() {
        assert_eq!(Duration::from_secs_sanitized(-1.0), Duration::ZERO);
        assert_eq!(Duration::from_secs_sanitized(f64::NAN), Duration::ZERO);
        assert_eq!(Duration::from_secs_sanitized(f64::INFINITY), Duration::ZERO);
    }
}
