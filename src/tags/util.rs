//! tags/util.rs
//! Small time helpers shared by chapter building and reporting.

use std::time::Duration;

/// ID3 chapter times are u32 milliseconds; longer durations saturate.
pub(crate) fn duration_to_millis(d: Duration) -> u32 {
    u32::try_from(d.as_millis()).unwrap_or(u32::MAX)
}

/// Render a duration as `HH:MM:SS`, rounded to the nearest second.
/// Examples:
/// - 59.4s -> "00:00:59"
/// - 59.5s -> "00:01:00"
pub fn format_timestamp(d: Duration) -> String {
    let secs = (d.as_millis() + 500) / 1000;
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_and_rounds() {
        assert_eq!(format_timestamp(Duration::ZERO), "00:00:00");
        assert_eq!(format_timestamp(Duration::from_millis(59_400)), "00:00:59");
        assert_eq!(format_timestamp(Duration::from_millis(59_500)), "00:01:00");
        assert_eq!(format_timestamp(Duration::from_secs(3 * 3600 + 62)), "03:01:02");
    }

    #[test]
    fn millis_saturate() {
        assert_eq!(duration_to_millis(Duration::from_millis(1234)), 1234);
        assert_eq!(duration_to_millis(Duration::from_secs(u64::MAX / 1000)), u32::MAX);
    }
}
