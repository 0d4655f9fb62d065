//! Display formatting helpers for dashboard values.
//!
//! Mirrors what the dashboard tables render: compact durations,
//! percentages, shortened counts and relative timestamps.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Parses a timestamp leniently. RFC 3339 is tried first, then a bare
/// datetime or date without offset (treated as UTC). Anything else yields
/// `None` rather than an error.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = value.parse::<NaiveDateTime>() {
        return Some(Utc.from_utc_datetime(&naive));
    }
    value
        .parse::<NaiveDate>()
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Formats a millisecond duration for display, switching to seconds with
/// one decimal at a full second.
pub fn format_response_time(ms: f64) -> String {
    if ms < 1000.0 {
        format!("{ms}ms")
    } else {
        format!("{:.1}s", ms / 1000.0)
    }
}

/// Formats an error-rate fraction as a percentage with one decimal.
pub fn format_error_rate(rate: f64) -> String {
    format!("{:.1}%", rate * 100.0)
}

/// Shortens a request count to `K`/`M` units above a thousand.
pub fn format_request_count(count: u64) -> String {
    if count >= 1_000_000 {
        format!("{:.1}M", count as f64 / 1_000_000.0)
    } else if count >= 1000 {
        format!("{:.1}K", count as f64 / 1000.0)
    } else {
        count.to_string()
    }
}

/// Renders a timestamp relative to `now` ("Just now", "5m ago", "3h ago",
/// "2d ago"), switching to a short date after a week. The year is shown
/// only when it differs from the current one. Unparseable input renders as
/// "Unknown".
pub fn format_relative_time(timestamp: &str, now: DateTime<Utc>) -> String {
    let Some(then) = parse_timestamp(timestamp) else {
        return "Unknown".to_string();
    };

    let minutes = (now - then).num_minutes();
    if minutes < 1 {
        return "Just now".to_string();
    }
    if minutes < 60 {
        return format!("{minutes}m ago");
    }
    if minutes < 1440 {
        return format!("{}h ago", minutes / 60);
    }
    if minutes < 10080 {
        return format!("{}d ago", minutes / 1440);
    }

    if then.year() == now.year() {
        then.format("%b %-d").to_string()
    } else {
        then.format("%b %-d, %Y").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn response_times_stay_in_millis_below_a_second() {
        assert_eq!(format_response_time(50.0), "50ms");
        assert_eq!(format_response_time(112.5), "112.5ms");
        assert_eq!(format_response_time(999.0), "999ms");
    }

    #[test]
    fn response_times_switch_to_seconds() {
        assert_eq!(format_response_time(1000.0), "1.0s");
        assert_eq!(format_response_time(1500.0), "1.5s");
        assert_eq!(format_response_time(2345.0), "2.3s");
    }

    #[test]
    fn error_rates_render_as_percentages() {
        assert_eq!(format_error_rate(0.0), "0.0%");
        assert_eq!(format_error_rate(0.05), "5.0%");
        assert_eq!(format_error_rate(0.123), "12.3%");
        assert_eq!(format_error_rate(1.0), "100.0%");
    }

    #[test]
    fn request_counts_shorten_above_a_thousand() {
        assert_eq!(format_request_count(0), "0");
        assert_eq!(format_request_count(999), "999");
        assert_eq!(format_request_count(1000), "1.0K");
        assert_eq!(format_request_count(1500), "1.5K");
        assert_eq!(format_request_count(1_000_000), "1.0M");
        assert_eq!(format_request_count(2_500_000), "2.5M");
    }

    #[test]
    fn relative_times_bucket_by_age() {
        let now = fixed_now();
        assert_eq!(format_relative_time("2024-03-15T11:59:30Z", now), "Just now");
        assert_eq!(format_relative_time("2024-03-15T11:55:00Z", now), "5m ago");
        assert_eq!(format_relative_time("2024-03-15T09:00:00Z", now), "3h ago");
        assert_eq!(format_relative_time("2024-03-13T12:00:00Z", now), "2d ago");
    }

    #[test]
    fn relative_times_switch_to_dates_after_a_week() {
        let now = fixed_now();
        assert_eq!(format_relative_time("2024-03-01T10:00:00Z", now), "Mar 1");
        assert_eq!(format_relative_time("2023-12-25T10:00:00Z", now), "Dec 25, 2023");
    }

    #[test]
    fn future_and_unparseable_timestamps_stay_calm() {
        let now = fixed_now();
        assert_eq!(format_relative_time("2024-03-15T12:30:00Z", now), "Just now");
        assert_eq!(format_relative_time("not-a-timestamp", now), "Unknown");
        assert_eq!(format_relative_time("", now), "Unknown");
    }

    #[test]
    fn timestamps_parse_with_and_without_offsets() {
        assert!(parse_timestamp("2024-03-01T10:00:00Z").is_some());
        assert!(parse_timestamp("2024-03-01T10:00:00+02:00").is_some());
        assert!(parse_timestamp("2024-03-01T10:00:00").is_some());
        assert!(parse_timestamp("2024-03-01").is_some());
        assert!(parse_timestamp("yesterday").is_none());

        let with_offset = parse_timestamp("2024-03-01T10:00:00+02:00").unwrap();
        let utc = parse_timestamp("2024-03-01T08:00:00Z").unwrap();
        assert_eq!(with_offset, utc);
    }
}
