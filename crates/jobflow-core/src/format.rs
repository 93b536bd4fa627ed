//! Human-readable formatting for table output.

use chrono::{DateTime, Utc};

/// "just now", "5 minutes ago", ... relative to `now`. `None` means the
/// workflow never ran.
pub fn format_date_distance(date: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(date) = date else {
        return "Not executed yet".to_string();
    };

    let diff_mins = (now - date).num_minutes();
    let diff_hours = diff_mins / 60;
    let diff_days = diff_hours / 24;

    if diff_mins < 1 {
        "just now".to_string()
    } else if diff_mins < 60 {
        format!("{} minutes ago", diff_mins)
    } else if diff_hours < 24 {
        format!("{} hours ago", diff_hours)
    } else {
        format!("{} days ago", diff_days)
    }
}

/// Run interval as shown next to a workflow, e.g. "1 hours 30 minutes".
pub fn format_interval(minutes: i32) -> String {
    if minutes < 60 {
        return format!("{} minutes", minutes);
    }

    let hours = minutes / 60;
    let mins = minutes % 60;

    if mins == 0 {
        format!("{} hours", hours)
    } else {
        format!("{} hours {} minutes", hours, mins)
    }
}

/// Truncate a string to max_len characters, appending "..." if truncated.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn now() -> DateTime<Utc> {
        "2025-03-01T12:00:00Z".parse().unwrap()
    }

    #[test]
    fn date_distance_buckets() {
        assert_eq!(format_date_distance(None, now()), "Not executed yet");
        assert_eq!(
            format_date_distance(Some(now() - Duration::seconds(30)), now()),
            "just now"
        );
        assert_eq!(
            format_date_distance(Some(now() - Duration::minutes(5)), now()),
            "5 minutes ago"
        );
        assert_eq!(
            format_date_distance(Some(now() - Duration::minutes(125)), now()),
            "2 hours ago"
        );
        assert_eq!(
            format_date_distance(Some(now() - Duration::hours(50)), now()),
            "2 days ago"
        );
    }

    #[test]
    fn future_dates_read_as_just_now() {
        assert_eq!(
            format_date_distance(Some(now() + Duration::minutes(3)), now()),
            "just now"
        );
    }

    #[test]
    fn interval_formatting() {
        assert_eq!(format_interval(15), "15 minutes");
        assert_eq!(format_interval(60), "1 hours");
        assert_eq!(format_interval(90), "1 hours 30 minutes");
        assert_eq!(format_interval(1440), "24 hours");
    }

    #[test]
    fn truncate_string_short() {
        assert_eq!(truncate_string("hello", 10), "hello");
        assert_eq!(truncate_string("", 5), "");
    }

    #[test]
    fn truncate_string_long() {
        assert_eq!(truncate_string("hello world", 8), "hello...");
        assert_eq!(truncate_string("abc", 2), "...");
    }

    #[test]
    fn truncate_string_multibyte() {
        assert_eq!(truncate_string("Розробник React", 8), "Розро...");
    }
}
