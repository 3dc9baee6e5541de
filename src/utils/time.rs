use chrono::{Duration, SecondsFormat, Utc};

/// Timestamps are stored as fixed-width RFC 3339 UTC strings so that
/// lexicographic comparison in queries matches chronological order.
pub fn time_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn time_now_plus_days(days: i64) -> String {
    (Utc::now() + Duration::days(days)).to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn time_now_plus_hours(hours: i64) -> String {
    (Utc::now() + Duration::hours(hours)).to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn time_now_minus_days(days: i64) -> String {
    (Utc::now() - Duration::days(days)).to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_matches_lexicographic() {
        let past = time_now_minus_days(1);
        let now = time_now();
        let future = time_now_plus_days(7);
        assert!(past < now);
        assert!(now < future);
    }
}
