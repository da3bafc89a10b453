//! Rest time between consecutive sets

use chrono::{DateTime, Utc};

/// Rest is capped at three minutes
pub const MAX_REST_SECONDS: u32 = 180;

/// Seconds from `prev` to `next`, clamped to [0, MAX_REST_SECONDS]
pub fn rest_between(prev: DateTime<Utc>, next: DateTime<Utc>) -> u32 {
    let secs = (next - prev).num_seconds();
    secs.clamp(0, MAX_REST_SECONDS as i64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn create_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_rest_within_cap() {
        let t = create_time();
        assert_eq!(rest_between(t, t + Duration::seconds(95)), 95);
    }

    #[test]
    fn test_rest_clamped_to_cap() {
        let t = create_time();
        assert_eq!(rest_between(t, t + Duration::minutes(5)), MAX_REST_SECONDS);
        assert_eq!(rest_between(t, t + Duration::days(2)), MAX_REST_SECONDS);
    }

    #[test]
    fn test_rest_never_negative() {
        let t = create_time();
        assert_eq!(rest_between(t, t - Duration::seconds(30)), 0);
        assert_eq!(rest_between(t, t), 0);
    }
}
