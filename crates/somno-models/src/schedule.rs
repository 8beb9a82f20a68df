//! Publish-time scheduling.
//!
//! Uploads are scheduled for a fixed local hour in Japan Standard Time.
//! If the run starts after that hour has already passed, the publish
//! time rolls over to the same hour the next day.

use chrono::{DateTime, Duration, FixedOffset};

/// Default publish hour (20:00 JST).
pub const PUBLISH_HOUR_JST: u32 = 20;

/// Japan Standard Time (UTC+9).
pub fn jst() -> FixedOffset {
    FixedOffset::east_opt(9 * 3600).expect("JST offset is valid")
}

/// Compute the next publish timestamp: today at `publish_hour:00` if that
/// is still in the future, otherwise the same time tomorrow.
pub fn next_publish_at(now: DateTime<FixedOffset>, publish_hour: u32) -> DateTime<FixedOffset> {
    let mut publish = now
        .date_naive()
        .and_hms_opt(publish_hour, 0, 0)
        .expect("publish hour is a valid time")
        .and_local_timezone(now.timezone())
        .single()
        .expect("fixed offsets have no DST gaps");

    if now >= publish {
        publish += Duration::days(1);
    }
    publish
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<FixedOffset> {
        jst().with_ymd_and_hms(2026, 8, 5, hour, minute, 0).unwrap()
    }

    #[test]
    fn test_morning_run_publishes_same_day() {
        let publish = next_publish_at(at(10, 0), PUBLISH_HOUR_JST);
        assert_eq!(publish, at(20, 0));
    }

    #[test]
    fn test_evening_run_rolls_to_next_day() {
        let publish = next_publish_at(at(21, 0), PUBLISH_HOUR_JST);
        assert_eq!(publish, at(20, 0) + Duration::days(1));
    }

    #[test]
    fn test_exact_publish_hour_rolls_over() {
        let publish = next_publish_at(at(20, 0), PUBLISH_HOUR_JST);
        assert_eq!(publish, at(20, 0) + Duration::days(1));
    }
}
