//! Time-boxed challenge rounds
//!
//! A round number identifies one time box of a recurring challenge:
//! - Daily: days since the Unix epoch (UTC)
//! - Weekly: weeks since the first Monday after the epoch
//! - Once: always round 1

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};

const SECS_PER_DAY: i64 = 24 * 60 * 60;
/// 1970-01-01 was a Thursday; the first Monday is four days later
const FIRST_MONDAY_OFFSET_DAYS: i64 = 4;

/// How often a challenge resets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChallengePeriod {
    #[default]
    Daily,
    Weekly,
    Once,
}

impl ChallengePeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Once => "once",
        }
    }
}

/// Round number for `period` at time `now`
pub fn round_for(period: ChallengePeriod, now: DateTime<Utc>) -> u32 {
    let days = now.timestamp().div_euclid(SECS_PER_DAY);
    let round = match period {
        ChallengePeriod::Daily => days,
        ChallengePeriod::Weekly => (days - FIRST_MONDAY_OFFSET_DAYS).div_euclid(7),
        ChallengePeriod::Once => 1,
    };
    u32::try_from(round).unwrap_or(0)
}

/// Start of the round containing `now`
pub fn round_start(period: ChallengePeriod, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let midnight = now.date_naive().and_hms_opt(0, 0, 0)?.and_utc();
    match period {
        ChallengePeriod::Daily => Some(midnight),
        ChallengePeriod::Weekly => {
            let since_monday = i64::from(now.weekday().num_days_from_monday());
            Some(midnight - Duration::days(since_monday))
        }
        ChallengePeriod::Once => None,
    }
}

/// Time left until the round rolls over; `None` for one-time challenges
pub fn time_until_next_round(period: ChallengePeriod, now: DateTime<Utc>) -> Option<Duration> {
    let start = round_start(period, now)?;
    let length = match period {
        ChallengePeriod::Daily => Duration::days(1),
        ChallengePeriod::Weekly => Duration::weeks(1),
        ChallengePeriod::Once => return None,
    };
    Some(start + length - now)
}

/// Day bucket string ("YYYY-MM-DD") for display next to a round
pub fn day_bucket(at: DateTime<Utc>) -> String {
    format!("{:04}-{:02}-{:02}", at.year(), at.month(), at.day())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_daily_round_changes_at_midnight() {
        let late = Utc.with_ymd_and_hms(2026, 10, 19, 23, 59, 59).unwrap();
        let next = Utc.with_ymd_and_hms(2026, 10, 20, 0, 0, 0).unwrap();
        assert_eq!(
            round_for(ChallengePeriod::Daily, next),
            round_for(ChallengePeriod::Daily, late) + 1
        );
    }

    #[test]
    fn test_weekly_round_changes_on_monday() {
        // 2026-10-18 is a Sunday
        let sunday = Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap();
        let monday = Utc.with_ymd_and_hms(2026, 10, 19, 0, 0, 0).unwrap();
        let tuesday = Utc.with_ymd_and_hms(2026, 10, 20, 9, 0, 0).unwrap();

        let week = round_for(ChallengePeriod::Weekly, monday);
        assert_eq!(round_for(ChallengePeriod::Weekly, sunday) + 1, week);
        assert_eq!(round_for(ChallengePeriod::Weekly, tuesday), week);
        assert_eq!(round_start(ChallengePeriod::Weekly, tuesday), Some(monday));
    }

    #[test]
    fn test_once_is_constant() {
        let now = Utc::now();
        assert_eq!(round_for(ChallengePeriod::Once, now), 1);
        assert_eq!(time_until_next_round(ChallengePeriod::Once, now), None);
    }

    #[test]
    fn test_time_until_next_daily_round() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 18, 30, 0).unwrap();
        assert_eq!(
            time_until_next_round(ChallengePeriod::Daily, now),
            Some(Duration::minutes(330))
        );
    }

    #[test]
    fn test_day_bucket() {
        // 2023-12-28 12:34:56 UTC
        let ts = DateTime::from_timestamp_millis(1703766896000).unwrap();
        assert_eq!(day_bucket(ts), "2023-12-28");
    }
}
