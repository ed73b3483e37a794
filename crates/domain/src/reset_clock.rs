//! Daily and weekly reset boundaries.
//!
//! The game resets daily content at 08:00 UTC and weekly content on
//! Wednesday at 08:00 UTC. Every function here is a pure function of `now`;
//! callers get `now` from the engine's clock port.

use chrono::{DateTime, Datelike, Duration, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};

/// Hour of day (UTC) at which resets happen.
pub const RESET_HOUR: i64 = 8;

/// Weekday on which the weekly reset happens.
pub const RESET_WEEKDAY: Weekday = Weekday::Wed;

// =============================================================================
// Reset Cadence
// =============================================================================

/// How often a tracked entry becomes available again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResetCadence {
    Daily,
    Weekly,
}

impl ResetCadence {
    pub fn display_name(&self) -> &'static str {
        match self {
            ResetCadence::Daily => "daily",
            ResetCadence::Weekly => "weekly",
        }
    }
}

impl std::fmt::Display for ResetCadence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

// =============================================================================
// Boundaries
// =============================================================================

/// Today's reset instant (08:00 UTC on the calendar day of `now`).
fn reset_on_day_of(now: DateTime<Utc>) -> DateTime<Utc> {
    let since_midnight = Duration::seconds(i64::from(now.num_seconds_from_midnight()))
        + Duration::nanoseconds(i64::from(now.nanosecond()));
    now - since_midnight + Duration::hours(RESET_HOUR)
}

/// Most recent daily reset at or before `now`.
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use innkeeper_domain::reset_clock::daily_boundary;
///
/// let now = Utc.with_ymd_and_hms(2024, 1, 10, 7, 59, 0).single().expect("valid date");
/// let expected = Utc.with_ymd_and_hms(2024, 1, 9, 8, 0, 0).single().expect("valid date");
/// assert_eq!(daily_boundary(now), expected);
/// ```
pub fn daily_boundary(now: DateTime<Utc>) -> DateTime<Utc> {
    let today = reset_on_day_of(now);
    if now < today {
        today - Duration::days(1)
    } else {
        today
    }
}

/// Most recent weekly (Wednesday) reset at or before `now`.
pub fn weekly_boundary(now: DateTime<Utc>) -> DateTime<Utc> {
    let days_since_reset_day = (i64::from(now.weekday().num_days_from_monday())
        - i64::from(RESET_WEEKDAY.num_days_from_monday()))
    .rem_euclid(7);
    let boundary = reset_on_day_of(now) - Duration::days(days_since_reset_day);
    if now < boundary {
        boundary - Duration::weeks(1)
    } else {
        boundary
    }
}

/// Most recent boundary for the given cadence.
pub fn boundary(cadence: ResetCadence, now: DateTime<Utc>) -> DateTime<Utc> {
    match cadence {
        ResetCadence::Daily => daily_boundary(now),
        ResetCadence::Weekly => weekly_boundary(now),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s)
            .single()
            .expect("valid test date")
    }

    #[test]
    fn daily_boundary_after_reset_hour_is_today() {
        assert_eq!(
            daily_boundary(at(2024, 1, 10, 15, 30, 0)),
            at(2024, 1, 10, 8, 0, 0)
        );
    }

    #[test]
    fn daily_boundary_before_reset_hour_is_yesterday() {
        assert_eq!(
            daily_boundary(at(2024, 1, 10, 3, 0, 0)),
            at(2024, 1, 9, 8, 0, 0)
        );
    }

    #[test]
    fn boundary_instant_counts_as_occurred() {
        let reset = at(2024, 1, 10, 8, 0, 0);
        assert_eq!(daily_boundary(reset), reset);
        // 2024-01-10 is a Wednesday
        assert_eq!(weekly_boundary(reset), reset);
    }

    #[test]
    fn weekly_boundary_on_wednesday_before_reset_is_previous_week() {
        assert_eq!(
            weekly_boundary(at(2024, 1, 10, 7, 59, 59)),
            at(2024, 1, 3, 8, 0, 0)
        );
    }

    #[test]
    fn weekly_boundary_from_tuesday_is_last_wednesday() {
        assert_eq!(
            weekly_boundary(at(2024, 1, 16, 23, 0, 0)),
            at(2024, 1, 10, 8, 0, 0)
        );
        assert_eq!(
            weekly_boundary(at(2024, 1, 16, 2, 0, 0)),
            at(2024, 1, 10, 8, 0, 0)
        );
    }

    #[test]
    fn weekly_boundary_from_sunday() {
        assert_eq!(
            weekly_boundary(at(2024, 1, 14, 12, 0, 0)),
            at(2024, 1, 10, 8, 0, 0)
        );
    }

    #[test]
    fn boundaries_never_exceed_now_and_are_stable() {
        let start = at(2024, 2, 26, 0, 0, 0);
        // Walk two weeks in 37-minute steps, hitting every hour of every weekday.
        for step in 0..(14 * 24 * 60 / 37) {
            let now = start + Duration::minutes(37 * step);
            let daily = daily_boundary(now);
            let weekly = weekly_boundary(now);
            assert!(daily <= now, "daily boundary after now at {now}");
            assert!(weekly <= now, "weekly boundary after now at {now}");
            assert!(now - daily < Duration::days(1));
            assert!(now - weekly < Duration::weeks(1));
            assert_eq!(weekly.weekday(), Weekday::Wed);
            assert_eq!(daily_boundary(now), daily);
            assert_eq!(weekly_boundary(now), weekly);
        }
    }

    #[test]
    fn boundary_dispatches_on_cadence() {
        let now = at(2024, 1, 12, 9, 0, 0);
        assert_eq!(boundary(ResetCadence::Daily, now), at(2024, 1, 12, 8, 0, 0));
        assert_eq!(
            boundary(ResetCadence::Weekly, now),
            at(2024, 1, 10, 8, 0, 0)
        );
    }
}
