/// Reset-period boundaries
///
/// A quota period starts at local midnight in the company's reference
/// timezone on January 1st, on the 1st of the month, or on Monday. A counter
/// last touched before the start of the current period is stale and resets.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::models::quota::QuotaResetAt;

/// Start of the period containing `now`
pub fn period_start(now: DateTime<Utc>, cadence: QuotaResetAt, tz: Tz) -> DateTime<Utc> {
    let today = now.with_timezone(&tz).date_naive();

    let first_day = match cadence {
        QuotaResetAt::FirstOfYear => today - Duration::days(i64::from(today.ordinal0())),
        QuotaResetAt::FirstOfMonth => today - Duration::days(i64::from(today.day0())),
        QuotaResetAt::FirstOfWeek => {
            today - Duration::days(i64::from(today.weekday().num_days_from_monday()))
        }
    };

    local_midnight(first_day, tz)
}

/// Whether a counter last written at `last_touched` belongs to an earlier period
pub fn needs_reset(
    last_touched: DateTime<Utc>,
    now: DateTime<Utc>,
    cadence: QuotaResetAt,
    tz: Tz,
) -> bool {
    last_touched < period_start(now, cadence, tz)
}

fn local_midnight(date: NaiveDate, tz: Tz) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    first_valid_local(midnight, tz).unwrap_or_else(|| Utc.from_utc_datetime(&midnight))
}

/// Earliest instant at or after `local` that exists in `tz`
///
/// Inside a DST gap this walks forward in 15-minute steps for at most one
/// day, so half-hour shifts resolve to the half hour.
fn first_valid_local(local: NaiveDateTime, tz: Tz) -> Option<DateTime<Utc>> {
    (0..=GAP_SEARCH_STEPS)
        .map(|step| local + Duration::minutes(GAP_STEP_MINUTES * step))
        .find_map(|candidate| tz.from_local_datetime(&candidate).earliest())
        .map(|start| start.with_timezone(&Utc))
}

const GAP_STEP_MINUTES: i64 = 15;
const GAP_SEARCH_STEPS: i64 = 24 * 60 / GAP_STEP_MINUTES;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::{America::Sao_Paulo, Australia::Lord_Howe, Europe::Berlin, UTC};

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_year_start_utc() {
        let start = period_start(utc(2025, 7, 14, 12, 0), QuotaResetAt::FirstOfYear, UTC);
        assert_eq!(start, utc(2025, 1, 1, 0, 0));
    }

    #[test]
    fn test_month_start_in_company_timezone() {
        // 2025-03-01 00:30 Berlin is still February in UTC.
        let now = utc(2025, 2, 28, 23, 30);

        assert_eq!(
            period_start(now, QuotaResetAt::FirstOfMonth, Berlin),
            utc(2025, 2, 28, 23, 0)
        );
        assert_eq!(
            period_start(now, QuotaResetAt::FirstOfMonth, UTC),
            utc(2025, 2, 1, 0, 0)
        );
    }

    #[test]
    fn test_week_starts_monday() {
        // Sunday 2025-03-16
        let sunday = utc(2025, 3, 16, 18, 0);
        assert_eq!(
            period_start(sunday, QuotaResetAt::FirstOfWeek, UTC),
            utc(2025, 3, 10, 0, 0)
        );

        // Monday itself
        let monday = utc(2025, 3, 17, 0, 0);
        assert_eq!(period_start(monday, QuotaResetAt::FirstOfWeek, UTC), monday);
    }

    #[test]
    fn test_week_crossing_year() {
        // Thursday 2025-01-02; the week began Monday 2024-12-30.
        let now = utc(2025, 1, 2, 9, 0);
        assert_eq!(
            period_start(now, QuotaResetAt::FirstOfWeek, UTC),
            utc(2024, 12, 30, 0, 0)
        );
    }

    #[test]
    fn test_needs_reset_across_boundary() {
        let last = utc(2024, 12, 31, 23, 0);
        let now = utc(2025, 1, 1, 0, 1);

        assert!(needs_reset(last, now, QuotaResetAt::FirstOfYear, UTC));
        assert!(!needs_reset(now, now, QuotaResetAt::FirstOfYear, UTC));
    }

    #[test]
    fn test_needs_reset_within_period() {
        let last = utc(2025, 1, 1, 0, 0);
        let now = utc(2025, 12, 31, 23, 59);

        assert!(!needs_reset(last, now, QuotaResetAt::FirstOfYear, UTC));
        assert!(needs_reset(last, now, QuotaResetAt::FirstOfMonth, UTC));
    }

    #[test]
    fn test_midnight_in_dst_gap() {
        // Sao Paulo skipped 2018-11-04 00:00..01:00 local (UTC-3 -> UTC-2).
        let date = NaiveDate::from_ymd_opt(2018, 11, 4).unwrap();
        assert_eq!(local_midnight(date, Sao_Paulo), utc(2018, 11, 4, 3, 0));
    }

    #[test]
    fn test_half_hour_gap_resolves_to_first_valid_minute() {
        // Lord Howe skipped 2023-10-01 02:00..02:30 local (UTC+10:30 -> UTC+11).
        let in_gap = NaiveDate::from_ymd_opt(2023, 10, 1)
            .unwrap()
            .and_hms_opt(2, 0, 0)
            .unwrap();

        let start = first_valid_local(in_gap, Lord_Howe).unwrap();

        assert_eq!(start, utc(2023, 9, 30, 15, 30));
        assert_eq!(
            start.with_timezone(&Lord_Howe).time(),
            NaiveTime::from_hms_opt(2, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_first_valid_local_outside_gap_is_identity() {
        let local = NaiveDate::from_ymd_opt(2025, 6, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();

        assert_eq!(first_valid_local(local, Berlin), Some(utc(2025, 6, 1, 22, 0)));
    }
}
