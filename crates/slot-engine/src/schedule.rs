//! Daily working-window resolution from a weekly schedule.
//!
//! A weekday with no schedule row is open with the configured defaults
//! (09:00-18:00, 15-minute granularity unless overridden). A row with
//! `is_closed` closes the day. A window whose end does not come after its
//! start, once converted to instants, is empty and yields no slots.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::warn;

use crate::config::EngineConfig;
use crate::model::DaySchedule;
use crate::timezone::{at_local_time, weekday_index};

/// The bookable window of one local calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayWindow {
    Open {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        granularity_min: i64,
    },
    /// The schedule closes this weekday.
    Closed,
    /// Open, but the window has no length (misconfigured or swallowed by a DST gap).
    Empty,
}

/// Resolve the window of the civil `date` in `tz`.
///
/// The first row matching the weekday wins; see [`check_schedule_rows`].
pub fn resolve_day_window(
    date: NaiveDate,
    schedules: &[DaySchedule],
    tz: &Tz,
    config: &EngineConfig,
) -> DayWindow {
    let weekday = weekday_index(date);
    let row = schedules.iter().find(|s| s.weekday == weekday);

    if row.is_some_and(|s| s.is_closed) {
        return DayWindow::Closed;
    }

    let open = row
        .and_then(|s| s.start_time)
        .unwrap_or(config.default_open);
    let close = row
        .and_then(|s| s.end_time)
        .unwrap_or(config.default_close);
    let granularity_min = match row.and_then(|s| s.granularity_min) {
        Some(g) if g > 0 => g,
        Some(g) => {
            warn!(
                weekday,
                granularity_min = g,
                fallback = config.default_granularity_min,
                "non-positive slot granularity, using default"
            );
            config.default_granularity_min
        }
        None => config.default_granularity_min,
    };

    let start = at_local_time(date, open, tz);
    let end = at_local_time(date, close, tz);
    if end <= start {
        return DayWindow::Empty;
    }

    DayWindow::Open {
        start,
        end,
        granularity_min,
    }
}

/// Log schedule rows the resolver will ignore. Returns how many were flagged.
pub fn check_schedule_rows(schedules: &[DaySchedule]) -> usize {
    let mut seen = [false; 7];
    let mut flagged = 0;
    for row in schedules {
        match seen.get_mut(row.weekday as usize) {
            None => {
                warn!(weekday = row.weekday, "schedule row with weekday outside 0..=6 ignored");
                flagged += 1;
            }
            Some(true) => {
                warn!(weekday = row.weekday, "duplicate schedule row ignored");
                flagged += 1;
            }
            Some(slot) => *slot = true,
        }
    }
    flagged
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, TimeZone};

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    const NY: Tz = chrono_tz::America::New_York;

    #[test]
    fn test_missing_row_uses_defaults() {
        // Monday March 16 2026, EDT
        let window = resolve_day_window(date(2026, 3, 16), &[], &NY, &EngineConfig::default());
        assert_eq!(
            window,
            DayWindow::Open {
                start: utc(2026, 3, 16, 13, 0),
                end: utc(2026, 3, 16, 22, 0),
                granularity_min: 15,
            }
        );
    }

    #[test]
    fn test_row_for_weekday_applies() {
        let schedules = vec![
            DaySchedule::open(0, hm(10, 0), hm(14, 0)),
            DaySchedule::open(1, hm(9, 0), hm(17, 0)).with_granularity(30),
        ];
        let window =
            resolve_day_window(date(2026, 3, 16), &schedules, &NY, &EngineConfig::default());
        assert_eq!(
            window,
            DayWindow::Open {
                start: utc(2026, 3, 16, 13, 0),
                end: utc(2026, 3, 16, 21, 0),
                granularity_min: 30,
            }
        );
    }

    #[test]
    fn test_closed_row_short_circuits() {
        let schedules = vec![DaySchedule::closed(1)];
        let window =
            resolve_day_window(date(2026, 3, 16), &schedules, &NY, &EngineConfig::default());
        assert_eq!(window, DayWindow::Closed);
    }

    #[test]
    fn test_inverted_window_is_empty() {
        let schedules = vec![DaySchedule::open(1, hm(17, 0), hm(9, 0))];
        let window =
            resolve_day_window(date(2026, 3, 16), &schedules, &NY, &EngineConfig::default());
        assert_eq!(window, DayWindow::Empty);

        let zero = vec![DaySchedule::open(1, hm(9, 0), hm(9, 0))];
        let window = resolve_day_window(date(2026, 3, 16), &zero, &NY, &EngineConfig::default());
        assert_eq!(window, DayWindow::Empty);
    }

    #[test]
    fn test_non_positive_granularity_uses_default() {
        let schedules = vec![DaySchedule::open(1, hm(9, 0), hm(17, 0)).with_granularity(0)];
        let window =
            resolve_day_window(date(2026, 3, 16), &schedules, &NY, &EngineConfig::default());
        assert!(matches!(window, DayWindow::Open { granularity_min: 15, .. }));
    }

    #[test]
    fn test_window_across_spring_forward_gap() {
        // Sunday March 8 2026: local 02:00-03:00 does not exist
        let schedules = vec![DaySchedule::open(0, hm(1, 0), hm(4, 0))];
        let window = resolve_day_window(date(2026, 3, 8), &schedules, &NY, &EngineConfig::default());
        match window {
            DayWindow::Open { start, end, .. } => {
                assert_eq!(start, utc(2026, 3, 8, 6, 0)); // 01:00 EST
                assert_eq!(end, utc(2026, 3, 8, 8, 0)); // 04:00 EDT
                assert_eq!((end - start).num_minutes(), 120);
            }
            other => panic!("expected open window, got {other:?}"),
        }
    }

    #[test]
    fn test_window_starting_inside_gap_shifts_forward() {
        let schedules = vec![DaySchedule::open(0, hm(2, 30), hm(5, 0))];
        let window = resolve_day_window(date(2026, 3, 8), &schedules, &NY, &EngineConfig::default());
        assert!(matches!(
            window,
            DayWindow::Open { start, .. } if start == utc(2026, 3, 8, 7, 0)
        ));
    }

    #[test]
    fn test_window_entirely_inside_gap_is_empty() {
        let schedules = vec![DaySchedule::open(0, hm(2, 10), hm(2, 50))];
        let window = resolve_day_window(date(2026, 3, 8), &schedules, &NY, &EngineConfig::default());
        assert_eq!(window, DayWindow::Empty);
    }

    #[test]
    fn test_check_schedule_rows_flags_bad_rows() {
        let schedules = vec![
            DaySchedule::open(1, hm(9, 0), hm(17, 0)),
            DaySchedule::closed(1),
            DaySchedule::closed(9),
        ];
        assert_eq!(check_schedule_rows(&schedules), 2);
        assert_eq!(check_schedule_rows(&[DaySchedule::closed(6)]), 0);
    }
}
