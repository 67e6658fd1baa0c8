//! Time-zone interval utilities.
//!
//! All interval arithmetic in the engine happens on `DateTime<Utc>`. Local
//! civil time is used only to derive day boundaries, weekday buckets and the
//! bounds of a working window, and is converted back to an instant before any
//! comparison. Every function takes an explicit [`Tz`]; none reads the clock.
//!
//! # DST resolution
//!
//! - A local time inside a spring-forward gap resolves to the first valid
//!   instant after the gap (02:30 on a US spring-forward day becomes 03:00).
//! - A local time inside a fall-back overlap resolves to the earlier of the
//!   two instants.
//!
//! # Functions
//!
//! - [`resolve_timezone`] — IANA name → [`Tz`], falling back to UTC
//! - [`to_local`] / [`to_instant`] — instant ↔ [`LocalWallTime`]
//! - [`start_of_local_day`] — local midnight of the day containing an instant
//! - [`add_local_days`] — calendar-day arithmetic (23h and 25h days included)
//! - [`local_date_key`] — `YYYY-MM-DD` grouping key

use chrono::{
    DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Timelike,
    Utc,
};
use chrono_tz::Tz;
use serde::Serialize;
use tracing::warn;

use crate::error::{EngineError, Result};

/// No IANA zone has ever skipped a full day of wall-clock time.
const MAX_GAP_MINUTES: u32 = 24 * 60;

// ── Zone lookup ─────────────────────────────────────────────────────────────

/// Parse an IANA timezone name into `Tz`.
///
/// # Errors
///
/// Returns [`EngineError::InvalidTimezone`] if the name is not in the tz database.
pub fn parse_timezone(s: &str) -> Result<Tz> {
    s.trim()
        .parse::<Tz>()
        .map_err(|_| EngineError::InvalidTimezone(format!("'{}'", s)))
}

/// Resolve an IANA timezone name, falling back to UTC when it is unknown.
///
/// The fallback is a degraded mode, not an error: it is logged and the
/// computation proceeds in UTC.
pub fn resolve_timezone(s: &str) -> Tz {
    match parse_timezone(s) {
        Ok(tz) => tz,
        Err(_) => {
            warn!(timezone = %s, "unrecognized time zone, falling back to UTC");
            Tz::UTC
        }
    }
}

// ── Local wall time ─────────────────────────────────────────────────────────

/// A civil (year, month, day, hour, minute) reading in some time zone.
///
/// Carries no zone of its own; it only means something next to a [`Tz`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct LocalWallTime {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
}

impl LocalWallTime {
    pub fn new(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
        }
    }

    pub fn from_naive(naive: NaiveDateTime) -> Self {
        Self::new(
            naive.year(),
            naive.month(),
            naive.day(),
            naive.hour(),
            naive.minute(),
        )
    }

    /// The civil date and time, or `None` if a field is out of range.
    pub fn to_naive(&self) -> Option<NaiveDateTime> {
        let date = NaiveDate::from_ymd_opt(self.year, self.month, self.day)?;
        let time = NaiveTime::from_hms_opt(self.hour, self.minute, 0)?;
        Some(date.and_time(time))
    }
}

// ── Conversions ─────────────────────────────────────────────────────────────

/// Render an instant in the zone's civil calendar.
pub fn to_local(instant: DateTime<Utc>, tz: &Tz) -> LocalWallTime {
    LocalWallTime::from_naive(instant.with_timezone(tz).naive_local())
}

/// Resolve a civil time in a zone to an absolute instant.
///
/// # Errors
///
/// Returns [`EngineError::InvalidRequest`] if the wall time has an
/// out-of-range field (e.g. month 13). DST gaps and overlaps are not errors;
/// see the module docs for how they resolve.
pub fn to_instant(local: &LocalWallTime, tz: &Tz) -> Result<DateTime<Utc>> {
    let naive = local.to_naive().ok_or_else(|| {
        EngineError::InvalidRequest(format!("invalid local wall time: {local:?}"))
    })?;
    Ok(resolve_local(naive, tz))
}

/// Resolve a naive local datetime in `tz`, shifting out of DST gaps.
pub fn resolve_local(naive: NaiveDateTime, tz: &Tz) -> DateTime<Utc> {
    if let Some(dt) = tz.from_local_datetime(&naive).earliest() {
        return dt.with_timezone(&Utc);
    }

    // Inside a gap: the first representable minute is the transition instant.
    let mut walk = naive;
    for _ in 0..MAX_GAP_MINUTES {
        walk = match walk.checked_add_signed(Duration::minutes(1)) {
            Some(next) => next,
            None => break,
        };
        if let Some(dt) = tz.from_local_datetime(&walk).earliest() {
            return dt.with_timezone(&Utc);
        }
    }

    // Unreachable for real zones; interpret with the offset in force a day earlier.
    let day_before = naive.checked_sub_signed(Duration::days(1)).unwrap_or(naive);
    let offset = tz
        .offset_from_utc_datetime(&day_before)
        .fix()
        .local_minus_utc();
    let utc = naive
        .checked_sub_signed(Duration::seconds(i64::from(offset)))
        .unwrap_or(naive);
    Utc.from_utc_datetime(&utc)
}

/// The instant of `time` on the civil `date` in `tz`.
pub fn at_local_time(date: NaiveDate, time: NaiveTime, tz: &Tz) -> DateTime<Utc> {
    resolve_local(date.and_time(time), tz)
}

// ── Day arithmetic ──────────────────────────────────────────────────────────

/// The civil date containing `instant` in `tz`.
pub fn local_date(instant: DateTime<Utc>, tz: &Tz) -> NaiveDate {
    instant.with_timezone(tz).date_naive()
}

/// The instant of 00:00 local time on the day containing `instant`.
///
/// In zones whose transitions happen at midnight, this is the first valid
/// instant of the day.
pub fn start_of_local_day(instant: DateTime<Utc>, tz: &Tz) -> DateTime<Utc> {
    at_local_time(local_date(instant, tz), NaiveTime::MIN, tz)
}

/// Add `days` calendar days in local civil time, keeping the wall-clock time.
///
/// This is not `days * 24h`: across a DST transition a day is 23 or 25
/// hours of absolute time.
///
/// # Errors
///
/// Returns [`EngineError::InvalidRequest`] if the result is not representable.
pub fn add_local_days(instant: DateTime<Utc>, days: i64, tz: &Tz) -> Result<DateTime<Utc>> {
    let local = instant.with_timezone(tz).naive_local();
    Duration::try_days(days)
        .and_then(|delta| local.checked_add_signed(delta))
        .map(|shifted| resolve_local(shifted, tz))
        .ok_or_else(|| {
            EngineError::InvalidRequest(format!("{days} days from {instant} is out of range"))
        })
}

/// `instant + delta`, or an error instead of an overflow panic.
pub(crate) fn checked_shift(instant: DateTime<Utc>, delta: Duration) -> Result<DateTime<Utc>> {
    instant.checked_add_signed(delta).ok_or_else(|| {
        EngineError::InvalidRequest(format!("{instant} shifted by {delta} is out of range"))
    })
}

/// A `YYYY-MM-DD` key naming the local calendar day of `instant`.
///
/// Two instants share a key iff they fall on the same civil date in `tz`.
pub fn local_date_key(instant: DateTime<Utc>, tz: &Tz) -> String {
    local_date(instant, tz).format("%Y-%m-%d").to_string()
}

/// Weekday of a civil date, 0 = Sunday through 6 = Saturday.
pub fn weekday_index(date: NaiveDate) -> u32 {
    date.weekday().num_days_from_sunday()
}

/// Weekday of the local day containing `instant`, 0 = Sunday.
pub fn local_weekday(instant: DateTime<Utc>, tz: &Tz) -> u32 {
    weekday_index(local_date(instant, tz))
}

// ── Tests ───────────────────────────────────────────────────────────────────
