//! The availability orchestrator.
//!
//! [`AvailabilityEngine::compute_availability`] fans out the five store reads
//! concurrently, waits for all of them, then runs the pure per-day pipeline
//! in [`AvailabilityEngine::compute_from_snapshot`]:
//!
//! 1. skip days whose local midnight precedes the lead-time day,
//! 2. resolve the day's working window (skip closed or empty days),
//! 3. keep the busy intervals that can touch the buffered window,
//! 4. generate and score that day's slots,
//! 5. drop slots starting before `lead_start`.
//!
//! Days do not share state, so the pipeline is a map over dates followed by
//! a flatten. "Now" is always a parameter; nothing here reads the clock.
//! Dropping the returned future abandons in-flight reads and yields nothing.

use chrono::{DateTime, Days, Duration, NaiveTime, Utc};
use chrono_tz::Tz;
use tracing::{debug, info};

use crate::busy::{busy_overlapping, collect_busy};
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::generator::{DayInput, SlotGenerator};
use crate::model::{BusyInterval, DaySchedule, Slot, SlotRequest};
use crate::schedule::{check_schedule_rows, resolve_day_window, DayWindow};
use crate::scoring::{SlotScorer, WeightedScorer};
use crate::store::AvailabilityStore;
use crate::timezone::{at_local_time, checked_shift, local_date, resolve_timezone};

/// Everything the per-day pipeline needs, already fetched and normalized.
#[derive(Debug, Clone)]
pub struct AvailabilitySnapshot {
    pub tz: Tz,
    pub booking_lead_days: u32,
    pub schedules: Vec<DaySchedule>,
    /// Appointments and blocks for the requested staff selection.
    pub busy: Vec<BusyInterval>,
}

/// The earliest instant that may be offered.
///
/// With no lead time this is `now`. Otherwise it is local midnight of the
/// day `lead_days` calendar days after today.
///
/// # Errors
///
/// Returns [`EngineError::Configuration`] if that day is past the end of the
/// representable calendar.
pub fn lead_start(now: DateTime<Utc>, lead_days: u32, tz: &Tz) -> Result<DateTime<Utc>> {
    if lead_days == 0 {
        return Ok(now);
    }
    let date = local_date(now, tz)
        .checked_add_days(Days::new(u64::from(lead_days)))
        .ok_or_else(|| {
            EngineError::Configuration(format!("booking lead of {lead_days} days is out of range"))
        })?;
    Ok(at_local_time(date, NaiveTime::MIN, tz))
}

pub struct AvailabilityEngine<St, S = WeightedScorer> {
    store: St,
    config: EngineConfig,
    generator: SlotGenerator<S>,
}

impl<St: AvailabilityStore> AvailabilityEngine<St, WeightedScorer> {
    /// # Errors
    ///
    /// Returns [`EngineError::Configuration`] if `config` fails validation.
    pub fn new(store: St, config: EngineConfig) -> Result<Self> {
        let scorer = WeightedScorer::new(config.scoring.clone());
        Self::with_scorer(store, config, scorer)
    }
}

impl<St: AvailabilityStore, S: SlotScorer> AvailabilityEngine<St, S> {
    pub fn with_scorer(store: St, config: EngineConfig, scorer: S) -> Result<Self> {
        config.validate()?;
        let generator = SlotGenerator::with_scorer(scorer, &config);
        Ok(Self {
            store,
            config,
            generator,
        })
    }

    pub fn store(&self) -> &St {
        &self.store
    }

    /// Compute every bookable slot over the rolling horizon.
    ///
    /// The result is ordered by day, then by start time. An empty list means
    /// no availability and is not an error.
    ///
    /// # Errors
    ///
    /// - [`EngineError::InvalidRequest`] for a structurally invalid request
    /// - [`EngineError::UnknownBusiness`] if the business row is missing
    /// - whatever the store returns, unchanged
    pub async fn compute_availability(
        &self,
        request: &SlotRequest,
        now: DateTime<Utc>,
    ) -> Result<Vec<Slot>> {
        request.check()?;
        let id = request.business_id;
        let (fetch_start, fetch_end) = self.fetch_range(request, now)?;

        let (business, policy, schedules, blocks, appointments) = tokio::try_join!(
            self.store.business(id),
            self.store.booking_policy(id),
            self.store.day_schedules(id),
            self.store.time_blocks(id),
            self.store.appointments(id, &request.staff, fetch_start, fetch_end),
        )?;

        let business = business.ok_or_else(|| EngineError::UnknownBusiness(id.to_string()))?;
        let zone = request
            .time_zone
            .clone()
            .or(business.timezone)
            .unwrap_or_else(|| "UTC".to_string());

        let snapshot = AvailabilitySnapshot {
            tz: resolve_timezone(&zone),
            booking_lead_days: policy.unwrap_or_default().booking_lead_days,
            schedules,
            busy: collect_busy(&appointments, &blocks, &request.staff),
        };

        let slots = self.compute_from_snapshot(request, &snapshot, now)?;
        info!(
            business_id = %id,
            staff = %request.staff,
            timezone = %zone,
            busy = snapshot.busy.len(),
            slots = slots.len(),
            "computed availability"
        );
        Ok(slots)
    }

    /// The synchronous half of [`compute_availability`](Self::compute_availability).
    pub fn compute_from_snapshot(
        &self,
        request: &SlotRequest,
        snapshot: &AvailabilitySnapshot,
        now: DateTime<Utc>,
    ) -> Result<Vec<Slot>> {
        request.check()?;
        check_schedule_rows(&snapshot.schedules);

        let tz = &snapshot.tz;
        let lead = lead_start(now, snapshot.booking_lead_days, tz)?;
        let first_day = local_date(lead, tz);
        let today = local_date(now, tz);
        let staff_id = request.slot_staff_id();
        let before = Duration::minutes(request.buffer_before_min);
        let after = Duration::minutes(request.buffer_after_min);

        // The calendar ends before the horizon only for a `now` at the end of time.
        let per_day = (0..self.config.horizon_days)
            .map_while(|offset| today.checked_add_days(Days::new(u64::from(offset))))
            .map(|date| {
                if date < first_day {
                    return Ok(Vec::new());
                }
                match resolve_day_window(date, &snapshot.schedules, tz, &self.config) {
                    DayWindow::Open {
                        start,
                        end,
                        granularity_min,
                    } => {
                        let busy = busy_overlapping(
                            &snapshot.busy,
                            start.checked_sub_signed(before).unwrap_or(DateTime::<Utc>::MIN_UTC),
                            end.checked_add_signed(after).unwrap_or(DateTime::<Utc>::MAX_UTC),
                        );
                        self.generator.generate(&DayInput {
                            staff_id: &staff_id,
                            work_start: start,
                            work_end: end,
                            service_duration_min: request.service_duration_min,
                            buffer_before_min: request.buffer_before_min,
                            buffer_after_min: request.buffer_after_min,
                            granularity_min,
                            busy: &busy,
                            tz: *tz,
                        })
                    }
                    window => {
                        debug!(%date, ?window, "no bookable window");
                        Ok(Vec::new())
                    }
                }
            })
            .collect::<Result<Vec<Vec<Slot>>>>()?;

        Ok(per_day
            .into_iter()
            .flatten()
            .filter(|slot| slot.starts_at >= lead)
            .collect())
    }

    /// A UTC window wide enough for any zone, so the appointment read does
    /// not have to wait for the business record.
    fn fetch_range(
        &self,
        request: &SlotRequest,
        now: DateTime<Utc>,
    ) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
        let start = checked_shift(
            now,
            -(Duration::days(1) + Duration::minutes(request.buffer_before_min)),
        )?;
        let end = checked_shift(
            now,
            Duration::days(i64::from(self.config.horizon_days) + 1)
                + Duration::minutes(request.buffer_after_min),
        )?;
        Ok((start, end))
    }
}
