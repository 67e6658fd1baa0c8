//! Slot generation for a single working day.
//!
//! # Algorithm
//!
//! 1. Anchors are `work_start + k * granularity` while the service still
//!    ends by `work_end`. Anchors are service start times; buffers are not
//!    part of the anchor.
//! 2. Each anchor's footprint is
//!    `[t - buffer_before, t + duration + buffer_after)`. An anchor is
//!    rejected iff its footprint overlaps a busy interval
//!    (`footprint.start < busy.end && footprint.end > busy.start`).
//! 3. Survivors become [`Slot`]s, are scored by the configured
//!    [`SlotScorer`], and the best `recommended_per_day` of them are
//!    flagged from the ranking order.
//!
//! Slots come back in ascending `starts_at` order regardless of score.

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::error::Result;
use crate::model::{check_spans, BusyInterval, Slot, MAX_SPAN_MIN};
use crate::scoring::{mark_recommended, Candidate, ScoringContext, SlotScorer, WeightedScorer};

/// Everything the generator needs to know about one day.
#[derive(Debug, Clone, Copy)]
pub struct DayInput<'a> {
    pub staff_id: &'a str,
    pub work_start: DateTime<Utc>,
    pub work_end: DateTime<Utc>,
    pub service_duration_min: i64,
    pub buffer_before_min: i64,
    pub buffer_after_min: i64,
    pub granularity_min: i64,
    /// Busy intervals relevant to this day, in any order, overlaps allowed.
    pub busy: &'a [BusyInterval],
    /// Zone used for local-time scoring (peak windows).
    pub tz: Tz,
}

#[derive(Debug, Clone)]
pub struct SlotGenerator<S = WeightedScorer> {
    scorer: S,
    recommended_per_day: usize,
    default_granularity_min: i64,
}

impl SlotGenerator<WeightedScorer> {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::with_scorer(WeightedScorer::new(config.scoring.clone()), config)
    }
}

impl<S: SlotScorer> SlotGenerator<S> {
    pub fn with_scorer(scorer: S, config: &EngineConfig) -> Self {
        Self {
            scorer,
            recommended_per_day: config.recommended_per_day,
            default_granularity_min: config.default_granularity_min,
        }
    }

    /// Produce every bookable slot of the day.
    ///
    /// Anchors step in absolute time from `work_start`. When the window
    /// crosses a DST gap and the granularity does not divide the size of the
    /// jump, anchors after the gap sit on a grid shifted by that jump (a
    /// 45-minute grid from 00:00 continues 03:15, 04:00 after a one-hour
    /// spring-forward at 02:00).
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidRequest`](crate::EngineError::InvalidRequest)
    /// if the service duration is outside `1..=MAX_SPAN_MIN` or a buffer is
    /// outside `0..=MAX_SPAN_MIN`. A non-positive granularity is replaced by
    /// the configured default and logged; one longer than a day is capped at
    /// a day.
    pub fn generate(&self, day: &DayInput<'_>) -> Result<Vec<Slot>> {
        check_spans(
            day.service_duration_min,
            day.buffer_before_min,
            day.buffer_after_min,
        )?;

        let granularity_min = if day.granularity_min > 0 {
            day.granularity_min
        } else {
            warn!(
                granularity_min = day.granularity_min,
                fallback = self.default_granularity_min,
                "non-positive slot granularity, using default"
            );
            self.default_granularity_min.max(1)
        };
        let granularity_min = granularity_min.min(MAX_SPAN_MIN);

        let duration = Duration::minutes(day.service_duration_min);
        let before = Duration::minutes(day.buffer_before_min);
        let after = Duration::minutes(day.buffer_after_min);
        let step = Duration::minutes(granularity_min);

        let ctx = ScoringContext {
            work_start: day.work_start,
            work_end: day.work_end,
            service_duration: duration,
            busy: day.busy,
            tz: day.tz,
        };

        let mut slots = Vec::new();
        let mut anchors = 0usize;
        let mut t = day.work_start;
        loop {
            let ends_at = match t.checked_add_signed(duration) {
                Some(end) if end <= day.work_end => end,
                _ => break,
            };
            anchors += 1;
            // Nothing is busy beyond the representable range.
            let candidate = Candidate {
                starts_at: t,
                ends_at,
                footprint_start: t.checked_sub_signed(before).unwrap_or(DateTime::<Utc>::MIN_UTC),
                footprint_end: ends_at
                    .checked_add_signed(after)
                    .unwrap_or(DateTime::<Utc>::MAX_UTC),
            };
            let blocked = day
                .busy
                .iter()
                .any(|b| b.overlaps(candidate.footprint_start, candidate.footprint_end));
            if !blocked {
                slots.push(Slot {
                    staff_id: day.staff_id.to_string(),
                    starts_at: candidate.starts_at,
                    ends_at: candidate.ends_at,
                    score: self.scorer.score(&candidate, &ctx),
                    recommended: false,
                });
            }
            t = match t.checked_add_signed(step) {
                Some(next) => next,
                None => break,
            };
        }

        mark_recommended(&mut slots, self.recommended_per_day);

        debug!(
            work_start = %day.work_start,
            work_end = %day.work_end,
            anchors,
            slots = slots.len(),
            "generated day slots"
        );
        Ok(slots)
    }
}
