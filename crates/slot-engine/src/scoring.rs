//! Slot desirability scoring and ranking.
//!
//! The score is a tunable heuristic behind the [`SlotScorer`] trait. What is
//! fixed is the ranking built on top of it: [`rank_slots`] orders by score
//! descending, then `starts_at` ascending, so equal inputs always produce the
//! same total order. The `recommended` flag is taken from the head of that
//! same order, never computed separately.
//!
//! [`WeightedScorer`] rewards slots that pack the calendar tightly:
//!
//! - footprint touching an existing busy interval: `+adjacent_busy` per side
//! - slot touching the start or end of the working day: `+day_edge` per side
//! - leftover gap shorter than the service itself: `-fragment_penalty` per side
//! - start inside a configured peak window: `+peak`

use std::cmp::Ordering;

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;

use crate::config::ScoringWeights;
use crate::model::{BusyInterval, Slot};

/// A surviving anchor and its buffered footprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub footprint_start: DateTime<Utc>,
    pub footprint_end: DateTime<Utc>,
}

/// Day-level facts a scorer may consult.
#[derive(Debug, Clone, Copy)]
pub struct ScoringContext<'a> {
    pub work_start: DateTime<Utc>,
    pub work_end: DateTime<Utc>,
    pub service_duration: Duration,
    pub busy: &'a [BusyInterval],
    pub tz: Tz,
}

pub trait SlotScorer: Send + Sync {
    /// Higher is better. Must be a pure function of its arguments.
    fn score(&self, candidate: &Candidate, ctx: &ScoringContext<'_>) -> i32;
}

#[derive(Debug, Clone, Default)]
pub struct WeightedScorer {
    weights: ScoringWeights,
}

impl WeightedScorer {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    fn gap_score(&self, gap: Duration, service: Duration) -> i32 {
        if gap > Duration::zero() && gap < service {
            self.weights.fragment_penalty.saturating_neg()
        } else {
            0
        }
    }
}

impl SlotScorer for WeightedScorer {
    fn score(&self, c: &Candidate, ctx: &ScoringContext<'_>) -> i32 {
        let w = &self.weights;
        let mut score: i32 = 0;

        let prev_end = ctx
            .busy
            .iter()
            .map(|b| b.ends_at)
            .filter(|end| *end <= c.footprint_start)
            .max();
        let next_start = ctx
            .busy
            .iter()
            .map(|b| b.starts_at)
            .filter(|start| *start >= c.footprint_end)
            .min();

        // Before the slot
        if prev_end == Some(c.footprint_start) {
            score = score.saturating_add(w.adjacent_busy);
        } else if c.starts_at <= ctx.work_start {
            score = score.saturating_add(w.day_edge);
        } else {
            let boundary = prev_end.map_or(ctx.work_start, |end| end.max(ctx.work_start));
            score = score.saturating_add(
                self.gap_score(c.footprint_start - boundary, ctx.service_duration),
            );
        }

        // After the slot
        if next_start == Some(c.footprint_end) {
            score = score.saturating_add(w.adjacent_busy);
        } else if c.ends_at >= ctx.work_end {
            score = score.saturating_add(w.day_edge);
        } else {
            let boundary = next_start.map_or(ctx.work_end, |start| start.min(ctx.work_end));
            score = score.saturating_add(
                self.gap_score(boundary - c.footprint_end, ctx.service_duration),
            );
        }

        let local_start = c.starts_at.with_timezone(&ctx.tz).time();
        if w.peak_windows.iter().any(|p| p.contains(local_start)) {
            score = score.saturating_add(w.peak);
        }

        score
    }
}

/// The ranking order: score descending, then `starts_at`, then `staff_id`.
pub fn ranking_cmp(a: &Slot, b: &Slot) -> Ordering {
    b.score
        .cmp(&a.score)
        .then(a.starts_at.cmp(&b.starts_at))
        .then_with(|| a.staff_id.cmp(&b.staff_id))
}

/// Slots in ranking order, best first.
pub fn rank_slots(slots: &[Slot]) -> Vec<&Slot> {
    let mut ranked: Vec<&Slot> = slots.iter().collect();
    ranked.sort_by(|a, b| ranking_cmp(a, b));
    ranked
}

/// Flag the `count` best-ranked slots as recommended, clearing the rest.
pub fn mark_recommended(slots: &mut [Slot], count: usize) {
    let mut order: Vec<usize> = (0..slots.len()).collect();
    order.sort_by(|&i, &j| ranking_cmp(&slots[i], &slots[j]));
    for slot in slots.iter_mut() {
        slot.recommended = false;
    }
    for &i in order.iter().take(count) {
        slots[i].recommended = true;
    }
}
