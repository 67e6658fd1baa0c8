//! Engine configuration.
//!
//! Every field has a default, so an empty JSON object is a valid config.

use std::path::Path;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::model::MAX_SPAN_MIN;

/// Longest supported horizon, ten years of days.
pub const MAX_HORIZON_DAYS: u32 = 3660;

/// A local time-of-day range `[start, end)` considered peak demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeakWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl PeakWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, time: NaiveTime) -> bool {
        self.start <= time && time < self.end
    }
}

/// Weights for [`WeightedScorer`](crate::scoring::WeightedScorer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    /// Added per side whose footprint touches a busy interval.
    pub adjacent_busy: i32,
    /// Added per side whose footprint touches the start or end of the working day.
    pub day_edge: i32,
    /// Added when the slot starts inside a peak window.
    pub peak: i32,
    /// Subtracted per side that leaves a gap too short for another booking.
    pub fragment_penalty: i32,
    pub peak_windows: Vec<PeakWindow>,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            adjacent_busy: 40,
            day_edge: 20,
            peak: 15,
            fragment_penalty: 25,
            peak_windows: vec![
                PeakWindow::new(hm(10, 0), hm(13, 0)),
                PeakWindow::new(hm(16, 0), hm(19, 0)),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of local calendar days computed, starting today.
    pub horizon_days: u32,
    /// Opening time for weekdays without a schedule row.
    pub default_open: NaiveTime,
    /// Closing time for weekdays without a schedule row.
    pub default_close: NaiveTime,
    pub default_granularity_min: i64,
    /// How many of each day's best-ranked slots are flagged `recommended`.
    pub recommended_per_day: usize,
    pub scoring: ScoringWeights,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            horizon_days: 31,
            default_open: hm(9, 0),
            default_close: hm(18, 0),
            default_granularity_min: 15,
            recommended_per_day: 8,
            scoring: ScoringWeights::default(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON config.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Configuration`] if the JSON is malformed or
    /// fails [`validate`](Self::validate).
    pub fn from_json_str(s: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(s)
            .map_err(|e| EngineError::Configuration(format!("invalid config JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            EngineError::Configuration(format!("cannot read '{}': {e}", path.display()))
        })?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        if self.horizon_days == 0 || self.horizon_days > MAX_HORIZON_DAYS {
            return Err(EngineError::Configuration(format!(
                "horizon_days must be in 1..={MAX_HORIZON_DAYS}, got {}",
                self.horizon_days
            )));
        }
        if self.default_granularity_min <= 0 || self.default_granularity_min > MAX_SPAN_MIN {
            return Err(EngineError::Configuration(format!(
                "default_granularity_min must be in 1..={MAX_SPAN_MIN}, got {}",
                self.default_granularity_min
            )));
        }
        if let Some(window) = self
            .scoring
            .peak_windows
            .iter()
            .find(|w| w.end <= w.start)
        {
            return Err(EngineError::Configuration(format!(
                "peak window {}-{} ends before it starts",
                window.start, window.end
            )));
        }
        Ok(())
    }
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}
