//! Value types flowing through the engine.
//!
//! Everything here is constructed fresh per request from rows supplied by the
//! store. Nothing is persisted and nothing has identity beyond its fields.

use std::fmt;

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, Result};

/// Staff id prefixes the booking surfaces use when no specific provider applies.
pub const WHOLE_BUSINESS_PREFIXES: [&str; 2] = ["fallback-", "business-"];

/// Upper bound on a service duration or buffer, in minutes.
pub const MAX_SPAN_MIN: i64 = 24 * 60;

// ── Busy intervals ──────────────────────────────────────────────────────────

/// A half-open `[starts_at, ends_at)` span during which nothing can be booked.
///
/// `ends_at == starts_at` is a zero-width block: it rejects footprints that
/// straddle that instant and nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BusyInterval {
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

impl BusyInterval {
    /// Build an interval, treating a missing or inverted end as zero-width.
    pub fn normalized(starts_at: DateTime<Utc>, ends_at: Option<DateTime<Utc>>) -> Self {
        let ends_at = ends_at.filter(|end| *end >= starts_at).unwrap_or(starts_at);
        Self { starts_at, ends_at }
    }

    /// Half-open overlap: `self.start < end && self.end > start`.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        start < self.ends_at && end > self.starts_at
    }
}

// ── Schedule ────────────────────────────────────────────────────────────────

/// One weekday of a business's recurring weekly schedule.
///
/// Unset fields fall back to the engine defaults; `is_closed` is the only
/// way to close a day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySchedule {
    /// 0 = Sunday through 6 = Saturday.
    pub weekday: u32,
    #[serde(default)]
    pub start_time: Option<NaiveTime>,
    #[serde(default)]
    pub end_time: Option<NaiveTime>,
    #[serde(default)]
    pub is_closed: bool,
    #[serde(default)]
    pub granularity_min: Option<i64>,
}

impl DaySchedule {
    pub fn open(weekday: u32, start_time: NaiveTime, end_time: NaiveTime) -> Self {
        Self {
            weekday,
            start_time: Some(start_time),
            end_time: Some(end_time),
            is_closed: false,
            granularity_min: None,
        }
    }

    pub fn closed(weekday: u32) -> Self {
        Self {
            weekday,
            start_time: None,
            end_time: None,
            is_closed: true,
            granularity_min: None,
        }
    }

    pub fn with_granularity(mut self, minutes: i64) -> Self {
        self.granularity_min = Some(minutes);
        self
    }
}

// ── Store rows ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Business {
    pub id: Uuid,
    #[serde(default)]
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingPolicy {
    #[serde(default)]
    pub booking_lead_days: u32,
}

/// Lifecycle status of a stored appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    PendingConfirmation,
    Confirmed,
    AwaitingPayment,
    Paid,
    CanceledByClient,
    CanceledByBusiness,
    RejectedByBusiness,
    NoShow,
    Completed,
    #[serde(other)]
    Unknown,
}

impl AppointmentStatus {
    pub const OCCUPYING: [AppointmentStatus; 4] = [
        AppointmentStatus::PendingConfirmation,
        AppointmentStatus::Confirmed,
        AppointmentStatus::AwaitingPayment,
        AppointmentStatus::Paid,
    ];

    /// Whether an appointment in this status holds its time on the calendar.
    pub fn occupies_calendar(self) -> bool {
        Self::OCCUPYING.contains(&self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentRow {
    pub starts_at: DateTime<Utc>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub staff_id: Option<Uuid>,
    pub status: AppointmentStatus,
}

/// A manual block. Blocks apply to the whole business, never one staff member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeBlockRow {
    pub starts_at: DateTime<Utc>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reason: Option<String>,
}

// ── Requests ────────────────────────────────────────────────────────────────

/// Whose calendar a request is computed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StaffSelector {
    /// One provider: only that provider's appointments count as busy.
    Specific(Uuid),
    /// No specific provider: every appointment of the business counts as busy.
    WholeBusiness,
}

impl StaffSelector {
    /// Parse a UUID or one of the [`WHOLE_BUSINESS_PREFIXES`] sentinels.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidRequest`] for anything else.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if WHOLE_BUSINESS_PREFIXES
            .iter()
            .any(|prefix| raw.starts_with(prefix) && raw.len() > prefix.len())
        {
            return Ok(StaffSelector::WholeBusiness);
        }
        Uuid::parse_str(raw)
            .map(StaffSelector::Specific)
            .map_err(|_| EngineError::InvalidRequest(format!("malformed staff id '{raw}'")))
    }

}

impl fmt::Display for StaffSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StaffSelector::Specific(id) => write!(f, "{id}"),
            StaffSelector::WholeBusiness => f.write_str("whole-business"),
        }
    }
}

/// The availability request body as it arrives from the API layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSlotRequest {
    pub business_id: String,
    pub staff_id: String,
    pub service_duration_min: i64,
    #[serde(default)]
    pub buffer_before_min: i64,
    #[serde(default)]
    pub buffer_after_min: i64,
    #[serde(default)]
    pub time_zone: Option<String>,
}

impl RawSlotRequest {
    /// Validate the body and resolve the staff sentinel.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidRequest`] on a malformed id or a
    /// duration or buffer outside `0..=MAX_SPAN_MIN`.
    pub fn validate(&self) -> Result<SlotRequest> {
        let business_id = Uuid::parse_str(self.business_id.trim()).map_err(|_| {
            EngineError::InvalidRequest(format!("malformed business id '{}'", self.business_id))
        })?;
        let staff = StaffSelector::parse(&self.staff_id)?;
        let staff_label = match staff {
            StaffSelector::WholeBusiness => Some(self.staff_id.trim().to_string()),
            StaffSelector::Specific(_) => None,
        };
        let request = SlotRequest {
            business_id,
            staff,
            staff_label,
            service_duration_min: self.service_duration_min,
            buffer_before_min: self.buffer_before_min,
            buffer_after_min: self.buffer_after_min,
            time_zone: self.time_zone.clone().filter(|tz| !tz.trim().is_empty()),
        };
        request.check()?;
        Ok(request)
    }
}

/// A validated availability request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotRequest {
    pub business_id: Uuid,
    pub staff: StaffSelector,
    pub service_duration_min: i64,
    pub buffer_before_min: i64,
    pub buffer_after_min: i64,
    /// The sentinel the caller sent for a whole-business request, echoed on
    /// every slot so `(staff_id, starts_at)` keys match what the caller holds.
    pub staff_label: Option<String>,
    /// Overrides the business record's zone when set.
    pub time_zone: Option<String>,
}

impl SlotRequest {
    pub fn new(business_id: Uuid, staff: StaffSelector, service_duration_min: i64) -> Self {
        Self {
            business_id,
            staff,
            staff_label: None,
            service_duration_min,
            buffer_before_min: 0,
            buffer_after_min: 0,
            time_zone: None,
        }
    }

    pub fn with_buffers(mut self, before_min: i64, after_min: i64) -> Self {
        self.buffer_before_min = before_min;
        self.buffer_after_min = after_min;
        self
    }

    pub fn with_time_zone(mut self, tz: impl Into<String>) -> Self {
        self.time_zone = Some(tz.into());
        self
    }

    pub fn with_staff_label(mut self, label: impl Into<String>) -> Self {
        self.staff_label = Some(label.into());
        self
    }

    /// The id stamped on generated slots.
    ///
    /// A specific provider's UUID, else the caller's sentinel, else
    /// `business-<business_id>`.
    pub fn slot_staff_id(&self) -> String {
        match (&self.staff, &self.staff_label) {
            (StaffSelector::Specific(id), _) => id.to_string(),
            (StaffSelector::WholeBusiness, Some(label)) => label.clone(),
            (StaffSelector::WholeBusiness, None) => format!("business-{}", self.business_id),
        }
    }

    /// Structural checks shared by the request boundary and the orchestrator.
    pub fn check(&self) -> Result<()> {
        check_spans(
            self.service_duration_min,
            self.buffer_before_min,
            self.buffer_after_min,
        )
    }
}

/// Duration in `1..=MAX_SPAN_MIN`, buffers in `0..=MAX_SPAN_MIN`.
pub(crate) fn check_spans(duration_min: i64, before_min: i64, after_min: i64) -> Result<()> {
    if duration_min <= 0 {
        return Err(EngineError::InvalidRequest(format!(
            "service duration must be positive, got {duration_min}"
        )));
    }
    if before_min < 0 || after_min < 0 {
        return Err(EngineError::InvalidRequest(format!(
            "buffers must be non-negative, got before={before_min} after={after_min}"
        )));
    }
    if duration_min > MAX_SPAN_MIN {
        return Err(EngineError::InvalidRequest(format!(
            "service duration must be at most {MAX_SPAN_MIN} minutes, got {duration_min}"
        )));
    }
    if before_min > MAX_SPAN_MIN || after_min > MAX_SPAN_MIN {
        return Err(EngineError::InvalidRequest(format!(
            "buffers must be at most {MAX_SPAN_MIN} minutes, got before={before_min} after={after_min}"
        )));
    }
    Ok(())
}

// ── Output ──────────────────────────────────────────────────────────────────

/// A bookable start time. `(staff_id, starts_at)` is its natural key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub staff_id: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub score: i32,
    pub recommended: bool,
}

impl Slot {
    pub fn key(&self) -> String {
        format!("{}-{}", self.staff_id, self.starts_at.to_rfc3339())
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
