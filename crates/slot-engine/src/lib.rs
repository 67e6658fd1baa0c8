//! # slot-engine
//!
//! Deterministic appointment availability.
//!
//! Given a service duration, buffers, a weekly working schedule, existing
//! bookings, manual time blocks, a business time zone and a lead-time policy,
//! the engine produces every bookable start time over a rolling horizon,
//! each scored and optionally flagged as recommended.
//!
//! ## Modules
//!
//! - [`timezone`] — Local civil time ↔ instants, DST-correct day arithmetic
//! - [`busy`] — Merge appointments and time blocks into busy intervals
//! - [`schedule`] — Resolve one day's working window from the weekly schedule
//! - [`generator`] — Buffered, granularity-aligned slot generation for one day
//! - [`scoring`] — Slot scoring heuristic and the ranking built on it
//! - [`engine`] — Orchestrate the horizon: fetch, resolve, generate, filter
//! - [`store`] — The async store collaborator and an in-memory implementation
//! - [`bucket`] — Group slots by local calendar day
//! - [`config`] — Engine configuration
//! - [`model`] — Request, row, and slot types
//! - [`error`] — Error types

pub mod bucket;
pub mod busy;
pub mod config;
pub mod engine;
pub mod error;
pub mod generator;
pub mod model;
pub mod schedule;
pub mod scoring;
pub mod store;
pub mod timezone;

pub use bucket::{group_by_local_day, DayBucket};
pub use busy::{busy_overlapping, collect_busy};
pub use config::{EngineConfig, PeakWindow, ScoringWeights, MAX_HORIZON_DAYS};
pub use engine::{lead_start, AvailabilityEngine, AvailabilitySnapshot};
pub use error::{EngineError, Result};
pub use generator::{DayInput, SlotGenerator};
pub use model::{
    AppointmentRow, AppointmentStatus, BookingPolicy, Business, BusyInterval, DaySchedule,
    RawSlotRequest, Slot, SlotRequest, StaffSelector, TimeBlockRow, MAX_SPAN_MIN,
};
pub use schedule::{resolve_day_window, DayWindow};
pub use scoring::{rank_slots, Candidate, ScoringContext, SlotScorer, WeightedScorer};
pub use store::{AvailabilityStore, InMemoryStore, StoreSnapshot};
pub use timezone::{
    add_local_days, local_date_key, parse_timezone, resolve_timezone, start_of_local_day,
    to_instant, to_local, LocalWallTime,
};
