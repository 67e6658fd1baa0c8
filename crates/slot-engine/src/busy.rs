//! Busy-interval collection.
//!
//! Appointments and manual time blocks are two independent sources of
//! unavailability. [`collect_busy`] flattens both into one list of
//! [`BusyInterval`]s; overlap between them is left alone, since the slot
//! generator tests every footprint against every interval anyway.

use chrono::{DateTime, Utc};

use crate::model::{AppointmentRow, BusyInterval, StaffSelector, TimeBlockRow};

/// Merge occupying appointments and time blocks into one busy list.
///
/// - Appointments in a non-occupying status are dropped.
/// - For [`StaffSelector::Specific`], only that provider's appointments count;
///   for [`StaffSelector::WholeBusiness`] every appointment does.
/// - Time blocks always count.
/// - A missing or inverted end becomes a zero-width interval at the start.
pub fn collect_busy(
    appointments: &[AppointmentRow],
    blocks: &[TimeBlockRow],
    staff: &StaffSelector,
) -> Vec<BusyInterval> {
    let booked = appointments
        .iter()
        .filter(|row| row.status.occupies_calendar())
        .filter(|row| match staff {
            StaffSelector::Specific(id) => row.staff_id == Some(*id),
            StaffSelector::WholeBusiness => true,
        })
        .map(|row| BusyInterval::normalized(row.starts_at, row.ends_at));

    let blocked = blocks
        .iter()
        .map(|row| BusyInterval::normalized(row.starts_at, row.ends_at));

    booked.chain(blocked).collect()
}

/// The intervals touching the closed window `[start, end]`.
///
/// Closed on both sides so that intervals ending exactly at `start` or
/// beginning exactly at `end` are kept for adjacency scoring.
pub fn busy_overlapping(
    busy: &[BusyInterval],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<BusyInterval> {
    busy.iter()
        .filter(|b| b.starts_at <= end && b.ends_at >= start)
        .copied()
        .collect()
}
