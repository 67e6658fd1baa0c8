//! The store collaborator the orchestrator reads from.
//!
//! Each method is one independent read, so the orchestrator can issue them
//! concurrently. Implementations map their own failures to
//! [`EngineError::Store`]; the engine never retries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, Result};
use crate::model::{
    AppointmentRow, BookingPolicy, Business, DaySchedule, StaffSelector, TimeBlockRow,
};

#[async_trait]
pub trait AvailabilityStore: Send + Sync {
    /// The business record, or `None` if it does not exist.
    async fn business(&self, business_id: Uuid) -> Result<Option<Business>>;

    /// The business's booking policy, or `None` if it has never been set.
    async fn booking_policy(&self, business_id: Uuid) -> Result<Option<BookingPolicy>>;

    async fn day_schedules(&self, business_id: Uuid) -> Result<Vec<DaySchedule>>;

    async fn time_blocks(&self, business_id: Uuid) -> Result<Vec<TimeBlockRow>>;

    /// Appointments overlapping `[range_start, range_end]`.
    ///
    /// Implementations may pre-filter by status and staff; the engine
    /// filters again either way.
    async fn appointments(
        &self,
        business_id: Uuid,
        staff: &StaffSelector,
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
    ) -> Result<Vec<AppointmentRow>>;
}

// ── Snapshot-backed store ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyRecord {
    pub business_id: Uuid,
    #[serde(flatten)]
    pub policy: BookingPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRecord {
    pub business_id: Uuid,
    #[serde(flatten)]
    pub schedule: DaySchedule,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeBlockRecord {
    pub business_id: Uuid,
    #[serde(flatten)]
    pub block: TimeBlockRow,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentRecord {
    pub business_id: Uuid,
    #[serde(flatten)]
    pub appointment: AppointmentRow,
}

/// A JSON-serializable dump of every table the engine reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreSnapshot {
    pub businesses: Vec<Business>,
    pub policies: Vec<PolicyRecord>,
    pub schedules: Vec<ScheduleRecord>,
    pub time_blocks: Vec<TimeBlockRecord>,
    pub appointments: Vec<AppointmentRecord>,
}

impl StoreSnapshot {
    /// # Errors
    ///
    /// Returns [`EngineError::Store`] if the JSON does not describe a snapshot.
    pub fn from_json_str(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| EngineError::Store(format!("invalid snapshot: {e}")))
    }
}

/// An [`AvailabilityStore`] answering from an in-memory [`StoreSnapshot`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    snapshot: StoreSnapshot,
}

impl InMemoryStore {
    pub fn new(snapshot: StoreSnapshot) -> Self {
        Self { snapshot }
    }

    pub fn snapshot(&self) -> &StoreSnapshot {
        &self.snapshot
    }
}

#[async_trait]
impl AvailabilityStore for InMemoryStore {
    async fn business(&self, business_id: Uuid) -> Result<Option<Business>> {
        Ok(self
            .snapshot
            .businesses
            .iter()
            .find(|b| b.id == business_id)
            .cloned())
    }

    async fn booking_policy(&self, business_id: Uuid) -> Result<Option<BookingPolicy>> {
        Ok(self
            .snapshot
            .policies
            .iter()
            .find(|p| p.business_id == business_id)
            .map(|p| p.policy))
    }

    async fn day_schedules(&self, business_id: Uuid) -> Result<Vec<DaySchedule>> {
        Ok(self
            .snapshot
            .schedules
            .iter()
            .filter(|s| s.business_id == business_id)
            .map(|s| s.schedule.clone())
            .collect())
    }

    async fn time_blocks(&self, business_id: Uuid) -> Result<Vec<TimeBlockRow>> {
        Ok(self
            .snapshot
            .time_blocks
            .iter()
            .filter(|b| b.business_id == business_id)
            .map(|b| b.block.clone())
            .collect())
    }

    async fn appointments(
        &self,
        business_id: Uuid,
        staff: &StaffSelector,
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
    ) -> Result<Vec<AppointmentRow>> {
        Ok(self
            .snapshot
            .appointments
            .iter()
            .filter(|a| a.business_id == business_id)
            .map(|a| &a.appointment)
            .filter(|a| a.status.occupies_calendar())
            .filter(|a| match staff {
                StaffSelector::Specific(id) => a.staff_id == Some(*id),
                StaffSelector::WholeBusiness => true,
            })
            .filter(|a| {
                let end = a.ends_at.unwrap_or(a.starts_at).max(a.starts_at);
                a.starts_at <= range_end && end >= range_start
            })
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AppointmentStatus;
    use chrono::TimeZone;

    const SNAPSHOT: &str = r#"{
        "businesses": [{"id": "6f1c2a3e-8d4b-4c5a-9e7f-0a1b2c3d4e5f", "timezone": "America/New_York"}],
        "policies": [{"businessId": "6f1c2a3e-8d4b-4c5a-9e7f-0a1b2c3d4e5f", "bookingLeadDays": 2}],
        "schedules": [
            {"businessId": "6f1c2a3e-8d4b-4c5a-9e7f-0a1b2c3d4e5f", "weekday": 0, "isClosed": true},
            {"businessId": "6f1c2a3e-8d4b-4c5a-9e7f-0a1b2c3d4e5f", "weekday": 1,
             "startTime": "09:00:00", "endTime": "17:00:00", "granularityMin": 30}
        ],
        "timeBlocks": [
            {"businessId": "6f1c2a3e-8d4b-4c5a-9e7f-0a1b2c3d4e5f",
             "startsAt": "2026-03-17T16:00:00Z", "endsAt": "2026-03-17T17:00:00Z", "reason": "lunch"}
        ],
        "appointments": [
            {"businessId": "6f1c2a3e-8d4b-4c5a-9e7f-0a1b2c3d4e5f",
             "staffId": "0b9e8d7c-6a5f-4e3d-8c2b-1a0f9e8d7c6b",
             "startsAt": "2026-03-16T14:00:00Z", "endsAt": "2026-03-16T15:00:00Z", "status": "confirmed"},
            {"businessId": "6f1c2a3e-8d4b-4c5a-9e7f-0a1b2c3d4e5f",
             "startsAt": "2026-03-16T18:00:00Z", "endsAt": null, "status": "paid"},
            {"businessId": "6f1c2a3e-8d4b-4c5a-9e7f-0a1b2c3d4e5f",
             "startsAt": "2026-03-16T19:00:00Z", "endsAt": "2026-03-16T20:00:00Z", "status": "canceled_by_client"}
        ]
    }"#;

    fn business_id() -> Uuid {
        Uuid::parse_str("6f1c2a3e-8d4b-4c5a-9e7f-0a1b2c3d4e5f").unwrap()
    }

    fn store() -> InMemoryStore {
        InMemoryStore::new(StoreSnapshot::from_json_str(SNAPSHOT).unwrap())
    }

    fn range() -> (DateTime<Utc>, DateTime<Utc>) {
        (
            Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_snapshot_parses_flattened_rows() {
        let snapshot = StoreSnapshot::from_json_str(SNAPSHOT).unwrap();
        assert_eq!(snapshot.policies[0].policy.booking_lead_days, 2);
        assert!(snapshot.schedules[0].schedule.is_closed);
        assert_eq!(snapshot.schedules[1].schedule.granularity_min, Some(30));
        assert_eq!(snapshot.appointments[1].appointment.ends_at, None);
        assert_eq!(
            snapshot.appointments[2].appointment.status,
            AppointmentStatus::CanceledByClient
        );
    }

    #[test]
    fn test_snapshot_rejects_garbage() {
        let err = StoreSnapshot::from_json_str("[1, 2]").unwrap_err();
        assert!(matches!(err, EngineError::Store(_)));
    }

    #[tokio::test]
    async fn test_lookup_by_business() {
        let store = store();
        let business = store.business(business_id()).await.unwrap().unwrap();
        assert_eq!(business.timezone.as_deref(), Some("America/New_York"));
        assert!(store.business(Uuid::new_v4()).await.unwrap().is_none());
        assert!(store.booking_policy(Uuid::new_v4()).await.unwrap().is_none());
        assert_eq!(store.day_schedules(business_id()).await.unwrap().len(), 2);
        assert_eq!(store.time_blocks(business_id()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_appointments_prefilter_status_and_staff() {
        let store = store();
        let (start, end) = range();
        let all = store
            .appointments(business_id(), &StaffSelector::WholeBusiness, start, end)
            .await
            .unwrap();
        assert_eq!(all.len(), 2);

        let staff = Uuid::parse_str("0b9e8d7c-6a5f-4e3d-8c2b-1a0f9e8d7c6b").unwrap();
        let mine = store
            .appointments(business_id(), &StaffSelector::Specific(staff), start, end)
            .await
            .unwrap();
        assert_eq!(mine.len(), 1);
    }

    #[tokio::test]
    async fn test_appointments_respect_range() {
        let store = store();
        let start = Utc.with_ymd_and_hms(2026, 3, 16, 15, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 3, 16, 17, 0, 0).unwrap();
        // The 14:00-15:00 appointment touches the range start
        let rows = store
            .appointments(business_id(), &StaffSelector::WholeBusiness, start, end)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].starts_at, Utc.with_ymd_and_hms(2026, 3, 16, 14, 0, 0).unwrap());
    }
}
