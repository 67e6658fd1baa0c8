//! Grouping slots by local calendar day for display.

use chrono_tz::Tz;
use serde::Serialize;

use crate::model::Slot;
use crate::scoring::rank_slots;
use crate::timezone::local_date_key;

/// All slots of one local day, plus the recommended ones in ranking order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayBucket {
    /// `YYYY-MM-DD` in the grouping zone.
    pub date_key: String,
    /// Chronological.
    pub slots: Vec<Slot>,
    /// Best first.
    pub recommended: Vec<Slot>,
}

/// Group slots by [`local_date_key`] in `tz`, in ascending key order.
///
/// Grouping in a zone other than the business's (a client browsing from
/// elsewhere) is allowed; slots then bucket by the client's calendar day.
pub fn group_by_local_day(slots: &[Slot], tz: &Tz) -> Vec<DayBucket> {
    let mut buckets: Vec<DayBucket> = Vec::new();
    for slot in slots {
        let key = local_date_key(slot.starts_at, tz);
        match buckets.iter_mut().find(|b| b.date_key == key) {
            Some(bucket) => bucket.slots.push(slot.clone()),
            None => buckets.push(DayBucket {
                date_key: key,
                slots: vec![slot.clone()],
                recommended: Vec::new(),
            }),
        }
    }

    buckets.sort_by(|a, b| a.date_key.cmp(&b.date_key));
    for bucket in &mut buckets {
        bucket.slots.sort_by_key(|s| s.starts_at);
        bucket.recommended = rank_slots(&bucket.slots)
            .into_iter()
            .filter(|s| s.recommended)
            .cloned()
            .collect();
    }
    buckets
}
