//! Availability snapshot.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::slot::Slot;

/// Coarse availability signal for feeds that only expose a binary state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// At least some capacity is open (or the site lists itemized slots)
    #[default]
    Available,
    /// The site reports no capacity at all
    Full,
}

/// The full set of slots (or coarse status) observed in one run.
///
/// Slot identities are unique within a snapshot; construction drops
/// duplicate keys, keeping the first occurrence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Snapshot {
    /// When the feed was checked
    pub checked_at: DateTime<Utc>,

    /// Coarse availability state
    #[serde(default)]
    pub status: Status,

    /// Itemized slots, in the order the site listed them
    #[serde(default)]
    pub slots: Vec<Slot>,
}

impl Snapshot {
    /// Build a snapshot from observed slots, deduplicating by identity key.
    pub fn new(status: Status, slots: Vec<Slot>) -> Self {
        Self::at(Utc::now(), status, slots)
    }

    /// Build a snapshot with an explicit timestamp.
    pub fn at(checked_at: DateTime<Utc>, status: Status, slots: Vec<Slot>) -> Self {
        let mut seen = HashSet::new();
        let mut unique = Vec::with_capacity(slots.len());
        for slot in slots {
            if seen.insert(slot.key()) {
                unique.push(slot);
            } else {
                log::debug!(
                    "Dropping duplicate slot {} {} {}-{}",
                    slot.facility_name,
                    slot.date,
                    slot.time_from,
                    slot.time_to
                );
            }
        }
        Self {
            checked_at,
            status,
            slots: unique,
        }
    }

    /// Snapshot for a feed that reported no capacity.
    pub fn full() -> Self {
        Self::new(Status::Full, Vec::new())
    }

    pub fn is_full(&self) -> bool {
        self.status == Status::Full
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(date: &str, from: &str) -> Slot {
        Slot {
            facility_key: "a".to_string(),
            facility_name: "Gym A".to_string(),
            date: date.to_string(),
            time_from: from.to_string(),
            time_to: "11:00".to_string(),
        }
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let snapshot = Snapshot::new(
            Status::Available,
            vec![
                slot("2025-09-27", "09:00"),
                slot("2025-09-28", "09:00"),
                slot("2025-09-27", "09:00"),
            ],
        );
        assert_eq!(snapshot.slot_count(), 2);
        assert_eq!(snapshot.slots[0].date, "2025-09-27");
        assert_eq!(snapshot.slots[1].date, "2025-09-28");
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&Status::Full).unwrap();
        assert_eq!(json, "\"full\"");
        let json = serde_json::to_string(&Status::Available).unwrap();
        assert_eq!(json, "\"available\"");
    }

    #[test]
    fn test_missing_fields_default() {
        let snapshot: Snapshot =
            serde_json::from_str(r#"{"checked_at":"2025-09-27T00:00:00Z"}"#).unwrap();
        assert_eq!(snapshot.status, Status::Available);
        assert!(snapshot.slots.is_empty());
    }
}
