//! Slot data structure.

use serde::{Deserialize, Serialize};

/// A reservable time unit at a facility.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Slot {
    /// Stable short identifier for the site/location (e.g. "nishiogi")
    pub facility_key: String,

    /// Human-readable room/venue name
    pub facility_name: String,

    /// Calendar date, or a raw display string treated as an opaque token
    pub date: String,

    /// Start time-of-day, normalized to HH:MM
    pub time_from: String,

    /// End time-of-day, normalized to HH:MM
    pub time_to: String,
}

/// Identity key for a slot. Two slots with equal keys are the same slot
/// regardless of any other field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SlotKey {
    pub facility_key: String,
    pub date: String,
    pub facility_name: String,
    pub time_from: String,
    pub time_to: String,
}

impl Slot {
    /// Identity key tuple used for diffing.
    pub fn key(&self) -> SlotKey {
        SlotKey {
            facility_key: self.facility_key.clone(),
            date: self.date.clone(),
            facility_name: self.facility_name.clone(),
            time_from: self.time_from.clone(),
            time_to: self.time_to.clone(),
        }
    }

    /// Format slot for display using a template.
    ///
    /// Supported placeholders:
    /// - `{facility_key}`, `{facility_name}`, `{date}`, `{time_from}`, `{time_to}`
    pub fn format(&self, template: &str) -> String {
        template
            .replace("{facility_key}", &self.facility_key)
            .replace("{facility_name}", &self.facility_name)
            .replace("{date}", &self.date)
            .replace("{time_from}", &self.time_from)
            .replace("{time_to}", &self.time_to)
    }
}
