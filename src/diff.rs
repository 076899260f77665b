//! Diff calculation between availability snapshots.
//!
//! Computes which slots in the current snapshot are new relative to the
//! previously persisted one, for notification dispatch. Comparison is
//! set-based on slot identity keys only; a slot that keeps its key but
//! changes some other field is not reported.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::models::{Slot, Snapshot};

/// Result of a snapshot comparison.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DiffOutcome {
    /// Slots present in the current snapshot but absent from the previous
    /// one, in the current snapshot's order
    pub new_slots: Vec<Slot>,

    /// No previous snapshot existed
    pub first_run: bool,

    /// The feed went from "full" to not-full since the last run
    pub status_transition: bool,
}

impl DiffOutcome {
    /// Whether this outcome warrants a notification.
    ///
    /// A full-to-available transition counts even with zero itemized
    /// slots; it is a state change in its own right.
    pub fn has_changes(&self) -> bool {
        !self.new_slots.is_empty() || self.status_transition
    }
}

/// Calculate the diff between the previous and current snapshots.
///
/// First-run rule: with no previous snapshot, every current slot is new,
/// so the first run notifies if any slots exist at all.
pub fn diff(previous: Option<&Snapshot>, current: &Snapshot) -> DiffOutcome {
    let Some(previous) = previous else {
        return DiffOutcome {
            new_slots: current.slots.clone(),
            first_run: true,
            status_transition: false,
        };
    };

    let status_transition = previous.is_full() && !current.is_full();

    if status_transition {
        // Everything the feed now lists is news to the subscriber.
        return DiffOutcome {
            new_slots: current.slots.clone(),
            first_run: false,
            status_transition: true,
        };
    }

    let previous_keys: HashSet<_> = previous.slots.iter().map(Slot::key).collect();

    let new_slots: Vec<Slot> = current
        .slots
        .iter()
        .filter(|slot| !previous_keys.contains(&slot.key()))
        .cloned()
        .collect();

    DiffOutcome {
        new_slots,
        first_run: false,
        status_transition: false,
    }
}
