//! Notification dispatch.
//!
//! Delivery is fire-and-forget: a failed or skipped notification never
//! affects the run outcome.

pub mod webhook;

use async_trait::async_trait;

use crate::diff::DiffOutcome;
use crate::models::{Feed, Slot};

pub use webhook::WebhookNotifier;

/// Trait for notification sinks.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a summary of the diff outcome. Returns whether a message
    /// actually went out.
    async fn notify(&self, feed: &Feed, outcome: &DiffOutcome) -> bool;
}

/// Build the human-readable summary message for a diff outcome.
///
/// Slots are grouped by facility, preserving the differ's output order
/// within each group.
pub fn format_message(feed: &Feed, outcome: &DiffOutcome) -> String {
    if outcome.new_slots.is_empty() {
        // Only reachable for a bare full→available transition.
        return format!(
            "🏢 {} の受付が再開されました（満枠 → 空きあり）\n詳細: {}",
            feed.name, feed.url
        );
    }

    let mut message = format!("🏀 {} の新しい空きが見つかりました:\n", feed.name);

    for (facility, slots) in group_by_facility(&outcome.new_slots) {
        message.push_str(&format!("\n📍 {}\n", facility));
        for slot in slots {
            message.push_str(&slot.format("🗓️ {date} ⏰ {time_from}-{time_to}\n"));
        }
    }

    message.push_str(&format!("\n詳細: {}", feed.url));
    message
}

/// Group slots by facility name, first-seen order.
fn group_by_facility(slots: &[Slot]) -> Vec<(&str, Vec<&Slot>)> {
    let mut groups: Vec<(&str, Vec<&Slot>)> = Vec::new();
    for slot in slots {
        match groups.iter_mut().find(|(name, _)| *name == slot.facility_name) {
            Some((_, members)) => members.push(slot),
            None => groups.push((slot.facility_name.as_str(), vec![slot])),
        }
    }
    groups
}
