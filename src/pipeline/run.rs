// src/pipeline/run.rs

//! One run of the snapshot-diff-notify pipeline.

use crate::diff;
use crate::error::Result;
use crate::fetch::Fetcher;
use crate::models::Feed;
use crate::notify::Notifier;
use crate::store::SnapshotStore;

/// Summary of one completed run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Feed that was checked
    pub feed_id: String,
    /// Slots in the current snapshot
    pub slot_count: usize,
    /// Slots reported as new by the differ
    pub new_count: usize,
    /// Whether a notification actually went out
    pub notified: bool,
    /// Whether the snapshot was persisted
    pub saved: bool,
}

/// Run the pipeline once for a feed.
///
/// Sequence: fetch → load previous → diff → notify on changes → save.
/// Only a fetch failure is an error; nothing is persisted in that case,
/// so the stale previous snapshot stays in place for the next run. The
/// save itself is best-effort and never fails the run.
pub async fn run_check(
    feed: &Feed,
    fetcher: &dyn Fetcher,
    store: &dyn SnapshotStore,
    notifier: &dyn Notifier,
) -> Result<RunReport> {
    log::info!("Checking feed '{}' ({})", feed.id, feed.name);

    let current = fetcher.fetch(feed).await?;
    log::info!(
        "Fetched snapshot for '{}': {} slots, full={}",
        feed.id,
        current.slot_count(),
        current.is_full()
    );

    let previous = store.load(&feed.id).await;

    let outcome = diff::diff(previous.as_ref(), &current);
    if outcome.first_run {
        log::info!("First run for '{}'", feed.id);
    }
    if outcome.status_transition {
        log::info!("Feed '{}' went from full to available", feed.id);
    }

    let notified = if outcome.has_changes() {
        log::info!(
            "{} new slots for '{}'; notifying",
            outcome.new_slots.len(),
            feed.id
        );
        notifier.notify(feed, &outcome).await
    } else {
        log::info!("No changes for '{}'", feed.id);
        false
    };

    let saved = store.save(&feed.id, &current).await;
    if !saved {
        log::warn!("Snapshot save failed for '{}'; continuing", feed.id);
    }

    Ok(RunReport {
        feed_id: feed.id.clone(),
        slot_count: current.slot_count(),
        new_count: outcome.new_slots.len(),
        notified,
        saved,
    })
}

/// Run the pipeline for every feed in turn.
///
/// Feeds are independent: one failed fetch does not stop the others, but
/// any failure makes the overall result an error after all feeds ran.
pub async fn run_all(
    feeds: &[Feed],
    fetcher: &dyn Fetcher,
    store: &dyn SnapshotStore,
    notifier: &dyn Notifier,
) -> Result<Vec<RunReport>> {
    let mut reports = Vec::with_capacity(feeds.len());
    let mut first_error = None;

    for feed in feeds {
        match run_check(feed, fetcher, store, notifier).await {
            Ok(report) => reports.push(report),
            Err(e) => {
                log::error!("Check failed for '{}': {}", feed.id, e);
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(reports),
    }
}
