//! Snapshot persistence.
//!
//! Exactly one snapshot document per feed, overwritten each run. Store
//! trouble is never fatal: an unreadable or missing document means "no
//! previous data" (first-run semantics), and a failed save is reported as
//! `false` while the run continues — notification has already been
//! decided by then.

pub mod file;
pub mod issue;

use async_trait::async_trait;

use crate::models::Snapshot;

pub use file::FileStore;
pub use issue::IssueStore;

/// Trait for snapshot store backends.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Load the previous snapshot for a feed.
    ///
    /// `None` covers first run, an unreachable or unauthenticated store,
    /// and a corrupt document alike.
    async fn load(&self, feed_id: &str) -> Option<Snapshot>;

    /// Overwrite the stored snapshot for a feed, creating the backing
    /// document if it does not exist yet. Failures are logged and
    /// reported as `false`, never raised.
    async fn save(&self, feed_id: &str, snapshot: &Snapshot) -> bool;
}
