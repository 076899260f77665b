//! Local filesystem snapshot store.
//!
//! One JSON document per feed under a root directory:
//!
//! ```text
//! {root}/
//! ├── nishiogi.json
//! └── sesion.json
//! ```

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::Snapshot;

use super::SnapshotStore;

/// Local filesystem store backend.
#[derive(Clone)]
pub struct FileStore {
    root_dir: PathBuf,
}

impl FileStore {
    /// Create a new FileStore rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// Snapshot file path for a feed.
    fn path(&self, feed_id: &str) -> PathBuf {
        self.root_dir.join(format!("{feed_id}.json"))
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, feed_id: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(feed_id);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Read bytes, returning None if the file doesn't exist.
    async fn read_bytes(&self, feed_id: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(feed_id);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }
}

#[async_trait]
impl SnapshotStore for FileStore {
    async fn load(&self, feed_id: &str) -> Option<Snapshot> {
        let bytes = match self.read_bytes(feed_id).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                log::info!("No previous snapshot for '{}'; treating as first run", feed_id);
                return None;
            }
            Err(e) => {
                log::warn!(
                    "Snapshot read failed for '{}': {}. Treating as first run.",
                    feed_id,
                    e
                );
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                log::warn!(
                    "Corrupt snapshot for '{}': {}. Treating as first run.",
                    feed_id,
                    e
                );
                None
            }
        }
    }

    async fn save(&self, feed_id: &str, snapshot: &Snapshot) -> bool {
        let bytes = match serde_json::to_vec_pretty(snapshot) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("Snapshot serialization failed for '{}': {}", feed_id, e);
                return false;
            }
        };

        match self.write_bytes(feed_id, &bytes).await {
            Ok(()) => {
                log::info!(
                    "Saved {} slots to {}",
                    snapshot.slot_count(),
                    self.path(feed_id).display()
                );
                true
            }
            Err(e) => {
                log::warn!("Snapshot write failed for '{}': {}", feed_id, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Slot, Status};
    use tempfile::TempDir;

    fn sample_snapshot() -> Snapshot {
        Snapshot::new(
            Status::Available,
            vec![Slot {
                facility_key: "nishiogi".to_string(),
                facility_name: "体育室半面Ａ".to_string(),
                date: "2025-09-27".to_string(),
                time_from: "09:00".to_string(),
                time_to: "11:00".to_string(),
            }],
        )
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path());

        let snapshot = sample_snapshot();
        assert!(store.save("nishiogi", &snapshot).await);

        let loaded = store.load("nishiogi").await.unwrap();
        assert_eq!(loaded, snapshot);
    }

    #[tokio::test]
    async fn test_load_missing_is_none() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path());

        assert!(store.load("nope").await.is_none());
    }

    #[tokio::test]
    async fn test_load_corrupt_is_none() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path());

        tokio::fs::write(tmp.path().join("bad.json"), b"not json{")
            .await
            .unwrap();
        assert!(store.load("bad").await.is_none());
    }

    #[tokio::test]
    async fn test_save_creates_missing_directory() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path().join("nested/snapshots"));

        assert!(store.save("sesion", &sample_snapshot()).await);
        assert!(store.load("sesion").await.is_some());
    }

    #[tokio::test]
    async fn test_save_overwrites_previous_generation() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path());

        let first = sample_snapshot();
        store.save("sesion", &first).await;

        let second = Snapshot::full();
        store.save("sesion", &second).await;

        let loaded = store.load("sesion").await.unwrap();
        assert!(loaded.is_full());
        assert_eq!(loaded.slot_count(), 0);
    }
}
