//! Feed definition.

use serde::{Deserialize, Serialize};

/// One (site, facility) pairing tracked independently, with its own
/// snapshot document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feed {
    /// Stable identifier, used as the snapshot document key
    pub id: String,

    /// Human-readable name used in notifications
    pub name: String,

    /// URL the fetcher polls for this feed
    pub url: String,

    /// Issue number for the issue-backed store (one issue per feed)
    #[serde(default)]
    pub issue_number: Option<u64>,
}

impl Feed {
    pub fn new(id: impl Into<String>, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            url: url.into(),
            issue_number: None,
        }
    }
}
