//! Issue-tracker-backed snapshot store.
//!
//! Each feed maps to one issue on a GitHub-style API whose body is free
//! text containing exactly one fenced ```json block holding the snapshot
//! document. Writes are update-or-create: GET to check existence, PATCH
//! the body, POST a new issue on 404. The surrounding text is
//! presentation only; the fenced block is the state.

use std::collections::HashMap;

use async_trait::async_trait;
use regex::Regex;
use serde_json::json;

use crate::models::{Feed, Snapshot};

use super::SnapshotStore;

/// Environment variable holding the API token.
pub const TOKEN_ENV: &str = "GITHUB_TOKEN";
/// Environment variable holding the `owner/repo` pair.
pub const REPO_ENV: &str = "GITHUB_REPOSITORY";

/// Issue binding for one feed.
#[derive(Debug, Clone)]
struct IssueBinding {
    number: u64,
    title: String,
}

/// Issue-backed store backend.
pub struct IssueStore {
    client: reqwest::Client,
    api_base: String,
    repo: String,
    token: Option<String>,
    bindings: HashMap<String, IssueBinding>,
}

impl IssueStore {
    pub fn new(
        client: reqwest::Client,
        api_base: impl Into<String>,
        repo: impl Into<String>,
        token: Option<String>,
    ) -> Self {
        Self {
            client,
            api_base: api_base.into(),
            repo: repo.into(),
            token: token.filter(|t| !t.is_empty()),
            bindings: HashMap::new(),
        }
    }

    /// Construct from the environment, binding the given feeds.
    ///
    /// A missing token is allowed; the store then degrades to first-run
    /// loads and failed saves instead of aborting the run.
    pub fn from_env(client: reqwest::Client, api_base: impl Into<String>, feeds: &[Feed]) -> Self {
        let token = std::env::var(TOKEN_ENV).ok();
        if token.is_none() {
            log::warn!("{} is not set; issue store disabled", TOKEN_ENV);
        }
        let repo = std::env::var(REPO_ENV).unwrap_or_default();

        Self::new(client, api_base, repo, token).with_feeds(feeds)
    }

    /// Bind feeds to their issue numbers.
    pub fn with_feeds(mut self, feeds: &[Feed]) -> Self {
        for feed in feeds {
            if let Some(number) = feed.issue_number {
                self.bindings.insert(
                    feed.id.clone(),
                    IssueBinding {
                        number,
                        title: format!("{} 空き状況", feed.name),
                    },
                );
            }
        }
        self
    }

    fn issue_url(&self, number: u64) -> String {
        format!("{}/repos/{}/issues/{}", self.api_base, self.repo, number)
    }

    fn create_url(&self) -> String {
        format!("{}/repos/{}/issues", self.api_base, self.repo)
    }

    /// Credentials and binding for a feed, or None if either is missing.
    fn access(&self, feed_id: &str) -> Option<(&str, &IssueBinding)> {
        let token = self.token.as_deref()?;
        let binding = self.bindings.get(feed_id)?;
        Some((token, binding))
    }

    fn request(&self, builder: reqwest::RequestBuilder, token: &str) -> reqwest::RequestBuilder {
        builder
            .header("Authorization", format!("token {token}"))
            .header("Accept", "application/vnd.github.v3+json")
    }

    /// GET the current issue body. A true 404 is distinct from a
    /// transient failure: only the former may trigger issue creation.
    async fn get_body(&self, token: &str, number: u64) -> IssueFetch {
        let response = match self
            .request(self.client.get(self.issue_url(number)), token)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                log::warn!("Issue #{} fetch failed: {}", number, e);
                return IssueFetch::Unavailable;
            }
        };

        match response.status() {
            s if s.is_success() => match response.json::<serde_json::Value>().await {
                Ok(issue) => {
                    let body = issue
                        .get("body")
                        .and_then(|b| b.as_str())
                        .unwrap_or_default();
                    IssueFetch::Found(body.to_string())
                }
                Err(e) => {
                    log::warn!("Issue #{} response parse failed: {}", number, e);
                    IssueFetch::Unavailable
                }
            },
            reqwest::StatusCode::NOT_FOUND => IssueFetch::NotFound,
            s => {
                log::warn!("Issue #{} fetch returned {}", number, s);
                IssueFetch::Unavailable
            }
        }
    }
}

/// Outcome of fetching an issue.
#[derive(Debug, Clone, PartialEq, Eq)]
enum IssueFetch {
    /// Issue exists; its current body
    Found(String),
    /// Tracker answered 404
    NotFound,
    /// Transient trouble; existence unknown
    Unavailable,
}

/// Write action derived from the existence check. `None` means the check
/// itself failed and nothing must be written.
fn save_action(fetch: &IssueFetch) -> Option<SaveAction> {
    match fetch {
        IssueFetch::Found(_) => Some(SaveAction::Update),
        IssueFetch::NotFound => Some(SaveAction::Create),
        IssueFetch::Unavailable => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SaveAction {
    Update,
    Create,
}

#[async_trait]
impl SnapshotStore for IssueStore {
    async fn load(&self, feed_id: &str) -> Option<Snapshot> {
        let Some((token, binding)) = self.access(feed_id) else {
            log::info!(
                "Issue store unavailable for '{}'; treating as first run",
                feed_id
            );
            return None;
        };

        let IssueFetch::Found(body) = self.get_body(token, binding.number).await else {
            log::info!(
                "Issue #{} not readable for '{}'; treating as first run",
                binding.number,
                feed_id
            );
            return None;
        };
        match extract_snapshot(&body) {
            Some(snapshot) => Some(snapshot),
            None => {
                log::warn!(
                    "Issue #{} has no parseable snapshot block; treating as first run",
                    binding.number
                );
                None
            }
        }
    }

    async fn save(&self, feed_id: &str, snapshot: &Snapshot) -> bool {
        let Some((token, binding)) = self.access(feed_id) else {
            log::info!("Issue store unavailable for '{}'; skipping save", feed_id);
            return false;
        };

        let body = match render_body(&binding.title, snapshot) {
            Ok(body) => body,
            Err(e) => {
                log::warn!("Snapshot serialization failed for '{}': {}", feed_id, e);
                return false;
            }
        };

        // Check existence first so PATCH never targets a missing issue.
        // Only a confirmed 404 falls back to create; a failed check means
        // the issue may still exist, and a POST would orphan the write
        // under a fresh number the next load never reads.
        let fetch = self.get_body(token, binding.number).await;
        let result = match save_action(&fetch) {
            Some(SaveAction::Update) => {
                self.request(self.client.patch(self.issue_url(binding.number)), token)
                    .json(&json!({ "body": body }))
                    .send()
                    .await
            }
            Some(SaveAction::Create) => {
                self.request(self.client.post(self.create_url()), token)
                    .json(&json!({
                        "title": binding.title,
                        "body": body,
                        "labels": ["automated", feed_id],
                    }))
                    .send()
                    .await
            }
            None => {
                log::warn!(
                    "Cannot confirm issue #{} exists; skipping save for '{}'",
                    binding.number,
                    feed_id
                );
                return false;
            }
        };

        match result {
            Ok(response) if response.status().is_success() => {
                log::info!("Saved snapshot for '{}' to issue #{}", feed_id, binding.number);
                true
            }
            Ok(response) => {
                log::warn!(
                    "Issue save for '{}' returned {}",
                    feed_id,
                    response.status()
                );
                false
            }
            Err(e) => {
                log::warn!("Issue save failed for '{}': {}", feed_id, e);
                false
            }
        }
    }
}

/// Render the issue body around the snapshot's fenced JSON block.
fn render_body(title: &str, snapshot: &Snapshot) -> serde_json::Result<String> {
    let mut facilities = String::new();
    for (name, count) in facility_counts(snapshot) {
        facilities.push_str(&format!("- {name}: {count}件\n"));
    }
    if facilities.is_empty() {
        facilities.push_str(if snapshot.is_full() {
            "- 満枠\n"
        } else {
            "- 空き枠なし\n"
        });
    }

    let json = serde_json::to_string_pretty(snapshot)?;

    Ok(format!(
        "# {title}\n\n\
         最終更新: {checked_at}\n\n\
         ## 施設一覧\n\n\
         {facilities}\n\
         ## 詳細データ\n\n\
         ```json\n{json}\n```\n\n\
         ---\n\
         このIssueは自動的に更新されます。\n",
        checked_at = snapshot.checked_at.to_rfc3339(),
    ))
}

/// Slot counts per facility, first-seen order.
fn facility_counts(snapshot: &Snapshot) -> Vec<(&str, usize)> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for slot in &snapshot.slots {
        match counts.iter_mut().find(|(name, _)| *name == slot.facility_name) {
            Some((_, count)) => *count += 1,
            None => counts.push((slot.facility_name.as_str(), 1)),
        }
    }
    counts
}

/// Extract the snapshot from the fenced JSON block of an issue body.
fn extract_snapshot(body: &str) -> Option<Snapshot> {
    let re = Regex::new(r"(?s)```json\s*(.*?)```").ok()?;
    let captured = re.captures(body)?.get(1)?.as_str();
    serde_json::from_str(captured.trim()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Slot, Status};

    fn sample_snapshot() -> Snapshot {
        Snapshot::new(
            Status::Available,
            vec![
                Slot {
                    facility_key: "sesion".to_string(),
                    facility_name: "体育室全面".to_string(),
                    date: "2025-09-27".to_string(),
                    time_from: "09:00".to_string(),
                    time_to: "11:00".to_string(),
                },
                Slot {
                    facility_key: "sesion".to_string(),
                    facility_name: "体育室全面".to_string(),
                    date: "2025-09-28".to_string(),
                    time_from: "13:00".to_string(),
                    time_to: "15:00".to_string(),
                },
            ],
        )
    }

    #[test]
    fn test_render_extract_round_trip() {
        let snapshot = sample_snapshot();
        let body = render_body("セシオン杉並 空き状況", &snapshot).unwrap();

        assert!(body.contains("# セシオン杉並 空き状況"));
        assert!(body.contains("体育室全面: 2件"));

        let extracted = extract_snapshot(&body).unwrap();
        assert_eq!(extracted, snapshot);
    }

    #[test]
    fn test_render_full_snapshot() {
        let body = render_body("満枠テスト", &Snapshot::full()).unwrap();
        assert!(body.contains("満枠"));
        assert!(extract_snapshot(&body).unwrap().is_full());
    }

    #[test]
    fn test_extract_without_block_is_none() {
        assert!(extract_snapshot("just some prose, no data here").is_none());
        assert!(extract_snapshot("```json\nnot valid json\n```").is_none());
    }

    #[tokio::test]
    async fn test_unauthenticated_store_degrades() {
        let feed = Feed {
            id: "sesion".to_string(),
            name: "セシオン杉並".to_string(),
            url: "https://example.com".to_string(),
            issue_number: Some(2),
        };
        let store = IssueStore::new(reqwest::Client::new(), "https://api.invalid", "o/r", None)
            .with_feeds(std::slice::from_ref(&feed));

        assert!(store.load("sesion").await.is_none());
        assert!(!store.save("sesion", &sample_snapshot()).await);
    }

    #[test]
    fn test_save_action_tri_state() {
        assert_eq!(
            save_action(&IssueFetch::Found("body".to_string())),
            Some(SaveAction::Update)
        );
        assert_eq!(save_action(&IssueFetch::NotFound), Some(SaveAction::Create));
        // A failed existence check must not create a duplicate issue.
        assert_eq!(save_action(&IssueFetch::Unavailable), None);
    }

    #[tokio::test]
    async fn test_unreachable_tracker_skips_save() {
        let feed = Feed {
            id: "sesion".to_string(),
            name: "セシオン杉並".to_string(),
            url: "https://example.com".to_string(),
            issue_number: Some(2),
        };
        // Nothing listens here; the existence check fails, so save must
        // bail out instead of POSTing a new issue.
        let store = IssueStore::new(
            reqwest::Client::new(),
            "http://127.0.0.1:1",
            "o/r",
            Some("t".to_string()),
        )
        .with_feeds(std::slice::from_ref(&feed));

        assert!(!store.save("sesion", &sample_snapshot()).await);
        assert!(store.load("sesion").await.is_none());
    }

    #[tokio::test]
    async fn test_unbound_feed_degrades() {
        let store = IssueStore::new(
            reqwest::Client::new(),
            "https://api.invalid",
            "o/r",
            Some("t".to_string()),
        );

        assert!(store.load("unknown").await.is_none());
        assert!(!store.save("unknown", &sample_snapshot()).await);
    }
}
