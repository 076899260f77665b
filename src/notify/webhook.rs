//! Webhook notification sink.
//!
//! One HTTP POST of `{"text": <string>}` to an operator-supplied URL.
//! Non-2xx responses are logged, never retried.

use async_trait::async_trait;

use crate::diff::DiffOutcome;
use crate::models::Feed;

use super::{Notifier, format_message};

/// Environment variable holding the webhook URL.
pub const WEBHOOK_URL_ENV: &str = "SLACK_WEBHOOK_URL";

/// Notifier posting to a Slack-style incoming webhook.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: Option<String>,
}

impl WebhookNotifier {
    pub fn new(client: reqwest::Client, url: Option<String>) -> Self {
        Self { client, url }
    }

    /// Read the destination from the environment. An unset variable is
    /// allowed; the notifier then degrades to a logged no-op.
    pub fn from_env(client: reqwest::Client) -> Self {
        let url = std::env::var(WEBHOOK_URL_ENV).ok().filter(|u| !u.is_empty());
        if url.is_none() {
            log::warn!("{} is not set; notifications disabled", WEBHOOK_URL_ENV);
        }
        Self::new(client, url)
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, feed: &Feed, outcome: &DiffOutcome) -> bool {
        let Some(url) = &self.url else {
            log::info!("No webhook configured; skipping notification for '{}'", feed.id);
            return false;
        };

        let payload = serde_json::json!({ "text": format_message(feed, outcome) });

        match self.client.post(url).json(&payload).send().await {
            Ok(response) if response.status().is_success() => {
                log::info!(
                    "Notified {} new slots for '{}'",
                    outcome.new_slots.len(),
                    feed.id
                );
                true
            }
            Ok(response) => {
                log::warn!(
                    "Webhook returned {} for '{}'",
                    response.status(),
                    feed.id
                );
                false
            }
            Err(e) => {
                log::warn!("Webhook delivery failed for '{}': {}", feed.id, e);
                false
            }
        }
    }
}
