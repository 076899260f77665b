//! Plain-HTTP fetcher.
//!
//! Pulls an availability document as JSON from the feed URL. Sites that
//! need a rendered page get their own `Fetcher` implementation outside
//! this crate.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::{Feed, Slot, Snapshot, Status};

use super::Fetcher;

/// Wire format of an availability document.
#[derive(Debug, Deserialize)]
struct AvailabilityDoc {
    #[serde(default)]
    status: Status,
    #[serde(default, alias = "availability")]
    slots: Vec<Slot>,
}

/// Fetcher that GETs a JSON availability document.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, feed: &Feed) -> Result<Snapshot> {
        let response = self.client.get(&feed.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::fetch(
                &feed.id,
                format!("HTTP {} from {}", status, feed.url),
            ));
        }

        let doc: AvailabilityDoc = response.json().await?;
        log::info!(
            "Fetched {} slots for '{}' (status: {:?})",
            doc.slots.len(),
            feed.id,
            doc.status
        );

        Ok(Snapshot::new(doc.status, doc.slots))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doc_parses_availability_alias() {
        let doc: AvailabilityDoc = serde_json::from_str(
            r#"{
                "availability": [{
                    "facility_key": "nishiogi",
                    "facility_name": "体育室半面Ａ",
                    "date": "2025-09-27",
                    "time_from": "09:00",
                    "time_to": "11:00"
                }]
            }"#,
        )
        .unwrap();

        assert_eq!(doc.status, Status::Available);
        assert_eq!(doc.slots.len(), 1);
        assert_eq!(doc.slots[0].facility_key, "nishiogi");
    }

    #[test]
    fn test_doc_full_status() {
        let doc: AvailabilityDoc = serde_json::from_str(r#"{"status": "full"}"#).unwrap();
        assert_eq!(doc.status, Status::Full);
        assert!(doc.slots.is_empty());
    }
}
