use serde::{Deserialize, Serialize};
use worker::kv::KvStore;
use worker::Date;

use crate::error::TrackerError;
use crate::scraper::types::PostReference;

/// A post that has already been relayed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedEntry {
    pub shortcode: PostReference,
    pub source_url: String,
    pub video_url: String,
    pub published_id: Option<String>,
}

/// Append-only record of processed posts.
#[allow(async_fn_in_trait)]
pub trait DuplicateTracker {
    async fn contains(&self, reference: &PostReference) -> Result<bool, TrackerError>;
    async fn record(&self, entry: &TrackedEntry) -> Result<(), TrackerError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StoredEntry<'a> {
    #[serde(flatten)]
    entry: &'a TrackedEntry,
    processed_at: u64,
}

fn tracker_key(reference: &PostReference) -> String {
    format!("processed:{reference}")
}

/// KV-backed tracker. Entries never expire and are never overwritten.
pub struct KvTracker {
    store: KvStore,
}

impl KvTracker {
    pub fn new(store: KvStore) -> Self {
        KvTracker { store }
    }
}

impl DuplicateTracker for KvTracker {
    async fn contains(&self, reference: &PostReference) -> Result<bool, TrackerError> {
        let existing = self.store.get(&tracker_key(reference)).text().await?;
        Ok(existing.is_some())
    }

    async fn record(&self, entry: &TrackedEntry) -> Result<(), TrackerError> {
        let key = tracker_key(&entry.shortcode);
        if self.store.get(&key).text().await?.is_some() {
            tracing::debug!(%key, "already tracked, keeping first entry");
            return Ok(());
        }

        let json = serde_json::to_string(&StoredEntry {
            entry,
            processed_at: Date::now().as_millis(),
        })?;
        self.store.put(&key, json)?.execute().await?;
        tracing::info!(%key, "tracked processed post");
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_namespaced_by_shortcode() {
        let reference = PostReference::parse("https://www.instagram.com/reel/DAbc_1/").unwrap();
        assert_eq!(tracker_key(&reference), "processed:DAbc_1");
    }

    #[test]
    fn stored_entry_carries_timestamp() {
        let entry = TrackedEntry {
            shortcode: PostReference::parse("DAbc").unwrap(),
            source_url: "https://www.instagram.com/reel/DAbc/".into(),
            video_url: "https://cdn/v.mp4".into(),
            published_id: Some("1789".into()),
        };
        let json = serde_json::to_value(StoredEntry {
            entry: &entry,
            processed_at: 1_700_000_000_000,
        })
        .unwrap();
        assert_eq!(json["shortcode"], "DAbc");
        assert_eq!(json["publishedId"], "1789");
        assert_eq!(json["processedAt"], 1_700_000_000_000u64);
    }
}
