//! 📦 The world's most obliging listing backend.
//!
//! `InMemoryListing` holds a configured vec of keys and deals them out in
//! pages, like a card dealer who has already seen every card and is at peace
//! with it. No network calls. No disk I/O. No heartbeat. Just vibes and heap
//! memory.
//!
//! ⚠️ This is for tests and demos. If you're pointing production at an
//! in-memory bucket, please also deploy a therapist.
//!
//! 🧠 Knowledge graph: unlike its cousins, this backend's "re-fetch" between
//! passes is genuinely free — the supervisor connects twice and gets the same
//! keys twice, which is exactly the determinism the two-pass design assumes
//! of real buckets. Here the assumption is a tautology. Enjoy it. 🦆

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;

use crate::common::KeyPage;
use crate::listings::{CommonListingConfig, Listing};
use crate::progress::ProgressMetrics;

/// 🔧 Configuration for the in-memory backend: the keys ARE the config.
#[derive(Debug, Deserialize, Clone)]
pub struct InMemoryListingConfig {
    /// 🪣 Pseudo-bucket name stamped into manifest locators.
    #[serde(default = "default_in_mem_bucket")]
    pub bucket: String,
    /// 🔑 The entire listing, verbatim, in order.
    pub keys: Vec<String>,
    #[serde(default)]
    pub common_config: CommonListingConfig,
}

fn default_in_mem_bucket() -> String {
    "in-memory".to_string()
}

/// 📦 Deals the configured keys out in `page_size` chunks, then returns `None`.
/// A cursor and a vec. The whole state machine fits in a tweet.
#[derive(Debug)]
pub(crate) struct InMemoryListing {
    config: InMemoryListingConfig,
    /// 🔖 Index of the next undealt key.
    cursor: usize,
    progress: ProgressMetrics,
}

impl InMemoryListing {
    /// 🚀 No I/O, no config files, no prayers. The most peaceful constructor
    /// in the entire crate. Cherish this moment.
    ///
    /// It's async because we respect the trait contract, not because we need it.
    /// Ancient proverb: "He who makes everything async learns nothing, but ships faster."
    pub(crate) async fn new(
        config: InMemoryListingConfig,
        progress: ProgressMetrics,
    ) -> Result<Self> {
        Ok(Self {
            config,
            cursor: 0,
            progress,
        })
    }
}

#[async_trait]
impl Listing for InMemoryListing {
    /// 📄 Deal the next chunk of keys. `None` once the deck is empty.
    async fn next_page(&mut self) -> Result<Option<KeyPage>> {
        if self.cursor >= self.config.keys.len() {
            self.progress.finish();
            return Ok(None);
        }

        let end = (self.cursor + self.config.common_config.page_size).min(self.config.keys.len());
        let keys: Vec<String> = self.config.keys[self.cursor..end].to_vec();
        self.cursor = end;

        self.progress.update(keys.len() as u64);
        Ok(Some(KeyPage::new(keys)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn listing_of(keys: &[&str], page_size: usize) -> InMemoryListing {
        InMemoryListing::new(
            InMemoryListingConfig {
                bucket: "test".into(),
                keys: keys.iter().map(|k| k.to_string()).collect(),
                common_config: CommonListingConfig { page_size },
            },
            ProgressMetrics::hidden("test".into(), 0),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn the_one_where_the_deck_is_dealt_in_order() {
        let mut listing = listing_of(&["a/1", "a/2", "b/1"], 2).await;
        assert_eq!(listing.next_page().await.unwrap().unwrap().keys, vec!["a/1", "a/2"]);
        assert_eq!(listing.next_page().await.unwrap().unwrap().keys, vec!["b/1"]);
        assert!(listing.next_page().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn the_one_where_an_empty_deck_deals_nothing() {
        let mut listing = listing_of(&[], 5).await;
        assert!(listing.next_page().await.unwrap().is_none());
    }
}
