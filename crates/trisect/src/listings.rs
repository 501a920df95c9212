//! 🔌 Listings — where the real I/O happens.
//!
//! 🚰 Listing backends pour object keys, one page at a time, in whatever order
//! the underlying store enumerates them. And in between, we panic!
//! (kidding, we use anyhow)
//!
//! 🎭 This module is the casting agency. Need keys from a real GCS bucket?
//! From a flat file of fixtures? Summoned from the in-memory void for a test?
//! We've got a backend for that. We've got backends for days.
//!
//! 🧠 Knowledge graph:
//! - Pattern: trait → concrete impls (GcsListing, FileListing, InMemoryListing)
//!   → ListingBackend enum. Same casting-call shape on every backend we'll ever add.
//! - A listing is a one-shot forward-only stream. There is no rewind. The
//!   supervisor runs TWO passes, so it calls [`ListingBackend::connect`] twice
//!   and gets two fresh streams — "re-fetch" is a feature, not an accident.
//! - `expected_total` feeds the progress bar: 0 on pass 1 (unknown), the real
//!   measured count on pass 2. No hard-coded estimates. Ever. We checked.
//!
//! 🦆 The duck is here because every dispatch module must have one. This is law.

use anyhow::{Result, bail};
use async_trait::async_trait;
use serde::Deserialize;

use crate::app_config::ListingConfig;
use crate::common::KeyPage;
use crate::progress::ProgressMetrics;

pub(crate) mod file;
pub(crate) mod gcs;
pub(crate) mod in_mem;

pub use file::FileListingConfig;
pub use gcs::GcsListingConfig;
pub use in_mem::InMemoryListingConfig;

/// 📦 Shared configuration embedded by every listing backend config.
///
/// One knob: how many keys per page. Sources are ignorant of downstream
/// concerns — they just pour pages at whatever size the config allows. 🚰
#[derive(Debug, Deserialize, Clone)]
pub struct CommonListingConfig {
    /// 📦 Max keys per page — the page-size speed limiter. For GCS this maps
    /// straight onto the API's `maxResults`; for file/in-memory backends it's
    /// just how big a chunk we hand upstream at a time.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl CommonListingConfig {
    /// ✅ Checks the paging knob makes streaming sense: `page_size` ≥ 1.
    ///
    /// 💀 A page size of zero is not "no paging", it's a listing that deals
    /// empty pages forever without ever reaching the end — an infinite loop
    /// wearing a config file as a disguise. Rejected before the first page.
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            bail!(
                "💀 page_size = 0 — a page that can hold nothing can never drain the \
                 bucket, and the listing would spin forever handing out empty pages. \
                 Set page_size to at least 1 (the default is 1000)."
            );
        }
        Ok(())
    }
}

// 📦 1000 keys per page — the GCS JSON API's own maximum, adopted here as the
// default because arguing with the API's ceiling is a losing strategy.
fn default_page_size() -> usize {
    1000
}

impl Default for CommonListingConfig {
    fn default() -> Self {
        Self { page_size: 1000 }
    }
}

/// 🚰 A listing that produces one page of object keys per call — forward-only,
/// maximally ignorant of what the keys mean.
///
/// Implement this trait and you too can be the origin of someone else's data problems.
/// Guaranteed to dispense only the finest organic, free-range, artisanal keys.
///
/// # Contract 📜
/// - `next_page` returns `Option<KeyPage>` — one page, listing order preserved.
/// - `None` = exhausted. The bucket is empty. The golden retriever goes home. 🐕
/// - The listing does NOT derive categories, count, or classify. It's a faucet,
///   not a chef. The tally and the splitter downstream do the thinking.
/// - The borrow checker demands `&mut self` because listings have state
///   (page tokens, cursors, feelings — mostly page tokens).
#[async_trait]
pub(crate) trait Listing: std::fmt::Debug {
    /// 📄 Fetch the next page of object keys.
    ///
    /// Returns `Ok(Some(page))` while keys flow. Returns `Ok(None)` when the
    /// bucket runs dry. EOF. Fin. The end. 🏁
    /// Returns `Err(...)` when something has gone sideways, sidelong, or fully upside-down.
    async fn next_page(&mut self) -> Result<Option<KeyPage>>;
}

/// 🎭 The many faces of a Listing — a polymorphic casting call for key origins.
///
/// Each variant wraps a concrete listing implementation. The enum dispatches
/// via `impl Listing for ListingBackend`, so the supervisor never needs to know
/// (or care) whether keys come from a real bucket, a fixture file, or RAM.
///
/// Think of it as a universal remote. Except it only controls bucket enumeration.
/// And it's async. And there is no warranty.
/// Ancient proverb: "He who hardcodes the backend, re-splits only once."
#[derive(Debug)]
pub(crate) enum ListingBackend {
    Gcs(gcs::GcsListing),
    File(file::FileListing),
    InMemory(in_mem::InMemoryListing),
}

impl ListingBackend {
    /// 🚀 Stand up a fresh stream for one pass over the bucket.
    ///
    /// `expected_total` is the object count the progress bar should aim at —
    /// 0 means unknown (pass 1). `show_progress = false` swaps in a hidden bar
    /// so tests and quiet runs stay quiet.
    ///
    /// Called once per pass. Two passes, two connects, two fresh streams —
    /// the "re-fetch instead of cache" strategy lives exactly here.
    pub(crate) async fn connect(
        config: &ListingConfig,
        expected_total: u64,
        show_progress: bool,
    ) -> Result<Self> {
        let progress = if show_progress {
            ProgressMetrics::new(config.describe(), expected_total)
        } else {
            ProgressMetrics::hidden(config.describe(), expected_total)
        };
        Ok(match config {
            ListingConfig::Gcs(c) => Self::Gcs(gcs::GcsListing::new(c.clone(), progress).await?),
            ListingConfig::File(c) => {
                Self::File(file::FileListing::new(c.clone(), progress).await?)
            }
            ListingConfig::InMemory(c) => {
                Self::InMemory(in_mem::InMemoryListing::new(c.clone(), progress).await?)
            }
        })
    }
}

#[async_trait]
impl Listing for ListingBackend {
    async fn next_page(&mut self) -> Result<Option<KeyPage>> {
        match self {
            ListingBackend::Gcs(g) => g.next_page().await,
            ListingBackend::File(f) => f.next_page().await,
            ListingBackend::InMemory(m) => m.next_page().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn the_one_where_a_zero_page_size_is_shown_the_door() {
        let the_error = CommonListingConfig { page_size: 0 }
            .validate()
            .expect_err("💀 a page that holds nothing is not a page");
        assert!(format!("{the_error:#}").contains("page_size"));
        assert!(CommonListingConfig { page_size: 1 }.validate().is_ok());
        assert!(CommonListingConfig::default().validate().is_ok());
    }
}
