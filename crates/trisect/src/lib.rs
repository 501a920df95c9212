//! ✂️ TRISECT — the dataset trisector.
//!
//! 🎬 COLD OPEN — INT. HOME OFFICE — 11:58 PM
//! 🎬 "The bucket has sixty thousand images."
//! 🎬 "The training job wants a CSV."
//! 🎬 "Nobody wants to label splits by hand."
//! 🎬 *[cracks open a terminal]* 🦆
//!
//! 📦 One-shot batch tool: enumerate a bucket, derive a category from each
//! key's first path segment, count categories in one streaming pass, then walk
//! the keys again and deal each category into TRAIN / UNASSIGNED / TEST by
//! configured percentages. Out comes a `set,image_path,label` CSV manifest
//! with fully-qualified locators. In goes coffee.
//!
//! 🧠 Knowledge graph — who does what:
//! - [`listings`] pours pages of keys (GCS JSON API, flat file, or in-memory).
//! - [`category`] turns a key into its category. One function. Total. At peace.
//! - [`tally`] counts contiguous category runs in pass 1.
//! - [`splits`] turns counts + percentages into cut points and labels.
//! - [`manifest`] renders and writes the CSV.
//! - `supervisor` conducts the two-pass orchestra and keeps the receipts.
//!
//! Ancient proverb: "He who splits without counting first, retrains twice."

use anyhow::{Context, Result};

pub mod app_config;
pub mod category;
pub mod common;
pub mod listings;
pub mod manifest;
pub(crate) mod progress;
pub mod splits;
mod supervisor;
pub mod tally;

pub use app_config::{AppConfig, ListingConfig, RuntimeConfig, load_config};
pub use common::{RunPhase, RunSummary};
pub use splits::{SplitLabel, SplitPercents, SplitPlan};

use supervisor::Supervisor;

/// 🚀 Run the whole trisection: two passes over the listing, one manifest out.
///
/// This is the crate's entire public verb. Load a config, hand it over, get a
/// [`RunSummary`] back (or an error whose chain carries a [`RunPhase`] tag
/// saying which half of the run fell over).
pub async fn run(app_config: AppConfig) -> Result<RunSummary> {
    Supervisor::new(app_config)
        .run()
        .await
        .context("💀 The trisection run failed. The manifest remains unwritten. The bucket remains unsplit.")
}
