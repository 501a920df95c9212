//! 🎬 COLD OPEN — INT. DATA CENTER — 3:47 AM
//! 🎬 *[a progress bar inches forward in the dark]*
//! 🎬 "Sixty thousand keys. Two passes. One CSV."
//! 🎬 *[the supervisor cracks its knuckles]* 🦆
//!
//! 📦 The Supervisor module — part air-traffic controller, part accountant,
//! part that one colleague who insists on reading the whole dataset twice
//! "just to be sure". (They're right. That's the algorithm.)
//!
//! 🧠 Knowledge graph — the whole run, in order:
//! 1. Pass 1 streams every key through the [`CategoryTally`] and learns how big
//!    each category is. Nothing is written. Nothing is labeled. Just counting.
//! 2. The frozen [`CategorySizes`] census turns each category's size into a
//!    [`SplitPlan`] — the TRAIN/UNASSIGNED cut points.
//! 3. Pass 2 walks the same keys in the same order, tracks a zero-based ordinal
//!    that resets at every category boundary, and writes one manifest row per
//!    non-excluded key.
//!
//! Determinism is the load-bearing assumption: both passes must see the same
//! keys in the same order. Bucket listings are lexicographic, so they do —
//! unless someone uploads mid-run, in which case pass 2 notices the stranger
//! category and bails instead of mislabeling.

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::app_config::AppConfig;
use crate::category::category_of;
use crate::common::{RunPhase, RunSummary};
use crate::listings::in_mem::{InMemoryListing, InMemoryListingConfig};
use crate::listings::{Listing, ListingBackend};
use crate::manifest::{ManifestRecord, ManifestSink, locator};
use crate::progress::ProgressMetrics;
use crate::splits::SplitPlan;
use crate::tally::{CategorySizes, CategoryTally};

/// 📦 The Supervisor: owns the config, runs both passes, returns the receipts.
///
/// It holds no I/O handles of its own — listings and the manifest sink are
/// stood up fresh inside [`Supervisor::run`] and torn down before it returns.
/// One-shot by design. There is no daemon mode. There will be no daemon mode.
pub(crate) struct Supervisor {
    /// 🔧 The sacred scrolls of configuration, passed down from main()
    /// through the ancient ritual of .clone()
    app_config: AppConfig,
}

impl Supervisor {
    /// 🚀 Birth of a Supervisor. It's like a baby, but less crying.
    /// Actually no, there's plenty of crying. Mostly from the developer.
    pub(crate) fn new(app_config: AppConfig) -> Self {
        Self { app_config }
    }

    /// 🏁 The whole show: validate, count, cut, write, report.
    ///
    /// 🚦 Errors are tagged with a [`RunPhase`] via the context chain so the
    /// CLI can tell "the bucket hung up on us" apart from "the disk is full"
    /// without parsing error strings like an animal.
    pub(crate) async fn run(self) -> Result<RunSummary> {
        // 🔧 Fail on nonsense config before any network packet moves — bad
        // percentages can't be split, and a zero page size would deal empty
        // pages forever without ever draining the listing.
        self.app_config.split.validate()?;
        self.app_config.listing.common().validate()?;

        let (sizes, cached_keys) = self.first_pass().await?;

        info!(
            "🧮 Pass 1 complete: {} objects across {} categories",
            sizes.total(),
            sizes.category_count()
        );

        let summary = self.second_pass(&sizes, cached_keys).await?;

        info!(
            "✅ Manifest written: {} rows to '{}' ({} excluded)",
            summary.rows_written, summary.manifest_path, summary.rows_excluded
        );
        Ok(summary)
    }

    /// 🧮 Pass 1: stream every key, count every category, write nothing.
    ///
    /// When `runtime.cache_keys` is on, the exact key sequence is also stashed
    /// for replay — one bucket walk instead of two, bought with RAM.
    async fn first_pass(&self) -> Result<(CategorySizes, Option<Vec<String>>)> {
        // 📡 expected_total = 0: we genuinely don't know yet. That's the point
        // of this pass. The progress bar shows "current / ?" and copes.
        let mut listing =
            ListingBackend::connect(&self.app_config.listing, 0, self.app_config.runtime.progress)
                .await
                .context(RunPhase::Listing)?;

        let mut tally = CategoryTally::new();
        let mut cached_keys = self.app_config.runtime.cache_keys.then(Vec::new);

        while let Some(page) = listing.next_page().await.context(RunPhase::Listing)? {
            for key in &page.keys {
                // 💀 A category reappearing after the tally flushed it means the
                // listing isn't contiguous — labels would come out wrong, so
                // this is a listing-phase failure, full stop.
                tally.observe(key).context(RunPhase::Listing)?;
            }
            if let Some(keys) = cached_keys.as_mut() {
                keys.extend_from_slice(&page.keys);
            }
        }

        Ok((tally.finish(), cached_keys))
    }

    /// ✂️ Pass 2: same keys, same order, now with labels and a pen.
    async fn second_pass(
        &self,
        sizes: &CategorySizes,
        cached_keys: Option<Vec<String>>,
    ) -> Result<RunSummary> {
        let mut listing = self
            .second_pass_listing(cached_keys, sizes.total())
            .await
            .context(RunPhase::Listing)?;

        let mut sink = ManifestSink::create(self.app_config.manifest.clone())
            .await
            .context(RunPhase::Write)?;

        let scheme = &self.app_config.manifest.scheme;
        let bucket = self.app_config.listing.bucket_label();

        // 🔖 The ordinal: each key's zero-based position within its category.
        // Resets at every category boundary. Excluded keys still advance it —
        // exclusion happens at the pen, not at the counter, so the surviving
        // rows keep the exact labels they'd have had in a full manifest.
        let mut current_category: Option<String> = None;
        let mut ordinal: u64 = 0;
        let mut plan = SplitPlan::for_category(0, self.app_config.split);
        let mut rows_excluded: u64 = 0;

        while let Some(page) = listing.next_page().await.context(RunPhase::Listing)? {
            for key in &page.keys {
                let category = category_of(key);

                if current_category.as_deref() != Some(category) {
                    let category_size = sizes.get(category).with_context(|| {
                        format!(
                            "💀 Category '{category}' showed up in pass 2 but was never counted \
                             in pass 1. Either the bucket changed mid-run or the listing order \
                             is nondeterministic. Both are listing problems. Neither is fine."
                        )
                    }).context(RunPhase::Listing)?;
                    debug!("✂️ Entering category '{category}' ({category_size} objects)");
                    plan = SplitPlan::for_category(category_size, self.app_config.split);
                    current_category = Some(category.to_string());
                    ordinal = 0;
                }

                let set = plan.label(ordinal);
                ordinal += 1;

                if self.app_config.excluded_labels.contains(category) {
                    rows_excluded += 1;
                    continue;
                }

                let record = ManifestRecord {
                    set,
                    image_path: locator(scheme, bucket, key),
                    label: category.to_string(),
                };
                sink.append(&record).await.context(RunPhase::Write)?;
            }
        }

        let rows_written = sink.rows_written();
        sink.close().await.context(RunPhase::Write)?;

        Ok(RunSummary {
            objects_listed: sizes.total(),
            rows_written,
            rows_excluded,
            categories: sizes.category_count(),
            manifest_path: self.app_config.manifest.file_name.clone(),
        })
    }

    /// 🔌 Stand up the key stream for pass 2.
    ///
    /// Cached mode replays the pass-1 sequence through the in-memory backend —
    /// same pages, same order, zero network. Otherwise we connect fresh and
    /// walk the bucket again, now with a real total for the progress bar.
    async fn second_pass_listing(
        &self,
        cached_keys: Option<Vec<String>>,
        expected_total: u64,
    ) -> Result<ListingBackend> {
        match cached_keys {
            Some(keys) => {
                let label = format!("{} (cached replay)", self.app_config.listing.describe());
                let progress = if self.app_config.runtime.progress {
                    ProgressMetrics::new(label, expected_total)
                } else {
                    ProgressMetrics::hidden(label, expected_total)
                };
                let replay_config = InMemoryListingConfig {
                    bucket: self.app_config.listing.bucket_label().to_string(),
                    keys,
                    common_config: self.app_config.listing.common().clone(),
                };
                Ok(ListingBackend::InMemory(
                    InMemoryListing::new(replay_config, progress).await?,
                ))
            }
            None => {
                ListingBackend::connect(
                    &self.app_config.listing,
                    expected_total,
                    self.app_config.runtime.progress,
                )
                .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_config::{ListingConfig, RuntimeConfig};
    use crate::listings::CommonListingConfig;
    use crate::manifest::ManifestConfig;
    use crate::splits::SplitPercents;
    use std::collections::HashSet;

    fn test_config(keys: &[&str], manifest_path: &std::path::Path) -> AppConfig {
        AppConfig {
            listing: ListingConfig::InMemory(InMemoryListingConfig {
                bucket: "art_translate_1".to_string(),
                keys: keys.iter().map(|k| k.to_string()).collect(),
                common_config: CommonListingConfig { page_size: 2 },
            }),
            manifest: ManifestConfig {
                file_name: manifest_path.to_string_lossy().to_string(),
                scheme: "gs".to_string(),
            },
            split: SplitPercents {
                percent_training: 50,
                percent_validation: 0,
            },
            excluded_labels: HashSet::new(),
            runtime: RuntimeConfig {
                cache_keys: false,
                progress: false,
            },
        }
    }

    async fn run_and_read(config: AppConfig) -> (RunSummary, Vec<Vec<String>>) {
        let manifest_path = config.manifest.file_name.clone();
        let summary = Supervisor::new(config)
            .run()
            .await
            .expect("💀 Supervisor faceplanted on a perfectly nice in-memory bucket");

        let mut reader = csv::Reader::from_path(&manifest_path)
            .expect("💀 The manifest we just wrote has gone missing. Spooky.");
        let rows = reader
            .records()
            .map(|r| {
                r.expect("💀 unreadable CSV row")
                    .iter()
                    .map(|f| f.to_string())
                    .collect()
            })
            .collect();
        (summary, rows)
    }

    #[tokio::test]
    async fn the_one_where_two_categories_get_cut_at_fifty_percent() {
        let dir = tempfile::tempdir().expect("💀 no tempdir, no test");
        let manifest = dir.path().join("manifest.csv");
        let config = test_config(
            &["cat-a/1.png", "cat-a/2.png", "cat-b/1.png"],
            manifest.as_path(),
        );

        let (summary, rows) = run_and_read(config).await;

        assert_eq!(summary.objects_listed, 3);
        assert_eq!(summary.rows_written, 3);
        assert_eq!(summary.rows_excluded, 0);
        assert_eq!(summary.categories, 2);

        // 🎯 cat-a: 2 keys, floor(2*50/100)=1 TRAIN then TEST.
        // 🎯 cat-b: 1 key, floor(1*50/100)=0 TRAIN, straight to TEST.
        assert_eq!(
            rows,
            vec![
                vec![
                    "TRAIN".to_string(),
                    "gs://art_translate_1/cat-a/1.png".to_string(),
                    "cat-a".to_string()
                ],
                vec![
                    "TEST".to_string(),
                    "gs://art_translate_1/cat-a/2.png".to_string(),
                    "cat-a".to_string()
                ],
                vec![
                    "TEST".to_string(),
                    "gs://art_translate_1/cat-b/1.png".to_string(),
                    "cat-b".to_string()
                ],
            ]
        );
    }

    #[tokio::test]
    async fn the_one_where_exclusion_skips_the_pen_but_not_the_counter() {
        let dir = tempfile::tempdir().expect("💀 no tempdir, no test");
        let manifest = dir.path().join("manifest.csv");
        let mut config = test_config(
            &[
                "banished/1.png",
                "banished/2.png",
                "kept/1.png",
                "kept/2.png",
            ],
            manifest.as_path(),
        );
        config.excluded_labels.insert("banished".to_string());

        let (summary, rows) = run_and_read(config).await;

        assert_eq!(summary.rows_written, 2);
        assert_eq!(summary.rows_excluded, 2);
        // 📊 objects_listed counts the banished ones too. The census sees all.
        assert_eq!(summary.objects_listed, 4);
        assert!(rows.iter().all(|r| r[2] == "kept"));
        assert_eq!(rows[0][0], "TRAIN");
        assert_eq!(rows[1][0], "TEST");
    }

    #[tokio::test]
    async fn the_one_where_cached_replay_writes_the_same_manifest() {
        let dir = tempfile::tempdir().expect("💀 no tempdir, no test");
        let keys = [
            "alpha/1.png",
            "alpha/2.png",
            "alpha/3.png",
            "beta/1.png",
            "beta/2.png",
        ];

        let refetch_path = dir.path().join("refetch.csv");
        let (_, refetch_rows) = run_and_read(test_config(&keys, refetch_path.as_path())).await;

        let cached_path = dir.path().join("cached.csv");
        let mut cached_config = test_config(&keys, cached_path.as_path());
        cached_config.runtime.cache_keys = true;
        let (_, cached_rows) = run_and_read(cached_config).await;

        // 🔧 cache_keys changes HOW, never WHAT.
        assert_eq!(refetch_rows, cached_rows);
    }

    #[tokio::test]
    async fn the_one_where_a_zero_page_size_is_refused_up_front() {
        // 🧪 An unvalidated page_size = 0 would hand the run empty pages forever
        // with the cursor frozen in place. It has to die at validation instead.
        let dir = tempfile::tempdir().expect("💀 no tempdir, no test");
        let manifest = dir.path().join("never_written.csv");
        let mut config = test_config(&["a/1.png"], manifest.as_path());
        if let ListingConfig::InMemory(c) = &mut config.listing {
            c.common_config.page_size = 0;
        }

        let err = Supervisor::new(config)
            .run()
            .await
            .expect_err("💀 a zero page size must be rejected, not looped on");
        assert!(format!("{err:#}").contains("page_size"));
        assert!(!manifest.exists());
    }

    #[tokio::test]
    async fn the_one_where_bad_percentages_die_before_any_io() {
        let dir = tempfile::tempdir().expect("💀 no tempdir, no test");
        let manifest = dir.path().join("never_written.csv");
        let mut config = test_config(&["a/1.png"], manifest.as_path());
        config.split = SplitPercents {
            percent_training: 90,
            percent_validation: 20,
        };

        let err = Supervisor::new(config)
            .run()
            .await
            .expect_err("💀 110% of a dataset should not be a thing");
        // 🚦 Config error, not a phase error — no RunPhase tag anywhere in the chain.
        assert!(err.downcast_ref::<RunPhase>().is_none());
        assert!(!manifest.exists());
    }
}
