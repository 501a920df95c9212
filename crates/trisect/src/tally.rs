//! 🧮 The category tally — one pass, one map, zero second chances.
//!
//! *Previously, on Trisect...*
//!
//! 🎬 The listing streamed past. Sixty thousand keys. Nobody was counting.
//! "Somebody should be counting," said the split planner, who needed the
//! per-category totals before it could cut anything. And so the tally was born:
//! a running label, a running count, and a solemn promise to flush exactly once
//! per category.
//!
//! 🧠 Knowledge graph:
//! - `CategoryTally::observe(key)` — derive category → on change, flush the
//!   previous run into the map (skipping the non-existent run before the first
//!   object) → increment the running count. Single pass, O(1) memory per category.
//! - `CategoryTally::finish()` — the final flush. Without it the LAST category
//!   would simply never exist. (The original sin of every run-length encoder.)
//! - The listing must be category-contiguous: once a category's run ends, that
//!   category must never reappear. We do not trust this invariant — we CHECK it.
//!   A reappearing category fails the run with a diagnostic naming the key,
//!   because silently wrong counts are how eval metrics become fiction.
//! - Output: [`CategorySizes`] — immutable after construction, sum of counts
//!   equals the number of observed keys. Always. There's a test. There are several.
//!
//! 📜 Ancient proverb: "He who skips the final flush, ships a manifest with one
//! category mysteriously missing, and debugs it on a Friday."

use std::collections::{HashMap, HashSet};

use anyhow::{Result, bail};
use tracing::debug;

use crate::category::category_of;

/// 📊 The finished category → count map, plus the grand total.
///
/// Built once per run by [`CategoryTally`], then never mutated again.
/// Not persisted anywhere — this is a one-shot tool, the map lives and dies
/// with the process, like a mayfly with a HashMap.
#[derive(Debug, Clone, Default)]
pub struct CategorySizes {
    sizes: HashMap<String, u64>,
    total: u64,
}

impl CategorySizes {
    /// 🔍 Count for one category, if we ever saw it.
    pub fn get(&self, category: &str) -> Option<u64> {
        self.sizes.get(category).copied()
    }

    /// 🔢 Total objects observed across all categories.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// 🔢 How many distinct categories the listing produced.
    pub fn category_count(&self) -> usize {
        self.sizes.len()
    }

    /// 🔍 Iterate (category, count) pairs. Order is HashMap order, i.e. chaos.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.sizes.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// 🧮 The streaming aggregator: consumes keys in listing order, emits [`CategorySizes`].
///
/// State is three fields and a trust issue:
/// - the label of the run currently in progress,
/// - how many keys that run has collected so far,
/// - the set of categories already flushed (the contiguity bouncer).
///
/// ⚠️ `finish()` MUST be called. An unfinished tally has swallowed the final
/// category and will not give it back. This is documented, tested, and still
/// going to bite somebody someday. Not you though. You read the docs. 🦆
#[derive(Debug, Default)]
pub struct CategoryTally {
    /// 🏷️ The category whose run is currently open. `None` before the first key.
    current: Option<String>,
    /// 🔢 Keys collected in the open run so far.
    run_count: u64,
    /// 🔒 Categories whose runs already closed. A closed run stays closed.
    flushed: HashSet<String>,
    /// 📊 The map under construction.
    sizes: HashMap<String, u64>,
    /// 🔢 Every key ever observed, across all runs.
    total: u64,
}

impl CategoryTally {
    /// 🚀 A fresh tally. No keys, no categories, nothing but potential.
    pub fn new() -> Self {
        Self::default()
    }

    /// 📥 Feed one key, in listing order.
    ///
    /// 💀 Fails if the key's category already had its run closed — that means
    /// the listing is not category-contiguous and every count downstream would
    /// be quietly wrong. We prefer loudly dead to quietly wrong.
    pub fn observe(&mut self, key: &str) -> Result<()> {
        let category = category_of(key);

        let changed = self.current.as_deref() != Some(category);
        if changed {
            // 🔒 Contiguity check BEFORE opening the new run. If this category's
            // run already closed, the listing order is broken and so are we.
            if self.flushed.contains(category) {
                bail!(
                    "💀 Listing is not grouped by category: key '{}' reopens category '{}' \
                     after that category's run already ended. Counts and ordinals would both \
                     be wrong from here on. Sort the listing (or use a listing source that \
                     yields keys in lexicographic order, like an actual bucket API) and retry.",
                    key,
                    category
                );
            }
            self.flush_current();
            self.current = Some(category.to_string());
        }

        self.run_count += 1;
        self.total += 1;
        Ok(())
    }

    /// 🏁 Close the final run and hand over the map. Consumes the tally —
    /// a finished count is a finished count, there is no observing your way
    /// back into it.
    pub fn finish(mut self) -> CategorySizes {
        self.flush_current();
        debug!(
            "🧮 tally complete: {} objects across {} categories",
            self.total,
            self.sizes.len()
        );
        CategorySizes {
            sizes: self.sizes,
            total: self.total,
        }
    }

    /// 🔄 Commit the open run into the map, if there is one. The "skip the
    /// flush on the very first object" rule falls out of `current` being `None`.
    fn flush_current(&mut self) {
        if let Some(category) = self.current.take() {
            self.sizes.insert(category.clone(), self.run_count);
            self.flushed.insert(category);
            self.run_count = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::UNCLASSIFIED_LABEL;

    fn tally_of(keys: &[&str]) -> CategorySizes {
        let mut tally = CategoryTally::new();
        for key in keys {
            tally.observe(key).expect("contiguous listing should tally");
        }
        tally.finish()
    }

    #[test]
    fn the_one_where_contiguous_runs_count_correctly() {
        let sizes = tally_of(&[
            "cubism/1.png",
            "cubism/2.png",
            "cubism/3.png",
            "dada/1.png",
            "realism/1.png",
            "realism/2.png",
        ]);
        assert_eq!(sizes.get("cubism"), Some(3));
        assert_eq!(sizes.get("dada"), Some(1));
        assert_eq!(sizes.get("realism"), Some(2));
        assert_eq!(sizes.total(), 6);
        assert_eq!(sizes.category_count(), 3);
    }

    #[test]
    fn the_one_where_the_final_category_is_not_forgotten() {
        // 🧪 The classic run-length bug: the last run only exists if finish() flushes it.
        let sizes = tally_of(&["a/1", "b/1", "b/2"]);
        assert_eq!(sizes.get("b"), Some(2), "finish() must flush the last run");
    }

    #[test]
    fn the_one_where_counts_always_sum_to_the_total() {
        let sizes = tally_of(&["a/1", "a/2", "b/1", "c/1", "c/2", "c/3"]);
        let sum: u64 = sizes.iter().map(|(_, n)| n).sum();
        assert_eq!(sum, sizes.total());
    }

    #[test]
    fn the_one_where_an_empty_listing_is_a_valid_nothing() {
        let sizes = tally_of(&[]);
        assert_eq!(sizes.total(), 0);
        assert_eq!(sizes.category_count(), 0);
    }

    #[test]
    fn the_one_where_a_single_category_listing_just_works() {
        let sizes = tally_of(&["solo/1", "solo/2", "solo/3", "solo/4"]);
        assert_eq!(sizes.get("solo"), Some(4));
        assert_eq!(sizes.category_count(), 1);
    }

    #[test]
    fn the_one_where_a_reappearing_category_gets_bounced() {
        // 🧪 a, b, a — category 'a' tries to reopen its run. The bouncer says no.
        let mut tally = CategoryTally::new();
        tally.observe("a/1").unwrap();
        tally.observe("b/1").unwrap();
        let err = tally.observe("a/2").expect_err("non-contiguous listing must fail");
        let msg = format!("{}", err);
        assert!(msg.contains("a/2"), "error should name the offending key: {msg}");
        assert!(msg.contains("'a'"), "error should name the category: {msg}");
    }

    #[test]
    fn the_one_where_prefixless_keys_pool_under_the_sentinel() {
        let sizes = tally_of(&["stray1.png", "stray2.png"]);
        assert_eq!(sizes.get(UNCLASSIFIED_LABEL), Some(2));
    }
}
