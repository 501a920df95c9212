//! ✂️ The partition assigner — where every object learns its destiny.
//!
//! 🎬 COLD OPEN — INT. TRAINING CLUSTER — 3:47 AM
//!
//! Ten thousand images wait in a queue. None of them know which split they're in.
//! "TRAIN," says the plan to the first eight thousand. "UNASSIGNED," it says to
//! the next thousand (the validation set wears a witness-protection name, blame
//! the downstream AutoML format). "TEST," it says to the rest, including every
//! rounding-error straggler. Nobody appeals. The math is the law.
//!
//! 🧠 Knowledge graph:
//! - `SplitPercents`: the two config knobs (train %, validation %). Test is the
//!   implicit remainder — it receives everything the floor division leaves behind.
//! - `SplitPlan::for_category(n, percents)`: integer cut points for ONE category.
//!   `num_train = floor(n·P_t/100)`, `num_valid = floor(n·P_v/100)`. That's it.
//! - `SplitPlan::label(ordinal)`: zero-based position within the category →
//!   [`SplitLabel`]. TRAIN positions strictly precede UNASSIGNED strictly precede TEST.
//! - Deterministic: same (n, percents, ordinal) → same label. Reproducibility is
//!   not a feature here, it's the entire point.
//!
//! 📜 Ancient proverb: "He who assigns splits with a random number generator,
//! cannot explain the eval metrics to anyone, including himself."

use anyhow::{Result, bail};
use serde::Deserialize;

/// 🎯 The three destinies. `UNASSIGNED` is the validation split — the downstream
/// manifest consumer picks validation rows itself from that pool, so the label
/// says "unassigned" while meaning "validation". We don't make the rules.
/// (We do make the enum, though.)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitLabel {
    /// 🏋️ The training set — the bulk of the bucket, doing the heavy lifting.
    Train,
    /// 🔍 The validation pool, wire name `UNASSIGNED`.
    Unassigned,
    /// 🧪 The holdout — plus every rounding remainder. TEST is where leftovers live.
    Test,
}

impl SplitLabel {
    /// 🏷️ The exact string the manifest format demands. Uppercase. Non-negotiable.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Train => "TRAIN",
            Self::Unassigned => "UNASSIGNED",
            Self::Test => "TEST",
        }
    }
}

impl std::fmt::Display for SplitLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 🔧 The two configured percentages. Integers 0–100; the test share is whatever
/// is left of 100 after these two take their cut.
///
/// Deserialized straight out of the `[split]` config table. Validation is an
/// explicit step ([`SplitPercents::validate`]) rather than a serde-time panic,
/// because config errors deserve a real diagnostic, not a deserializer shrug.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct SplitPercents {
    /// 🏋️ Percent of each category that goes to TRAIN.
    pub percent_training: u8,
    /// 🔍 Percent of each category that goes to UNASSIGNED (validation).
    pub percent_validation: u8,
}

impl SplitPercents {
    /// ✅ Checks the knobs make arithmetic sense: each ≤ 100, sum ≤ 100.
    ///
    /// 💀 Fails with an error naming the actual numbers, because "invalid config"
    /// as a diagnostic is a war crime and we are signatories to the convention.
    pub fn validate(&self) -> Result<()> {
        let sum = self.percent_training as u16 + self.percent_validation as u16;
        if self.percent_training > 100 || self.percent_validation > 100 || sum > 100 {
            bail!(
                "💀 Split percentages don't add up (literally): training={}%, validation={}%, \
                 combined={}%. The two must each be ≤ 100 and sum to ≤ 100 — the test split \
                 gets the remainder, and the remainder cannot be negative. Math said no.",
                self.percent_training,
                self.percent_validation,
                sum
            );
        }
        Ok(())
    }
}

impl Default for SplitPercents {
    fn default() -> Self {
        // 🎯 80/10/10 — the folk wisdom of ML dataset splitting, inherited from
        // every tutorial ever written and never once questioned since.
        Self {
            percent_training: 80,
            percent_validation: 10,
        }
    }
}

/// 📐 The integer cut points for ONE category of known size.
///
/// Computed once per category, then consulted once per object. The plan is
/// just two numbers — where TRAIN ends and where UNASSIGNED ends. Everything
/// at or past `num_train + num_valid` is TEST, remainders included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitPlan {
    /// 🏋️ Ordinals `0..num_train` are TRAIN.
    num_train: u64,
    /// 🔍 Ordinals `num_train..num_train + num_valid` are UNASSIGNED.
    num_valid: u64,
}

impl SplitPlan {
    /// 📐 Builds the cut points for a category of `n` objects.
    ///
    /// Floor division throughout — small categories can (correctly) get zero
    /// TRAIN or zero UNASSIGNED objects. A category of 1 at 80/10 is one TEST
    /// object and nothing else. The formula does not negotiate with small n.
    pub fn for_category(n: u64, percents: SplitPercents) -> Self {
        // u64 math: a bucket would need ~10^17 objects per category to overflow
        // this multiply. If that's your bucket, please write in, we have questions.
        Self {
            num_train: n * percents.percent_training as u64 / 100,
            num_valid: n * percents.percent_validation as u64 / 100,
        }
    }

    /// 🎯 Classifies the object at zero-based `ordinal` within its category.
    ///
    /// First `num_train` ordinals → TRAIN, next `num_valid` → UNASSIGNED,
    /// everything else → TEST. Strictly ordered, fully deterministic.
    pub fn label(&self, ordinal: u64) -> SplitLabel {
        if ordinal < self.num_train {
            SplitLabel::Train
        } else if ordinal < self.num_train + self.num_valid {
            SplitLabel::Unassigned
        } else {
            SplitLabel::Test
        }
    }

    /// 🏋️ How many TRAIN slots this plan hands out.
    pub fn num_train(&self) -> u64 {
        self.num_train
    }

    /// 🔍 How many UNASSIGNED slots this plan hands out.
    pub fn num_valid(&self) -> u64 {
        self.num_valid
    }
}
