//! 📦 Common data structures — the small, load-bearing types everyone passes around.
//!
//! A page of keys, a phase marker for errors, a run summary for the victory lap.
//! They don't ask questions. They carry the data. They are the postal workers
//! of this codebase. Please tip your postal workers. 🦆

/// 📦 One page of object keys, exactly as the listing handed them over, in order.
///
/// Think of it as a shopping cart, except everything in the cart is a string
/// and the store is a cloud bucket. Pages exist so sources can stream without
/// holding sixty thousand keys at once — listing APIs paginate, so do we.
#[derive(Debug, Clone, Default)]
pub struct KeyPage {
    /// 🔑 The object keys in this page, listing order preserved.
    pub keys: Vec<String>,
}

impl KeyPage {
    /// 🏗️ Wraps a vec of keys. Order in = order out. No sorting, no judging.
    pub fn new(keys: Vec<String>) -> Self {
        Self { keys }
    }

    /// 🔢 How many keys this page carries.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// 📭 True if the listing handed us an empty cart.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// 🚦 Which half of the run an error came from.
///
/// Attached to the error chain via `anyhow::Context` so the CLI can walk the
/// chain, find one of these, and pick a distinct exit code — listing failures
/// and manifest-write failures are different 3am conversations and deserve
/// different return codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    /// 📡 Failure while enumerating the bucket (either pass).
    Listing,
    /// 🧾 Failure while writing the manifest file.
    Write,
}

impl std::fmt::Display for RunPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Listing => write!(f, "listing phase failed"),
            Self::Write => write!(f, "manifest write phase failed"),
        }
    }
}

/// 🏁 What a completed run looks like in numbers. Returned by [`crate::run`]
/// so the CLI can print a completion message that names the output file
/// instead of just exiting with the smug silence of a successful Unix tool.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// 🔢 Objects enumerated by the listing (both included and excluded ones).
    pub objects_listed: u64,
    /// 🧾 Data rows actually written to the manifest.
    pub rows_written: u64,
    /// 🚫 Objects skipped because their category sits in the exclusion set.
    pub rows_excluded: u64,
    /// 🏷️ Distinct categories the listing produced.
    pub categories: usize,
    /// 📁 Where the manifest landed.
    pub manifest_path: String,
}
