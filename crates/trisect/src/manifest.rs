//! 🧾 The manifest — where every included object gets its one line of fame.
//!
//! *Previously, on Trisect...*
//!
//! 🎬 The splits were assigned. The labels were ready. But a split that lives
//! only in memory trains nobody's model. Someone had to write it down. One
//! header. One row per object. Comma-separated, quote-escaped, streamed to
//! disk like a responsible adult — because the bucket may hold sixty thousand
//! objects and buffering all of them "just in case" is how OOMs are born.
//!
//! 🧠 Knowledge graph:
//! - `record` renders — pure string-out functions built on the `csv` crate,
//!   so embedded commas and quotes round-trip losslessly. Render has no I/O.
//! - `sink` writes — a BufWriter and nothing else. I/O has no format opinions.
//! - The split is the same render-vs-send split as everywhere else in this
//!   codebase: composers compose, sinks sink, and never the twain shall merge.
//!
//! 📜 Ancient proverb: "He who formats CSV with format!(), meets his first
//! embedded comma in production."

mod record;
mod sink;

pub use record::{ManifestRecord, locator};
pub use sink::ManifestConfig;
pub(crate) use sink::ManifestSink;
