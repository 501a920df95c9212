//! 🏷️ Category extraction — the first path segment is the label. That's the whole deal.
//!
//! A bucket key like `cubism/portrait_42.png` belongs to category `cubism`.
//! One delimiter. One substring. Zero network calls. The most peaceful module
//! in the entire crate — cherish it, because the listing backends are next door
//! and they have *opinions* about TLS.
//!
//! 🧠 Knowledge graph:
//! - `category_of` is TOTAL. Keys with no `/` (or an empty first segment) get the
//!   [`UNCLASSIFIED_LABEL`] sentinel instead of an implicit nothing. The tally and
//!   the splitter downstream never have to handle "undefined" — it does not exist here.
//! - Objects under the sentinel are real objects. They get counted, they get split,
//!   and they can be banished wholesale via `excluded_labels` in the config.
//!
//! 📜 Ancient proverb: "He who returns Option from a classifier, unwraps in production."

/// 🏷️ The sentinel category for keys that carry no folder prefix.
///
/// A key like `loose_file.png` has nowhere to belong, so it belongs here,
/// with all the other loose files. They have each other. It's enough.
pub const UNCLASSIFIED_LABEL: &str = "unclassified";

/// 🔍 Derives the category label from an object key: everything before the first `/`.
///
/// Pure, total, O(len of key). Same input, same output, every time, forever.
///
/// - `"cubism/art.png"` → `"cubism"`
/// - `"a/b/c.png"` → `"a"` (first delimiter wins, the rest is somebody else's path)
/// - `"no_delimiter.png"` → [`UNCLASSIFIED_LABEL`]
/// - `"/leading_slash.png"` → [`UNCLASSIFIED_LABEL`] (an empty label is no label)
/// - `""` → [`UNCLASSIFIED_LABEL`]
pub fn category_of(key: &str) -> &str {
    match key.find('/') {
        Some(0) | None => UNCLASSIFIED_LABEL,
        Some(idx) => &key[..idx],
    }
}
