//! 🧾 Record rendering — structs in, RFC-4180-respecting strings out, no I/O.

use anyhow::{Context, Result};

use crate::splits::SplitLabel;

/// 🧾 The three manifest columns, in the one true order.
///
/// The downstream training pipeline reads these positionally AND by header
/// name, so both the order and the spellings are load-bearing. Do not
/// alphabetize. Do not "clean up". The format is the format.
pub(crate) const MANIFEST_FIELDS: [&str; 3] = ["set", "image_path", "label"];

/// 🧾 One manifest row: which split, which object, which category.
///
/// A triple with delusions of grandeur. `image_path` is the fully-qualified
/// locator (`gs://bucket/key`), `label` is the category — the same label the
/// tally counted under, verbatim, or the round trip breaks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestRecord {
    /// 🎯 TRAIN / UNASSIGNED / TEST.
    pub set: SplitLabel,
    /// 📍 Fully-qualified storage locator.
    pub image_path: String,
    /// 🏷️ The category label.
    pub label: String,
}

/// 📍 Builds the fully-qualified locator: `<scheme>://<bucket>/<key>`.
///
/// The key goes in verbatim — buckets allow basically anything in a key and
/// the CSV layer downstream handles the escaping, so we don't mangle here.
pub fn locator(scheme: &str, bucket: &str, key: &str) -> String {
    format!("{}://{}/{}", scheme, bucket, key)
}

/// 🧾 Renders the fixed header row, newline included.
pub(crate) fn render_header() -> Result<String> {
    render_fields(MANIFEST_FIELDS)
}

/// 🧾 Renders one data row, newline included, fields in [`MANIFEST_FIELDS`] order.
///
/// Values containing commas, quotes, or newlines come out quoted and escaped —
/// that's the entire reason the `csv` crate is here instead of a `format!()`.
pub(crate) fn render_row(record: &ManifestRecord) -> Result<String> {
    render_fields([
        record.set.as_str(),
        record.image_path.as_str(),
        record.label.as_str(),
    ])
}

/// 🔧 The shared render path: one record through a csv::Writer into a String.
///
/// A fresh writer per row costs a small allocation and buys total isolation —
/// render is pure, reorderable, and testable without touching a file handle.
/// The sink amortizes the actual I/O; this does not need to be clever.
fn render_fields(fields: [&str; 3]) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer
        .write_record(fields)
        .context("💀 csv refused to serialize a 3-field record, which should be impossible")?;
    let bytes = writer
        .into_inner()
        .context("💀 csv writer would not give its buffer back. It grew attached.")?;
    String::from_utf8(bytes).context(
        "💀 csv produced non-UTF-8 output from UTF-8 input. Physics may be broken. Check on physics.",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn the_one_where_the_header_is_exactly_the_sacred_three() {
        assert_eq!(render_header().unwrap(), "set,image_path,label\n");
    }

    #[test]
    fn the_one_where_a_plain_row_renders_plainly() {
        let row = ManifestRecord {
            set: SplitLabel::Train,
            image_path: locator("gs", "art_translate_1", "cubism/art_image.png"),
            label: "cubism".to_string(),
        };
        assert_eq!(
            render_row(&row).unwrap(),
            "TRAIN,gs://art_translate_1/cubism/art_image.png,cubism\n"
        );
    }

    #[test]
    fn the_one_where_embedded_commas_and_quotes_survive_the_trip() {
        // 🧪 The row that format!() would have silently corrupted. Not today.
        let row = ManifestRecord {
            set: SplitLabel::Test,
            image_path: locator("gs", "b", r#"weird/comma, and "quote".png"#),
            label: "weird".to_string(),
        };
        let rendered = render_row(&row).unwrap();

        // 🔄 Round-trip through a standard reader — field-for-field equality.
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(rendered.as_bytes());
        let parsed = reader.records().next().unwrap().unwrap();
        assert_eq!(&parsed[0], "TEST");
        assert_eq!(&parsed[1], r#"gs://b/weird/comma, and "quote".png"#);
        assert_eq!(&parsed[2], "weird");
    }

    #[test]
    fn the_one_where_the_locator_assembles_scheme_bucket_key() {
        assert_eq!(locator("gs", "art_translate_1", "dada/x.png"), "gs://art_translate_1/dada/x.png");
        assert_eq!(locator("s3", "other", "a/b/c"), "s3://other/a/b/c");
    }
}
