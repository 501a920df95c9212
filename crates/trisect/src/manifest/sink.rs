//! 🕳️ The manifest sink — receives rendered rows and writes them to disk. I/O only.

use anyhow::{Context, Result};
use serde::Deserialize;
use tokio::{
    fs::File,
    io::{self, AsyncWriteExt},
};
use tracing::trace;

use super::record::{ManifestRecord, render_header, render_row};

/// 🔧 Where the manifest lands and how its locators are spelled.
///
/// KNOWLEDGE GRAPH: config lives co-located with the sink that uses it.
/// Same ethos as every listing backend — no long-distance config relationships.
#[derive(Debug, Deserialize, Clone)]
pub struct ManifestConfig {
    /// 📁 Output path. Created fresh every run; see the truncation warning below.
    pub file_name: String,
    /// 📍 Locator scheme for `image_path` values — `gs` unless you've moved clouds.
    #[serde(default = "default_scheme")]
    pub scheme: String,
}

/// 📍 `gs` — the original bucket lived on Google Cloud Storage, so do the defaults.
fn default_scheme() -> String {
    "gs".to_string()
}

/// 🕳️ ManifestSink — one BufWriter, one header, then rows until the bucket runs out.
///
/// It's a BufWriter around a tokio `File`. Simple. Honest. Does not complain.
/// Does not retry. Does not have opinions about your categories. It writes
/// what the renderer gives it, in the order it's given, exactly once each.
///
/// ⚠️ `File::create` truncates if the file exists. No warning. No backup.
/// Just gone. He who runs this twice with the same `file_name`, keeps only
/// the second manifest.
///
/// ⚠️ Flushing is NOT automatic on drop. You must call `close()`. If you
/// don't, the last buffered rows will silently vanish like a developer at
/// 4:59pm on a Friday. Call. `close()`.
#[derive(Debug)]
pub(crate) struct ManifestSink {
    file_buf: io::BufWriter<File>,
    config: ManifestConfig,
    /// 🔢 Rows appended so far (header excluded). The supervisor reports this.
    rows_written: u64,
}

impl ManifestSink {
    /// 🚀 Creates (or obliterates and recreates) the manifest file and
    /// immediately writes the fixed header row. One constructor, one header,
    /// no way to double-write it or forget it. The type system as a checklist.
    pub(crate) async fn create(config: ManifestConfig) -> Result<Self> {
        // -- 💀 The file refused to be born. Perhaps the directory didn't exist.
        // -- Perhaps permissions were set by someone who really, truly, did not
        // -- want this file to exist. We respect their energy. We do not respect
        // -- their disk ACLs.
        let file_handle = File::create(&config.file_name).await.context(format!(
            "💀 The manifest file '{}' could not be conjured into existence. \
             We stared at the path. The path stared back. One of us was wrong \
             about whether the parent directory existed. It was us. It was always us.",
            config.file_name
        ))?;
        // -- 📦 BufWriter: because issuing one syscall per row is a war crime.
        // -- The original tooling reopened the file in append mode for EVERY row.
        // -- Sixty thousand opens. We do not speak of it. We buffer.
        let mut file_buf = io::BufWriter::new(file_handle);

        let header = render_header()?;
        file_buf
            .write_all(header.as_bytes())
            .await
            .context("💀 Could not even write the header row. The manifest is over before it began.")?;

        Ok(Self {
            file_buf,
            config,
            rows_written: 0,
        })
    }

    /// 📥 Append one row, in second-pass encounter order. Streaming: prior rows
    /// are already on their way to disk, not sitting in a Vec getting comfortable.
    pub(crate) async fn append(&mut self, record: &ManifestRecord) -> Result<()> {
        let row = render_row(record)?;
        self.file_buf.write_all(row.as_bytes()).await.context(format!(
            "💀 Writing manifest row for '{}' failed. The disk said no. The manifest \
             at '{}' is now truncated mid-thought — rerun once the disk apologizes.",
            record.image_path, self.config.file_name
        ))?;
        self.rows_written += 1;
        trace!("🧾 row {} appended: {}", self.rows_written, record.image_path);
        Ok(())
    }

    /// 🔢 Rows appended so far, header not included.
    pub(crate) fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// 🗑️ Flush the BufWriter and close up shop. The final act. The curtain call.
    ///
    /// Without this flush, the last rows might be sitting in the buffer, warm
    /// and cozy, never making it to disk. Like a letter you wrote but never
    /// sent. Don't be that letter. Always flush.
    pub(crate) async fn close(mut self) -> Result<()> {
        trace!(
            "🎬 final flush. the manifest sink takes its bow, {} rows and one header deep",
            self.rows_written
        );
        self.file_buf.flush().await.context(format!(
            "💀 Error flushing '{}' — the rows were SO CLOSE. They were in the buffer. \
             They could SEE the disk. A tragedy in one line.",
            self.config.file_name
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::locator;
    use crate::splits::SplitLabel;

    fn record(set: SplitLabel, key: &str, label: &str) -> ManifestRecord {
        ManifestRecord {
            set,
            image_path: locator("gs", "bucket", key),
            label: label.to_string(),
        }
    }

    #[tokio::test]
    async fn the_one_where_header_plus_n_rows_round_trip_exactly() {
        let the_dir = tempfile::tempdir().unwrap();
        let the_path = the_dir.path().join("manifest.csv");
        let config = ManifestConfig {
            file_name: the_path.display().to_string(),
            scheme: "gs".to_string(),
        };

        let mut sink = ManifestSink::create(config).await.unwrap();
        let rows = vec![
            record(SplitLabel::Train, "a/1.png", "a"),
            record(SplitLabel::Unassigned, "a/2.png", "a"),
            record(SplitLabel::Test, r#"b/comma, "quoted".png"#, "b"),
        ];
        for row in &rows {
            sink.append(row).await.unwrap();
        }
        assert_eq!(sink.rows_written(), 3);
        sink.close().await.unwrap();

        // 🔄 Parse it back with a standard reader — field-for-field equality.
        let contents = std::fs::read_to_string(&the_path).unwrap();
        let mut reader = csv::Reader::from_reader(contents.as_bytes());
        assert_eq!(
            reader.headers().unwrap(),
            &csv::StringRecord::from(vec!["set", "image_path", "label"])
        );
        let parsed: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(parsed.len(), rows.len());
        for (row, got) in rows.iter().zip(&parsed) {
            assert_eq!(&got[0], row.set.as_str());
            assert_eq!(&got[1], row.image_path.as_str());
            assert_eq!(&got[2], row.label.as_str());
        }
    }

    #[tokio::test]
    async fn the_one_where_create_truncates_the_previous_manifest() {
        let the_dir = tempfile::tempdir().unwrap();
        let the_path = the_dir.path().join("manifest.csv");
        std::fs::write(&the_path, "stale rows from a previous life\n").unwrap();

        let config = ManifestConfig {
            file_name: the_path.display().to_string(),
            scheme: "gs".to_string(),
        };
        let sink = ManifestSink::create(config).await.unwrap();
        sink.close().await.unwrap();

        let contents = std::fs::read_to_string(&the_path).unwrap();
        assert_eq!(contents, "set,image_path,label\n", "old contents must be gone");
    }

    #[tokio::test]
    async fn the_one_where_an_unwritable_path_fails_with_the_path() {
        let result = ManifestSink::create(ManifestConfig {
            file_name: "/definitely/not/a/dir/manifest.csv".to_string(),
            scheme: "gs".to_string(),
        })
        .await;
        let the_error = result.expect_err("💀 writing into the void should fail");
        assert!(format!("{:#}", the_error).contains("/definitely/not/a/dir/manifest.csv"));
    }
}
