//! 📂 Previously, on "Things That Could Go Wrong With A File"...
//!
//! The disk was quiet. Too quiet. A lone process had been tasked with reading
//! a key list — just a text file, they said. One key per line, they said.
//! What could go wrong?
//!
//! The file didn't exist. The export had a blank line in the middle. And
//! somewhere in the depths of a BufReader, somebody's key had a trailing `\r`
//! because the fixture was edited on Windows. We handle all of it.
//!
//! [`FileListing`] implements [`Listing`] over a local newline-delimited key
//! file — the offline stand-in for a real bucket. Capture a listing once
//! (`gcloud storage ls -r gs://bucket | ...`), split against it forever,
//! no network required, no cloud bill acquired.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tokio::{
    fs::File,
    io::{self, AsyncBufReadExt},
};
use tracing::trace;

use crate::common::KeyPage;
use crate::listings::{CommonListingConfig, Listing};
use crate::progress::ProgressMetrics;

// -- 📂 FileListingConfig — "It's just a file", said no sysadmin ever before the disk filled up.
// KNOWLEDGE GRAPH: config lives co-located with the backend that uses it. This is intentional.
// It avoids the "where the heck is that config defined" scavenger hunt at 2am during an incident.
#[derive(Debug, Deserialize, Clone)]
pub struct FileListingConfig {
    /// 📁 Path to the newline-delimited key file. One object key per line.
    pub file_name: String,
    /// 🪣 The bucket name to stamp into manifest locators — the file is a
    /// stand-in for a real bucket, but the manifest still needs `gs://<what>/`.
    pub bucket: String,
    #[serde(default = "default_file_common_listing_config")]
    pub common_config: CommonListingConfig,
}

/// 🔧 Returns the default page config for FileListing. It defaults. It ships.
/// It doesn't ask questions.
///
/// This exists purely so serde can call it when `common_config` is absent from
/// the TOML. The `#[serde(default = "...")]` attribute demands a named function.
/// Bureaucracy, but in type-system form.
fn default_file_common_listing_config() -> CommonListingConfig {
    CommonListingConfig::default()
}

/// 📂 FileListing — reads a key file line by line and vends pages of keys.
///
/// Think of it like a very diligent intern who reads a massive key dump,
/// never complains, and only stops when (a) the file ends or (b) the page is
/// full — whichever comes first. Blank lines are skipped; trailing `\n` and
/// `\r` are stripped, because fixtures have lived hard lives.
pub(crate) struct FileListing {
    buf_reader: io::BufReader<File>,
    config: FileListingConfig,
    progress: ProgressMetrics,
}

// 🐛 NOTE: progress is intentionally excluded from this Debug impl.
// ProgressMetrics contains an indicatif bar that doesn't format cleanly, and
// nobody debugging a FileListing wants to read a wall of terminal-render state.
impl std::fmt::Debug for FileListing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileListing")
            .field("config", &self.config)
            .finish()
    }
}

impl FileListing {
    /// 🚀 Opens the key file and wraps it in a BufReader, ready to vend pages.
    ///
    /// If the file doesn't exist: 💀 anyhow will tell you with *theatrical flair*.
    pub(crate) async fn new(config: FileListingConfig, progress: ProgressMetrics) -> Result<Self> {
        let file_handle = File::open(&config.file_name).await.context(format!(
            "💀 The door to '{}' would not budge. We knocked. We pleaded. \
             We checked if it existed (it might not). We checked permissions \
             (they might be wrong). The door remained closed. The key file \
             remains unopened. We remain outside.",
            config.file_name
        ))?;

        let buf_reader = io::BufReader::new(file_handle);
        Ok(Self {
            buf_reader,
            config,
            progress,
        })
    }
}

#[async_trait]
impl Listing for FileListing {
    /// 📄 Read the next page of keys from the file. Returns `None` at EOF.
    async fn next_page(&mut self) -> Result<Option<KeyPage>> {
        let mut keys = Vec::with_capacity(self.config.common_config.page_size);
        let mut line = String::new();

        while keys.len() < self.config.common_config.page_size {
            let bytes_read = self.buf_reader.read_line(&mut line).await.context(format!(
                "💀 Reading '{}' failed mid-file. The disk blinked. The listing is \
                 incomplete and so is our trust in local storage.",
                self.config.file_name
            ))?;
            if bytes_read == 0 {
                break;
            }

            // 🧹 read_line includes \n (and \r\n on Windows). Strip both; skip blanks.
            let trimmed = line.trim_end_matches('\n').trim_end_matches('\r');
            if !trimmed.is_empty() {
                keys.push(trimmed.to_string());
            }
            line.clear();
        }

        let page = KeyPage::new(keys);
        trace!(
            "📖 hauled {} keys out of '{}' like a digital fishing trip",
            page.len(),
            self.config.file_name
        );
        self.progress.update(page.len() as u64);

        // 📄 Empty page = EOF. The well is dry. Return None. 🏁
        if page.is_empty() {
            self.progress.finish();
            Ok(None)
        } else {
            Ok(Some(page))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn config_for(path: &std::path::Path, page_size: usize) -> FileListingConfig {
        FileListingConfig {
            file_name: path.display().to_string(),
            bucket: "fixture-bucket".to_string(),
            common_config: CommonListingConfig { page_size },
        }
    }

    async fn listing_for(path: &std::path::Path, page_size: usize) -> FileListing {
        FileListing::new(
            config_for(path, page_size),
            ProgressMetrics::hidden("test".into(), 0),
        )
        .await
        .expect("💀 fixture file should open — we just wrote it")
    }

    #[tokio::test]
    async fn the_one_where_keys_come_back_in_file_order_and_pages() {
        let mut the_fixture = tempfile::NamedTempFile::new().unwrap();
        writeln!(the_fixture, "a/1.png\na/2.png\nb/1.png").unwrap();

        let mut the_listing = listing_for(the_fixture.path(), 2).await;
        let page1 = the_listing.next_page().await.unwrap().unwrap();
        assert_eq!(page1.keys, vec!["a/1.png", "a/2.png"]);
        let page2 = the_listing.next_page().await.unwrap().unwrap();
        assert_eq!(page2.keys, vec!["b/1.png"]);
        assert!(the_listing.next_page().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn the_one_where_blank_lines_and_crlf_are_quietly_handled() {
        let mut the_fixture = tempfile::NamedTempFile::new().unwrap();
        write!(the_fixture, "a/1.png\r\n\r\nb/1.png\n\n").unwrap();

        let mut the_listing = listing_for(the_fixture.path(), 10).await;
        let page = the_listing.next_page().await.unwrap().unwrap();
        assert_eq!(page.keys, vec!["a/1.png", "b/1.png"]);
    }

    #[tokio::test]
    async fn the_one_where_a_missing_file_fails_with_its_name() {
        let result = FileListing::new(
            config_for(std::path::Path::new("/definitely/not/here.txt"), 10),
            ProgressMetrics::hidden("test".into(), 0),
        )
        .await;
        let the_error = result.expect_err("a missing file is not a listing");
        assert!(format!("{:#}", the_error).contains("/definitely/not/here.txt"));
    }
}
