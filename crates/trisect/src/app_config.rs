//! 🔧 App Configuration — the sacred TOML-to-struct pipeline.
//!
//! 📡 "Config not found: We looked everywhere. Under the couch. Behind the fridge.
//! In the junk drawer. Nothing." — every developer at 3am 🦆
//!
//! 🏗️ Powered by Figment, because manually parsing env vars is a form of
//! self-harm that even the borrow checker wouldn't approve of.
//!
//! 🧠 Knowledge graph: every knob the original tooling hard-coded — bucket,
//! output filename, split percentages, exclusion list — is a config field now.
//! Parameterized runs, repeatable tests, zero constants lurking in function bodies.

use std::collections::HashSet;

use anyhow::Context;
use serde::Deserialize;

use crate::listings::{FileListingConfig, GcsListingConfig, InMemoryListingConfig};
use crate::manifest::ManifestConfig;
use crate::splits::SplitPercents;
use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use std::path::Path;
use tracing::info;

/// 📦 The AppConfig: one struct to rule them all, one struct to find them,
/// one struct to bring them all, and in the Figment bind them.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// 📡 Where the object keys come from. Configurable, unlike my children.
    pub listing: ListingConfig,
    /// 🧾 Where the manifest goes and how locators are spelled.
    pub manifest: ManifestConfig,
    /// ✂️ The two split percentages; test is the implicit remainder.
    #[serde(default)]
    pub split: SplitPercents,
    /// 🚫 Categories to omit from the manifest entirely. They still get listed
    /// and counted (ordinals don't lie), they just never make it onto paper.
    #[serde(default)]
    pub excluded_labels: HashSet<String>,
    /// 🔧 Runtime behavior knobs.
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

/// 🎭 The many faces of a listing config — externally tagged, so the TOML reads
/// `[listing.Gcs]` / `[listing.File]` / `[listing.InMemory]` and serde picks
/// the backend. No stringly-typed "type" field to typo at 2am.
#[derive(Debug, Deserialize, Clone)]
pub enum ListingConfig {
    /// 🪣 A real GCS bucket, via the JSON API.
    Gcs(GcsListingConfig),
    /// 📂 A newline-delimited key file standing in for a bucket.
    File(FileListingConfig),
    /// 📦 Keys straight from the config. Tests and demos only.
    InMemory(InMemoryListingConfig),
}

impl ListingConfig {
    /// 🪣 The bucket name stamped into manifest locators
    /// (`<scheme>://<THIS>/<key>`).
    pub fn bucket_label(&self) -> &str {
        match self {
            Self::Gcs(c) => &c.bucket,
            Self::File(c) => &c.bucket,
            Self::InMemory(c) => &c.bucket,
        }
    }

    /// 📦 The shared paging knobs, whichever backend is behind the curtain.
    pub(crate) fn common(&self) -> &crate::listings::CommonListingConfig {
        match self {
            Self::Gcs(c) => &c.common_config,
            Self::File(c) => &c.common_config,
            Self::InMemory(c) => &c.common_config,
        }
    }

    /// 🏷️ Human-readable handle for the progress display.
    pub(crate) fn describe(&self) -> String {
        match self {
            Self::Gcs(c) => format!("gs://{}", c.bucket),
            Self::File(c) => format!("file://{}", c.file_name),
            Self::InMemory(c) => format!("in-memory ({} keys)", c.keys.len()),
        }
    }
}

/// 🔧 Runtime knobs that change HOW the run happens, never WHAT comes out.
#[derive(Debug, Deserialize, Clone)]
pub struct RuntimeConfig {
    /// 🧠 `true` = hold the pass-1 key sequence in memory and replay it for
    /// pass 2 (one network walk, more RAM). `false` = re-fetch the listing
    /// fresh for pass 2 (two walks, O(1) key memory) — the classic behavior.
    /// Memory vs. network: pick your poison, it's explicit now.
    #[serde(default)]
    pub cache_keys: bool,
    /// 📊 `false` silences the progress display entirely. Cosmetic by contract:
    /// the manifest is byte-identical either way.
    #[serde(default = "default_progress")]
    pub progress: bool,
}

fn default_progress() -> bool {
    true
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            cache_keys: false,
            progress: true,
        }
    }
}

/// 🚀 Load the config — from a file, from env vars, or from the sheer power of hoping.
///
/// 🔧 Merges environment variables (TRI_*) with an optional TOML file.
/// ALL TRI_ vars are fair game. We don't gatekeep env vars here. This is a safe space. 🦆
///
/// 📐 DESIGN NOTE (no cap, this is tribal knowledge):
///   - If `config_file_name` is None  → env vars only. No file. No assumptions.
///   - If `config_file_name` is Some  → env vars + TOML file, merged. TOML wins on conflicts.
///
/// 💀 Returns an error if config is unparseable. Which it will be. Check the error
/// message though — it's contextual, informative, and written with love. Or despair.
/// Hard to tell at 3am.
pub fn load_config(config_file_name: Option<&Path>) -> anyhow::Result<AppConfig> {
    // 🚀 Log what we're loading — because silent failures are the villain origin
    // story of every 3am incident. "The config loaded fine." — famous last words.
    info!(
        "🔧 Loading configuration: {}",
        describe_config_source(config_file_name)
    );

    // 🏗️ Start with env vars as the base layer — like a good sourdough starter.
    let config = Figment::new().merge(Env::prefixed("TRI_"));

    // 🎯 Conditionally layer in TOML only if a file was actually provided.
    // No file? No problem. We trust the env. Like a golden retriever trusts everyone.
    let config = match config_file_name {
        Some(file_name) => config.merge(Toml::file(file_name)),
        None => config,
    };

    // 💬 Build a context message that will actually TELL you what went wrong.
    // None of that "error: error" energy. This isn't a Kafka novel. (The author, not the queue.)
    let context_msg = match config_file_name {
        Some(path) => format!(
            "💀 Failed to parse configuration from file '{}' and environment variables (TRI_*). \
             The file exists in our hearts, but apparently its contents do not parse.",
            path.display()
        ),
        None => "💀 Failed to parse configuration from environment variables (TRI_*). \
                 No file was provided — this one's all on the environment. Classic."
            .to_string(),
    };

    config.extract().context(context_msg)
}

/// 🏷️ Names where the config is coming from, without pretending a missing
/// file is a file called "". The log reader deserves the truth.
fn describe_config_source(config_file_name: Option<&Path>) -> String {
    match config_file_name {
        Some(path) => format!("file '{}' merged over environment (TRI_*)", path.display()),
        None => "environment only (TRI_*)".to_string(),
    }
}
