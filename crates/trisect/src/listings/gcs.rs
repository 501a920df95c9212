//! 🪣📡 GCS Listing — streaming object names from the cloud, one page at a time.
//!
//! COLD OPEN — EXT. DATA CENTER — 3:47 AM
//!
//! The on-call engineer stared at the terminal. "We need every key in the
//! art bucket," they whispered. "All sixty-one thousand. Grouped by movement.
//! By morning." The cursor blinked. The GcsListing blinked back.
//! "I got you, fam," it said, and began paginating at wire speed.
//!
//! This module implements [`Listing`] for the Google Cloud Storage JSON API.
//! Given a bucket name, it walks `GET {api_base}/b/{bucket}/o` with
//! `maxResults` + `pageToken` pagination, asking only for object names
//! (`fields=items/name,nextPageToken`) because names are all we ever consult.
//!
//! 🧠 Knowledge graph:
//! - `GcsListingConfig`: bucket, optional prefix, optional bearer token,
//!   overridable `api_base` (tests point this at a wiremock server), CommonListingConfig
//! - Transport: `reqwest::Client` → JSON → `serde_json` → `KeyPage`
//! - GCS enumerates objects in lexicographic key order, which is exactly the
//!   category-contiguous order the tally downstream demands. External contract,
//!   assumed here, CHECKED in the tally. Trust, but verify. Mostly verify.
//! - One page per `next_page()` call — same faucet contract as every other backend.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::trace;

use crate::common::KeyPage;
use crate::listings::{CommonListingConfig, Listing};
use crate::progress::ProgressMetrics;

/// 🔧 Configuration for the GCS listing backend.
///
/// KNOWLEDGE GRAPH: config lives co-located with the backend that uses it.
/// No scavenger hunts at 2am wondering "where is that config struct defined?"
/// It's RIGHT HERE.
///
/// 📐 Design note: `bucket` is required. `api_base` defaults to the real GCS
/// endpoint and exists as a knob purely so tests can aim the client at a mock
/// server. `auth_token` is optional — public buckets list anonymously, private
/// ones want `Authorization: Bearer <token>` (mint one with
/// `gcloud auth print-access-token` and put it in the environment, not the TOML,
/// unless you enjoy explaining leaked credentials to people).
#[derive(Debug, Deserialize, Clone)]
pub struct GcsListingConfig {
    /// 🪣 The bucket name — where the keys live, sleep, and wait for us.
    pub bucket: String,
    /// 📡 API base URL — override for tests; leave alone for real clouds.
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// 🔍 Optional key prefix filter, passed straight through to the API.
    #[serde(default)]
    pub prefix: Option<String>,
    /// 🔒 Optional OAuth2 bearer token. If this is in plaintext in your config
    /// file, I've already filed a complaint with the Department of Security Choices.
    #[serde(default)]
    pub auth_token: Option<String>,
    /// 📦 Page-size configuration — shared with all listing backends.
    #[serde(default = "default_gcs_common_listing_config")]
    pub common_config: CommonListingConfig,
}

/// 📡 The real endpoint. Everything before `/b/{bucket}/o` lives here.
fn default_api_base() -> String {
    "https://storage.googleapis.com/storage/v1".to_string()
}

/// 🔧 Default page config for GCS listings — same defaults as CommonListingConfig::default().
///
/// This exists purely so serde can call it when `common_config` is absent from TOML.
/// The `#[serde(default = "...")]` attribute demands a named function. We oblige.
fn default_gcs_common_listing_config() -> CommonListingConfig {
    CommonListingConfig::default()
}

/// 📦 What the GCS JSON API sends back, trimmed to the two fields we asked for.
#[derive(Debug, Deserialize)]
struct ListObjectsResponse {
    /// 🔑 This page's objects. Absent entirely when a bucket/prefix has nothing.
    #[serde(default)]
    items: Vec<ObjectEntry>,
    /// 📄 Present = more pages exist. Absent = the bucket has no more to give.
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

/// 🔑 One object, reduced to the only attribute this tool ever consults.
#[derive(Debug, Deserialize)]
struct ObjectEntry {
    name: String,
}

/// 🪣 GcsListing — streams object names from a GCS bucket, page by page.
///
/// State machine the size of a postage stamp: a page token and an `exhausted`
/// flag. The token rides along between calls; when the API stops sending one,
/// the well is dry and `exhausted` locks the door behind us.
///
/// 🐛 Known edge case: if someone is uploading to the bucket while we list it,
/// the two passes can disagree about what exists. But honestly, if you're
/// splitting a training set out of a bucket someone is actively writing to,
/// you have bigger problems than pagination.
pub(crate) struct GcsListing {
    // 📡 reqwest::Client — the envoy we send into the HTTP wilderness. Reused
    // across pages because spinning up a new client per request is the networking
    // equivalent of buying a new car every time you need to go to the grocery store.
    client: reqwest::Client,
    config: GcsListingConfig,
    // 📄 The continuation token from the previous page. None before the first call.
    page_token: Option<String>,
    // 🏁 Once true, next_page() short-circuits to None forever.
    exhausted: bool,
    // 📊 Progress tracker — feeds the TUI progress table. Without it, you're
    // listing blind. With it, you're listing blind but at least there's a bar.
    progress: ProgressMetrics,
}

// 🐛 Debug impl excludes `client` and `progress` — neither formats usefully,
// and nobody debugging a listing wants a wall of connection-pool internals.
impl std::fmt::Debug for GcsListing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GcsListing")
            .field("config", &self.config)
            .field("page_token", &self.page_token)
            .field("exhausted", &self.exhausted)
            .finish()
    }
}

impl GcsListing {
    /// 🚀 Builds the HTTP client and returns a listing poised at page one.
    ///
    /// No request is fired here — GCS has no cheap "does this bucket exist" probe
    /// that doesn't cost the same as just asking for page one, so the first
    /// `next_page()` call is where the bucket gets to ghost us, loudly.
    pub(crate) async fn new(config: GcsListingConfig, progress: ProgressMetrics) -> Result<Self> {
        // 🔧 10 second connect timeout because if GCS can't handshake in 10 seconds,
        // it's not having a good time and neither are we. 30 second response timeout
        // because a 1000-object page of names is small, but networks are networks.
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()
            .context(
                "💀 The HTTP client refused to be born. The TLS stack wept. \
                 Probably a missing TLS cert or a cursed system OpenSSL. Either way: tragic.",
            )?;

        Ok(Self {
            client,
            config,
            page_token: None,
            exhausted: false,
            progress,
        })
    }
}

#[async_trait]
impl Listing for GcsListing {
    /// 📄 Fetch the next page of object names. Returns `None` once the API
    /// stops handing out continuation tokens.
    ///
    /// 🧠 Knowledge graph: `fields=items/name,nextPageToken` keeps the response
    /// lean — we never download sizes, hashes, or ACLs we'd only throw away.
    /// A page with no token marks the end; the flag makes that stick.
    async fn next_page(&mut self) -> Result<Option<KeyPage>> {
        if self.exhausted {
            return Ok(None);
        }

        let the_url = format!("{}/b/{}/o", self.config.api_base, self.config.bucket);

        // 🔧 Assemble the query string — page size, trimmed fields, and whatever
        // continuation token the previous page left us.
        let mut the_query: Vec<(&str, String)> = vec![
            (
                "maxResults",
                self.config.common_config.page_size.to_string(),
            ),
            ("fields", "items/name,nextPageToken".to_string()),
        ];
        if let Some(prefix) = &self.config.prefix {
            the_query.push(("prefix", prefix.clone()));
        }
        if let Some(token) = &self.page_token {
            the_query.push(("pageToken", token.clone()));
        }

        let mut the_request = self.client.get(&the_url).query(&the_query);
        if let Some(token) = &self.config.auth_token {
            the_request = the_request.bearer_auth(token);
        }

        // 📡 Fire. This is where DNS errors, refused connections, and revoked
        // credentials all come to introduce themselves.
        let the_response = the_request.send().await.context(format!(
            "💀 Listing request to '{}' never came back. The bucket ghosted us. \
             Like my college roommate. Kevin, if you're reading this, I want my blender back. \
             Check: network, DNS, and that the bucket name '{}' is actually a bucket name.",
            the_url, self.config.bucket
        ))?;

        let the_response = the_response.error_for_status().context(format!(
            "💀 GCS said no to listing bucket '{}'. The data is (probably) there, \
             but the API won't let us see it. This is the digital equivalent of \
             being told 'we have food at home' by the cloud. \
             Check: bucket name spelling, IAM permissions, and whether your bearer \
             token expired somewhere over the last coffee.",
            self.config.bucket
        ))?;

        let the_body = the_response.text().await.context(
            "💀 The listing response body evaporated mid-read. The connection gave up \
             between the status line and the JSON. Networks: still networks.",
        )?;

        let the_parsed: ListObjectsResponse = serde_json::from_str(&the_body).context(format!(
            "💀 GCS sent back something that is not the listing JSON we agreed on. \
             Either the api_base points somewhere creative, or the API changed shape \
             while nobody was looking. First 200 chars of the evidence: {:?}",
            the_body.chars().take(200).collect::<String>()
        ))?;

        // 📄 No continuation token = this is the final page. Lock the door on the way out.
        if the_parsed.next_page_token.is_none() {
            self.exhausted = true;
        }
        self.page_token = the_parsed.next_page_token;

        let the_page = KeyPage::new(the_parsed.items.into_iter().map(|o| o.name).collect());

        trace!(
            "🪣 hauled {} object names from gs://{} — pagination {} ",
            the_page.len(),
            self.config.bucket,
            if self.exhausted { "complete 🏁" } else { "continues" }
        );
        self.progress.update(the_page.len() as u64);

        if the_page.is_empty() && self.exhausted {
            // 📄 Final page and it's empty — the bucket is done. Or was empty all along.
            self.progress.finish();
            return Ok(None);
        }
        if self.exhausted {
            self.progress.finish();
        }
        Ok(Some(the_page))
    }
}
