#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Page fetching and embedded-model extraction for the VRM property catalog.
//!
//! The catalog renders its listing data as a JSON object assigned to an
//! inline-script variable rather than serving a JSON API. This crate knows
//! how to fetch one catalog page ([`fetch`]), dig the model out of the HTML
//! ([`extract`]), and normalise each listing with derived slug/URL fields
//! ([`normalize`]).
//!
//! It is a pure fetching library: no pacing, no persistence, no run state.
//! Orchestration lives upstream in `vrm_harvest_engine`.

pub mod extract;
pub mod fetch;
pub mod normalize;

use std::collections::BTreeMap;
use std::time::Duration;

use vrm_harvest_models::PageResult;

/// The paginated catalog URL; the page number is appended directly.
pub const CATALOG_URL: &str = "https://www.vrmproperties.com/Properties-For-Sale?currentpage=";

/// Per-request timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Errors that can occur while fetching or decoding a catalog page.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    /// An HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The embedded model JSON failed to decode after cleanup.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The page HTML contains no embedded model assignment.
    #[error("embedded model not found in page HTML")]
    ModelMissing,

    /// The scrape configuration is unusable (e.g. a malformed header).
    #[error("invalid scrape configuration: {0}")]
    Config(String),
}

/// Configuration shared by catalog fetches.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// Base catalog URL; the page number is appended.
    pub base_url: String,
    /// Additional HTTP headers to include in requests.
    pub headers: BTreeMap<String, String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl ScrapeConfig {
    /// Creates a config pointed at the live catalog with browser-like
    /// headers and the default timeout.
    #[must_use]
    pub fn new() -> Self {
        Self {
            base_url: CATALOG_URL.to_owned(),
            headers: default_headers(),
            timeout: REQUEST_TIMEOUT,
        }
    }

    /// Overrides the base catalog URL (used by tests and staging).
    #[must_use]
    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.to_owned();
        self
    }

    /// Adds an HTTP header to include in requests.
    #[must_use]
    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.headers.insert(key.to_owned(), value.to_owned());
        self
    }

    /// Overrides the per-request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Browser-like headers for the HTML catalog. The endpoint serves pages to
/// real browsers; a bare client User-Agent gets served a challenge page.
#[must_use]
pub fn default_headers() -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();
    headers.insert(
        "User-Agent".to_owned(),
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36".to_owned(),
    );
    headers.insert(
        "Accept".to_owned(),
        "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8".to_owned(),
    );
    headers
}

/// Trait for fetching one catalog page of listings.
///
/// The engine drives this seam; the production implementation is
/// [`fetch::PageFetcher`]. Test doubles serve canned pages.
pub trait PageSource: Send + Sync {
    /// Fetches a single page of listings.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError`] if the HTTP request fails or the embedded
    /// model cannot be extracted or decoded. Callers are expected to absorb
    /// the error into an empty [`PageResult`] — a bad page never aborts a
    /// run.
    fn fetch_page(
        &self,
        page: u32,
    ) -> impl std::future::Future<Output = Result<PageResult, ScrapeError>> + Send;
}
