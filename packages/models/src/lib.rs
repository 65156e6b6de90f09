#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared data types for the VRM listing harvester.
//!
//! Listings are kept as raw [`serde_json::Value`] objects so every source
//! field survives verbatim (nulls included); the types here describe the
//! structure *around* them — per-page results, the aggregate of a full run,
//! and the shared progress state observers poll.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Pagination details declared by the catalog's embedded model.
///
/// All fields default to zero when the source omits or mangles them; the
/// engine treats a zeroed block as "unknown" and never trusts it beyond a
/// single run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// The page this block was read from.
    pub current_page: u32,
    /// Total number of pages the catalog claims to have.
    pub total_pages: u32,
    /// Total number of listings across all pages.
    pub item_count: u64,
    /// Listings per page.
    pub page_size: u32,
}

/// The outcome of fetching a single catalog page.
///
/// A failed fetch or parse degrades to [`PageResult::empty`] rather than an
/// error — a single bad page never aborts a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult {
    /// Listings in source order.
    pub records: Vec<serde_json::Value>,
    /// Catalog-wide facets (search states, portfolio groupings, …).
    /// Only populated for page 1.
    pub metadata: Option<serde_json::Value>,
    /// Pagination block as declared by this page.
    pub pagination: Pagination,
}

impl PageResult {
    /// An empty result for a page that failed to fetch or parse.
    #[must_use]
    pub fn empty(page: u32) -> Self {
        Self {
            records: Vec::new(),
            metadata: None,
            pagination: Pagination {
                current_page: page,
                ..Pagination::default()
            },
        }
    }
}

/// The aggregate of one full scrape run. Immutable once persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    /// Number of listings harvested this run.
    pub count: u64,
    /// Number of listing identifiers never observed in any prior run.
    pub new_listing_count: u64,
    /// All listings, concatenated in page order.
    pub properties: Vec<serde_json::Value>,
    /// Catalog-wide facets captured from page 1, if it parsed.
    pub metadata: Option<serde_json::Value>,
    /// The last pagination block observed during the run.
    pub pagination: Pagination,
    /// When the run started (UTC).
    pub started_at: DateTime<Utc>,
    /// When the run finished (UTC).
    pub finished_at: DateTime<Utc>,
    /// Wall-clock duration of the run in seconds.
    pub duration_seconds: f64,
}

impl RunResult {
    /// Returns every non-null `imageUrl` across the run's listings, in
    /// listing order.
    #[must_use]
    pub fn image_urls(&self) -> Vec<String> {
        self.properties
            .iter()
            .filter_map(|record| record.get("imageUrl"))
            .filter_map(serde_json::Value::as_str)
            .map(str::to_owned)
            .collect()
    }
}

/// Mutable run state shared between the active run and any number of
/// concurrent observers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    /// Whether a run is currently executing.
    pub running: bool,
    /// The page most recently fetched.
    pub current_page: u32,
    /// Total pages the current run expects to fetch.
    pub total_pages: u32,
    /// When the current (or most recent) run started.
    pub started_at: Option<DateTime<Utc>>,
    /// When the most recent run finished.
    pub finished_at: Option<DateTime<Utc>>,
    /// Duration of the most recent run in seconds.
    pub duration_seconds: Option<f64>,
    /// Human-readable status line.
    pub message: String,
}
