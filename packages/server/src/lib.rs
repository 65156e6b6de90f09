#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the VRM listing harvester.
//!
//! A thin routing layer over the orchestration engine: every endpoint
//! either delegates to the [`RunController`](vrm_harvest_engine::RunController)
//! or reads the latest persisted snapshot. No scrape logic lives here.

pub mod handlers;

use std::sync::Arc;

use vrm_harvest_engine::RunController;
use vrm_harvest_scraper::fetch::PageFetcher;
use vrm_harvest_store::Store;

/// Shared application state.
pub struct AppState {
    /// The single long-lived run controller.
    pub controller: Arc<RunController<PageFetcher>>,
    /// Snapshot/known-ID store, shared with the controller.
    pub store: Arc<Store>,
    /// Inbound API key; `None` disables the check.
    pub api_key: Option<String>,
}
