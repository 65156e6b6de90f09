#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! The scrape orchestration engine.
//!
//! A run discovers the catalog's page count from page 1, walks the
//! remaining pages strictly in order with human-like pacing, classifies
//! never-before-seen listings against the persisted known-identifier set,
//! and snapshots the aggregate. The [`controller::RunController`] owns the
//! shared [`Progress`](vrm_harvest_models::Progress) state and the
//! cooperative kill switch, and enforces a single active run.

pub mod cancel;
pub mod controller;
pub mod pacing;
pub mod pipeline;

pub use cancel::CancelToken;
pub use controller::RunController;
pub use pacing::Pacing;
pub use pipeline::{RunObserver, RunOutcome, run_pipeline};
