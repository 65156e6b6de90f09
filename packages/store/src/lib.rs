#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Durable artifacts for the VRM harvester.
//!
//! Everything lives as whole-file JSON under one data directory:
//!
//! - `known_ids.json` — every listing identifier ever observed
//! - `latest.json` — the most recent [`RunResult`](vrm_harvest_models::RunResult)
//! - `snapshot_<UTC>.json` — immutable per-run snapshots, pruned to the
//!   [`RETAINED_SNAPSHOTS`] most recent
//!
//! All I/O is synchronous; artifacts are only touched at run boundaries.

pub mod known_ids;
pub mod snapshot;

use std::path::{Path, PathBuf};

/// File name of the known-identifier artifact.
pub const KNOWN_IDS_FILE: &str = "known_ids.json";

/// File name of the always-overwritten latest run artifact.
pub const LATEST_FILE: &str = "latest.json";

/// Prefix of timestamped snapshot artifacts.
pub const SNAPSHOT_PREFIX: &str = "snapshot_";

/// Suffix of timestamped snapshot artifacts.
pub const SNAPSHOT_SUFFIX: &str = ".json";

/// How many timestamped snapshots survive pruning.
pub const RETAINED_SNAPSHOTS: usize = 5;

/// `chrono` format string for snapshot file names (UTC, second precision).
pub const SNAPSHOT_TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Errors that can occur reading or writing store artifacts.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An artifact body failed to encode or decode.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The requested artifact has never been written.
    #[error("no {artifact} artifact exists yet")]
    NotFound {
        /// Which artifact was requested.
        artifact: String,
    },
}

/// Handle on the harvester's data directory.
#[derive(Debug, Clone)]
pub struct Store {
    root: PathBuf,
}

impl Store {
    /// Opens (creating if necessary) the data directory at `root`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the directory cannot be created.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Returns the data directory path.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the path of the known-identifier artifact.
    #[must_use]
    pub fn known_ids_path(&self) -> PathBuf {
        self.root.join(KNOWN_IDS_FILE)
    }

    /// Returns the path of the latest-run artifact.
    #[must_use]
    pub fn latest_path(&self) -> PathBuf {
        self.root.join(LATEST_FILE)
    }

    /// Returns the path of the timestamped snapshot for a run started at
    /// `started_at`.
    #[must_use]
    pub fn snapshot_path(&self, started_at: &chrono::DateTime<chrono::Utc>) -> PathBuf {
        self.root.join(format!(
            "{SNAPSHOT_PREFIX}{}{SNAPSHOT_SUFFIX}",
            started_at.format(SNAPSHOT_TIMESTAMP_FORMAT)
        ))
    }

    /// Whether `name` looks like a timestamped snapshot artifact.
    #[must_use]
    pub fn is_snapshot_name(name: &str) -> bool {
        name.starts_with(SNAPSHOT_PREFIX) && name.ends_with(SNAPSHOT_SUFFIX)
    }
}
