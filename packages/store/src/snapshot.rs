//! Run snapshot persistence and retention pruning.

use std::path::PathBuf;
use std::time::SystemTime;

use vrm_harvest_models::RunResult;

use crate::{RETAINED_SNAPSHOTS, Store, StoreError};

impl Store {
    /// Writes `result` as the latest artifact (overwriting) and as a new
    /// timestamped snapshot named by the run's UTC start time, then prunes
    /// snapshots beyond [`RETAINED_SNAPSHOTS`].
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if either artifact cannot be written. Pruning
    /// failures are logged and never fail the run.
    pub fn write_snapshot(&self, result: &RunResult) -> Result<PathBuf, StoreError> {
        let body = serde_json::to_vec(result)?;

        std::fs::write(self.latest_path(), &body)?;

        let snapshot_path = self.snapshot_path(&result.started_at);
        std::fs::write(&snapshot_path, &body)?;
        log::info!(
            "Wrote snapshot {} ({} listings)",
            snapshot_path.display(),
            result.count,
        );

        self.prune_snapshots();
        Ok(snapshot_path)
    }

    /// Loads the latest run artifact.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no run has ever been
    /// persisted, or another [`StoreError`] when the artifact cannot be
    /// read or decoded.
    pub fn load_latest(&self) -> Result<RunResult, StoreError> {
        let text = match std::fs::read_to_string(self.latest_path()) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound {
                    artifact: "latest run".to_owned(),
                });
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&text)?)
    }

    /// Lists timestamped snapshot artifacts, newest first.
    ///
    /// Ordered by modification time descending with the file name as
    /// tie-break — names embed the UTC second, so ordering stays
    /// deterministic on filesystems with coarse mtime granularity.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the data directory cannot be listed.
    pub fn list_snapshots(&self) -> Result<Vec<PathBuf>, StoreError> {
        let mut snapshots: Vec<(SystemTime, String, PathBuf)> = Vec::new();

        for entry in std::fs::read_dir(self.root())? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if !Self::is_snapshot_name(&name) {
                continue;
            }
            let modified = match entry.metadata().and_then(|m| m.modified()) {
                Ok(modified) => modified,
                Err(e) => {
                    log::warn!("Skipping unreadable snapshot {name}: {e}");
                    continue;
                }
            };
            snapshots.push((modified, name, entry.path()));
        }

        snapshots.sort_by(|a, b| (&b.0, &b.1).cmp(&(&a.0, &a.1)));
        Ok(snapshots.into_iter().map(|(_, _, path)| path).collect())
    }

    /// Deletes every timestamped snapshot beyond the retention window,
    /// logging each deletion. Failures are logged and otherwise ignored.
    pub fn prune_snapshots(&self) {
        let snapshots = match self.list_snapshots() {
            Ok(snapshots) => snapshots,
            Err(e) => {
                log::warn!("Snapshot pruning skipped, listing failed: {e}");
                return;
            }
        };

        for stale in snapshots.iter().skip(RETAINED_SNAPSHOTS) {
            match std::fs::remove_file(stale) {
                Ok(()) => log::info!("Pruned old snapshot {}", stale.display()),
                Err(e) => log::warn!("Failed to prune snapshot {}: {e}", stale.display()),
            }
        }
    }
}
