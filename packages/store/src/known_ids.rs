//! Persistence of the cumulative known-identifier set.
//!
//! The set records every listing identifier ever observed across runs and
//! only ever grows — it is a discovery history, not a mirror of current
//! catalog membership.

use std::collections::BTreeSet;

use crate::{Store, StoreError};

impl Store {
    /// Loads the known-identifier set, returning an empty set when no
    /// artifact has been written yet.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the artifact exists but cannot be read or
    /// decoded.
    pub fn load_known_ids(&self) -> Result<BTreeSet<String>, StoreError> {
        let path = self.known_ids_path();
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No known-identifier artifact yet, starting empty");
                return Ok(BTreeSet::new());
            }
            Err(e) => return Err(e.into()),
        };

        let ids: Vec<String> = serde_json::from_str(&text)?;
        Ok(ids.into_iter().collect())
    }

    /// Persists the known-identifier set, replacing any prior artifact.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the artifact cannot be encoded or written.
    pub fn save_known_ids(&self, ids: &BTreeSet<String>) -> Result<(), StoreError> {
        let body = serde_json::to_vec(&ids.iter().collect::<Vec<_>>())?;
        std::fs::write(self.known_ids_path(), body)?;
        log::debug!("Persisted {} known identifiers", ids.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use crate::Store;

    fn store() -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn missing_artifact_loads_as_empty_set() {
        let (_dir, store) = store();
        assert!(store.load_known_ids().unwrap().is_empty());
    }

    #[test]
    fn round_trips_the_set() {
        let (_dir, store) = store();
        let ids: BTreeSet<String> = ["4417", "4418", "9002"]
            .into_iter()
            .map(str::to_owned)
            .collect();

        store.save_known_ids(&ids).unwrap();
        assert_eq!(store.load_known_ids().unwrap(), ids);
    }

    #[test]
    fn save_replaces_prior_artifact() {
        let (_dir, store) = store();
        let first: BTreeSet<String> = ["a"].into_iter().map(str::to_owned).collect();
        let second: BTreeSet<String> = ["a", "b", "c"].into_iter().map(str::to_owned).collect();

        store.save_known_ids(&first).unwrap();
        store.save_known_ids(&second).unwrap();
        assert_eq!(store.load_known_ids().unwrap(), second);
    }

    #[test]
    fn corrupt_artifact_is_an_error() {
        let (_dir, store) = store();
        std::fs::write(store.known_ids_path(), b"not json").unwrap();
        assert!(store.load_known_ids().is_err());
    }
}
