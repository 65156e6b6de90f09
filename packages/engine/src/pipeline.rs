//! The run pipeline: discover, fetch, classify, persist.

use std::collections::BTreeSet;
use std::time::Instant;

use chrono::Utc;
use vrm_harvest_models::{PageResult, RunResult};
use vrm_harvest_scraper::{PageSource, normalize};
use vrm_harvest_store::Store;

use crate::cancel::CancelToken;
use crate::pacing::Pacing;

/// Observer notified as the pipeline advances, page by page.
///
/// The [`RunController`](crate::controller::RunController) implements this
/// to mirror pipeline progress into the shared
/// [`Progress`](vrm_harvest_models::Progress) state.
pub trait RunObserver: Send + Sync {
    /// Called after each page fetch completes (successfully or not).
    fn page_fetched(&self, page: u32, total_pages: u32);
}

/// An observer that ignores all notifications.
pub struct NullObserver;

impl RunObserver for NullObserver {
    fn page_fetched(&self, _page: u32, _total_pages: u32) {}
}

/// What one pipeline execution produced.
#[derive(Debug)]
pub struct RunOutcome {
    /// The aggregate run result (always present, even when degraded).
    pub result: RunResult,
    /// Whether the snapshot artifacts were durably written.
    pub snapshot_saved: bool,
    /// Whether the run stopped early on the cancellation token.
    pub cancelled: bool,
}

/// Executes one full scrape run.
///
/// Page 1 is fetched first to discover the declared page count; pages
/// `2..=total` follow strictly in order under `pacing`, with `cancel`
/// checked at every page boundary. Every per-page failure degrades to an
/// empty page. The aggregate is classified against the known-identifier
/// set and snapshotted; a snapshot-write failure is surfaced via
/// [`RunOutcome::snapshot_saved`] rather than an error.
pub async fn run_pipeline<S: PageSource>(
    source: &S,
    store: &Store,
    pacing: &Pacing,
    cancel: &CancelToken,
    observer: &dyn RunObserver,
) -> RunOutcome {
    let started_at = Utc::now();
    let timer = Instant::now();

    let mut known_ids = store.load_known_ids().unwrap_or_else(|e| {
        log::warn!("Known-identifier artifact unreadable, starting empty: {e}");
        BTreeSet::new()
    });

    // ── Discover the page count from page 1 ──────────────────────────
    let first = fetch_soft(source, 1).await;
    let total_pages = first.pagination.total_pages.max(1);
    let metadata = first.metadata;
    let mut pagination = first.pagination;
    let mut records = first.records;
    let mut cancelled = false;

    log::info!("Catalog declares {total_pages} page(s)");
    observer.page_fetched(1, total_pages);

    // ── Paced sequential fetch of the remaining pages ────────────────
    for page in 2..=total_pages {
        if cancel.is_cancelled() {
            log::info!("Kill switch observed, stopping before page {page}");
            cancelled = true;
            break;
        }

        tokio::time::sleep(pacing.page_delay()).await;

        let mut result = fetch_soft(source, page).await;
        records.append(&mut result.records);
        if result.pagination.total_pages != 0 {
            pagination = result.pagination;
        }
        observer.page_fetched(page, total_pages);

        if pacing.is_cooldown_page(page) {
            let cooldown = pacing.cooldown();
            log::debug!("Cooldown after page {page}: {cooldown:?}");
            tokio::time::sleep(cooldown).await;
        }
    }

    // ── Classify new identifiers against the known set ───────────────
    let mut new_ids: Vec<String> = Vec::new();
    for record in &records {
        if let Some(id) = normalize::listing_id(record)
            && !known_ids.contains(&id)
        {
            known_ids.insert(id.clone());
            new_ids.push(id);
        }
    }

    if new_ids.is_empty() {
        log::info!("No new listings this run");
    } else {
        log::info!("{} newly discovered listing(s)", new_ids.len());
        if let Err(e) = store.save_known_ids(&known_ids) {
            log::error!("Failed to persist known identifiers: {e}");
        }
    }

    let result = RunResult {
        count: records.len() as u64,
        new_listing_count: new_ids.len() as u64,
        properties: records,
        metadata,
        pagination,
        started_at,
        finished_at: Utc::now(),
        duration_seconds: timer.elapsed().as_secs_f64(),
    };

    // ── Snapshot ─────────────────────────────────────────────────────
    let snapshot_saved = match store.write_snapshot(&result) {
        Ok(_) => true,
        Err(e) => {
            log::error!("Failed to persist snapshot, returning in-memory result only: {e}");
            false
        }
    };

    RunOutcome {
        result,
        snapshot_saved,
        cancelled,
    }
}

/// Fetches one page, absorbing any error into an empty result. A bad page
/// never aborts the run.
async fn fetch_soft<S: PageSource>(source: &S, page: u32) -> PageResult {
    match source.fetch_page(page).await {
        Ok(result) => result,
        Err(e) => {
            log::warn!("Page {page} failed, continuing with empty page: {e}");
            PageResult::empty(page)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicU32, Ordering};

    use serde_json::json;
    use vrm_harvest_models::{PageResult, Pagination};
    use vrm_harvest_scraper::{PageSource, ScrapeError};
    use vrm_harvest_store::Store;

    use super::*;

    /// Serves canned pages; optionally fails some and/or trips the cancel
    /// token while serving a given page.
    struct FakeSource {
        pages: Vec<PageResult>,
        fail_pages: BTreeSet<u32>,
        cancel_at: Option<(u32, CancelToken)>,
        calls: AtomicU32,
    }

    impl FakeSource {
        fn new(pages: Vec<PageResult>) -> Self {
            Self {
                pages,
                fail_pages: BTreeSet::new(),
                cancel_at: None,
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl PageSource for FakeSource {
        async fn fetch_page(&self, page: u32) -> Result<PageResult, ScrapeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some((at, token)) = &self.cancel_at
                && page == *at
            {
                token.cancel();
            }
            if self.fail_pages.contains(&page) {
                return Err(ScrapeError::ModelMissing);
            }
            Ok(self.pages[(page - 1) as usize].clone())
        }
    }

    fn page(page_no: u32, total: u32, asset_ids: &[u64]) -> PageResult {
        PageResult {
            records: asset_ids.iter().map(|id| json!({"assetId": id})).collect(),
            metadata: (page_no == 1).then(|| json!({"searchStates": ["AL"]})),
            pagination: Pagination {
                current_page: page_no,
                total_pages: total,
                item_count: 0,
                page_size: asset_ids.len() as u32,
            },
        }
    }

    fn store() -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path()).unwrap();
        (dir, store)
    }

    async fn run(source: &FakeSource, store: &Store) -> RunOutcome {
        run_pipeline(
            source,
            store,
            &Pacing::none(),
            &CancelToken::new(),
            &NullObserver,
        )
        .await
    }

    #[tokio::test]
    async fn aggregates_all_pages_in_order() {
        let (_dir, store) = store();
        let source = FakeSource::new(vec![
            page(1, 3, &[1, 2]),
            page(2, 3, &[3, 4]),
            page(3, 3, &[5]),
        ]);

        let outcome = run(&source, &store).await;

        assert_eq!(outcome.result.count, 5);
        assert_eq!(source.calls(), 3);
        assert!(!outcome.cancelled);
        assert!(outcome.snapshot_saved);
        let ids: Vec<u64> = outcome
            .result
            .properties
            .iter()
            .map(|r| r["assetId"].as_u64().unwrap())
            .collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
        assert_eq!(outcome.result.metadata, Some(json!({"searchStates": ["AL"]})));
    }

    #[tokio::test]
    async fn failed_page_degrades_to_empty_and_run_continues() {
        let (_dir, store) = store();
        let mut source = FakeSource::new(vec![
            page(1, 3, &[1]),
            page(2, 3, &[2]),
            page(3, 3, &[3]),
        ]);
        source.fail_pages.insert(2);

        let outcome = run(&source, &store).await;

        assert_eq!(outcome.result.count, 2);
        assert_eq!(source.calls(), 3);
        assert!(outcome.snapshot_saved);
    }

    #[tokio::test]
    async fn page_one_failure_finalizes_with_empty_result() {
        let (_dir, store) = store();
        let mut source = FakeSource::new(vec![page(1, 5, &[1])]);
        source.fail_pages.insert(1);

        let outcome = run(&source, &store).await;

        assert_eq!(outcome.result.count, 0);
        assert!(outcome.result.metadata.is_none());
        // Total defaulted to 1, so no further pages were attempted.
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn new_identifiers_are_classified_against_the_known_set() {
        let (_dir, store) = store();
        let prior: BTreeSet<String> = ["1", "2"].into_iter().map(str::to_owned).collect();
        store.save_known_ids(&prior).unwrap();

        let source = FakeSource::new(vec![page(1, 1, &[1, 3, 4])]);
        let outcome = run(&source, &store).await;

        assert_eq!(outcome.result.new_listing_count, 2);
        let persisted = store.load_known_ids().unwrap();
        let expected: BTreeSet<String> =
            ["1", "2", "3", "4"].into_iter().map(str::to_owned).collect();
        assert_eq!(persisted, expected);
    }

    #[tokio::test]
    async fn second_identical_run_discovers_nothing_new() {
        let (_dir, store) = store();
        let source = FakeSource::new(vec![page(1, 2, &[1, 2]), page(2, 2, &[3])]);

        let first = run(&source, &store).await;
        assert_eq!(first.result.new_listing_count, 3);

        let second = run(&source, &store).await;
        assert_eq!(second.result.new_listing_count, 0);
        assert_eq!(second.result.count, 3);
    }

    #[tokio::test]
    async fn records_without_identifiers_are_kept_but_never_counted_new() {
        let (_dir, store) = store();
        let mut first = page(1, 1, &[7]);
        first.records.push(json!({"addressLine1": "5 Main St"}));
        let source = FakeSource::new(vec![first]);

        let outcome = run(&source, &store).await;

        assert_eq!(outcome.result.count, 2);
        assert_eq!(outcome.result.new_listing_count, 1);
    }

    #[tokio::test]
    async fn cancellation_stops_at_the_next_page_boundary() {
        let (_dir, store) = store();
        let token = CancelToken::new();
        let mut source = FakeSource::new(vec![
            page(1, 5, &[1]),
            page(2, 5, &[2]),
            page(3, 5, &[3]),
            page(4, 5, &[4]),
            page(5, 5, &[5]),
        ]);
        source.cancel_at = Some((3, token.clone()));

        let outcome =
            run_pipeline(&source, &store, &Pacing::none(), &token, &NullObserver).await;

        // Page 3's fetch completes (cancellation is cooperative), page 4
        // is never started.
        assert!(outcome.cancelled);
        assert_eq!(outcome.result.count, 3);
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test]
    async fn pre_cancelled_token_stops_after_discovery() {
        let (_dir, store) = store();
        let token = CancelToken::new();
        token.cancel();
        let source = FakeSource::new(vec![page(1, 4, &[1]), page(2, 4, &[2])]);

        let outcome =
            run_pipeline(&source, &store, &Pacing::none(), &token, &NullObserver).await;

        assert!(outcome.cancelled);
        assert_eq!(outcome.result.count, 1);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn observer_sees_every_page() {
        struct Recording(std::sync::Mutex<Vec<(u32, u32)>>);
        impl RunObserver for Recording {
            fn page_fetched(&self, page: u32, total_pages: u32) {
                self.0.lock().unwrap().push((page, total_pages));
            }
        }

        let (_dir, store) = store();
        let source = FakeSource::new(vec![page(1, 2, &[1]), page(2, 2, &[2])]);
        let observer = Recording(std::sync::Mutex::new(Vec::new()));

        run_pipeline(
            &source,
            &store,
            &Pacing::none(),
            &CancelToken::new(),
            &observer,
        )
        .await;

        assert_eq!(*observer.0.lock().unwrap(), vec![(1, 2), (2, 2)]);
    }
}
