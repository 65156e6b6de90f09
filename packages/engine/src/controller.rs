//! The run controller: single-run enforcement, shared progress, kill switch.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use vrm_harvest_models::Progress;
use vrm_harvest_scraper::PageSource;
use vrm_harvest_store::Store;

use crate::cancel::CancelToken;
use crate::pacing::Pacing;
use crate::pipeline::{self, RunObserver, RunOutcome};

/// Owns the run lifecycle: at most one active run at a time, a shared
/// [`Progress`] any number of callers can read, and the cooperative kill
/// switch.
///
/// Constructed once at startup and injected into request handlers; there
/// are no process-wide globals.
pub struct RunController<S> {
    source: S,
    store: Arc<Store>,
    pacing: Pacing,
    progress: Mutex<Progress>,
    cancel: CancelToken,
}

impl<S: PageSource + 'static> RunController<S> {
    /// Creates an idle controller.
    #[must_use]
    pub fn new(source: S, store: Arc<Store>, pacing: Pacing) -> Arc<Self> {
        Arc::new(Self {
            source,
            store,
            pacing,
            progress: Mutex::new(Progress::default()),
            cancel: CancelToken::new(),
        })
    }

    /// Returns the store this controller persists runs into.
    #[must_use]
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Returns a copy of the current run progress.
    #[must_use]
    pub fn progress(&self) -> Progress {
        self.lock().clone()
    }

    /// Starts a run, or returns the current progress unchanged when one is
    /// already in flight. The run executes on a spawned task; this returns
    /// immediately.
    pub fn start(self: &Arc<Self>) -> Progress {
        let snapshot = {
            let mut progress = self.lock();
            if progress.running {
                log::info!("Run already in progress, ignoring start request");
                return progress.clone();
            }

            *progress = Progress {
                running: true,
                current_page: 0,
                total_pages: 0,
                started_at: Some(Utc::now()),
                finished_at: None,
                duration_seconds: None,
                message: "run started".to_owned(),
            };
            self.cancel.reset();
            progress.clone()
        };

        let this = Arc::clone(self);
        tokio::spawn(async move {
            this.run().await;
        });

        snapshot
    }

    /// Sets the kill switch and immediately marks progress as not running.
    ///
    /// The in-flight pipeline only observes the switch at its next page
    /// boundary; any request already in flight completes first.
    pub fn kill(&self) -> Progress {
        self.cancel.cancel();
        let mut progress = self.lock();
        progress.running = false;
        progress.message = "manually stopped".to_owned();
        log::info!("Kill switch set");
        progress.clone()
    }

    /// Executes one pipeline run and finalizes the shared progress.
    async fn run(self: Arc<Self>) {
        let outcome = pipeline::run_pipeline(
            &self.source,
            &self.store,
            &self.pacing,
            &self.cancel,
            self.as_ref(),
        )
        .await;

        self.finalize(&outcome);
    }

    fn finalize(&self, outcome: &RunOutcome) {
        let RunOutcome {
            result,
            snapshot_saved,
            cancelled,
        } = outcome;

        let summary = if *cancelled {
            format!(
                "stopped early — {} listings ({} new)",
                result.count, result.new_listing_count,
            )
        } else if *snapshot_saved {
            format!(
                "completed — {} listings ({} new)",
                result.count, result.new_listing_count,
            )
        } else {
            format!(
                "completed without snapshot (write failed) — {} listings ({} new)",
                result.count, result.new_listing_count,
            )
        };
        log::info!("Run {summary}");

        let mut progress = self.lock();
        progress.running = false;
        progress.finished_at = Some(result.finished_at);
        progress.duration_seconds = Some(result.duration_seconds);
        progress.message = summary;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Progress> {
        self.progress.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<S: PageSource + 'static> RunObserver for RunController<S> {
    fn page_fetched(&self, page: u32, total_pages: u32) {
        let mut progress = self.lock();
        progress.current_page = page;
        progress.total_pages = total_pages;
        progress.message = format!("fetched page {page}/{total_pages}");
    }
}
