//! Background publishing of the catalog index.
//!
//! The indexer runs the publish pipeline once on its own thread. Search and
//! random picks are served from the catalog right away; the index becomes
//! visible to readers only after the run finishes, through a set-once cell.
//!
//! - `published` / `failed` count page outcomes as they happen
//! - `running` is true while the thread is publishing

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Arc, OnceLock};
use std::thread::JoinHandle;

use crate::catalog::CatalogStore;
use crate::error::CatalogResult;
use crate::partition::{Letter, partition};
use crate::publish::{
    CatalogIndex, IndexEntry, Pacer, PageService, PublishObserver, PublishSettings, Publisher,
};

#[derive(Debug, Clone)]
pub struct IndexerStats {
    pub published: Arc<AtomicU64>,
    pub failed: Arc<AtomicU64>,
    pub running: Arc<AtomicBool>,
}

impl IndexerStats {
    fn new() -> Self {
        Self {
            published: Arc::new(AtomicU64::new(0)),
            failed: Arc::new(AtomicU64::new(0)),
            running: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl PublishObserver for IndexerStats {
    fn on_page(&self, _letter: Letter, outcome: &CatalogResult<IndexEntry>) {
        match outcome {
            Ok(_) => self.published.fetch_add(1, AtomicOrdering::Relaxed),
            Err(_) => self.failed.fetch_add(1, AtomicOrdering::Relaxed),
        };
    }
}

/// Shared, read-only state the chat front end queries.
#[derive(Debug, Clone)]
pub struct CatalogState {
    store: Arc<CatalogStore>,
    index: Arc<OnceLock<CatalogIndex>>,
}

impl CatalogState {
    pub fn new(store: CatalogStore) -> Self {
        Self {
            store: Arc::new(store),
            index: Arc::new(OnceLock::new()),
        }
    }

    pub fn store(&self) -> &CatalogStore {
        &self.store
    }

    /// The finished index, or `None` while publishing is still in progress.
    pub fn index(&self) -> Option<&CatalogIndex> {
        self.index.get()
    }

    pub fn is_index_ready(&self) -> bool {
        self.index.get().is_some_and(|index| !index.is_empty())
    }

    /// Installs the index. Only the first call has an effect.
    pub fn install_index(&self, index: CatalogIndex) -> bool {
        self.index.set(index).is_ok()
    }
}

pub struct Indexer {
    stats: IndexerStats,
    handle: Option<JoinHandle<()>>,
}

impl Indexer {
    /// Starts publishing on a background thread.
    pub fn spawn<S, P>(
        state: CatalogState,
        service: S,
        pacer: P,
        settings: PublishSettings,
    ) -> Self
    where
        S: PageService + Send + 'static,
        P: Pacer + Send + 'static,
    {
        let stats = IndexerStats::new();
        stats.running.store(true, AtomicOrdering::Relaxed);
        let thread_stats = stats.clone();
        let handle = std::thread::spawn(move || {
            run_publish(&state, &service, &pacer, &settings, &thread_stats);
            thread_stats.running.store(false, AtomicOrdering::Relaxed);
        });
        Self {
            stats,
            handle: Some(handle),
        }
    }

    pub fn stats(&self) -> IndexerStats {
        self.stats.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(|handle| handle.is_finished())
    }

    /// Waits for the publish thread. Returns `false` if it panicked; the
    /// panic message is logged and no index is installed.
    pub fn join(&mut self) -> bool {
        let Some(handle) = self.handle.take() else {
            return true;
        };
        match handle.join() {
            Ok(()) => true,
            Err(payload) => {
                let reason = payload
                    .downcast_ref::<&str>()
                    .copied()
                    .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
                    .unwrap_or("unknown panic payload");
                tracing::error!(reason, "catalog publish thread panicked");
                self.stats.running.store(false, AtomicOrdering::Relaxed);
                false
            }
        }
    }

    /// Logs the page counters, then joins a finished publish thread. A run
    /// still in progress is left to die with the process and `false` is
    /// returned, as it is for a panicked thread.
    pub fn shutdown(mut self) -> bool {
        let published = self.stats.published.load(AtomicOrdering::Relaxed);
        let failed = self.stats.failed.load(AtomicOrdering::Relaxed);
        if !self.is_finished() {
            tracing::warn!(
                published,
                failed,
                "abandoning catalog publish still in progress"
            );
            return false;
        }
        tracing::info!(published, failed, "catalog publish finished");
        self.join()
    }
}

fn run_publish<S: PageService, P: Pacer>(
    state: &CatalogState,
    service: &S,
    pacer: &P,
    settings: &PublishSettings,
    stats: &IndexerStats,
) {
    let groups = partition(state.store().records());
    tracing::info!(letters = groups.len(), "publishing catalog pages");
    match Publisher::new(service, pacer, settings).publish_all(&groups, stats) {
        Ok(report) => {
            if report.is_partial() {
                tracing::warn!(
                    failed = report.failures.len(),
                    "catalog index is missing some letters"
                );
            }
            state.install_index(report.index);
        }
        Err(e) => {
            tracing::error!(error = %e, "catalog publishing aborted");
            state.install_index(CatalogIndex::default());
        }
    }
}
