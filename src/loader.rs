//! Catalog acquisition and the process-wide cache.
//!
//! The cache is a single `Arc<Snapshot>` behind a read-write lock. Readers
//! clone the `Arc`; an acquisition builds a complete new snapshot and swaps
//! it in, so a caller never sees books from two different loads.
//!
//! Acquisition never fails: the remote source is tried first, then the
//! bundled file, and the worst outcome is an empty catalog. Every fallback
//! is logged and counted in [`AcquisitionStats`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::catalog::{Book, Catalog};
use crate::source::{CatalogSource, LocalSource, RemoteSource};

/// A published catalog together with the time it was acquired.
#[derive(Debug)]
pub struct Snapshot {
    pub books: Catalog,
    /// `None` until the first acquisition completes.
    pub acquired_at: Option<DateTime<Utc>>,
    generation: u64,
}

impl Snapshot {
    fn empty() -> Self {
        Self {
            books: Arc::from(Vec::new()),
            acquired_at: None,
            generation: 0,
        }
    }
}

/// Counters for acquisition outcomes. Purely diagnostic.
#[derive(Debug, Default)]
pub struct AcquisitionStats {
    acquisitions: AtomicU64,
    remote_failures: AtomicU64,
    remote_empty: AtomicU64,
    local_failures: AtomicU64,
    empty_catalogs: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsReport {
    pub acquisitions: u64,
    pub remote_failures: u64,
    pub remote_empty: u64,
    pub local_failures: u64,
    pub empty_catalogs: u64,
}

impl AcquisitionStats {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn report(&self) -> StatsReport {
        StatsReport {
            acquisitions: self.acquisitions.load(Ordering::Relaxed),
            remote_failures: self.remote_failures.load(Ordering::Relaxed),
            remote_empty: self.remote_empty.load(Ordering::Relaxed),
            local_failures: self.local_failures.load(Ordering::Relaxed),
            empty_catalogs: self.empty_catalogs.load(Ordering::Relaxed),
        }
    }
}

pub struct CatalogLoader<R = RemoteSource, L = LocalSource> {
    remote: R,
    local: L,
    state: RwLock<Arc<Snapshot>>,
    /// Serializes acquisitions so overlapping callers share one result.
    gate: Mutex<()>,
    stats: AcquisitionStats,
}

impl<R: CatalogSource, L: CatalogSource> CatalogLoader<R, L> {
    pub fn new(remote: R, local: L) -> Self {
        Self {
            remote,
            local,
            state: RwLock::new(Arc::new(Snapshot::empty())),
            gate: Mutex::new(()),
            stats: AcquisitionStats::default(),
        }
    }

    /// Current snapshot; never triggers an acquisition.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.state.read().clone()
    }

    pub fn last_acquired(&self) -> Option<DateTime<Utc>> {
        self.snapshot().acquired_at
    }

    pub fn stats(&self) -> &AcquisitionStats {
        &self.stats
    }

    /// Return the cached catalog, acquiring it first if the cache is empty.
    ///
    /// Callers that arrive while another acquisition is running wait for it
    /// and return its result rather than starting their own.
    pub async fn ensure_loaded(&self) -> Catalog {
        let seen = self.snapshot();
        if !seen.books.is_empty() {
            return Arc::clone(&seen.books);
        }

        let _guard = self.gate.lock().await;
        let latest = self.snapshot();
        if latest.generation != seen.generation {
            debug!("catalog published while waiting, reusing it");
            return Arc::clone(&latest.books);
        }

        Arc::clone(&self.acquire().await.books)
    }

    /// Run an acquisition cycle even if books are already cached.
    pub async fn reload(&self) -> Arc<Snapshot> {
        let _guard = self.gate.lock().await;
        self.acquire().await
    }

    /// Must be called with `gate` held.
    async fn acquire(&self) -> Arc<Snapshot> {
        AcquisitionStats::bump(&self.stats.acquisitions);
        let books = self.resolve().await;

        if books.is_empty() {
            AcquisitionStats::bump(&self.stats.empty_catalogs);
            warn!("no books available from any source, publishing empty catalog");
        }

        let mut state = self.state.write();
        let snapshot = Arc::new(Snapshot {
            books: Arc::from(books),
            acquired_at: Some(Utc::now()),
            generation: state.generation + 1,
        });
        *state = Arc::clone(&snapshot);
        drop(state);

        info!(
            books = snapshot.books.len(),
            generation = snapshot.generation,
            "catalog published"
        );
        snapshot
    }

    async fn resolve(&self) -> Vec<Book> {
        match self.remote.fetch().await {
            Ok(books) if !books.is_empty() => {
                info!(source = %self.remote.describe(), books = books.len(), "loaded remote catalog");
                return books;
            }
            Ok(_) => {
                AcquisitionStats::bump(&self.stats.remote_empty);
                warn!(source = %self.remote.describe(), "remote catalog is empty, using fallback");
            }
            Err(e) => {
                AcquisitionStats::bump(&self.stats.remote_failures);
                warn!(source = %self.remote.describe(), error = %e, "remote catalog unavailable, using fallback");
            }
        }

        match self.local.fetch().await {
            Ok(books) => {
                info!(source = %self.local.describe(), books = books.len(), "loaded fallback catalog");
                books
            }
            Err(e) => {
                AcquisitionStats::bump(&self.stats.local_failures);
                warn!(source = %self.local.describe(), error = %e, "fallback catalog unavailable");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceError;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    struct MockSource {
        responses: parking_lot::Mutex<VecDeque<Result<Vec<Book>, SourceError>>>,
        calls: AtomicUsize,
        delay: Duration,
    }

    impl MockSource {
        fn with(responses: Vec<Result<Vec<Book>, SourceError>>) -> Self {
            Self {
                responses: parking_lot::Mutex::new(responses.into()),
                calls: AtomicUsize::new(0),
                delay: Duration::ZERO,
            }
        }

        fn books(books: Vec<Book>) -> Self {
            Self::with(vec![Ok(books)])
        }

        fn failing() -> Self {
            Self::with(vec![Err(SourceError::Status(500))])
        }

        fn slow(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl CatalogSource for MockSource {
        async fn fetch(&self) -> Result<Vec<Book>, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            // Once the scripted responses run out, keep repeating "empty".
            self.responses.lock().pop_front().unwrap_or(Ok(Vec::new()))
        }

        fn describe(&self) -> String {
            "mock".to_string()
        }
    }

    fn titled(titles: &[&str]) -> Vec<Book> {
        titles
            .iter()
            .map(|t| Book {
                title: Some(t.to_string()),
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn starts_empty_and_never_acquired() {
        let loader = CatalogLoader::new(MockSource::books(vec![]), MockSource::books(vec![]));
        assert!(loader.snapshot().books.is_empty());
        assert_eq!(loader.last_acquired(), None);
    }

    #[tokio::test]
    async fn remote_books_win_over_fallback() {
        let loader = CatalogLoader::new(
            MockSource::books(titled(&["Remote"])),
            MockSource::books(titled(&["Local"])),
        );

        let books = loader.ensure_loaded().await;
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].title.as_deref(), Some("Remote"));
        assert_eq!(loader.local.calls(), 0);
        assert!(loader.last_acquired().is_some());
    }

    #[tokio::test]
    async fn remote_failure_falls_back_to_local() {
        let loader = CatalogLoader::new(
            MockSource::failing(),
            MockSource::books(titled(&["A", "B", "C", "D", "E"])),
        );

        let books = loader.ensure_loaded().await;
        assert_eq!(books.len(), 5);
        assert_eq!(loader.stats().report().remote_failures, 1);
        assert_eq!(loader.stats().report().remote_empty, 0);
    }

    #[tokio::test]
    async fn empty_remote_falls_back_to_local() {
        let loader = CatalogLoader::new(
            MockSource::books(vec![]),
            MockSource::books(titled(&["Local"])),
        );

        let books = loader.ensure_loaded().await;
        assert_eq!(books[0].title.as_deref(), Some("Local"));
        assert_eq!(loader.stats().report().remote_empty, 1);
    }

    #[tokio::test]
    async fn both_sources_failing_publishes_empty_catalog_with_timestamp() {
        let loader = CatalogLoader::new(MockSource::failing(), MockSource::failing());

        let before = Utc::now();
        let books = loader.ensure_loaded().await;

        assert!(books.is_empty());
        let acquired = loader.last_acquired().expect("timestamp recorded");
        assert!(acquired >= before);

        let report = loader.stats().report();
        assert_eq!(report.acquisitions, 1);
        assert_eq!(report.remote_failures, 1);
        assert_eq!(report.local_failures, 1);
        assert_eq!(report.empty_catalogs, 1);
    }

    #[tokio::test]
    async fn cached_catalog_is_reused() {
        let loader = CatalogLoader::new(
            MockSource::books(titled(&["One", "Two"])),
            MockSource::books(vec![]),
        );

        let first = loader.ensure_loaded().await;
        let second = loader.ensure_loaded().await;

        assert_eq!(first, second);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(loader.remote.calls(), 1);
        assert_eq!(loader.stats().report().acquisitions, 1);
    }

    #[tokio::test]
    async fn empty_cache_is_retried_on_next_call() {
        let loader = CatalogLoader::new(
            MockSource::with(vec![Err(SourceError::Status(503)), Ok(titled(&["Back"]))]),
            MockSource::failing(),
        );

        assert!(loader.ensure_loaded().await.is_empty());
        let books = loader.ensure_loaded().await;
        assert_eq!(books[0].title.as_deref(), Some("Back"));
        assert_eq!(loader.remote.calls(), 2);
    }

    #[tokio::test]
    async fn reload_forces_a_new_acquisition() {
        let loader = CatalogLoader::new(
            MockSource::with(vec![Ok(titled(&["Old"])), Ok(titled(&["New", "Newer"]))]),
            MockSource::books(vec![]),
        );

        loader.ensure_loaded().await;
        let first_time = loader.last_acquired();

        let snapshot = loader.reload().await;
        assert_eq!(snapshot.books.len(), 2);
        assert!(snapshot.acquired_at >= first_time);
        assert_eq!(loader.ensure_loaded().await.len(), 2);
        assert_eq!(loader.remote.calls(), 2);
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_acquisition() {
        let loader = Arc::new(CatalogLoader::new(
            MockSource::books(titled(&["Shared"])).slow(Duration::from_millis(50)),
            MockSource::books(vec![]),
        ));

        let calls = (0..8).map(|_| {
            let loader = Arc::clone(&loader);
            async move { loader.ensure_loaded().await }
        });
        let results = futures::future::join_all(calls).await;

        assert!(results.iter().all(|books| books.len() == 1));
        assert_eq!(loader.remote.calls(), 1);
        assert_eq!(loader.stats().report().acquisitions, 1);
    }

    #[tokio::test]
    async fn concurrent_callers_share_an_empty_result() {
        let loader = Arc::new(CatalogLoader::new(
            MockSource::failing().slow(Duration::from_millis(50)),
            MockSource::failing(),
        ));

        let calls = (0..4).map(|_| {
            let loader = Arc::clone(&loader);
            async move { loader.ensure_loaded().await }
        });
        let results = futures::future::join_all(calls).await;

        assert!(results.iter().all(|books| books.is_empty()));
        assert_eq!(loader.remote.calls(), 1);
    }
}
