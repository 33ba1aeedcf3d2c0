//! Debounced search over the catalog snapshot.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::catalog::CatalogCache;
use crate::models::Country;

/// Quiet window used when none is configured.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Outcome of one debounced evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResults {
    pub query: String,
    pub countries: Vec<Country>,
}

/// Evaluates only the latest query after a quiet window.
///
/// Each [`submit`](Self::submit) cancels the pending evaluation and restarts the
/// window. A query equal to the last evaluated one is dropped. Evaluations run
/// one at a time and results arrive on the receiver in evaluation order.
pub struct SearchDebouncer {
    catalog: Arc<CatalogCache>,
    window: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
    last_query: Arc<Mutex<Option<String>>>,
    results: mpsc::UnboundedSender<SearchResults>,
}

impl SearchDebouncer {
    pub fn new(
        catalog: Arc<CatalogCache>,
        window: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<SearchResults>) {
        let (results, receiver) = mpsc::unbounded_channel();
        let debouncer = Self {
            catalog,
            window,
            pending: Mutex::new(None),
            last_query: Arc::new(Mutex::new(None)),
            results,
        };
        (debouncer, receiver)
    }

    /// Schedule `query`, replacing any evaluation still waiting out its window.
    pub fn submit(&self, query: impl Into<String>) {
        let query = query.into();
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = pending.take() {
            previous.abort();
        }

        let catalog = Arc::clone(&self.catalog);
        let last_query = Arc::clone(&self.last_query);
        let results = self.results.clone();
        let window = self.window;

        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(window).await;

            // Held for the whole evaluation so two evaluations never overlap.
            let mut last = last_query.lock().unwrap_or_else(PoisonError::into_inner);
            if last.as_deref() == Some(query.as_str()) {
                tracing::trace!(%query, "Skipping repeated search query");
                return;
            }

            let countries = catalog.search(&query);
            tracing::debug!(%query, matches = countries.len(), "Evaluated search query");
            *last = Some(query.clone());
            if results.send(SearchResults { query, countries }).is_err() {
                tracing::debug!("Search results receiver dropped");
            }
        }));
    }

    /// Drop the pending evaluation, if any.
    pub fn cancel(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = pending.take() {
            previous.abort();
        }
    }
}

impl Drop for SearchDebouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::FetchMode;
    use crate::services::MemoryStore;
    use crate::test_support::{egypt, japan, united_kingdom, StubSource};
    use pretty_assertions::assert_eq;
    use tokio::time::{sleep, timeout};

    async fn warmed_catalog() -> Arc<CatalogCache> {
        let source = Arc::new(StubSource::with_countries(vec![
            egypt(),
            united_kingdom(),
            japan(),
        ]));
        let cache = Arc::new(CatalogCache::new(source, Arc::new(MemoryStore::new())));
        cache.fetch_all(FetchMode::Online).await.unwrap();
        cache
    }

    async fn assert_quiet(receiver: &mut mpsc::UnboundedReceiver<SearchResults>) {
        let next = timeout(Duration::from_secs(5), receiver.recv()).await;
        assert!(next.is_err(), "unexpected search results: {next:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn only_latest_query_in_window_is_evaluated() {
        let (debouncer, mut receiver) = SearchDebouncer::new(warmed_catalog().await, DEFAULT_DEBOUNCE);

        debouncer.submit("u");
        sleep(Duration::from_millis(100)).await;
        debouncer.submit("un");
        sleep(Duration::from_millis(100)).await;
        debouncer.submit("united");

        let results = receiver.recv().await.unwrap();
        assert_eq!(results.query, "united");
        assert_eq!(results.countries, vec![united_kingdom()]);
        assert_quiet(&mut receiver).await;
    }

    #[tokio::test(start_paused = true)]
    async fn queries_separated_by_quiet_window_are_each_evaluated() {
        let (debouncer, mut receiver) = SearchDebouncer::new(warmed_catalog().await, DEFAULT_DEBOUNCE);

        debouncer.submit("egy");
        let first = receiver.recv().await.unwrap();
        debouncer.submit("jap");
        let second = receiver.recv().await.unwrap();

        assert_eq!(first.query, "egy");
        assert_eq!(first.countries, vec![egypt()]);
        assert_eq!(second.query, "jap");
        assert_eq!(second.countries, vec![japan()]);
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_query_is_not_reevaluated() {
        let (debouncer, mut receiver) = SearchDebouncer::new(warmed_catalog().await, DEFAULT_DEBOUNCE);

        debouncer.submit("egy");
        receiver.recv().await.unwrap();
        debouncer.submit("egy");
        assert_quiet(&mut receiver).await;

        debouncer.submit("");
        let cleared = receiver.recv().await.unwrap();
        assert_eq!(cleared.query, "");
        assert!(cleared.countries.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_drops_pending_query() {
        let (debouncer, mut receiver) = SearchDebouncer::new(warmed_catalog().await, DEFAULT_DEBOUNCE);

        debouncer.submit("united");
        sleep(Duration::from_millis(100)).await;
        debouncer.cancel();
        assert_quiet(&mut receiver).await;
    }
}
