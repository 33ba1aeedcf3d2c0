//! Catalog cache manager.
//!
//! Holds the in-memory catalog snapshot and implements read-through with
//! fallback: the remote source is always tried first, and the durable snapshot
//! is only consulted when that fails. Successful remote fetches replace the
//! snapshot wholesale, in memory immediately and on disk from a detached task.

use std::sync::{Arc, PoisonError, RwLock};

use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::models::Country;
use crate::remote::CatalogSource;
use crate::search::search_countries;
use crate::services::DurableStore;

/// Errors surfaced by catalog fetches.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Server error: {0}")]
    ServerError(u16),
    #[error("Failed to decode data: {0}")]
    DecodeError(String),
    #[error("No data received")]
    NoData,
    #[error("Country not found: {0}")]
    NotFound(String),
    #[error("Invalid country code: {0}")]
    InvalidCode(String),
}

/// Whether a full fetch may go to the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchMode {
    /// Remote first, durable snapshot on failure
    #[default]
    Online,
    /// Durable snapshot only
    Offline,
}

/// Where the in-memory snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogOrigin {
    /// Nothing fetched yet
    Empty,
    /// Last successful remote fetch
    Remote,
    /// Read back from the durable store
    Cache,
}

struct Snapshot {
    countries: Arc<Vec<Country>>,
    origin: CatalogOrigin,
    /// Bumped on every install, under the write lock
    generation: u64,
}

/// Read-through cache over a [`CatalogSource`] backed by a [`DurableStore`].
pub struct CatalogCache {
    source: Arc<dyn CatalogSource>,
    store: Arc<dyn DurableStore>,
    snapshot: RwLock<Snapshot>,
    /// Generation of the newest snapshot written to the store
    persisted: Arc<Mutex<u64>>,
    pending: std::sync::Mutex<Vec<JoinHandle<()>>>,
}

impl CatalogCache {
    pub fn new(source: Arc<dyn CatalogSource>, store: Arc<dyn DurableStore>) -> Self {
        Self {
            source,
            store,
            snapshot: RwLock::new(Snapshot {
                countries: Arc::new(Vec::new()),
                origin: CatalogOrigin::Empty,
                generation: 0,
            }),
            persisted: Arc::new(Mutex::new(0)),
            pending: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Fetch the full catalog.
    ///
    /// In [`FetchMode::Online`] the remote source is tried first; on success the
    /// snapshot is replaced and persisted without waiting for the write. Any
    /// remote failure falls back to the durable snapshot, which fails with
    /// [`CatalogError::NoData`] when empty or unreadable.
    pub async fn fetch_all(&self, mode: FetchMode) -> Result<Vec<Country>, CatalogError> {
        if mode == FetchMode::Online {
            match self.source.fetch_all().await {
                Ok(countries) => {
                    let generation = self.install(countries.clone(), CatalogOrigin::Remote);
                    self.spawn_persist(generation, countries.clone());
                    return Ok(countries);
                }
                Err(error) => {
                    tracing::warn!(%error, "Online catalog fetch failed, trying cached snapshot");
                }
            }
        }

        self.load_cached().await
    }

    /// Warm the catalog in the background.
    ///
    /// Fetches remotely and persists the result. Failures are logged and
    /// otherwise ignored; callers may drop the handle.
    pub fn prewarm(self: &Arc<Self>) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            match cache.source.fetch_all().await {
                Ok(countries) => {
                    let count = countries.len();
                    let generation = cache.install(countries.clone(), CatalogOrigin::Remote);
                    persist_snapshot(cache.store.as_ref(), &cache.persisted, generation, &countries)
                        .await;
                    tracing::info!(count, "Catalog cache warmed");
                }
                Err(error) => tracing::warn!(%error, "Catalog prewarm failed"),
            }
        })
    }

    /// Look up a single country remotely. No cache fallback.
    pub async fn fetch_by_code(&self, code: &str) -> Result<Country, CatalogError> {
        self.source.fetch_by_code(code).await
    }

    /// Current in-memory snapshot.
    pub fn snapshot(&self) -> Arc<Vec<Country>> {
        Arc::clone(&self.read_snapshot().countries)
    }

    /// Where the current snapshot came from.
    pub fn origin(&self) -> CatalogOrigin {
        self.read_snapshot().origin
    }

    /// Find a country in the current snapshot by alpha-2 or alpha-3 code.
    pub fn find(&self, code: &str) -> Option<Country> {
        self.read_snapshot()
            .countries
            .iter()
            .find(|country| country.matches_code(code))
            .cloned()
    }

    /// Name search over the current snapshot.
    pub fn search(&self, query: &str) -> Vec<Country> {
        search_countries(&self.snapshot(), query)
    }

    /// When the durable snapshot was last written (Unix ms).
    pub async fn last_fetched_at(&self) -> Option<i64> {
        match self.store.catalog_fetched_at().await {
            Ok(fetched_at) => fetched_at,
            Err(error) => {
                tracing::debug!(%error, "Could not read catalog snapshot metadata");
                None
            }
        }
    }

    /// Wait for snapshot writes started by earlier fetches.
    pub async fn flush(&self) {
        let handles = {
            let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::take(&mut *pending)
        };

        for handle in handles {
            if let Err(error) = handle.await {
                tracing::warn!(%error, "Catalog snapshot write task failed");
            }
        }
    }

    async fn load_cached(&self) -> Result<Vec<Country>, CatalogError> {
        match self.store.read_catalog_snapshot().await {
            Ok(countries) if !countries.is_empty() => {
                tracing::info!(count = countries.len(), "Using cached catalog snapshot");
                self.install(countries.clone(), CatalogOrigin::Cache);
                Ok(countries)
            }
            Ok(_) => Err(CatalogError::NoData),
            Err(error) => {
                tracing::warn!(%error, "Failed to read cached catalog snapshot");
                Err(CatalogError::NoData)
            }
        }
    }

    fn read_snapshot(&self) -> std::sync::RwLockReadGuard<'_, Snapshot> {
        self.snapshot.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the in-memory snapshot, returning its generation.
    fn install(&self, countries: Vec<Country>, origin: CatalogOrigin) -> u64 {
        let mut snapshot = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
        let generation = snapshot.generation + 1;
        *snapshot = Snapshot {
            countries: Arc::new(countries),
            origin,
            generation,
        };
        generation
    }

    fn spawn_persist(&self, generation: u64, countries: Vec<Country>) {
        let store = Arc::clone(&self.store);
        let persisted = Arc::clone(&self.persisted);
        let handle = tokio::spawn(async move {
            persist_snapshot(store.as_ref(), &persisted, generation, &countries).await;
        });

        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        pending.retain(|handle| !handle.is_finished());
        pending.push(handle);
    }
}

/// Write `countries` unless a newer generation has already been stored.
async fn persist_snapshot(
    store: &dyn DurableStore,
    persisted: &Mutex<u64>,
    generation: u64,
    countries: &[Country],
) {
    let mut last = persisted.lock().await;
    if *last > generation {
        tracing::debug!(generation, newest = *last, "Skipping stale catalog snapshot");
        return;
    }

    match store.write_catalog_snapshot(countries).await {
        Ok(()) => *last = generation,
        Err(error) => tracing::warn!(%error, "Failed to persist catalog snapshot"),
    }
}
