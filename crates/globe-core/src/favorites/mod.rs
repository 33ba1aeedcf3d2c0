//! Bounded favorites cache manager.
//!
//! Favorites are an ordered list of at most [`MAX_FAVORITES`] countries, unique
//! by alpha-3 code. The list is loaded from the [`DurableStore`] on first use
//! and rewritten whole on every mutation. Memory only changes after the store
//! write succeeds, so a failed save leaves both sides at the previous list.

use std::sync::{Arc, PoisonError, RwLock};

use thiserror::Error;
use tokio::sync::{broadcast, Mutex, MutexGuard};

use crate::models::Country;
use crate::services::DurableStore;

/// Maximum number of saved countries.
pub const MAX_FAVORITES: usize = 5;

const EVENT_CAPACITY: usize = 64;

/// Errors surfaced by favorites mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FavoritesError {
    #[error("This country is already saved")]
    AlreadyExists(String),
    #[error("You can only save up to {limit} countries")]
    LimitReached { limit: usize },
    #[error("Failed to save favorites: {0}")]
    SaveFailed(String),
    #[error("Failed to load favorites: {0}")]
    LoadFailed(String),
}

/// Full favorites list after a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FavoritesEvent {
    pub favorites: Vec<Country>,
}

/// Single-writer owner of the favorites list.
pub struct FavoritesCache {
    store: Arc<dyn DurableStore>,
    /// `None` until loaded from the store
    state: Mutex<Option<Vec<Country>>>,
    /// Last committed list, readable without awaiting
    published: RwLock<Arc<Vec<Country>>>,
    events: broadcast::Sender<FavoritesEvent>,
    limit: usize,
}

impl FavoritesCache {
    pub fn new(store: Arc<dyn DurableStore>) -> Self {
        Self::with_limit(store, MAX_FAVORITES)
    }

    pub fn with_limit(store: Arc<dyn DurableStore>, limit: usize) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            store,
            state: Mutex::new(None),
            published: RwLock::new(Arc::new(Vec::new())),
            events,
            limit,
        }
    }

    pub const fn limit(&self) -> usize {
        self.limit
    }

    /// Receive a [`FavoritesEvent`] for every committed mutation, in commit order.
    ///
    /// Receivers that fall more than a few dozen events behind observe
    /// `RecvError::Lagged` and should re-read [`list`](Self::list).
    pub fn subscribe(&self) -> broadcast::Receiver<FavoritesEvent> {
        self.events.subscribe()
    }

    /// Last committed list without touching the store.
    ///
    /// Empty until the first load or mutation.
    pub fn snapshot(&self) -> Arc<Vec<Country>> {
        Arc::clone(&self.published.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Current favorites in saved order.
    pub async fn list(&self) -> Result<Vec<Country>, FavoritesError> {
        let state = self.lock_loaded().await?;
        Ok(state.as_deref().unwrap_or_default().to_vec())
    }

    pub async fn contains(&self, country: &Country) -> Result<bool, FavoritesError> {
        self.contains_code(&country.alpha3_code).await
    }

    /// Whether a favorite matches `code` (alpha-2 or alpha-3, any case).
    pub async fn contains_code(&self, code: &str) -> Result<bool, FavoritesError> {
        let state = self.lock_loaded().await?;
        Ok(state
            .as_deref()
            .unwrap_or_default()
            .iter()
            .any(|saved| saved.matches_code(code)))
    }

    /// Append `country` to the list.
    pub async fn add(&self, country: Country) -> Result<(), FavoritesError> {
        let mut state = self.lock_loaded().await?;
        self.add_locked(&mut state, country).await
    }

    /// Remove every entry with the same alpha-3 code. Absent countries are a no-op.
    pub async fn remove(&self, country: &Country) -> Result<(), FavoritesError> {
        let mut state = self.lock_loaded().await?;
        self.remove_locked(&mut state, country).await
    }

    /// Add when absent, remove when present. Returns whether it is now saved.
    ///
    /// The membership check and the mutation happen under one writer lock.
    pub async fn toggle(&self, country: Country) -> Result<bool, FavoritesError> {
        let mut state = self.lock_loaded().await?;
        let saved = state
            .as_deref()
            .unwrap_or_default()
            .iter()
            .any(|saved| saved.same_country(&country));

        if saved {
            self.remove_locked(&mut state, &country).await?;
            Ok(false)
        } else {
            self.add_locked(&mut state, country).await?;
            Ok(true)
        }
    }

    pub async fn clear(&self) -> Result<(), FavoritesError> {
        let mut state = self.lock_loaded().await?;
        self.commit(&mut state, Vec::new()).await
    }

    async fn add_locked(
        &self,
        state: &mut Option<Vec<Country>>,
        country: Country,
    ) -> Result<(), FavoritesError> {
        let favorites = state.as_deref().unwrap_or_default();

        if favorites.iter().any(|saved| saved.same_country(&country)) {
            return Err(FavoritesError::AlreadyExists(country.alpha3_code));
        }
        if favorites.len() >= self.limit {
            return Err(FavoritesError::LimitReached { limit: self.limit });
        }

        let mut next = favorites.to_vec();
        tracing::debug!(code = %country.alpha3_code, "Adding favorite");
        next.push(Country {
            cached: false,
            ..country
        });
        self.commit(state, next).await
    }

    async fn remove_locked(
        &self,
        state: &mut Option<Vec<Country>>,
        country: &Country,
    ) -> Result<(), FavoritesError> {
        let next: Vec<Country> = state
            .as_deref()
            .unwrap_or_default()
            .iter()
            .filter(|saved| !saved.same_country(country))
            .cloned()
            .collect();
        tracing::debug!(code = %country.alpha3_code, "Removing favorite");
        self.commit(state, next).await
    }

    async fn lock_loaded(&self) -> Result<MutexGuard<'_, Option<Vec<Country>>>, FavoritesError> {
        let mut state = self.state.lock().await;
        if state.is_none() {
            let stored = self.store.read_favorites().await.map_err(|error| {
                tracing::warn!(%error, "Failed to load favorites");
                FavoritesError::LoadFailed(error.to_string())
            })?;
            let favorites = sanitize(stored, self.limit);
            tracing::debug!(count = favorites.len(), "Loaded favorites");
            self.publish_snapshot(&favorites);
            *state = Some(favorites);
        }
        Ok(state)
    }

    /// Write `next` to the store, then make it the in-memory list.
    async fn commit(
        &self,
        state: &mut Option<Vec<Country>>,
        next: Vec<Country>,
    ) -> Result<(), FavoritesError> {
        if let Err(error) = self.store.write_favorites(&next).await {
            tracing::warn!(%error, "Failed to persist favorites, keeping previous list");
            return Err(FavoritesError::SaveFailed(error.to_string()));
        }

        self.publish_snapshot(&next);
        *state = Some(next.clone());
        // No subscribers is fine.
        let _ = self.events.send(FavoritesEvent { favorites: next });
        Ok(())
    }

    fn publish_snapshot(&self, favorites: &[Country]) {
        let mut published = self
            .published
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *published = Arc::new(favorites.to_vec());
    }
}

/// Drop duplicate codes and anything past `limit` from a stored list.
fn sanitize(stored: Vec<Country>, limit: usize) -> Vec<Country> {
    let stored_len = stored.len();
    let mut favorites: Vec<Country> = Vec::with_capacity(stored_len.min(limit));
    for country in stored {
        if favorites.len() == limit {
            break;
        }
        if !favorites.iter().any(|saved| saved.same_country(&country)) {
            favorites.push(country);
        }
    }

    if favorites.len() != stored_len {
        tracing::warn!(
            stored = stored_len,
            kept = favorites.len(),
            "Stored favorites exceeded constraints, trimming"
        );
    }
    favorites
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::MemoryStore;
    use crate::test_support::{egypt, japan, sample, united_kingdom, FlakyStore, YieldingStore};
    use pretty_assertions::assert_eq;

    fn codes(countries: &[Country]) -> Vec<&str> {
        countries
            .iter()
            .map(|country| country.alpha3_code.as_str())
            .collect()
    }

    fn assert_invariants(favorites: &[Country]) {
        assert!(favorites.len() <= MAX_FAVORITES);
        for (index, country) in favorites.iter().enumerate() {
            assert!(
                favorites[index + 1..]
                    .iter()
                    .all(|other| !other.same_country(country)),
                "duplicate favorite {}",
                country.alpha3_code
            );
        }
    }

    #[tokio::test]
    async fn add_appends_in_order_and_persists() {
        let store = Arc::new(MemoryStore::new());
        let cache = FavoritesCache::new(store.clone());

        cache.add(egypt()).await.unwrap();
        cache.add(japan()).await.unwrap();

        assert_eq!(codes(&cache.list().await.unwrap()), vec!["EGY", "JPN"]);
        assert_eq!(
            codes(&store.read_favorites().await.unwrap()),
            vec!["EGY", "JPN"]
        );
        assert!(cache.contains(&egypt()).await.unwrap());
        assert!(cache.contains_code("jp").await.unwrap());
        assert!(!cache.contains(&united_kingdom()).await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_add_is_rejected_without_changes() {
        let cache = FavoritesCache::new(Arc::new(MemoryStore::new()));
        cache.add(egypt()).await.unwrap();

        let renamed = Country::new("Arab Republic of Egypt", "EG", "EGY");
        assert_eq!(
            cache.add(renamed).await,
            Err(FavoritesError::AlreadyExists("EGY".to_string()))
        );
        assert_eq!(cache.list().await.unwrap().len(), 1);
        assert_eq!(cache.list().await.unwrap()[0].name, "Egypt");
    }

    #[tokio::test]
    async fn sixth_add_hits_limit() {
        let store = Arc::new(MemoryStore::new());
        let cache = FavoritesCache::new(store.clone());
        for index in 0..5 {
            cache.add(sample(index)).await.unwrap();
        }

        let error = cache.add(sample(5)).await.unwrap_err();
        assert_eq!(error, FavoritesError::LimitReached { limit: 5 });
        assert_eq!(error.to_string(), "You can only save up to 5 countries");
        assert_eq!(cache.list().await.unwrap().len(), 5);
        assert_eq!(store.read_favorites().await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn invariants_hold_over_mixed_sequences() {
        let cache = FavoritesCache::new(Arc::new(MemoryStore::new()));
        let pool: Vec<Country> = (0..8).map(sample).collect();

        for step in 0..40_usize {
            let country = pool[(step * 7 + 3) % pool.len()].clone();
            if step % 3 == 2 {
                cache.remove(&country).await.unwrap();
            } else {
                let _ = cache.add(country).await;
            }
            assert_invariants(&cache.list().await.unwrap());
        }
    }

    #[tokio::test]
    async fn remove_absent_country_is_noop_success() {
        let store = Arc::new(MemoryStore::new());
        let cache = FavoritesCache::new(store.clone());
        cache.add(egypt()).await.unwrap();
        let mut events = cache.subscribe();

        cache.remove(&japan()).await.unwrap();

        assert_eq!(codes(&cache.list().await.unwrap()), vec!["EGY"]);
        assert_eq!(codes(&events.recv().await.unwrap().favorites), vec!["EGY"]);
    }

    #[tokio::test]
    async fn failed_save_rolls_back_memory_and_store() {
        let store = Arc::new(FlakyStore::new());
        let cache = FavoritesCache::new(store.clone());
        cache.add(egypt()).await.unwrap();
        let mut events = cache.subscribe();

        store.fail_writes(true);
        let result = cache.add(japan()).await;
        assert!(matches!(result, Err(FavoritesError::SaveFailed(_))));
        assert!(matches!(
            cache.remove(&egypt()).await,
            Err(FavoritesError::SaveFailed(_))
        ));

        assert_eq!(codes(&cache.list().await.unwrap()), vec!["EGY"]);
        assert_eq!(codes(&cache.snapshot()), vec!["EGY"]);
        assert!(events.try_recv().is_err());

        store.fail_writes(false);
        assert_eq!(
            codes(&store.read_favorites().await.unwrap()),
            vec!["EGY"]
        );
        cache.add(japan()).await.unwrap();
        assert_eq!(codes(&cache.list().await.unwrap()), vec!["EGY", "JPN"]);
    }

    #[tokio::test]
    async fn load_failure_surfaces_and_is_retried() {
        let store = Arc::new(FlakyStore::new());
        store.fail_reads(true);
        let cache = FavoritesCache::new(store.clone());

        assert!(matches!(
            cache.list().await,
            Err(FavoritesError::LoadFailed(_))
        ));

        store.fail_reads(false);
        assert!(cache.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_loads_from_store_on_first_use() {
        let store = Arc::new(MemoryStore::new());
        store
            .write_favorites(&[japan(), united_kingdom()])
            .await
            .unwrap();
        let cache = FavoritesCache::new(store);

        assert!(cache.snapshot().is_empty());
        assert_eq!(codes(&cache.list().await.unwrap()), vec!["JPN", "GBR"]);
        assert_eq!(codes(&cache.snapshot()), vec!["JPN", "GBR"]);
    }

    #[tokio::test]
    async fn loaded_list_is_trimmed_to_constraints() {
        let store = Arc::new(MemoryStore::new());
        let mut stored: Vec<Country> = (0..7).map(sample).collect();
        stored.insert(1, sample(0));
        store.write_favorites(&stored).await.unwrap();
        let cache = FavoritesCache::new(store);

        let favorites = cache.list().await.unwrap();
        assert_eq!(favorites.len(), MAX_FAVORITES);
        assert_invariants(&favorites);
        assert_eq!(favorites[1], sample(1));
    }

    #[tokio::test]
    async fn events_arrive_in_mutation_order() {
        let cache = FavoritesCache::new(Arc::new(MemoryStore::new()));
        let mut events = cache.subscribe();

        cache.add(egypt()).await.unwrap();
        cache.add(japan()).await.unwrap();
        cache.remove(&egypt()).await.unwrap();
        cache.clear().await.unwrap();

        let mut seen = Vec::new();
        for _ in 0..4 {
            let event = events.recv().await.unwrap();
            seen.push(codes(&event.favorites).join(","));
        }
        assert_eq!(seen, vec!["EGY", "EGY,JPN", "JPN", ""]);
    }

    #[tokio::test]
    async fn toggle_flips_membership() {
        let cache = FavoritesCache::new(Arc::new(MemoryStore::new()));

        assert!(cache.toggle(egypt()).await.unwrap());
        assert!(cache.contains(&egypt()).await.unwrap());
        assert!(!cache.toggle(egypt()).await.unwrap());
        assert!(cache.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn concurrent_toggles_of_absent_country_both_succeed() {
        let store = Arc::new(YieldingStore::default());
        let cache = FavoritesCache::new(store.clone());

        let (first, second) = tokio::join!(cache.toggle(egypt()), cache.toggle(egypt()));

        let mut outcomes = vec![first.unwrap(), second.unwrap()];
        outcomes.sort_unstable();
        assert_eq!(outcomes, vec![false, true]);
        assert!(cache.list().await.unwrap().is_empty());
        assert!(store.read_favorites().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn cached_marker_is_not_kept_on_favorites() {
        let cache = FavoritesCache::new(Arc::new(MemoryStore::new()));
        cache.add(egypt().into_cached()).await.unwrap();
        assert!(!cache.list().await.unwrap()[0].cached);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_adds_never_exceed_limit() {
        let cache = Arc::new(FavoritesCache::new(Arc::new(MemoryStore::new())));
        for index in 0..4 {
            cache.add(sample(index)).await.unwrap();
        }

        let mut handles = Vec::new();
        for index in 4..10 {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move { cache.add(sample(index)).await }));
        }

        let mut added = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => added += 1,
                Err(error) => assert_eq!(error, FavoritesError::LimitReached { limit: 5 }),
            }
        }

        assert_eq!(added, 1);
        assert_eq!(cache.list().await.unwrap().len(), MAX_FAVORITES);
    }
}
