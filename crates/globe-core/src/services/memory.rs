//! Process-local store for ephemeral sessions and embedding.

use std::sync::Mutex;

use async_trait::async_trait;

use super::DurableStore;
use crate::models::Country;
use crate::util::unix_timestamp_millis;
use crate::{Error, Result};

#[derive(Debug, Default)]
struct MemoryState {
    favorites: Vec<Country>,
    catalog: Vec<Country>,
    catalog_fetched_at: Option<i64>,
}

/// [`DurableStore`] kept entirely in memory; contents last as long as the value.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with a catalog snapshot.
    pub fn with_catalog(countries: Vec<Country>) -> Self {
        let store = Self::default();
        if let Ok(mut state) = store.state.lock() {
            state.catalog = countries;
            state.catalog_fetched_at = Some(unix_timestamp_millis());
        }
        store
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| Error::Database("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl DurableStore for MemoryStore {
    async fn read_favorites(&self) -> Result<Vec<Country>> {
        Ok(self.lock()?.favorites.clone())
    }

    async fn write_favorites(&self, countries: &[Country]) -> Result<()> {
        self.lock()?.favorites = countries.to_vec();
        Ok(())
    }

    async fn read_catalog_snapshot(&self) -> Result<Vec<Country>> {
        Ok(self
            .lock()?
            .catalog
            .iter()
            .cloned()
            .map(Country::into_cached)
            .collect())
    }

    async fn write_catalog_snapshot(&self, countries: &[Country]) -> Result<()> {
        let mut state = self.lock()?;
        state.catalog = countries.to_vec();
        state.catalog_fetched_at = Some(unix_timestamp_millis());
        Ok(())
    }

    async fn catalog_fetched_at(&self) -> Result<Option<i64>> {
        Ok(self.lock()?.catalog_fetched_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{egypt, united_kingdom};

    #[tokio::test]
    async fn starts_empty() {
        let store = MemoryStore::new();
        assert!(store.read_favorites().await.unwrap().is_empty());
        assert!(store.read_catalog_snapshot().await.unwrap().is_empty());
        assert_eq!(store.catalog_fetched_at().await.unwrap(), None);
    }

    #[tokio::test]
    async fn seeded_catalog_reads_back_as_cached() {
        let store = MemoryStore::with_catalog(vec![egypt(), united_kingdom()]);
        let snapshot = store.read_catalog_snapshot().await.unwrap();
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.iter().all(|country| country.cached));
    }
}
