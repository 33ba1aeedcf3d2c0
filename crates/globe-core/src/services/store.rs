//! Durable store abstraction and its libSQL-backed implementation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::db::{
    CatalogSnapshotRepository, Database, FavoritesRepository, LibSqlCatalogRepository,
    LibSqlFavoritesRepository, SavedCountry,
};
use crate::models::Country;
use crate::Result;

/// Persistence for the favorites list and the catalog snapshot.
///
/// Both collections are written whole; implementations must survive process
/// restarts (or, for [`super::MemoryStore`], the lifetime of the value).
#[async_trait]
pub trait DurableStore: Send + Sync {
    /// Favorites in list order.
    async fn read_favorites(&self) -> Result<Vec<Country>>;

    /// Overwrite the favorites collection.
    async fn write_favorites(&self, countries: &[Country]) -> Result<()>;

    /// The last stored catalog snapshot, records marked `cached`.
    async fn read_catalog_snapshot(&self) -> Result<Vec<Country>>;

    /// Replace the catalog snapshot.
    async fn write_catalog_snapshot(&self, countries: &[Country]) -> Result<()>;

    /// When the stored catalog snapshot was written (Unix ms).
    async fn catalog_fetched_at(&self) -> Result<Option<i64>> {
        Ok(None)
    }
}

/// Thread-safe libSQL store shared by the cache managers.
#[derive(Clone)]
pub struct DatabaseStore {
    db: Arc<Mutex<Database>>,
    db_path: Option<PathBuf>,
}

impl DatabaseStore {
    /// Open a store at the given filesystem path.
    ///
    /// A file that is not a valid database is moved aside and a fresh one is
    /// created in its place.
    pub async fn open_path(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = match Database::open(&db_path).await {
            Ok(db) => db,
            Err(error) if Self::is_corrupted_db_error(&error) => {
                tracing::warn!(
                    "Detected invalid database file at {}: {}. Moving it aside and retrying once.",
                    db_path.display(),
                    error
                );
                Self::quarantine_corrupted_db_files(&db_path)?;
                Database::open(&db_path).await?
            }
            Err(error) => return Err(error),
        };

        tracing::debug!("Opened store at {}", db_path.display());
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            db_path: Some(db_path),
        })
    }

    /// Open an in-memory store (primarily for tests).
    pub async fn open_in_memory() -> Result<Self> {
        let db = Database::open_in_memory().await?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            db_path: None,
        })
    }

    /// Filesystem path of the database, if file-backed.
    pub fn path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Favorites with their first-saved timestamps.
    pub async fn saved_favorites(&self) -> Result<Vec<SavedCountry>> {
        let db = self.db.lock().await;
        let repo = LibSqlFavoritesRepository::new(db.connection());
        repo.load().await
    }

    fn is_corrupted_db_error(error: &crate::Error) -> bool {
        let message = error.to_string().to_ascii_lowercase();
        message.contains("file is not a database") || message.contains("malformed")
    }

    fn quarantine_corrupted_db_files(db_path: &Path) -> Result<()> {
        if db_path.exists() {
            let timestamp = chrono::Utc::now().timestamp_millis();
            let base_name = db_path
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or("globe.db");
            let backup_path = db_path.with_file_name(format!("{base_name}.corrupt-{timestamp}"));

            std::fs::rename(db_path, &backup_path)?;
            tracing::warn!(
                "Moved corrupted database file from {} to {}",
                db_path.display(),
                backup_path.display()
            );
        }

        let Some(parent) = db_path.parent() else {
            return Ok(());
        };
        let Some(base_name) = db_path.file_name().and_then(|name| name.to_str()) else {
            return Ok(());
        };
        let sidecar_prefix = format!("{base_name}-");

        for entry in std::fs::read_dir(parent)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let file_name = entry.file_name();
            let file_name = file_name.to_string_lossy();
            if file_name.starts_with(&sidecar_prefix) {
                let path = entry.path();
                std::fs::remove_file(&path)?;
                tracing::warn!("Removed stale database sidecar file {}", path.display());
            }
        }

        Ok(())
    }
}

#[async_trait]
impl DurableStore for DatabaseStore {
    async fn read_favorites(&self) -> Result<Vec<Country>> {
        Ok(self
            .saved_favorites()
            .await?
            .into_iter()
            .map(|saved| saved.country)
            .collect())
    }

    async fn write_favorites(&self, countries: &[Country]) -> Result<()> {
        let db = self.db.lock().await;
        let repo = LibSqlFavoritesRepository::new(db.connection());
        repo.replace(countries).await
    }

    async fn read_catalog_snapshot(&self) -> Result<Vec<Country>> {
        let db = self.db.lock().await;
        let repo = LibSqlCatalogRepository::new(db.connection());
        repo.load().await
    }

    async fn write_catalog_snapshot(&self, countries: &[Country]) -> Result<()> {
        let db = self.db.lock().await;
        let repo = LibSqlCatalogRepository::new(db.connection());
        repo.replace(countries).await
    }

    async fn catalog_fetched_at(&self) -> Result<Option<i64>> {
        let db = self.db.lock().await;
        let repo = LibSqlCatalogRepository::new(db.connection());
        repo.fetched_at().await
    }
}
