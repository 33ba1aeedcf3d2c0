//! Wiring of config, store and cache managers for one CLI invocation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use globe_core::catalog::{CatalogCache, CatalogError, FetchMode};
use globe_core::config::GlobeConfig;
use globe_core::favorites::FavoritesCache;
use globe_core::location::{FixedLocation, IpLookupLocation, LocationProvider, NoLocation};
use globe_core::remote::{CatalogSource, RestCountriesClient};
use globe_core::services::DatabaseStore;
use globe_core::Country;

use crate::error::CliError;

const CONFIG_FILE_NAME: &str = "config.json";
const DB_FILE_NAME: &str = "globe.db";

pub struct AppContext {
    pub config: GlobeConfig,
    pub store: Arc<DatabaseStore>,
    pub catalog: Arc<CatalogCache>,
    pub favorites: FavoritesCache,
    pub mode: FetchMode,
}

impl AppContext {
    /// Open the store and build the REST-backed cache managers.
    pub async fn open(
        config: GlobeConfig,
        cli_db_path: Option<PathBuf>,
        offline: bool,
    ) -> Result<Self, CliError> {
        let source: Arc<dyn CatalogSource> = if offline {
            Arc::new(OfflineSource)
        } else {
            Arc::new(
                RestCountriesClient::with_timeout(config.api_base_url(), config.http_timeout())
                    .map_err(CliError::Config)?,
            )
        };
        let db_path = resolve_db_path(cli_db_path, &config);
        let store = DatabaseStore::open_path(&db_path).await?;
        Ok(Self::from_parts(config, store, source, offline))
    }

    pub fn from_parts(
        config: GlobeConfig,
        store: DatabaseStore,
        source: Arc<dyn CatalogSource>,
        offline: bool,
    ) -> Self {
        let store = Arc::new(store);
        let catalog = Arc::new(CatalogCache::new(source, store.clone()));
        let favorites = FavoritesCache::new(store.clone());
        let mode = if offline {
            FetchMode::Offline
        } else {
            FetchMode::Online
        };

        Self {
            config,
            store,
            catalog,
            favorites,
            mode,
        }
    }

    /// Location provider chosen from config: fixed code, HTTP lookup, or none.
    pub fn location_provider(&self) -> Result<Box<dyn LocationProvider>, CliError> {
        if let Some(code) = self.config.home_country() {
            let provider = FixedLocation::new(code)
                .ok_or_else(|| CliError::InvalidCountryCode(code.to_string()))?;
            return Ok(Box::new(provider));
        }

        match self.config.location_url() {
            Some(url) if self.mode == FetchMode::Online => Ok(Box::new(
                IpLookupLocation::new(url).map_err(CliError::Config)?,
            )),
            _ => Ok(Box::new(NoLocation)),
        }
    }

    /// Wait for pending snapshot writes before the process exits.
    pub async fn shutdown(&self) {
        self.catalog.flush().await;
    }
}

/// Catalog source used with `--offline`; every request fails without I/O.
struct OfflineSource;

#[async_trait]
impl CatalogSource for OfflineSource {
    async fn fetch_all(&self) -> Result<Vec<Country>, CatalogError> {
        Err(CatalogError::NetworkError("offline mode".to_string()))
    }

    async fn fetch_by_code(&self, _code: &str) -> Result<Country, CatalogError> {
        Err(CatalogError::NetworkError("offline mode".to_string()))
    }
}

pub fn load_config(explicit_path: Option<&Path>) -> Result<(GlobeConfig, PathBuf), CliError> {
    let path = explicit_path.map_or_else(default_config_path, Path::to_path_buf);
    let config = GlobeConfig::load_from_path(&path)
        .map_err(CliError::Config)?
        .with_process_env();
    config.validate().map_err(CliError::Config)?;
    Ok((config, path))
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("globe")
        .join(CONFIG_FILE_NAME)
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>, config: &GlobeConfig) -> PathBuf {
    cli_db_path
        .or_else(|| config.db_path())
        .unwrap_or_else(default_db_path)
}

fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("globe")
        .join(DB_FILE_NAME)
}
