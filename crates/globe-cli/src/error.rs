use std::io;

use globe_core::catalog::CatalogError;
use globe_core::favorites::FavoritesError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] globe_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error(transparent)]
    Favorites(#[from] FavoritesError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Invalid country code '{0}': expected 2 or 3 letters")]
    InvalidCountryCode(String),
    #[error("Country not found: {0}")]
    CountryNotFound(String),
    #[error("Search query cannot be empty")]
    EmptySearchQuery,
    #[error("Could not save a home country: {0}")]
    Seed(String),
    #[error("Background task failed: {0}")]
    Task(String),
}
