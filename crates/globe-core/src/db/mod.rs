//! Database layer for Globe

mod catalog_repository;
mod connection;
mod favorites_repository;
mod migrations;

pub use catalog_repository::{CatalogSnapshotRepository, LibSqlCatalogRepository};
pub use connection::Database;
pub use favorites_repository::{FavoritesRepository, LibSqlFavoritesRepository, SavedCountry};
