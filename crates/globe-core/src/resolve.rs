//! First-run home country seeding.
//!
//! When the favorites list is empty, the user's current country is looked up
//! and saved. Any failure along the way falls back to a default country code.

use crate::catalog::CatalogCache;
use crate::favorites::{FavoritesCache, FavoritesError};
use crate::location::LocationProvider;
use crate::models::Country;

/// Country saved when the location cannot be resolved.
pub const DEFAULT_COUNTRY_CODE: &str = "EG";

/// How the seeded country was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedSource {
    Located,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedOutcome {
    /// Favorites were not empty; nothing was done
    AlreadySeeded,
    Added { country: Country, source: SeedSource },
    /// Neither the located nor the default country could be saved
    Failed { reason: String },
}

/// Save the user's home country if no favorites exist yet.
pub async fn seed_home_country(
    location: &dyn LocationProvider,
    catalog: &CatalogCache,
    favorites: &FavoritesCache,
    default_code: &str,
) -> SeedOutcome {
    match favorites.list().await {
        Ok(saved) if !saved.is_empty() => return SeedOutcome::AlreadySeeded,
        Ok(_) => {}
        Err(error) => {
            tracing::warn!(%error, "Could not read favorites before seeding");
            return SeedOutcome::Failed {
                reason: error.to_string(),
            };
        }
    }

    let located = match location.current_country_code().await {
        Ok(code) => match catalog.fetch_by_code(&code).await {
            Ok(country) => Some(country),
            Err(error) => {
                tracing::warn!(%code, %error, "Failed to fetch located country");
                None
            }
        },
        Err(error) => {
            tracing::info!(%error, "Location unavailable, using default country");
            None
        }
    };

    let (country, source) = match located {
        Some(country) => (country, SeedSource::Located),
        None => match catalog.fetch_by_code(default_code).await {
            Ok(country) => (country, SeedSource::Fallback),
            Err(error) => {
                tracing::warn!(code = %default_code, %error, "Failed to add default country");
                return SeedOutcome::Failed {
                    reason: format!("Failed to add default country: {error}"),
                };
            }
        },
    };

    match favorites.add(country.clone()).await {
        Ok(()) => {
            tracing::info!(code = %country.alpha3_code, ?source, "Seeded home country");
            SeedOutcome::Added { country, source }
        }
        Err(FavoritesError::AlreadyExists(_)) => SeedOutcome::AlreadySeeded,
        Err(error) => {
            tracing::warn!(%error, "Failed to save home country");
            SeedOutcome::Failed {
                reason: error.to_string(),
            }
        }
    }
}
