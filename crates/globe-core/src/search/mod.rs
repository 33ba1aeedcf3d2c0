//! Search functionality for Globe
//!
//! Country search is a case-insensitive substring scan over the in-memory
//! catalog snapshot. Snapshots are small and replaced wholesale, so there is
//! no index to maintain; every call rescans.

mod debounce;

pub use debounce::{SearchDebouncer, SearchResults, DEFAULT_DEBOUNCE};

use crate::models::Country;

/// Countries whose name contains `query`, ignoring case, in catalog order.
///
/// An empty query yields no results rather than the whole catalog.
pub fn search_countries(catalog: &[Country], query: &str) -> Vec<Country> {
    if query.is_empty() {
        return Vec::new();
    }

    let needle = query.to_lowercase();
    catalog
        .iter()
        .filter(|country| country.name.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}
