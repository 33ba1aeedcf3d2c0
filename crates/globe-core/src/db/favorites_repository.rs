//! Favorites repository implementation

use std::collections::HashMap;

use crate::error::Result;
use crate::models::Country;
use crate::util::unix_timestamp_millis;
use libsql::{params, Connection};

/// A persisted favorite together with the time it was first saved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedCountry {
    pub country: Country,
    /// First-saved timestamp (Unix ms)
    pub saved_at: i64,
}

/// Trait for favorites storage operations (async)
#[allow(async_fn_in_trait)]
pub trait FavoritesRepository {
    /// Load favorites in list order
    async fn load(&self) -> Result<Vec<SavedCountry>>;

    /// Overwrite the stored favorites with `countries`, in order
    async fn replace(&self, countries: &[Country]) -> Result<()>;
}

/// libSQL implementation of `FavoritesRepository`
pub struct LibSqlFavoritesRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlFavoritesRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    async fn saved_at_by_code(&self) -> Result<HashMap<String, i64>> {
        let mut rows = self
            .conn
            .query("SELECT alpha3_code, saved_at FROM favorites", ())
            .await?;

        let mut saved_at = HashMap::new();
        while let Some(row) = rows.next().await? {
            saved_at.insert(row.get::<String>(0)?, row.get::<i64>(1)?);
        }
        Ok(saved_at)
    }

    async fn write_rows(&self, countries: &[Country]) -> Result<()> {
        let previous = self.saved_at_by_code().await?;
        let now = unix_timestamp_millis();

        self.conn.execute("DELETE FROM favorites", ()).await?;

        for (position, country) in (0_i64..).zip(countries) {
            let payload = serde_json::to_string(country)?;
            let saved_at = previous.get(&country.alpha3_code).copied().unwrap_or(now);
            self.conn
                .execute(
                    "INSERT OR REPLACE INTO favorites (alpha3_code, position, payload, saved_at)
                     VALUES (?, ?, ?, ?)",
                    params![country.alpha3_code.clone(), position, payload, saved_at],
                )
                .await?;
        }

        Ok(())
    }
}

impl FavoritesRepository for LibSqlFavoritesRepository<'_> {
    async fn load(&self) -> Result<Vec<SavedCountry>> {
        let mut rows = self
            .conn
            .query(
                "SELECT payload, saved_at FROM favorites ORDER BY position ASC",
                (),
            )
            .await?;

        let mut saved = Vec::new();
        while let Some(row) = rows.next().await? {
            let payload: String = row.get(0)?;
            saved.push(SavedCountry {
                country: serde_json::from_str(&payload)?,
                saved_at: row.get(1)?,
            });
        }
        Ok(saved)
    }

    async fn replace(&self, countries: &[Country]) -> Result<()> {
        self.conn.execute("BEGIN TRANSACTION", ()).await?;

        if let Err(error) = self.write_rows(countries).await {
            self.conn.execute("ROLLBACK", ()).await.ok();
            return Err(error);
        }

        if let Err(e) = self.conn.execute("COMMIT", ()).await {
            self.conn.execute("ROLLBACK", ()).await.ok();
            return Err(e.into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use pretty_assertions::assert_eq;

    async fn setup() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    fn codes(saved: &[SavedCountry]) -> Vec<String> {
        saved
            .iter()
            .map(|entry| entry.country.alpha3_code.clone())
            .collect()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_load_empty() {
        let db = setup().await;
        let repo = LibSqlFavoritesRepository::new(db.connection());
        assert!(repo.load().await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_replace_and_load_preserves_order() {
        let db = setup().await;
        let repo = LibSqlFavoritesRepository::new(db.connection());

        let countries = vec![
            Country::new("United Kingdom", "GB", "GBR").with_capital("London"),
            Country::new("Egypt", "EG", "EGY"),
            Country::new("Japan", "JP", "JPN"),
        ];
        repo.replace(&countries).await.unwrap();

        let loaded = repo.load().await.unwrap();
        assert_eq!(codes(&loaded), vec!["GBR", "EGY", "JPN"]);
        assert_eq!(loaded[0].country.capital.as_deref(), Some("London"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_replace_overwrites_and_keeps_saved_at() {
        let db = setup().await;
        let repo = LibSqlFavoritesRepository::new(db.connection());

        repo.replace(&[Country::new("Egypt", "EG", "EGY")])
            .await
            .unwrap();
        let first_saved_at = repo.load().await.unwrap()[0].saved_at;

        repo.replace(&[
            Country::new("Japan", "JP", "JPN"),
            Country::new("Egypt", "EG", "EGY"),
        ])
        .await
        .unwrap();

        let loaded = repo.load().await.unwrap();
        assert_eq!(codes(&loaded), vec!["JPN", "EGY"]);
        assert_eq!(loaded[1].saved_at, first_saved_at);

        repo.replace(&[]).await.unwrap();
        assert!(repo.load().await.unwrap().is_empty());
    }
}
