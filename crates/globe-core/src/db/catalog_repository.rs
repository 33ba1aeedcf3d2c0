//! Catalog snapshot repository implementation

use crate::error::Result;
use crate::models::Country;
use crate::util::unix_timestamp_millis;
use libsql::{params, Connection};

const FETCHED_AT_KEY: &str = "catalog_fetched_at";

/// Trait for catalog snapshot storage operations (async)
#[allow(async_fn_in_trait)]
pub trait CatalogSnapshotRepository {
    /// Load the snapshot in source order; every record is marked `cached`
    async fn load(&self) -> Result<Vec<Country>>;

    /// Replace the whole snapshot and stamp the fetch time
    async fn replace(&self, countries: &[Country]) -> Result<()>;

    /// When the stored snapshot was written (Unix ms), if ever
    async fn fetched_at(&self) -> Result<Option<i64>>;
}

/// libSQL implementation of `CatalogSnapshotRepository`
pub struct LibSqlCatalogRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlCatalogRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    async fn write_rows(&self, countries: &[Country]) -> Result<()> {
        self.conn.execute("DELETE FROM catalog_snapshot", ()).await?;

        for (position, country) in (0_i64..).zip(countries) {
            let payload = serde_json::to_string(country)?;
            self.conn
                .execute(
                    "INSERT OR REPLACE INTO catalog_snapshot (alpha3_code, position, payload)
                     VALUES (?, ?, ?)",
                    params![country.alpha3_code.clone(), position, payload],
                )
                .await?;
        }

        self.conn
            .execute(
                "INSERT OR REPLACE INTO snapshot_meta (key, value) VALUES (?, ?)",
                params![FETCHED_AT_KEY, unix_timestamp_millis().to_string()],
            )
            .await?;

        Ok(())
    }
}

impl CatalogSnapshotRepository for LibSqlCatalogRepository<'_> {
    async fn load(&self) -> Result<Vec<Country>> {
        let mut rows = self
            .conn
            .query(
                "SELECT payload FROM catalog_snapshot ORDER BY position ASC",
                (),
            )
            .await?;

        let mut countries = Vec::new();
        while let Some(row) = rows.next().await? {
            let payload: String = row.get(0)?;
            let country: Country = serde_json::from_str(&payload)?;
            countries.push(country.into_cached());
        }
        Ok(countries)
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

        tracing::debug!(count = countries.len(), "Stored catalog snapshot");
        Ok(())
    }

    async fn fetched_at(&self) -> Result<Option<i64>> {
        let mut rows = self
            .conn
            .query(
                "SELECT value FROM snapshot_meta WHERE key = ?",
                [FETCHED_AT_KEY],
            )
            .await?;

        if let Some(row) = rows.next().await? {
            let value: String = row.get(0)?;
            Ok(value.parse().ok())
        } else {
            Ok(None)
        }
    }
}
