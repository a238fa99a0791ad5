//! SQLite Dedup Store.
//!
//! A file-based backend for local runs and tests. Same table shape as the
//! MySQL store: `sent_links(url unique, sent_at)`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::error::{StoreError, StoreResult};
use crate::traits::store::DedupStore;

/// SQLite-backed processed-identifier table.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connect and create the table if needed.
    ///
    /// # Example URLs
    /// - `sqlite::memory:` - In-memory database (ephemeral)
    /// - `sqlite://./sent_links.db?mode=rwc` - Create if not exists
    pub async fn new(database_url: &str) -> StoreResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(StoreError::backend)?;

        Self::from_pool(pool).await
    }

    /// In-memory store (for testing).
    ///
    /// Pinned to one connection: every SQLite memory connection is its own database.
    pub async fn in_memory() -> StoreResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(StoreError::backend)?;

        Self::from_pool(pool).await
    }

    async fn from_pool(pool: SqlitePool) -> StoreResult<Self> {
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> StoreResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sent_links (
                url TEXT PRIMARY KEY,
                sent_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        Ok(())
    }

    /// Number of recorded identifiers.
    pub async fn count(&self) -> StoreResult<i64> {
        sqlx::query_scalar("SELECT COUNT(1) FROM sent_links")
            .fetch_one(&self.pool)
            .await
            .map_err(StoreError::backend)
    }

    /// When the identifier was recorded, if at all.
    pub async fn processed_at(&self, identifier: &str) -> StoreResult<Option<DateTime<Utc>>> {
        let raw: Option<String> = sqlx::query_scalar("SELECT sent_at FROM sent_links WHERE url = ?")
            .bind(identifier)
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::backend)?;

        raw.map(|s| {
            DateTime::parse_from_rfc3339(&s)
                .map(|d| d.with_timezone(&Utc))
                .map_err(StoreError::backend)
        })
        .transpose()
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl DedupStore for SqliteStore {
    async fn is_processed(&self, identifier: &str) -> StoreResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM sent_links WHERE url = ?")
            .bind(identifier)
            .fetch_one(&self.pool)
            .await
            .map_err(StoreError::backend)?;

        Ok(count > 0)
    }

    async fn mark_processed(&self, identifier: &str) -> StoreResult<()> {
        sqlx::query("INSERT OR IGNORE INTO sent_links (url, sent_at) VALUES (?, ?)")
            .bind(identifier)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(StoreError::backend)?;

        Ok(())
    }
}
