//! Dedup Store selection from a database URL.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use notice_pipeline::{DedupStore, MemoryStore, MySqlStore, SqliteStore};

/// Which backend a URL selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    MySql,
    Sqlite,
    Memory,
}

impl StoreKind {
    pub fn for_url(url: &str) -> Result<Self> {
        if url.starts_with("mysql://") {
            Ok(Self::MySql)
        } else if url.starts_with("sqlite:") {
            Ok(Self::Sqlite)
        } else if url == "memory" {
            Ok(Self::Memory)
        } else {
            anyhow::bail!("Unsupported DATABASE_URL scheme: {}", url)
        }
    }
}

/// Open the Dedup Store a URL points at, creating its table if needed.
pub async fn open_store(url: &str) -> Result<Arc<dyn DedupStore>> {
    let kind = StoreKind::for_url(url)?;
    info!(backend = ?kind, "Opening dedup store");

    Ok(match kind {
        StoreKind::MySql => Arc::new(
            MySqlStore::new(url)
                .await
                .context("Failed to connect to MySQL dedup store")?,
        ),
        StoreKind::Sqlite if url == "sqlite::memory:" => Arc::new(
            SqliteStore::in_memory()
                .await
                .context("Failed to open SQLite dedup store")?,
        ),
        StoreKind::Sqlite => Arc::new(
            SqliteStore::new(url)
                .await
                .context("Failed to open SQLite dedup store")?,
        ),
        StoreKind::Memory => Arc::new(MemoryStore::new()),
    })
}
