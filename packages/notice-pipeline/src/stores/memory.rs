//! In-memory Dedup Store for testing and dry setups.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{StoreError, StoreResult};
use crate::traits::store::DedupStore;

/// In-memory processed-identifier set.
///
/// Not durable: everything is lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    processed: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already knows these identifiers.
    pub fn with_processed(identifiers: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let now = Utc::now();
        Self {
            processed: RwLock::new(
                identifiers
                    .into_iter()
                    .map(|id| (id.into(), now))
                    .collect(),
            ),
        }
    }

    /// Number of processed identifiers.
    pub fn len(&self) -> usize {
        self.processed.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// When the identifier was recorded, if at all.
    pub fn processed_at(&self, identifier: &str) -> Option<DateTime<Utc>> {
        self.processed
            .read()
            .ok()
            .and_then(|m| m.get(identifier).copied())
    }
}

fn poisoned() -> StoreError {
    StoreError::Backend("memory store lock poisoned".into())
}

#[async_trait]
impl DedupStore for MemoryStore {
    async fn is_processed(&self, identifier: &str) -> StoreResult<bool> {
        let processed = self.processed.read().map_err(|_| poisoned())?;
        Ok(processed.contains_key(identifier))
    }

    async fn mark_processed(&self, identifier: &str) -> StoreResult<()> {
        let mut processed = self.processed.write().map_err(|_| poisoned())?;
        processed
            .entry(identifier.to_string())
            .or_insert_with(Utc::now);
        Ok(())
    }
}
