//! Dedup Store capability.

use async_trait::async_trait;

use crate::error::StoreResult;

/// A persistent keyed set of processed identifiers.
///
/// Implementations must tolerate concurrent reads while the dispatcher's
/// tasks commit other identifiers.
#[async_trait]
pub trait DedupStore: Send + Sync {
    /// Has this identifier already been processed?
    async fn is_processed(&self, identifier: &str) -> StoreResult<bool>;

    /// Record the identifier as processed.
    ///
    /// Idempotent: marking an already-present identifier is a no-op.
    async fn mark_processed(&self, identifier: &str) -> StoreResult<()>;
}
