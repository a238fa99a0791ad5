//! Notification sink capability.

use async_trait::async_trait;

use crate::error::SinkResult;
use crate::types::payload::Payload;

/// Outbound channel for payloads (mail, file write, remote upload).
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Deliver a titled payload.
    async fn deliver(&self, payload: &Payload) -> SinkResult<()>;
}
