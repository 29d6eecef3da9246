use anyhow::Result;
use async_trait::async_trait;

/// Outbound status-change messages to customers. Delivery is best-effort:
/// every call site logs and swallows failures, so an outage of the chat
/// platform never fails the triggering operation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(
        &self,
        customer_id: String,
        event_type: String,
        payload: serde_json::Value,
    ) -> Result<()>;
}
