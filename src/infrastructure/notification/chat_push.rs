use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, info};

use crate::{
    config::config_model::ChatPush, domain::repositories::notification::NotificationSink,
};

/// Pushes status-change messages to customers through the chat platform's
/// HTTP push API. When the push URL or token is absent from the environment
/// the sink degrades to logging, which keeps local development working
/// without chat credentials.
pub struct ChatPushSink {
    client: Client,
    push_url: Option<String>,
    access_token: Option<String>,
}

impl ChatPushSink {
    pub fn new(config: &ChatPush) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(5))
            .build()
            .expect("reqwest client must build");

        Self {
            client,
            push_url: config.push_url.clone(),
            access_token: config.access_token.clone(),
        }
    }
}

#[async_trait]
impl NotificationSink for ChatPushSink {
    async fn notify(
        &self,
        customer_id: String,
        event_type: String,
        payload: serde_json::Value,
    ) -> Result<()> {
        let (Some(push_url), Some(access_token)) =
            (self.push_url.as_deref(), self.access_token.as_deref())
        else {
            info!(
                customer_id,
                event_type, "chat push: not configured, logging instead of sending"
            );
            return Ok(());
        };

        let body = json!({
            "to": customer_id,
            "event_type": event_type,
            "data": payload,
        });

        let response = self
            .client
            .post(push_url)
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(anyhow!("chat push failed with status {}: {}", status, detail));
        }

        debug!(customer_id, event_type, "chat push: message delivered");
        Ok(())
    }
}
