//! Webhook alerting for publish failures.
//!
//! When a publish attempt fails and a webhook URL is configured, the run
//! sends a JSON `{"text": ...}` payload describing the failed message and
//! the error before aborting. A failure to notify is itself escalated: the
//! operator must find out when the bot can neither post nor alert.

use crate::error::BotError;
use reqwest::Client;
use tracing::{info, instrument, warn};

/// Something that can raise an out-of-band alert about a failed publish.
pub trait Notify {
    async fn notify(&self, message: &str, error: &BotError) -> Result<(), BotError>;
}

/// Posts alerts to a generic incoming-webhook endpoint.
#[derive(Debug)]
pub struct WebhookNotifier {
    client: Client,
    webhook_url: String,
}

impl WebhookNotifier {
    pub fn new(client: Client, webhook_url: impl Into<String>) -> Self {
        Self {
            client,
            webhook_url: webhook_url.into(),
        }
    }
}

impl Notify for WebhookNotifier {
    #[instrument(level = "info", skip_all)]
    async fn notify(&self, message: &str, error: &BotError) -> Result<(), BotError> {
        let body = serde_json::json!({
            "text": format!("feedpost: failed to publish {message:?}: {error}"),
        });

        let response = self
            .client
            .post(&self.webhook_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| BotError::Notify {
                detail: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Webhook rejected alert");
            return Err(BotError::NotifyStatus {
                status: status.as_u16(),
            });
        }

        info!("Delivered publish-failure alert");
        Ok(())
    }
}
