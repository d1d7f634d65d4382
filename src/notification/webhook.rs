//! A client for posting alerts to a chat webhook.

use super::NotifyError;
use crate::core::{AlertEvent, Notifier};
use crate::formatting::TextFormatter;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::json;
use std::time::Duration;
use tracing::{info, instrument};

/// Posts `{"content": "..."}` to a webhook URL.
///
/// Delivery counts as successful only when the endpoint answers
/// `204 No Content`, which is what Discord-compatible webhooks return.
pub struct WebhookNotifier {
    client: reqwest::Client,
    webhook_url: String,
    formatter: Box<dyn TextFormatter>,
}

impl WebhookNotifier {
    /// Creates a new `WebhookNotifier`.
    ///
    /// # Arguments
    /// * `webhook_url` - Destination of the POST request
    /// * `timeout` - Upper bound for a single delivery attempt
    /// * `formatter` - Renders the alert into the message text
    pub fn new(
        webhook_url: String,
        timeout: Duration,
        formatter: Box<dyn TextFormatter>,
    ) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            webhook_url,
            formatter,
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> &str {
        "webhook"
    }

    #[instrument(skip_all, fields(domain = %alert.domain))]
    async fn notify(&self, alert: &AlertEvent) -> Result<(), NotifyError> {
        let payload = json!({ "content": self.formatter.format(alert) });

        let response = self
            .client
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::NO_CONTENT {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected { status, body });
        }

        info!("Alert delivered to webhook");
        Ok(())
    }
}
