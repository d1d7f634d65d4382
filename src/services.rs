//! Encapsulation for setting up external services.

use crate::{
    config::{Config, MessageFormat},
    core::{Notifier, RecordStore},
    formatting::{PlainTextFormatter, TextFormatter, WebhookTextFormatter},
    notification::{NoopNotifier, NotifyError, WebhookNotifier},
    store::SqliteRecordStore,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Builds the notifier described by the configuration.
///
/// Without a webhook URL alerting degrades to the `NoopNotifier`, which logs a
/// warning for every alert instead of failing startup.
pub fn build_notifier(config: &Config) -> Result<Arc<dyn Notifier>, NotifyError> {
    let Some(webhook_url) = config.webhook_url() else {
        warn!("No webhook URL configured. Keyword alerts will only be logged.");
        return Ok(Arc::new(NoopNotifier));
    };

    let formatter: Box<dyn TextFormatter> = match config.notification.format {
        MessageFormat::Discord => Box::new(WebhookTextFormatter),
        MessageFormat::Plain => Box::new(PlainTextFormatter),
    };
    let notifier = WebhookNotifier::new(
        webhook_url.to_string(),
        Duration::from_secs(config.notification.timeout_seconds),
        formatter,
    )?;
    info!("Webhook notifications enabled.");
    Ok(Arc::new(notifier))
}

/// Opens the record store described by the configuration.
pub async fn open_record_store(config: &Config) -> anyhow::Result<Arc<dyn RecordStore>> {
    let url = config.store_url()?;
    let store = SqliteRecordStore::connect(
        url,
        &config.store.collection,
        config.store.max_connections,
    )
    .await?;
    Ok(Arc::new(store))
}

/// Logs how many domains are already recorded. Failures are only logged.
pub async fn log_store_size(store: &dyn RecordStore) {
    match store.count().await {
        Ok(count) => info!(count, "Record store opened"),
        Err(e) => warn!(error = %e, "Could not count stored domains"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::AlertEvent;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn alert() -> AlertEvent {
        AlertEvent {
            domain: "free-phish-login.net".to_string(),
            matched_at: "2025-07-05 12:30:00".to_string(),
            keyword: "phish".to_string(),
        }
    }

    #[tokio::test]
    async fn test_missing_webhook_builds_noop_notifier() {
        let config = Config::default();

        let notifier = build_notifier(&config).unwrap();

        assert_eq!(notifier.name(), "noop");
        assert!(notifier.notify(&alert()).await.is_ok());
    }

    #[tokio::test]
    async fn test_blank_webhook_builds_noop_notifier() {
        let mut config = Config::default();
        config.notification.webhook_url = Some("  ".to_string());

        assert_eq!(build_notifier(&config).unwrap().name(), "noop");
    }

    #[tokio::test]
    async fn test_plain_format_posts_plain_line() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(body_json(json!({
                "content": "[2025-07-05 12:30:00] free-phish-login.net matched 'phish'"
            })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let mut config = Config::default();
        config.notification.webhook_url = Some(format!("{}/hook", server.uri()));
        config.notification.format = MessageFormat::Plain;

        let notifier = build_notifier(&config).unwrap();
        assert_eq!(notifier.name(), "webhook");
        notifier.notify(&alert()).await.unwrap();
    }

    #[tokio::test]
    async fn test_default_format_posts_markdown() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_json(json!({
                "content": WebhookTextFormatter.format(&alert())
            })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let mut config = Config::default();
        config.notification.webhook_url = Some(server.uri());

        build_notifier(&config).unwrap().notify(&alert()).await.unwrap();
    }
}
