//! Best-effort delivery of watchlist alerts.
//!
//! The pipeline never talks to a notifier directly. It publishes alerts
//! through an `AlertSender` into a bounded queue, and the
//! `NotificationManager` drains that queue in the background, making exactly
//! one delivery attempt per alert.
pub mod manager;
pub mod webhook;

use crate::core::{AlertEvent, Notifier};
use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

pub use manager::{AlertSender, NotificationManager};
pub use webhook::WebhookNotifier;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("webhook request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("webhook answered {status}: {body}")]
    Rejected {
        status: reqwest::StatusCode,
        body: String,
    },
}

/// Stand-in used when no destination is configured. Every alert is logged
/// and discarded.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    fn name(&self) -> &str {
        "noop"
    }

    async fn notify(&self, alert: &AlertEvent) -> Result<(), NotifyError> {
        warn!(
            domain = %alert.domain,
            "No webhook URL configured, alert not delivered"
        );
        Ok(())
    }
}
