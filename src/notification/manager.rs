//! The notification manager is a background actor that drains the alert
//! queue and hands each alert to a `Notifier`.

use crate::core::{AlertEvent, Notifier};
use crate::internal_metrics::Metrics;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

/// Cloneable publishing side of the alert queue.
///
/// Publishing never waits: when the queue is full the alert is dropped.
#[derive(Clone, Debug)]
pub struct AlertSender {
    tx: mpsc::Sender<AlertEvent>,
    metrics: Arc<Metrics>,
}

impl AlertSender {
    /// Queues an alert for delivery.
    ///
    /// # Returns
    /// * `true` if the alert was queued
    /// * `false` if it was dropped because the queue is full or closed
    pub fn dispatch(&self, alert: AlertEvent) -> bool {
        match self.tx.try_send(alert) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(alert)) => {
                self.metrics.alerts_dropped_total.increment(1);
                warn!(domain = %alert.domain, "Alert queue full, dropping alert");
                false
            }
            Err(mpsc::error::TrySendError::Closed(alert)) => {
                self.metrics.alerts_dropped_total.increment(1);
                warn!(domain = %alert.domain, "Notification manager stopped, dropping alert");
                false
            }
        }
    }
}

/// The `NotificationManager` actor.
pub struct NotificationManager {
    notifier: Arc<dyn Notifier>,
    alert_rx: mpsc::Receiver<AlertEvent>,
    metrics: Arc<Metrics>,
}

impl NotificationManager {
    /// Creates the manager together with the sender feeding it.
    pub fn new(
        notifier: Arc<dyn Notifier>,
        queue_capacity: usize,
        metrics: Arc<Metrics>,
    ) -> (Self, AlertSender) {
        let (tx, alert_rx) = mpsc::channel(queue_capacity.max(1));
        let sender = AlertSender {
            tx,
            metrics: metrics.clone(),
        };
        let manager = Self {
            notifier,
            alert_rx,
            metrics,
        };
        (manager, sender)
    }

    /// Runs the manager's main loop until shutdown or until every sender is
    /// dropped.
    pub async fn run(mut self, mut shutdown_rx: watch::Receiver<bool>) {
        info!(notifier = self.notifier.name(), "NotificationManager started.");
        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.changed() => {
                    info!("NotificationManager received shutdown signal.");
                    break;
                }
                alert = self.alert_rx.recv() => {
                    match alert {
                        Some(alert) => self.deliver(&alert).await,
                        None => {
                            info!("Alert channel closed. Shutting down NotificationManager.");
                            break;
                        }
                    }
                }
            }
        }
    }

    async fn deliver(&self, alert: &AlertEvent) {
        debug!(domain = %alert.domain, notifier = self.notifier.name(), "Delivering alert");
        match self.notifier.notify(alert).await {
            Ok(()) => self.metrics.alerts_sent_total.increment(1),
            Err(e) => {
                self.metrics.alerts_failed_total.increment(1);
                warn!(domain = %alert.domain, error = %e, "Failed to deliver alert");
            }
        }
    }
}
