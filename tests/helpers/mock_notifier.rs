#![allow(dead_code)]
use async_trait::async_trait;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};
use std::time::Duration;
use tokio::sync::Notify;
use trawler::core::{AlertEvent, Notifier};
use trawler::notification::NotifyError;

/// A mock Notifier that keeps every alert it receives.
#[derive(Clone, Debug, Default)]
pub struct RecordingNotifier {
    alerts: Arc<Mutex<Vec<AlertEvent>>>,
    notifier: Arc<Notify>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alerts(&self) -> Vec<AlertEvent> {
        self.alerts.lock().unwrap().clone()
    }

    pub async fn wait_for_count(&self, target_count: usize, timeout_duration: Duration) {
        let wait_future = async {
            loop {
                let notified = self.notifier.notified();
                if self.alerts.lock().unwrap().len() >= target_count {
                    break;
                }
                notified.await;
            }
        };

        tokio::time::timeout(timeout_duration, wait_future)
            .await
            .expect("Timed out waiting for alerts");
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &str {
        "recording_mock"
    }

    async fn notify(&self, alert: &AlertEvent) -> Result<(), NotifyError> {
        self.alerts.lock().unwrap().push(alert.clone());
        self.notifier.notify_waiters();
        Ok(())
    }
}

/// A mock Notifier whose every delivery fails.
#[derive(Clone, Debug, Default)]
pub struct FailingNotifier {
    pub attempts: Arc<AtomicUsize>,
}

impl FailingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Notifier for FailingNotifier {
    fn name(&self) -> &str {
        "failing_mock"
    }

    async fn notify(&self, _alert: &AlertEvent) -> Result<(), NotifyError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(NotifyError::Rejected {
            status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
            body: "unavailable".to_string(),
        })
    }
}
