#![allow(dead_code)]
pub mod fake_feed;
pub mod mock_notifier;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use trawler::core::{DomainRecord, InsertOutcome, Notifier, RecordStore};
use trawler::internal_metrics::Metrics;
use trawler::notification::NotificationManager;
use trawler::pipeline::IngestionPipeline;
use trawler::store::{MemoryRecordStore, StoreError};
use trawler::watchlist::Watchlist;

/// A pipeline wired to a running NotificationManager.
pub struct TestPipeline {
    pub pipeline: Arc<IngestionPipeline>,
    pub shutdown_tx: watch::Sender<bool>,
}

/// Builds a pipeline over `store`, alerting through `notifier` for `keywords`.
pub fn build_pipeline(
    store: Arc<dyn RecordStore>,
    keywords: &[&str],
    notifier: Arc<dyn Notifier>,
) -> TestPipeline {
    let metrics = Arc::new(Metrics::new());
    let (manager, sender) = NotificationManager::new(notifier, 64, metrics.clone());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(manager.run(shutdown_rx));

    let pipeline = IngestionPipeline::new(
        store,
        Watchlist::new(keywords),
        sender,
        chrono_tz::Africa::Johannesburg,
        metrics,
    );
    TestPipeline {
        pipeline: Arc::new(pipeline),
        shutdown_tx,
    }
}

/// Waits until the memory store holds `count` records.
pub async fn wait_for_records(store: &MemoryRecordStore, count: usize, timeout: Duration) {
    tokio::time::timeout(timeout, async {
        while store.domains().len() < count {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("Timed out waiting for records");
}

/// A store whose every operation fails.
#[derive(Debug, Default)]
pub struct FailingStore;

#[async_trait]
impl RecordStore for FailingStore {
    async fn insert_if_absent(&self, _record: &DomainRecord) -> Result<InsertOutcome, StoreError> {
        Err(StoreError::Query(sqlx::Error::PoolTimedOut))
    }

    async fn get(&self, _domain: &str) -> Result<Option<DomainRecord>, StoreError> {
        Err(StoreError::Query(sqlx::Error::PoolTimedOut))
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Err(StoreError::Query(sqlx::Error::PoolTimedOut))
    }
}
