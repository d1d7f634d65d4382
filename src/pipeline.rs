//! The ingestion pipeline: record each domain once, alert on first sightings
//! that hit the watchlist.

use crate::core::{AlertEvent, DomainEvent, DomainRecord, IngestResult, InsertOutcome, RecordStore};
use crate::decoder::{decode, normalize_domain, DecodeError};
use crate::internal_metrics::Metrics;
use crate::notification::AlertSender;
use crate::watchlist::Watchlist;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Rendering of `received_at`, always in the configured display timezone.
pub const RECEIVED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Source of the current time.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub struct IngestionPipeline {
    store: Arc<dyn RecordStore>,
    watchlist: Watchlist,
    alerts: AlertSender,
    timezone: Tz,
    clock: Clock,
    metrics: Arc<Metrics>,
}

impl IngestionPipeline {
    pub fn new(
        store: Arc<dyn RecordStore>,
        watchlist: Watchlist,
        alerts: AlertSender,
        timezone: Tz,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            store,
            watchlist,
            alerts,
            timezone,
            clock: Arc::new(Utc::now),
            metrics,
        }
    }

    /// Replaces the wall clock, for deterministic timestamps in tests.
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> DateTime<Utc> + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    /// The current time in the display timezone, formatted for storage.
    pub fn received_at(&self) -> String {
        (self.clock)()
            .with_timezone(&self.timezone)
            .format(RECEIVED_AT_FORMAT)
            .to_string()
    }

    /// Decodes a raw feed payload and ingests it.
    ///
    /// # Returns
    /// * `Ok(IngestResult)` for any decodable payload
    /// * `Err(DecodeError)` if the payload was dropped before ingestion
    pub async fn handle_payload(&self, raw: &str) -> Result<IngestResult, DecodeError> {
        let event = decode(raw)?;
        Ok(self.ingest(event).await)
    }

    /// Records the event unless its domain is already known.
    ///
    /// Only a first sighting can raise an alert, so each domain alerts at most
    /// once. Store and notifier failures never propagate out of this call.
    pub async fn ingest(&self, mut event: DomainEvent) -> IngestResult {
        event.domain = normalize_domain(&event.domain);
        if event.domain.is_empty() {
            return IngestResult::Rejected("empty domain".to_string());
        }

        let record = DomainRecord::from_event(event, self.received_at());

        match self.store.insert_if_absent(&record).await {
            Ok(InsertOutcome::Inserted) => {
                self.metrics.domains_inserted_total.increment(1);
                info!(domain = %record.domain, "Inserted new domain");
                self.raise_alert_if_watched(&record);
                IngestResult::Inserted
            }
            Ok(InsertOutcome::AlreadyExists) => {
                self.metrics.domains_duplicate_total.increment(1);
                debug!(domain = %record.domain, "Domain already exists");
                IngestResult::AlreadyExists
            }
            Err(e) => {
                self.metrics.store_errors_total.increment(1);
                error!(domain = %record.domain, error = %e, "Failed to record domain");
                IngestResult::Rejected(e.to_string())
            }
        }
    }

    fn raise_alert_if_watched(&self, record: &DomainRecord) {
        let Some(keyword) = self.watchlist.first_match(&record.domain) else {
            return;
        };

        warn!(domain = %record.domain, keyword, "Keyword match found in domain");
        self.alerts.dispatch(AlertEvent {
            domain: record.domain.clone(),
            matched_at: record.received_at.clone(),
            keyword: keyword.to_string(),
        });
    }
}
