//! # Internal Metrics Module
//!
//! `Metrics` is a cloneable bundle of handles used by the pipeline, the feed
//! session and the notification manager. Without an installed recorder the
//! handles are no-ops; `install_exporter` registers a Prometheus recorder
//! that serves them over HTTP.

use crate::config::MetricsConfig;
use metrics::{Counter, Gauge, Unit};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use tracing::info;

/// The public API for the metrics system.
#[derive(Clone)]
pub struct Metrics {
    pub feed_messages_total: Counter,
    pub decode_failures_total: Counter,
    pub domains_inserted_total: Counter,
    pub domains_duplicate_total: Counter,
    pub store_errors_total: Counter,
    pub alerts_sent_total: Counter,
    pub alerts_failed_total: Counter,
    pub alerts_dropped_total: Counter,
    pub feed_reconnects_total: Counter,
    pub feed_connection_status: Gauge,
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics").finish_non_exhaustive()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    /// Creates a new `Metrics` instance and registers descriptions for all
    /// supported metrics with the global recorder.
    pub fn new() -> Self {
        metrics::describe_counter!("feed_messages_total", Unit::Count, "Total number of payloads received from the feed.");
        metrics::describe_counter!("decode_failures_total", Unit::Count, "Total number of feed payloads dropped because they could not be decoded.");
        metrics::describe_counter!("domains_inserted_total", Unit::Count, "Total number of domains recorded for the first time.");
        metrics::describe_counter!("domains_duplicate_total", Unit::Count, "Total number of events for domains that were already recorded.");
        metrics::describe_counter!("store_errors_total", Unit::Count, "Total number of events rejected because the record store failed.");
        metrics::describe_counter!("alerts_sent_total", Unit::Count, "Total number of alerts acknowledged by the notifier.");
        metrics::describe_counter!("alerts_failed_total", Unit::Count, "Total number of alerts the notifier failed to deliver.");
        metrics::describe_counter!("alerts_dropped_total", Unit::Count, "Total number of alerts dropped before delivery because the queue was full or closed.");
        metrics::describe_counter!("feed_reconnects_total", Unit::Count, "Total number of times the feed session ended and was scheduled for reconnection.");
        metrics::describe_gauge!("feed_connection_status", Unit::Count, "Status of the feed connection (1 for connected, 0 for disconnected).");

        Self {
            feed_messages_total: metrics::counter!("feed_messages_total"),
            decode_failures_total: metrics::counter!("decode_failures_total"),
            domains_inserted_total: metrics::counter!("domains_inserted_total"),
            domains_duplicate_total: metrics::counter!("domains_duplicate_total"),
            store_errors_total: metrics::counter!("store_errors_total"),
            alerts_sent_total: metrics::counter!("alerts_sent_total"),
            alerts_failed_total: metrics::counter!("alerts_failed_total"),
            alerts_dropped_total: metrics::counter!("alerts_dropped_total"),
            feed_reconnects_total: metrics::counter!("feed_reconnects_total"),
            feed_connection_status: metrics::gauge!("feed_connection_status"),
        }
    }
}

/// Installs the Prometheus recorder and its HTTP listener.
///
/// Must run inside a Tokio runtime and before `Metrics::new`, otherwise the
/// handles bind to the no-op recorder.
pub fn install_exporter(config: &MetricsConfig) -> Result<(), BuildError> {
    PrometheusBuilder::new()
        .with_http_listener(config.listen_address)
        .install()?;
    info!(address = %config.listen_address, "Prometheus exporter listening");
    Ok(())
}
