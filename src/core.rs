//! Core domain types and service traits for Trawler
//!
//! This module defines the data that flows through the ingestion pipeline and
//! the trait contracts for the two leaf services it talks to: the record store
//! and the alert notifier.

use crate::notification::NotifyError;
use crate::store::StoreError;
use async_trait::async_trait;
use serde_json::Value;

/// A single observation decoded from the feed.
///
/// Only `domain` is interpreted. The other fields are carried as whatever JSON
/// the feed sent, so an unexpected type never costs the domain.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DomainEvent {
    /// Normalized hostname. Never empty once decoded.
    pub domain: String,
    /// Upstream identifier of the certificate/log entry.
    pub cert_index: Option<Value>,
    /// Name of the sensor that observed the domain (wire field `ct_name`).
    pub source_name: Option<Value>,
    /// Upstream-reported observation time (wire field `timestamp`).
    pub observed_timestamp: Option<Value>,
    /// Upstream confidence score.
    pub confidence: Option<Value>,
}

impl DomainEvent {
    /// Creates an event carrying only a domain.
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            ..Default::default()
        }
    }
}

/// The persisted form of a domain, created at most once per domain.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainRecord {
    pub domain: String,
    pub cert_index: Option<Value>,
    pub source_name: Option<Value>,
    pub observed_timestamp: Option<Value>,
    pub confidence: Option<Value>,
    /// Local time of first ingestion, `YYYY-MM-DD HH:MM:SS`.
    pub received_at: String,
}

impl DomainRecord {
    /// Builds the record proposed for a freshly observed event.
    pub fn from_event(event: DomainEvent, received_at: String) -> Self {
        Self {
            domain: event.domain,
            cert_index: event.cert_index,
            source_name: event.source_name,
            observed_timestamp: event.observed_timestamp,
            confidence: event.confidence,
            received_at,
        }
    }
}

/// Raised when a newly recorded domain hits the watchlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertEvent {
    pub domain: String,
    /// Same value as the record's `received_at`.
    pub matched_at: String,
    /// The watchlist entry that matched, as configured.
    pub keyword: String,
}

/// Result of an atomic insert-if-absent against the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    AlreadyExists,
}

/// Outcome of pushing one event through the ingestion pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestResult {
    /// The domain was seen for the first time and recorded.
    Inserted,
    /// A record for the domain already existed; nothing changed.
    AlreadyExists,
    /// The event could not be recorded. The message is not retried.
    Rejected(String),
}

// =============================================================================
// Service Traits
// =============================================================================

/// Durable keyed storage for domain records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Inserts the record unless one with the same domain exists.
    ///
    /// Implementations must guarantee that, for concurrent calls with the same
    /// domain, exactly one caller observes `Inserted`.
    async fn insert_if_absent(&self, record: &DomainRecord) -> Result<InsertOutcome, StoreError>;

    /// Looks up the record for a normalized domain.
    async fn get(&self, domain: &str) -> Result<Option<DomainRecord>, StoreError>;

    /// Returns the number of stored records.
    async fn count(&self) -> Result<u64, StoreError>;
}

/// Delivers alerts to an external channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// A short name used in logs (e.g., "webhook").
    fn name(&self) -> &str;

    /// Makes exactly one delivery attempt for the alert.
    ///
    /// # Returns
    /// * `Ok(())` if the destination acknowledged the alert
    /// * `Err` on transport failure or an unexpected response
    async fn notify(&self, alert: &AlertEvent) -> Result<(), NotifyError>;
}
