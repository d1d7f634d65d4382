/// Trawler - records newly registered domains from a live feed
///
/// This library provides the reconnecting feed session, the decoding of feed
/// payloads, the insert-if-absent record store and the watchlist alerting
/// that together make up the ingestion agent.
pub mod app;
pub mod cli;
pub mod config;
pub mod core;
pub mod decoder;
pub mod formatting;
pub mod internal_metrics;
pub mod network;
pub mod notification;
pub mod pipeline;
pub mod services;
pub mod store;
pub mod task_manager;
pub mod watchlist;

// Re-export core types for convenience
pub use crate::core::*;
