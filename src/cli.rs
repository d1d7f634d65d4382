//! Command-Line Interface (CLI) argument parsing.
//!
//! This module defines the command-line arguments for the application using the
//! `clap` crate. These arguments are parsed at startup and then merged on top
//! of the `trawler.toml` file and environment variables.

use clap::Parser;
use figment::{
    providers::Serialized,
    value::{Dict, Map},
    Error, Figment, Metadata, Profile, Provider,
};
use std::path::PathBuf;

/// Records newly registered domains from a live feed and alerts on watchlist
/// matches.
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Record store connection string (e.g. sqlite://trawler.db).
    #[arg(long, value_name = "URL")]
    pub store_url: Option<String>,

    /// Collection (table) holding the domain records.
    #[arg(long, value_name = "NAME")]
    pub collection: Option<String>,

    /// WebSocket URL of the domain feed.
    #[arg(long, value_name = "URL")]
    pub feed_url: Option<String>,

    /// Webhook receiving keyword alerts.
    #[arg(long, value_name = "URL")]
    pub webhook_url: Option<String>,

    /// Comma-separated watchlist keywords.
    #[arg(long, value_name = "LIST")]
    pub keywords: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,
}

impl Provider for Cli {
    fn metadata(&self) -> Metadata {
        Metadata::named("Command-Line Arguments")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        let overrides = [
            ("store.url", &self.store_url),
            ("store.collection", &self.collection),
            ("network.feed_url", &self.feed_url),
            ("notification.webhook_url", &self.webhook_url),
            ("watchlist.keywords", &self.keywords),
            ("core.log_level", &self.log_level),
        ];

        overrides
            .into_iter()
            .filter_map(|(key, value)| value.as_ref().map(|v| (key, v)))
            .fold(Figment::new(), |figment, (key, value)| {
                figment.merge(Serialized::default(key, value))
            })
            .data()
    }
}
