//! Configuration management for Trawler
//!
//! This module defines the main `Config` struct and its sub-structs. It uses
//! the `figment` crate to layer, in increasing priority: built-in defaults, a
//! TOML file, `TRAWLER_`-prefixed environment variables (`__` separates
//! sections, e.g. `TRAWLER_STORE__URL`), and command-line arguments.

use crate::cli::Cli;
use crate::store::{validate_collection_name, DEFAULT_COLLECTION};
use crate::watchlist::Watchlist;
use chrono_tz::Tz;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Config file read when `--config-file` is not given, if it exists.
pub const DEFAULT_CONFIG_FILE: &str = "trawler.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("configuration file not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("store.url is required (set TRAWLER_STORE__URL or --store-url)")]
    MissingStoreUrl,

    #[error("invalid timezone '{name}': {reason}")]
    InvalidTimezone { name: String, reason: String },

    #[error("invalid store.collection '{0}': use letters, digits and underscores")]
    InvalidCollection(String),
}

/// The main configuration struct for the application.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub core: CoreConfig,
    pub network: NetworkConfig,
    pub store: StoreConfig,
    pub notification: NotificationConfig,
    pub watchlist: WatchlistConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct CoreConfig {
    /// The logging level for the application.
    pub log_level: String,
    /// IANA timezone used to render `received_at`.
    pub timezone: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            timezone: "Africa/Johannesburg".to_string(),
        }
    }
}

/// Configuration for the feed session.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct NetworkConfig {
    /// The URL of the feed WebSocket endpoint.
    pub feed_url: String,
    /// Fixed wait before every reconnection attempt.
    pub reconnect_delay_seconds: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            feed_url: "wss://zonestream.openintel.nl/ws/confirmed_newly_registered_domain"
                .to_string(),
            reconnect_delay_seconds: 5,
        }
    }
}

/// Configuration for the record store.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    /// Connection string, e.g. `sqlite://trawler.db`. Required.
    pub url: Option<String>,
    /// Name of the collection (table) holding the records.
    pub collection: String,
    pub max_connections: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: None,
            collection: DEFAULT_COLLECTION.to_string(),
            max_connections: 5,
        }
    }
}

/// The text layout of webhook messages.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MessageFormat {
    #[default]
    Discord,
    Plain,
}

/// Configuration for alert delivery.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct NotificationConfig {
    /// Webhook receiving alerts. Alerting is a logged no-op without it.
    pub webhook_url: Option<String>,
    pub timeout_seconds: u64,
    /// Alerts waiting for delivery beyond this are dropped.
    pub queue_capacity: usize,
    pub format: MessageFormat,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            timeout_seconds: 10,
            queue_capacity: 1024,
            format: MessageFormat::default(),
        }
    }
}

/// Configuration for the keyword watchlist.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct WatchlistConfig {
    /// A TOML list, or a comma-separated string such as `"phish,paypal"`.
    pub keywords: Keywords,
}

/// Watchlist keywords, accepted either as a list or as one comma-separated
/// string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "KeywordsRepr")]
pub struct Keywords(pub Vec<String>);

#[derive(Deserialize)]
#[serde(untagged)]
enum KeywordsRepr {
    List(Vec<String>),
    Csv(String),
}

impl From<KeywordsRepr> for Keywords {
    fn from(repr: KeywordsRepr) -> Self {
        let raw = match repr {
            KeywordsRepr::List(list) => list,
            KeywordsRepr::Csv(csv) => csv.split(',').map(str::to_string).collect(),
        };
        Keywords(
            raw.into_iter()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect(),
        )
    }
}

/// Configuration for the Prometheus exporter.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub listen_address: SocketAddr,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_address: SocketAddr::from(([127, 0, 0, 1], 9090)),
        }
    }
}

impl Config {
    /// Loads and validates the configuration for the given command line.
    ///
    /// An explicitly requested config file must exist; the default
    /// `trawler.toml` is optional.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        match &cli.config_file {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::MissingFile(path.clone()));
                }
                figment = figment.merge(Toml::file(path));
            }
            None => figment = figment.merge(Toml::file(DEFAULT_CONFIG_FILE)),
        }

        let config: Config = figment
            .merge(Env::prefixed("TRAWLER_").split("__"))
            .merge(cli.clone())
            .extract()
            .map_err(Box::new)?;

        config.validate()?;
        Ok(config)
    }

    /// Checks every setting that would otherwise fail at startup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.store_url()?;
        self.timezone()?;
        validate_collection_name(&self.store.collection)
            .map_err(|_| ConfigError::InvalidCollection(self.store.collection.clone()))?;
        Ok(())
    }

    /// The store connection string.
    pub fn store_url(&self) -> Result<&str, ConfigError> {
        self.store
            .url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or(ConfigError::MissingStoreUrl)
    }

    /// The parsed display timezone.
    pub fn timezone(&self) -> Result<Tz, ConfigError> {
        self.core
            .timezone
            .parse::<Tz>()
            .map_err(|e| ConfigError::InvalidTimezone {
                name: self.core.timezone.clone(),
                reason: e.to_string(),
            })
    }

    pub fn watchlist(&self) -> Watchlist {
        Watchlist::new(&self.watchlist.keywords.0)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.network.reconnect_delay_seconds)
    }

    /// The webhook URL, treating a blank value as unset.
    pub fn webhook_url(&self) -> Option<&str> {
        self.notification
            .webhook_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}
