//! Trawler - newly registered domain ingestion agent
//!
//! Subscribes to the domain feed, records every new domain once and raises a
//! webhook alert when a domain matches the watchlist.

use anyhow::Result;
use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use trawler::{app::App, cli::Cli, config::Config};

/// Initializes the tracing subscriber. `RUST_LOG` takes precedence over the
/// configured level.
fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = match Config::load(&cli) {
        Ok(config) => config,
        Err(err) => {
            init_tracing("info");
            error!("Failed to load configuration: {}", err);
            std::process::exit(1);
        }
    };

    init_tracing(&config.core.log_level);

    info!("Trawler starting up...");
    info!("-------------------- Configuration --------------------");
    info!("Log Level: {}", config.core.log_level);
    info!("Timezone: {}", config.core.timezone);
    info!("Feed URL: {}", config.network.feed_url);
    info!("Reconnect Delay: {}s", config.network.reconnect_delay_seconds);
    info!("Store Collection: {}", config.store.collection);
    info!(
        "Webhook: {}",
        if config.webhook_url().is_some() {
            "Enabled"
        } else {
            "Disabled"
        }
    );
    info!("Watchlist Keywords: {}", config.watchlist.keywords.0.len());
    info!(
        "Metrics Exporter: {}",
        if config.metrics.enabled {
            config.metrics.listen_address.to_string()
        } else {
            "Disabled".to_string()
        }
    );
    info!("-------------------------------------------------------");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let app = App::builder(config).build(shutdown_rx).await?;
    let app_handle = tokio::spawn(app.run());

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received. Shutting down gracefully...");
    shutdown_tx.send(true)?;

    app_handle.await??;
    info!("Trawler stopped.");
    Ok(())
}
