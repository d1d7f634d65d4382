//! The main application logic, decoupled from the entry point.

use crate::{
    config::Config,
    core::{Notifier, RecordStore},
    internal_metrics::{self, Metrics},
    network::{FeedConnector, FeedSession, SessionState, WebSocketConnector},
    notification::NotificationManager,
    pipeline::IngestionPipeline,
    services,
    task_manager::TaskManager,
};
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, instrument};

/// A handle to the running application.
pub struct App {
    task_manager: TaskManager,
    store: Arc<dyn RecordStore>,
    session_state: watch::Receiver<SessionState>,
}

impl App {
    /// Creates a new `AppBuilder` to construct an `App`.
    pub fn builder(config: Config) -> AppBuilder {
        AppBuilder::new(config)
    }

    /// The record store the pipeline writes to.
    pub fn store(&self) -> Arc<dyn RecordStore> {
        self.store.clone()
    }

    /// Observes the feed session state machine.
    pub fn session_state(&self) -> watch::Receiver<SessionState> {
        self.session_state.clone()
    }

    /// Waits for the shutdown signal and then gracefully shuts down all tasks.
    pub async fn run(self) -> Result<()> {
        let mut shutdown_rx = self.task_manager.get_shutdown_rx();
        // A dropped sender also counts as shutdown.
        shutdown_rx.changed().await.ok();
        info!("Shutdown signal received. Waiting for tasks to complete...");

        self.task_manager.shutdown().await;

        info!("All tasks shut down.");
        Ok(())
    }
}

/// Builder for the main application.
///
/// Every long-lived collaborator is constructed here once and handed to the
/// components that need it. Tests replace the store, the notifier or the feed
/// connector through the override methods.
pub struct AppBuilder {
    config: Config,
    store_override: Option<Arc<dyn RecordStore>>,
    notifier_override: Option<Arc<dyn Notifier>>,
    connector_override: Option<Arc<dyn FeedConnector>>,
}

impl AppBuilder {
    /// Creates a new `AppBuilder` with the given configuration.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            store_override: None,
            notifier_override: None,
            connector_override: None,
        }
    }

    /// Overrides the record store.
    pub fn store_override(mut self, store: Arc<dyn RecordStore>) -> Self {
        self.store_override = Some(store);
        self
    }

    /// Overrides the alert notifier.
    pub fn notifier_override(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier_override = Some(notifier);
        self
    }

    /// Overrides the feed connector.
    pub fn connector_override(mut self, connector: Arc<dyn FeedConnector>) -> Self {
        self.connector_override = Some(connector);
        self
    }

    /// Builds and starts all application components, returning a runnable `App`.
    #[instrument(skip_all)]
    pub async fn build(self, shutdown_rx: watch::Receiver<bool>) -> Result<App> {
        let config = self.config;
        let task_manager = TaskManager::new(shutdown_rx);

        // =========================================================================
        // 1. Metrics
        // =========================================================================
        if config.metrics.enabled {
            internal_metrics::install_exporter(&config.metrics)
                .map_err(|e| anyhow::anyhow!("failed to install metrics exporter: {}", e))?;
        }
        let metrics = Arc::new(Metrics::new());

        // =========================================================================
        // 2. Record Store
        // =========================================================================
        let store = match self.store_override {
            Some(store) => store,
            None => services::open_record_store(&config).await?,
        };
        services::log_store_size(store.as_ref()).await;

        // =========================================================================
        // 3. Notification Manager
        // =========================================================================
        let notifier = match self.notifier_override {
            Some(notifier) => notifier,
            None => services::build_notifier(&config)?,
        };
        let (notification_manager, alert_sender) = NotificationManager::new(
            notifier,
            config.notification.queue_capacity,
            metrics.clone(),
        );
        task_manager.spawn(
            "NotificationManager",
            notification_manager.run(task_manager.get_shutdown_rx()),
        );

        // =========================================================================
        // 4. Ingestion Pipeline
        // =========================================================================
        let watchlist = config.watchlist();
        debug!(keywords = watchlist.len(), "Initializing ingestion pipeline");
        let pipeline = Arc::new(IngestionPipeline::new(
            store.clone(),
            watchlist,
            alert_sender,
            config.timezone()?,
            metrics.clone(),
        ));

        // =========================================================================
        // 5. Feed Session
        // =========================================================================
        let connector = match self.connector_override {
            Some(connector) => connector,
            None => {
                debug!(feed_url = %config.network.feed_url, "Initializing feed connector");
                Arc::new(WebSocketConnector::new(config.network.feed_url.clone()))
                    as Arc<dyn FeedConnector>
            }
        };
        let session = FeedSession::new(
            connector,
            pipeline,
            config.reconnect_delay(),
            metrics.clone(),
        );
        let session_state = session.subscribe();
        let session_shutdown_rx = task_manager.get_shutdown_rx();
        task_manager.spawn("FeedSession", async move {
            session.run(session_shutdown_rx).await;
        });

        info!("Trawler initialized successfully. Monitoring for domains...");

        Ok(App {
            task_manager,
            store,
            session_state,
        })
    }
}
