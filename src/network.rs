//! Feed session manager
//!
//! This module owns the WebSocket connection to the domain feed. Payloads are
//! pushed through the ingestion pipeline one at a time, in arrival order, and
//! every session end (close, EOF, transport error, failed handshake) is
//! followed by a fixed delay and a fresh connection attempt.

use crate::internal_metrics::Metrics;
use crate::pipeline::IngestionPipeline;
use async_trait::async_trait;
use futures_util::stream::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, instrument, warn};

/// Default delay between the end of a session and the next connection attempt.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Lifecycle of the feed session.
///
/// `Closed` and `Errored` always lead back to `Disconnected` after the
/// reconnect delay, then to `Connecting` again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected,
    Closed,
    Errored,
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("failed to connect to {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: WsError,
    },

    #[error("feed transport error: {0}")]
    Transport(#[from] WsError),
}

/// An open feed connection, abstracted so tests can script the traffic.
#[async_trait]
pub trait FeedConnection: Send {
    /// Reads the next message from the connection
    ///
    /// # Returns
    /// * `Some(Ok(Message))` if a message was successfully received
    /// * `Some(Err(error))` if there was an error reading the message
    /// * `None` if the connection has been closed
    async fn read_message(&mut self) -> Option<Result<Message, WsError>>;
}

/// Opens feed connections.
#[async_trait]
pub trait FeedConnector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn FeedConnection>, SessionError>;
}

/// Connects to a real WebSocket endpoint.
pub struct WebSocketConnector {
    url: String,
}

impl WebSocketConnector {
    pub fn new(url: String) -> Self {
        Self { url }
    }
}

struct WebSocketFeed {
    // Kept whole rather than split: reading also flushes queued pong replies.
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl FeedConnection for WebSocketFeed {
    async fn read_message(&mut self) -> Option<Result<Message, WsError>> {
        self.stream.next().await
    }
}

#[async_trait]
impl FeedConnector for WebSocketConnector {
    async fn connect(&self) -> Result<Box<dyn FeedConnection>, SessionError> {
        let (stream, _) = connect_async(self.url.as_str())
            .await
            .map_err(|source| SessionError::Connect {
                url: self.url.clone(),
                source,
            })?;
        Ok(Box::new(WebSocketFeed { stream }))
    }
}

/// Drives the reconnecting feed session.
pub struct FeedSession {
    connector: Arc<dyn FeedConnector>,
    pipeline: Arc<IngestionPipeline>,
    reconnect_delay: Duration,
    state_tx: watch::Sender<SessionState>,
    metrics: Arc<Metrics>,
}

impl FeedSession {
    pub fn new(
        connector: Arc<dyn FeedConnector>,
        pipeline: Arc<IngestionPipeline>,
        reconnect_delay: Duration,
        metrics: Arc<Metrics>,
    ) -> Self {
        let (state_tx, _) = watch::channel(SessionState::Disconnected);
        Self {
            connector,
            pipeline,
            reconnect_delay,
            state_tx,
            metrics,
        }
    }

    /// Subscribes to state transitions.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    pub fn state(&self) -> SessionState {
        *self.state_tx.borrow()
    }

    fn set_state(&self, state: SessionState) {
        debug!(?state, "Feed session state change");
        self.metrics
            .feed_connection_status
            .set(if state == SessionState::Connected { 1.0 } else { 0.0 });
        self.state_tx.send_replace(state);
    }

    /// Runs the session loop until `shutdown_rx` fires.
    ///
    /// There is no retry limit and no backoff: every session end is followed
    /// by the same fixed delay.
    #[instrument(skip_all)]
    pub async fn run(&self, mut shutdown_rx: watch::Receiver<bool>) {
        loop {
            self.set_state(SessionState::Connecting);

            let outcome = tokio::select! {
                biased;
                _ = shutdown_rx.changed() => {
                    info!("Feed session received shutdown signal.");
                    break;
                }
                outcome = self.connect_and_consume() => outcome,
            };

            match outcome {
                Ok(()) => {
                    self.set_state(SessionState::Closed);
                    warn!("Feed connection closed");
                }
                Err(e) => {
                    self.set_state(SessionState::Errored);
                    error!(error = %e, "Feed session failed");
                }
            }
            self.metrics.feed_reconnects_total.increment(1);

            info!("Reconnecting in {} seconds...", self.reconnect_delay.as_secs_f64());
            tokio::select! {
                biased;
                _ = shutdown_rx.changed() => {
                    info!("Feed session received shutdown signal while waiting to reconnect.");
                    break;
                }
                _ = tokio::time::sleep(self.reconnect_delay) => {}
            }
            self.set_state(SessionState::Disconnected);
        }

        self.set_state(SessionState::Disconnected);
        info!("Feed session stopped.");
    }

    async fn connect_and_consume(&self) -> Result<(), SessionError> {
        let connection = self.connector.connect().await?;
        self.run_with_connection(connection).await
    }

    /// Processes messages from an open connection until it closes.
    ///
    /// This does not reconnect. `Ok(())` means the peer closed the session
    /// (close frame or end of stream); `Err` is a transport failure.
    pub async fn run_with_connection(
        &self,
        mut connection: Box<dyn FeedConnection>,
    ) -> Result<(), SessionError> {
        self.set_state(SessionState::Connected);
        info!("Feed connection opened");

        loop {
            match connection.read_message().await {
                Some(Ok(Message::Text(text))) => self.handle_payload(text.as_str()).await,
                Some(Ok(Message::Binary(data))) => match std::str::from_utf8(&data) {
                    Ok(text) => self.handle_payload(text).await,
                    Err(e) => {
                        self.metrics.decode_failures_total.increment(1);
                        warn!(error = %e, "Dropping non UTF-8 binary message");
                    }
                },
                Some(Ok(Message::Ping(_))) => {
                    debug!("Received ping message");
                }
                Some(Ok(Message::Pong(_))) => {
                    debug!("Received pong message");
                }
                Some(Ok(Message::Frame(_))) => {
                    debug!("Received frame message, ignoring");
                }
                Some(Ok(Message::Close(frame))) => {
                    info!(?frame, "Received close message from server");
                    return Ok(());
                }
                Some(Err(e)) => return Err(SessionError::Transport(e)),
                None => {
                    info!("Feed stream ended");
                    return Ok(());
                }
            }
        }
    }

    async fn handle_payload(&self, raw: &str) {
        self.metrics.feed_messages_total.increment(1);
        debug!("Received message");
        if let Err(e) = self.pipeline.handle_payload(raw).await {
            self.metrics.decode_failures_total.increment(1);
            warn!(error = %e, payload = raw, "Dropping undecodable feed message");
        }
    }
}
