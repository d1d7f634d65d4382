#![allow(dead_code)]
//! Scripted feed connections for exercising the FeedSession.
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use trawler::network::{FeedConnection, FeedConnector, SessionError};

/// A text frame carrying a feed message for `domain`.
pub fn domain_message(domain: &str) -> Option<Result<Message, WsError>> {
    text_message(&format!(
        r#"{{"domain": "{}", "cert_index": 1, "ct_name": "test-log", "timestamp": 1735689600, "confidence": 0.9}}"#,
        domain
    ))
}

pub fn text_message(text: &str) -> Option<Result<Message, WsError>> {
    Some(Ok(Message::Text(text.to_string().into())))
}

pub fn close_message() -> Option<Result<Message, WsError>> {
    Some(Ok(Message::Close(None)))
}

pub fn transport_error() -> Option<Result<Message, WsError>> {
    Some(Err(WsError::ConnectionClosed))
}

/// A connection replaying a fixed list of reads.
///
/// Once the script is exhausted the connection either reports end of stream
/// or, if `hold_open` is set, blocks forever like an idle live feed.
pub struct FakeFeedConnection {
    reads: VecDeque<Option<Result<Message, WsError>>>,
    hold_open: bool,
}

impl FakeFeedConnection {
    pub fn new(reads: Vec<Option<Result<Message, WsError>>>) -> Self {
        Self {
            reads: reads.into(),
            hold_open: false,
        }
    }

    pub fn held_open(reads: Vec<Option<Result<Message, WsError>>>) -> Self {
        Self {
            reads: reads.into(),
            hold_open: true,
        }
    }
}

#[async_trait]
impl FeedConnection for FakeFeedConnection {
    async fn read_message(&mut self) -> Option<Result<Message, WsError>> {
        match self.reads.pop_front() {
            Some(read) => read,
            None if self.hold_open => std::future::pending().await,
            None => None,
        }
    }
}

enum Attempt {
    Connect(FakeFeedConnection),
    Fail,
}

/// Hands out scripted connections, one per connection attempt.
///
/// After the script runs out every further attempt gets an idle connection.
#[derive(Default)]
pub struct ScriptedConnector {
    attempts: Mutex<VecDeque<Attempt>>,
    connect_times: Mutex<Vec<Instant>>,
}

impl ScriptedConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// A session that ends with end of stream after `reads`.
    pub fn session(self, reads: Vec<Option<Result<Message, WsError>>>) -> Self {
        self.push(Attempt::Connect(FakeFeedConnection::new(reads)))
    }

    /// A session that stays open after `reads`.
    pub fn held_open_session(self, reads: Vec<Option<Result<Message, WsError>>>) -> Self {
        self.push(Attempt::Connect(FakeFeedConnection::held_open(reads)))
    }

    /// A connection attempt whose handshake fails.
    pub fn failed_attempt(self) -> Self {
        self.push(Attempt::Fail)
    }

    fn push(self, attempt: Attempt) -> Self {
        self.attempts.lock().unwrap().push_back(attempt);
        self
    }

    pub fn connect_count(&self) -> usize {
        self.connect_times.lock().unwrap().len()
    }

    pub fn connect_times(&self) -> Vec<Instant> {
        self.connect_times.lock().unwrap().clone()
    }
}

#[async_trait]
impl FeedConnector for ScriptedConnector {
    async fn connect(&self) -> Result<Box<dyn FeedConnection>, SessionError> {
        self.connect_times.lock().unwrap().push(Instant::now());
        let attempt = self.attempts.lock().unwrap().pop_front();
        match attempt {
            Some(Attempt::Connect(connection)) => Ok(Box::new(connection)),
            Some(Attempt::Fail) => Err(SessionError::Connect {
                url: "ws://fake-feed".to_string(),
                source: WsError::ConnectionClosed,
            }),
            None => Ok(Box::new(FakeFeedConnection::held_open(vec![]))),
        }
    }
}
