//! Talks to the public feed. Run with `--features live-tests`.

use std::time::Duration;
use tokio_tungstenite::tungstenite::Message;
use trawler::config::NetworkConfig;
use trawler::decoder::decode;
use trawler::network::{FeedConnection, FeedConnector, WebSocketConnector};

#[tokio::test]
async fn test_live_feed_delivers_decodable_messages() {
    let url = std::env::var("TRAWLER_NETWORK__FEED_URL")
        .unwrap_or_else(|_| NetworkConfig::default().feed_url);
    let connector = WebSocketConnector::new(url);

    let mut connection = connector
        .connect()
        .await
        .expect("failed to connect to the live feed");

    let payload = tokio::time::timeout(Duration::from_secs(120), async {
        loop {
            match connection.read_message().await {
                Some(Ok(Message::Text(text))) => break text.to_string(),
                Some(Ok(_)) => continue,
                Some(Err(e)) => panic!("feed transport error: {}", e),
                None => panic!("feed closed before sending a message"),
            }
        }
    })
    .await
    .expect("no message received from the live feed");

    let event = decode(&payload).expect("live payload should decode");
    assert!(!event.domain.is_empty());
    assert_eq!(event.domain, event.domain.to_ascii_lowercase());
}
