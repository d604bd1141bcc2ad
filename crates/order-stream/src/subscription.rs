//! WebSocket subscription to the upstream order feed

use crate::error::{Result, StreamError};
use crate::event::StreamEvent;
use futures_util::StreamExt;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

const DEFAULT_STREAM_URL: &str = "ws://localhost:9000/orders";
const MAX_RECONNECT_ATTEMPTS: u32 = 10;
const INITIAL_RECONNECT_DELAY: Duration = Duration::from_secs(1);
const MAX_RECONNECT_DELAY: Duration = Duration::from_secs(60);

/// Configuration for the order stream subscription
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// WebSocket URL of the upstream feed
    pub url: String,
    /// Consecutive failed connection attempts before giving up
    pub max_reconnect_attempts: u32,
    /// Delay before the first retry; doubles on each further failure
    pub initial_reconnect_delay: Duration,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_STREAM_URL.to_string(),
            max_reconnect_attempts: MAX_RECONNECT_ATTEMPTS,
            initial_reconnect_delay: INITIAL_RECONNECT_DELAY,
        }
    }
}

/// How a single connection ended without an error
enum ConnectionEnd {
    ServerClosed,
    ConsumerGone,
}

/// Subscription that connects to the upstream feed and streams payloads
pub struct OrderStream {
    config: StreamConfig,
    event_tx: mpsc::Sender<StreamEvent>,
    delivered: u64,
}

impl OrderStream {
    pub fn new(config: StreamConfig, event_tx: mpsc::Sender<StreamEvent>) -> Self {
        Self {
            config,
            event_tx,
            delivered: 0,
        }
    }

    /// Number of payloads forwarded so far
    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    /// Run the subscription until the consumer goes away or reconnects are exhausted.
    ///
    /// A clean close from the server is followed by a reconnect; the attempt
    /// counter resets whenever a connection is established.
    pub async fn run(&mut self) -> Result<()> {
        let mut reconnect_attempts = 0;

        loop {
            match self.connect_and_stream(&mut reconnect_attempts).await {
                Ok(ConnectionEnd::ConsumerGone) => {
                    info!("Order stream consumer dropped, stopping subscription");
                    return Ok(());
                }
                Ok(ConnectionEnd::ServerClosed) => {
                    info!("Order stream connection closed by server");
                    tokio::time::sleep(self.config.initial_reconnect_delay).await;
                }
                Err(e) => {
                    error!(error = %e, "Order stream error");
                    if self
                        .event_tx
                        .send(StreamEvent::Error(e.to_string()))
                        .await
                        .is_err()
                    {
                        return Ok(());
                    }

                    reconnect_attempts += 1;
                    if reconnect_attempts >= self.config.max_reconnect_attempts {
                        return Err(StreamError::MaxReconnectAttempts);
                    }

                    let delay =
                        reconnect_delay(self.config.initial_reconnect_delay, reconnect_attempts);
                    warn!(
                        "Reconnecting in {:?} (attempt {}/{})",
                        delay, reconnect_attempts, self.config.max_reconnect_attempts
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn connect_and_stream(&mut self, reconnect_attempts: &mut u32) -> Result<ConnectionEnd> {
        info!(url = %self.config.url, "Connecting to order stream");

        let (mut ws_stream, _) = connect_async(self.config.url.as_str()).await?;
        *reconnect_attempts = 0;

        if self.event_tx.send(StreamEvent::Connected).await.is_err() {
            return Ok(ConnectionEnd::ConsumerGone);
        }
        info!("Order stream connection established");

        while let Some(msg) = ws_stream.next().await {
            let payload = match msg {
                Ok(Message::Text(text)) => text.as_bytes().to_vec(),
                Ok(Message::Binary(data)) => data.to_vec(),
                Ok(Message::Close(_)) => {
                    debug!("Received close frame");
                    break;
                }
                Ok(_) => {
                    // Ping/pong are handled by tungstenite
                    continue;
                }
                Err(e) => {
                    let _ = self.event_tx.send(StreamEvent::Disconnected).await;
                    return Err(e.into());
                }
            };

            if self
                .event_tx
                .send(StreamEvent::Payload(payload))
                .await
                .is_err()
            {
                return Ok(ConnectionEnd::ConsumerGone);
            }
            self.delivered += 1;
        }

        if self.event_tx.send(StreamEvent::Disconnected).await.is_err() {
            return Ok(ConnectionEnd::ConsumerGone);
        }
        Ok(ConnectionEnd::ServerClosed)
    }
}

/// Exponential backoff for the given 1-based attempt, capped at one minute
fn reconnect_delay(initial: Duration, attempt: u32) -> Duration {
    let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
    initial.saturating_mul(factor).min(MAX_RECONNECT_DELAY)
}
