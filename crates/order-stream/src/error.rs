//! Error types for the order stream client

#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("WebSocket error: {0}")]
    WebSocket(Box<tokio_tungstenite::tungstenite::Error>),
    #[error("Max reconnection attempts reached")]
    MaxReconnectAttempts,
}

impl From<tokio_tungstenite::tungstenite::Error> for StreamError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        StreamError::WebSocket(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, StreamError>;
