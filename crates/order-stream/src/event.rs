//! Event types emitted by the order stream subscription

/// Events emitted by the order stream subscription
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// One message body, exactly as received
    Payload(Vec<u8>),
    /// Successfully connected to the upstream
    Connected,
    /// The upstream closed the connection or it failed
    Disconnected,
    /// An error occurred; the subscription will retry
    Error(String),
}
