//! Order stream client
//!
//! Subscribes to an upstream WebSocket feed and forwards every data frame as an
//! opaque byte payload. Decoding is the consumer's job; the subscription only
//! guarantees at-least-once delivery of what the server sends while connected.

pub mod error;
pub mod event;
pub mod subscription;

pub use error::{Result, StreamError};
pub use event::StreamEvent;
pub use subscription::{OrderStream, StreamConfig};
