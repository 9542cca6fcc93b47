//! Bridge-side core: the poll-decode loop, the rate-limited publisher and
//! the websocket sink it feeds.

pub mod driver;
pub mod publisher;
pub mod websocket;

// Re-exports for easier access
pub use driver::{BridgeDriver, BridgeError};
pub use publisher::{wire_message, PublishOutcome, RatePublisher, SinkError, TextSink};
pub use websocket::WebSocketSink;
