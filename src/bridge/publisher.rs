//! Rate-limited snapshot publisher.
//!
//! The publisher is a decimator, not a queue: at most one serialized snapshot
//! leaves per window, everything arriving inside the window is dropped
//! silently. It never buffers and never blocks the poll loop on a backlog.

use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};
use thiserror::Error;
use tokio::time::{Duration, Instant};
use tracing::{debug, trace};

use crate::device::state::Snapshot;

// Sink errors
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink closed")]
    Closed,

    #[error("transport error: {0}")]
    Transport(String),
}

/// An already-established duplex text channel. Connection management is not
/// this crate's concern.
#[allow(async_fn_in_trait)]
pub trait TextSink {
    async fn send(&mut self, text: &str) -> Result<(), SinkError>;
}

/// Result of offering one snapshot to the publisher.
#[derive(Debug, Clone, PartialEq)]
pub enum PublishOutcome {
    /// The snapshot left the building; carries the wire payload.
    Sent(String),
    /// Inside the send window, dropped by design.
    Dropped,
}

/// Forwards at most one snapshot per fixed time window to the sink.
pub struct RatePublisher<S: TextSink> {
    sink: S,
    window: Duration,
    /// `None` until the first send, so the first snapshot always goes out.
    last_send: Option<Instant>,
}

impl<S: TextSink> RatePublisher<S> {
    pub fn new(sink: S, window: Duration) -> Self {
        Self {
            sink,
            window,
            last_send: None,
        }
    }

    /// Whether the next offered snapshot would be sent rather than dropped.
    pub fn window_open(&self) -> bool {
        match self.last_send {
            None => true,
            Some(last) => Instant::now().duration_since(last) >= self.window,
        }
    }

    /// Serializes and sends the snapshot if the window is open, drops it
    /// otherwise. A dropped snapshot is never an error; a sink failure is
    /// surfaced to the caller and does not advance the window.
    pub async fn publish(&mut self, snapshot: &Snapshot) -> Result<PublishOutcome, SinkError> {
        if !self.window_open() {
            trace!("Snapshot inside send window, dropping");
            return Ok(PublishOutcome::Dropped);
        }

        let payload = wire_message(snapshot).to_string();
        self.sink.send(&payload).await?;
        self.last_send = Some(Instant::now());

        debug!("Sent snapshot: {}", payload);
        Ok(PublishOutcome::Sent(payload))
    }
}

/// Builds the outbound wire object: the six axes rounded to two decimals,
/// `button0..buttonN-1` as 0/1 and `timeStamp` as fractional epoch seconds.
pub fn wire_message(snapshot: &Snapshot) -> Value {
    let mut object = Map::new();
    object.insert("x".to_string(), json!(round2(snapshot.x)));
    object.insert("y".to_string(), json!(round2(snapshot.y)));
    object.insert("z".to_string(), json!(round2(snapshot.z)));
    object.insert("roll".to_string(), json!(round2(snapshot.roll)));
    object.insert("pitch".to_string(), json!(round2(snapshot.pitch)));
    object.insert("yaw".to_string(), json!(round2(snapshot.yaw)));

    for (index, &pressed) in snapshot.buttons.iter().enumerate() {
        object.insert(format!("button{}", index), json!(pressed & 1));
    }

    object.insert("timeStamp".to_string(), json!(epoch_seconds(snapshot.timestamp)));
    Value::Object(object)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Unix epoch seconds with sub-second precision, or -1 for a state that has
/// never seen a channel-matched report.
fn epoch_seconds(timestamp: Option<DateTime<Utc>>) -> f64 {
    match timestamp {
        Some(t) => t.timestamp_micros() as f64 / 1_000_000.0,
        None => -1.0,
    }
}
