//! The poll-decode loop driving the whole bridge.
//!
//! One cooperative task: pull a raw report, decode it, merge it into the
//! device state, offer the fresh snapshot to the rate-limited publisher.
//! The source read and the sink send are the only suspension points and they
//! are strictly sequential, so the single [`DeviceState`] needs no locking.

use chrono::Utc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::publisher::{PublishOutcome, RatePublisher, SinkError, TextSink};
use crate::datalog::DataLogger;
use crate::device::mapping::DeviceSpec;
use crate::device::report::{self, ReportError};
use crate::device::source::{ReportSource, SourceError};
use crate::device::state::DeviceState;

// Bridge errors
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("report source error: {0}")]
    Source(#[from] SourceError),

    #[error("publish error: {0}")]
    Sink(#[from] SinkError),
}

/// Owns the source, the device state and the publisher, and runs the loop
/// until the source closes, the sink fails or shutdown is requested.
pub struct BridgeDriver<R: ReportSource, S: TextSink> {
    spec: DeviceSpec,
    source: R,
    state: DeviceState,
    publisher: RatePublisher<S>,
    datalog: Option<DataLogger>,
}

impl<R: ReportSource, S: TextSink> BridgeDriver<R, S> {
    pub fn new(
        spec: DeviceSpec,
        source: R,
        publisher: RatePublisher<S>,
        datalog: Option<DataLogger>,
    ) -> Self {
        let state = DeviceState::new(spec.button_count());
        Self {
            spec,
            source,
            state,
            publisher,
            datalog,
        }
    }

    /// Runs the poll-decode loop. Returns `Ok(())` on requested shutdown,
    /// `BridgeError::Source(Closed)` when the device disappears and
    /// `BridgeError::Sink` when a send fails. Malformed reports are logged
    /// and skipped without touching the state.
    pub async fn run(mut self, shutdown: CancellationToken) -> Result<(), BridgeError> {
        info!("Starting poll-decode loop for {}", self.spec.name);

        loop {
            if shutdown.is_cancelled() {
                info!("Shutdown requested, stopping poll-decode loop");
                return Ok(());
            }

            let report = match self.source.read() {
                Ok(Some(report)) => report,
                Ok(None) => {
                    // No-data tick, keep the task cooperative.
                    tokio::task::yield_now().await;
                    continue;
                }
                Err(SourceError::Closed) => {
                    warn!("Report source closed, shutting down");
                    return Err(SourceError::Closed.into());
                }
                Err(e) => {
                    error!("Report source failed: {}", e);
                    return Err(e.into());
                }
            };

            if let Some(log) = &mut self.datalog {
                log.raw_data(&format!("{:?}", report));
            }

            let updates = match report::decode(&report, &self.spec) {
                Ok(updates) => updates,
                Err(e @ ReportError::Malformed { .. }) => {
                    warn!("Skipping malformed report: {}", e);
                    continue;
                }
            };

            if self.state.apply(&updates, Utc::now()) {
                debug!("Applied {} axis / {} button updates", updates.axes.len(), updates.buttons.len());
            }

            let snapshot = self.state.snapshot();
            if self.publisher.window_open() {
                if let Some(log) = &mut self.datalog {
                    log.before_websocket(&format!("publishing state from {:?}", snapshot.timestamp));
                }
            }

            match self.publisher.publish(&snapshot).await {
                Ok(PublishOutcome::Sent(payload)) => {
                    if let Some(log) = &mut self.datalog {
                        log.after_websocket(&payload);
                    }
                }
                Ok(PublishOutcome::Dropped) => {}
                Err(e) => {
                    error!("Failed to publish snapshot: {}", e);
                    return Err(e.into());
                }
            }
        }
    }
}
