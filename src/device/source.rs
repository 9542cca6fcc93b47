//! Byte-report source over hidapi.
//!
//! Enumeration, open and the blocking-with-timeout read live here; the rest
//! of the crate only sees the [`ReportSource`] trait.

use hidapi::{HidApi, HidDevice};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::mapping::DeviceSpec;

/// One raw channel-tagged report as read from the device.
pub type RawReport = Vec<u8>;

// Source errors
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("report source closed")]
    Closed,

    #[error("hid error: {0}")]
    Hid(String),
}

/// Anything that yields raw reports. `Ok(None)` is a no-data tick; `Closed`
/// means the device is gone and the loop should shut down.
pub trait ReportSource {
    fn read(&mut self) -> Result<Option<RawReport>, SourceError>;
}

/// Report source backed by an open hidapi device handle.
pub struct HidReportSource {
    device: HidDevice,
    name: String,
    report_len: usize,
    read_timeout_ms: i32,
}

impl HidReportSource {
    /// Enumerates all HID devices and opens the first one matching the spec's
    /// vendor/product identity.
    pub fn open(api: &HidApi, spec: &DeviceSpec) -> Result<Self, SourceError> {
        info!(
            "Scanning HID devices for {} ({:04x}:{:04x})",
            spec.name, spec.vendor_id, spec.product_id
        );

        for info in api.device_list() {
            debug!(
                "HID device: {:04x}:{:04x} {}",
                info.vendor_id(),
                info.product_id(),
                info.product_string().unwrap_or("<unknown>")
            );

            if info.vendor_id() == spec.vendor_id && info.product_id() == spec.product_id {
                let device = info
                    .open_device(api)
                    .map_err(|e| SourceError::Hid(e.to_string()))?;
                info!("Opened {}", spec.name);

                return Ok(Self {
                    device,
                    name: spec.name.clone(),
                    report_len: spec.report_len,
                    read_timeout_ms: 10,
                });
            }
        }

        Err(SourceError::Hid(format!("{} not found", spec.name)))
    }
}

impl ReportSource for HidReportSource {
    fn read(&mut self) -> Result<Option<RawReport>, SourceError> {
        let mut buf = vec![0u8; self.report_len];
        match self.device.read_timeout(&mut buf, self.read_timeout_ms) {
            Ok(0) => Ok(None),
            Ok(read) => {
                buf.truncate(read);
                Ok(Some(buf))
            }
            Err(e) => {
                // hidapi reads only fail once the handle is unusable, which
                // for this single-device bridge means the device is gone.
                warn!("{} read failed, treating source as closed: {}", self.name, e);
                Err(SourceError::Closed)
            }
        }
    }
}
