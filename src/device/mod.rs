//! Device-side core: mapping tables, the report decoder, the aggregated
//! device state and the hidapi-backed report source.

pub mod mapping;
pub mod report;
pub mod source;
pub mod state;

// Re-exports for easier access
pub use mapping::{Axis, AxisMapping, ButtonMapping, DeviceSpec, SpecError};
pub use report::{decode, signed16, ReportError, ReportUpdates};
pub use source::{HidReportSource, RawReport, ReportSource, SourceError};
pub use state::{button_bitmask, DeviceState, Snapshot};
