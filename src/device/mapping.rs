//! Device-specific mapping tables describing how raw HID reports carry the
//! six axes and the buttons.
//!
//! Each axis and button entry names the report channel it lives on and the
//! byte offsets inside that report. Channels partition the axis set into
//! report pages; the decoder only ever applies the entries whose channel
//! matches the tag byte of an incoming report.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The six degrees of freedom reported by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
    Roll,
    Pitch,
    Yaw,
}

/// Where one axis lives inside a channel-tagged report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisMapping {
    pub axis: Axis,
    pub channel: u8,
    pub byte_low: usize,
    pub byte_high: usize,
    /// +1.0 or -1.0, applied after the signed 16-bit reconstruction.
    pub sign: f64,
}

/// Where one button lives inside a channel-tagged report. The position of an
/// entry in the button table is the button's index on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ButtonMapping {
    pub channel: u8,
    pub byte: usize,
    pub bit: u8,
}

// Mapping validation errors
#[derive(Debug, Error)]
pub enum SpecError {
    #[error("{axis:?} mapping references byte {offset}, report is only {len} bytes")]
    AxisOffset { axis: Axis, offset: usize, len: usize },

    #[error("button {index} references byte {offset}, report is only {len} bytes")]
    ButtonOffset { index: usize, offset: usize, len: usize },

    #[error("button {index} bit position {bit} is out of range")]
    ButtonBit { index: usize, bit: u8 },

    #[error("duplicate mapping for {axis:?}")]
    DuplicateAxis { axis: Axis },

    #[error("axis scale must be positive, got {0}")]
    AxisScale(f64),
}

/// Complete description of one supported device: identity, report geometry
/// and both mapping tables. Fixed at configuration time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceSpec {
    pub name: String,
    pub vendor_id: u16,
    pub product_id: u16,
    /// Divisor converting raw axis units to the normalized float range.
    pub axis_scale: f64,
    /// Fixed length of a raw report including the tag byte.
    pub report_len: usize,
    pub axes: Vec<AxisMapping>,
    pub buttons: Vec<ButtonMapping>,
}

impl DeviceSpec {
    /// Mapping tables for the 3Dconnexion SpaceMouse Wireless / SpaceNavigator.
    /// Translation is carried on channel 1, rotation on channel 2 and the two
    /// buttons on channel 3.
    pub fn spacemouse_wireless() -> Self {
        Self {
            name: "SpaceNavigator".to_string(),
            vendor_id: 0x046D,
            product_id: 0xC626,
            axis_scale: 350.0,
            report_len: 13,
            axes: vec![
                AxisMapping { axis: Axis::X, channel: 1, byte_low: 1, byte_high: 2, sign: 1.0 },
                AxisMapping { axis: Axis::Y, channel: 1, byte_low: 3, byte_high: 4, sign: -1.0 },
                AxisMapping { axis: Axis::Z, channel: 1, byte_low: 5, byte_high: 6, sign: -1.0 },
                AxisMapping { axis: Axis::Pitch, channel: 2, byte_low: 1, byte_high: 2, sign: -1.0 },
                AxisMapping { axis: Axis::Roll, channel: 2, byte_low: 3, byte_high: 4, sign: -1.0 },
                AxisMapping { axis: Axis::Yaw, channel: 2, byte_low: 5, byte_high: 6, sign: 1.0 },
            ],
            buttons: vec![
                ButtonMapping { channel: 3, byte: 1, bit: 0 },
                ButtonMapping { channel: 3, byte: 1, bit: 1 },
            ],
        }
    }

    /// Number of logical buttons, and therefore the length of the button
    /// sequence in every snapshot.
    pub fn button_count(&self) -> usize {
        self.buttons.len()
    }

    /// Checks that every mapping entry fits inside a report of `report_len`
    /// bytes and that no axis is mapped twice.
    pub fn validate(&self) -> Result<(), SpecError> {
        if self.axis_scale <= 0.0 {
            return Err(SpecError::AxisScale(self.axis_scale));
        }

        let mut seen: Vec<Axis> = Vec::new();
        for mapping in &self.axes {
            if seen.contains(&mapping.axis) {
                return Err(SpecError::DuplicateAxis { axis: mapping.axis });
            }
            seen.push(mapping.axis);

            let max_offset = mapping.byte_low.max(mapping.byte_high);
            if max_offset >= self.report_len {
                return Err(SpecError::AxisOffset {
                    axis: mapping.axis,
                    offset: max_offset,
                    len: self.report_len,
                });
            }
        }

        for (index, mapping) in self.buttons.iter().enumerate() {
            if mapping.byte >= self.report_len {
                return Err(SpecError::ButtonOffset {
                    index,
                    offset: mapping.byte,
                    len: self.report_len,
                });
            }
            if mapping.bit > 7 {
                return Err(SpecError::ButtonBit {
                    index,
                    bit: mapping.bit,
                });
            }
        }

        Ok(())
    }
}
