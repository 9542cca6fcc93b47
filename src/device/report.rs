//! Stateless decoding of raw channel-tagged HID reports.
//!
//! One physical sample is split across several reports, each carrying only
//! the fields of a single channel. Decoding therefore never yields a full
//! device state, only the set of field updates implied by one report.

use thiserror::Error;
use tracing::trace;

use super::mapping::{Axis, DeviceSpec};

// Decoding errors
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("report of {len} bytes is too short, mapping references offset {offset}")]
    Malformed { len: usize, offset: usize },
}

/// Field updates implied by a single report. Axes are normalized floats,
/// buttons are 0/1 paired with their ordinal index in the button table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportUpdates {
    pub axes: Vec<(Axis, f64)>,
    pub buttons: Vec<(usize, u8)>,
}

impl ReportUpdates {
    pub fn is_empty(&self) -> bool {
        self.axes.is_empty() && self.buttons.is_empty()
    }
}

/// Reconstructs a signed 16-bit value from its little-endian byte pair,
/// matching two's-complement semantics exactly.
pub fn signed16(low: u8, high: u8) -> i16 {
    i16::from_le_bytes([low, high])
}

/// Decodes one raw report against the device's mapping tables.
///
/// A tag byte matching no mapped channel yields an empty update set; the
/// device is known to emit auxiliary channels we do not map. A report too
/// short for any referenced offset fails as a whole, so a malformed report
/// can never contribute partial updates.
pub fn decode(data: &[u8], spec: &DeviceSpec) -> Result<ReportUpdates, ReportError> {
    let Some(&tag) = data.first() else {
        return Err(ReportError::Malformed { len: 0, offset: 0 });
    };

    // Bounds check every matching entry up front so a short report fails
    // before any update is produced.
    for mapping in spec.axes.iter().filter(|m| m.channel == tag) {
        let max_offset = mapping.byte_low.max(mapping.byte_high);
        if max_offset >= data.len() {
            return Err(ReportError::Malformed {
                len: data.len(),
                offset: max_offset,
            });
        }
    }
    for mapping in spec.buttons.iter().filter(|m| m.channel == tag) {
        if mapping.byte >= data.len() {
            return Err(ReportError::Malformed {
                len: data.len(),
                offset: mapping.byte,
            });
        }
    }

    let mut updates = ReportUpdates::default();

    for mapping in spec.axes.iter().filter(|m| m.channel == tag) {
        let raw = signed16(data[mapping.byte_low], data[mapping.byte_high]);
        let value = mapping.sign * f64::from(raw) / spec.axis_scale;
        updates.axes.push((mapping.axis, value));
    }

    for (index, mapping) in spec
        .buttons
        .iter()
        .enumerate()
        .filter(|(_, m)| m.channel == tag)
    {
        updates.buttons.push((index, (data[mapping.byte] >> mapping.bit) & 1));
    }

    trace!("Decoded channel {} report into {:?}", tag, updates);
    Ok(updates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::mapping::AxisMapping;

    fn spec() -> DeviceSpec {
        DeviceSpec::spacemouse_wireless()
    }

    fn report(tag: u8, payload: &[(usize, u8)]) -> Vec<u8> {
        let mut data = vec![0u8; 13];
        data[0] = tag;
        for &(offset, byte) in payload {
            data[offset] = byte;
        }
        data
    }

    #[test]
    fn signed16_concrete_values() {
        assert_eq!(signed16(0x00, 0x00), 0);
        assert_eq!(signed16(0xFF, 0x7F), 32767);
        assert_eq!(signed16(0x00, 0x80), -32768);
        assert_eq!(signed16(0xFF, 0xFF), -1);
    }

    #[test]
    fn signed16_round_trips_every_byte_pair() {
        for raw in 0..=u16::MAX {
            let [low, high] = raw.to_le_bytes();
            let value = signed16(low, high);
            assert_eq!((value as u16).to_le_bytes(), [low, high]);
        }
    }

    #[test]
    fn translation_report_decodes_scaled_axes() {
        // x = +100 raw on channel 1, scale 350 and sign +1
        let updates = decode(&report(1, &[(1, 0x64)]), &spec()).unwrap();

        assert_eq!(updates.axes.len(), 3);
        assert!(updates.buttons.is_empty());
        let (axis, value) = updates.axes[0];
        assert_eq!(axis, Axis::X);
        assert!((value - 100.0 / 350.0).abs() < 1e-9);
    }

    #[test]
    fn flipped_axis_applies_sign() {
        let mut spec = spec();
        spec.axes = vec![AxisMapping {
            axis: Axis::X,
            channel: 1,
            byte_low: 1,
            byte_high: 2,
            sign: -1.0,
        }];

        let updates = decode(&report(1, &[(1, 0x64)]), &spec).unwrap();
        let (_, value) = updates.axes[0];
        assert!((value - (-100.0 / 350.0)).abs() < 1e-9);
        assert!((value - (-0.285714)).abs() < 1e-5);
    }

    #[test]
    fn button_report_decodes_bits() {
        let updates = decode(&report(3, &[(1, 0b10)]), &spec()).unwrap();

        assert!(updates.axes.is_empty());
        assert_eq!(updates.buttons, vec![(0, 0), (1, 1)]);
    }

    #[test]
    fn unmapped_channel_yields_no_updates() {
        let updates = decode(&report(9, &[(1, 0xFF)]), &spec()).unwrap();
        assert!(updates.is_empty());
    }

    #[test]
    fn short_report_is_malformed() {
        let result = decode(&[1, 0x64], &spec());
        assert!(matches!(
            result,
            Err(ReportError::Malformed { len: 2, .. })
        ));
    }

    #[test]
    fn empty_report_is_malformed() {
        assert!(matches!(
            decode(&[], &spec()),
            Err(ReportError::Malformed { len: 0, .. })
        ));
    }

    #[test]
    fn short_report_on_unmapped_channel_is_not_an_error() {
        // Bounds only matter for entries the tag actually selects.
        let updates = decode(&[9, 0x01], &spec()).unwrap();
        assert!(updates.is_empty());
    }
}
