//! Aggregated device state, merged incrementally from decoded reports.
//!
//! The state is a left fold over all reports received since startup with
//! last-write-wins per field: a report only ever touches the fields its
//! channel carries, everything else is carried forward unchanged.

use chrono::{DateTime, Utc};
use tracing::trace;

use super::report::ReportUpdates;
use crate::device::mapping::Axis;

/// Mutable device state, owned exclusively by the poll-decode loop.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceState {
    last_update: Option<DateTime<Utc>>,
    x: f64,
    y: f64,
    z: f64,
    roll: f64,
    pitch: f64,
    yaw: f64,
    buttons: Vec<u8>,
}

/// Immutable point-in-time copy of the device state, the unit handed to the
/// publisher. `timestamp` is `None` until the first channel-matched report.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub timestamp: Option<DateTime<Utc>>,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
    pub buttons: Vec<u8>,
}

impl DeviceState {
    /// All-neutral state with `button_count` released buttons.
    pub fn new(button_count: usize) -> Self {
        Self {
            last_update: None,
            x: 0.0,
            y: 0.0,
            z: 0.0,
            roll: 0.0,
            pitch: 0.0,
            yaw: 0.0,
            buttons: vec![0; button_count],
        }
    }

    /// Merges decoder output into the persisted fields and stamps the update
    /// time. The timestamp tracks freshness of the whole aggregate, so any
    /// non-empty update set advances it, a button-only report included. An
    /// empty update set leaves the state untouched, timestamp included.
    ///
    /// Returns whether anything changed. Never fails; updates come from an
    /// already-validated report.
    pub fn apply(&mut self, updates: &ReportUpdates, now: DateTime<Utc>) -> bool {
        if updates.is_empty() {
            return false;
        }

        for &(axis, value) in &updates.axes {
            match axis {
                Axis::X => self.x = value,
                Axis::Y => self.y = value,
                Axis::Z => self.z = value,
                Axis::Roll => self.roll = value,
                Axis::Pitch => self.pitch = value,
                Axis::Yaw => self.yaw = value,
            }
        }

        for &(index, pressed) in &updates.buttons {
            if let Some(slot) = self.buttons.get_mut(index) {
                *slot = pressed;
            }
        }

        self.last_update = Some(now);
        trace!("State updated at {}", now);
        true
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            timestamp: self.last_update,
            x: self.x,
            y: self.y,
            z: self.z,
            roll: self.roll,
            pitch: self.pitch,
            yaw: self.yaw,
            buttons: self.buttons.clone(),
        }
    }
}

/// Derives the bitmask view of the button sequence, button 0 in bit 0.
/// Computed on demand; the ordered 0/1 sequence stays the canonical state.
pub fn button_bitmask(buttons: &[u8]) -> u32 {
    buttons
        .iter()
        .enumerate()
        .fold(0, |mask, (index, &pressed)| {
            mask | (u32::from(pressed & 1) << index)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::mapping::DeviceSpec;
    use crate::device::report::decode;

    fn now() -> DateTime<Utc> {
        Utc::now()
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
    fn empty_updates_leave_state_untouched() {
        let spec = DeviceSpec::spacemouse_wireless();
        let mut state = DeviceState::new(spec.button_count());
        let before = state.clone();

        let updates = decode(&report(9, &[(1, 0xFF)]), &spec).unwrap();
        assert!(!state.apply(&updates, now()));

        assert_eq!(state, before);
        assert_eq!(state.snapshot().timestamp, None);
    }

    #[test]
    fn matched_report_advances_timestamp() {
        let spec = DeviceSpec::spacemouse_wireless();
        let mut state = DeviceState::new(spec.button_count());

        let stamp = now();
        let updates = decode(&report(3, &[(1, 0b01)]), &spec).unwrap();
        assert!(state.apply(&updates, stamp));

        let snapshot = state.snapshot();
        assert_eq!(snapshot.timestamp, Some(stamp));
        assert_eq!(snapshot.buttons, vec![1, 0]);
    }

    #[test]
    fn disjoint_channels_merge_order_independently() {
        let spec = DeviceSpec::spacemouse_wireless();
        let translation = decode(&report(1, &[(1, 0x64)]), &spec).unwrap();
        let buttons = decode(&report(3, &[(1, 0b11)]), &spec).unwrap();
        let stamp = now();

        let mut forward = DeviceState::new(spec.button_count());
        forward.apply(&translation, stamp);
        forward.apply(&buttons, stamp);

        let mut reverse = DeviceState::new(spec.button_count());
        reverse.apply(&buttons, stamp);
        reverse.apply(&translation, stamp);

        assert_eq!(forward.snapshot(), reverse.snapshot());

        let snapshot = forward.snapshot();
        assert!((snapshot.x - 100.0 / 350.0).abs() < 1e-9);
        assert_eq!(snapshot.buttons, vec![1, 1]);
    }

    #[test]
    fn repeated_channel_is_last_write_wins() {
        let spec = DeviceSpec::spacemouse_wireless();
        let mut state = DeviceState::new(spec.button_count());

        let first = decode(&report(1, &[(1, 0x64)]), &spec).unwrap();
        let second = decode(&report(1, &[(1, 0xC8)]), &spec).unwrap();
        state.apply(&first, now());
        state.apply(&second, now());

        assert!((state.snapshot().x - 200.0 / 350.0).abs() < 1e-9);
    }

    #[test]
    fn untouched_fields_carry_forward() {
        let spec = DeviceSpec::spacemouse_wireless();
        let mut state = DeviceState::new(spec.button_count());

        let translation = decode(&report(1, &[(1, 0x64)]), &spec).unwrap();
        state.apply(&translation, now());
        let rotation = decode(&report(2, &[(5, 0x32)]), &spec).unwrap();
        state.apply(&rotation, now());

        let snapshot = state.snapshot();
        assert!((snapshot.x - 100.0 / 350.0).abs() < 1e-9);
        assert!((snapshot.yaw - 50.0 / 350.0).abs() < 1e-9);
    }

    #[test]
    fn bitmask_is_derived_lsb_first() {
        assert_eq!(button_bitmask(&[]), 0);
        assert_eq!(button_bitmask(&[1, 0]), 0b01);
        assert_eq!(button_bitmask(&[0, 1]), 0b10);
        assert_eq!(button_bitmask(&[1, 0, 1]), 0b101);
    }
}
