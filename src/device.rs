//! Device model and shared device types.
//!
//! This module defines the common vocabulary of the device layer.
//!
//! ## Design notes
//! - Devices are owned by the [`InputManager`](crate::manager::InputManager)
//!   in an arena keyed by [`DeviceId`]; devices never hold a reference back
//!   to the manager. Backends that need manager services (id minting, the
//!   concurrent queue) are handed narrow context arguments instead.
//! - Polymorphism is shallow: one sum type over the device kind, and a trait
//!   object over each kind's backend capability set. [`InputDeviceOps`] is
//!   the uniform **read** surface shared by every device kind; mutation goes
//!   through the concrete types.

use crate::buttons::{ButtonType, DeviceButtonId};

/// Identifier assigned by the manager when a device is registered.
///
/// Ids are unique and never reused within a manager's lifetime; a
/// re-connected pad receives a fresh id.
pub type DeviceId = u32;

/// Sentinel for "no device" / "not registered".
pub const INVALID_DEVICE_ID: DeviceId = DeviceId::MAX;

/// The kind of a device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceKind {
    Keyboard,
    Mouse,
    Pad,
    Touch,
}

impl DeviceKind {
    /// Stable lowercase type name, usable with
    /// [`find_device_id_by_name`](crate::manager::InputManager::find_device_id_by_name).
    pub fn type_name(self) -> &'static str {
        match self {
            DeviceKind::Keyboard => "keyboard",
            DeviceKind::Mouse => "mouse",
            DeviceKind::Pad => "pad",
            DeviceKind::Touch => "touch",
        }
    }
}

/// Which implementation flavor backs a device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceVariant {
    /// Window-system events (X11, Win32 messages).
    Standard,
    /// Raw OS streams (Raw Input, evdev, joystick API, raw HID).
    Raw,
    /// Programmatically fed device (tests, embedder-driven platforms).
    Synthetic,
    /// Placeholder that never reports input.
    Null,
}

/// Hardware availability of a device.
///
/// Dynamically attached devices (pads) start `Unavailable` and flip to `Ok`
/// when a hardware handle is bound; losing the hardware flips them back.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceState {
    Ok,
    LowBattery,
    Unavailable,
}

/// Addresses one button on one device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeviceButtonSpec {
    pub device: DeviceId,
    pub button: DeviceButtonId,
}

impl Default for DeviceButtonSpec {
    fn default() -> Self {
        Self {
            device: INVALID_DEVICE_ID,
            button: crate::buttons::INVALID_DEVICE_BUTTON_ID,
        }
    }
}

/// A pre-translated input record pushed by embedder glue (Android/iOS
/// platform threads, VR runtimes). Routed through the concurrent queue into
/// the next tick.
#[derive(Clone, Copy, Debug)]
pub struct DeviceInput {
    pub kind: DeviceKind,
    pub index: u32,
    pub button: DeviceButtonId,
    pub value: DeviceInputValue,
}

#[derive(Clone, Copy, Debug)]
pub enum DeviceInputValue {
    Bool(bool),
    Float(f32),
    /// Connection edge for dynamically attached devices (`true` = attached).
    Connection(bool),
}

/// Uniform read-only surface over every device kind.
pub trait InputDeviceOps {
    fn kind(&self) -> DeviceKind;
    fn variant(&self) -> DeviceVariant;
    /// Index within the device's kind (keyboard 0, pad 2, ...).
    fn index(&self) -> u32;
    fn device_id(&self) -> DeviceId;
    fn device_state(&self) -> DeviceState;
    /// Human-readable hardware name, when the backend knows one.
    fn device_name(&self) -> &str;

    fn is_valid_button(&self, button: DeviceButtonId) -> bool;
    fn button_type(&self, button: DeviceButtonId) -> Option<ButtonType>;
    /// ABI-stable button name; `None` for ids outside the device's space.
    fn button_name(&self, button: DeviceButtonId) -> Option<&'static str>;
    /// Reverse name lookup; returns
    /// [`INVALID_DEVICE_BUTTON_ID`](crate::buttons::INVALID_DEVICE_BUTTON_ID)
    /// on miss.
    fn button_by_name(&self, name: &str) -> DeviceButtonId;

    /// Committed (current) boolean state.
    fn get_bool(&self, button: DeviceButtonId) -> bool;
    /// Boolean state of the previous tick.
    fn get_bool_previous(&self, button: DeviceButtonId) -> bool;
    /// Committed (current) float state.
    fn get_float(&self, button: DeviceButtonId) -> f32;

    /// Appends every held button / non-zero axis to `out`, stopping when
    /// `out` is full. Returns the number of entries written; the scan
    /// truncates at the buffer length by contract.
    fn any_button_down(&self, out: &mut [DeviceButtonSpec]) -> usize;
}

/// Scans `[first, last)` of a state for held buttons, appending to `out`.
/// Shared by the per-kind `any_button_down` implementations.
pub(crate) fn check_all_buttons_down(
    out: &mut [DeviceButtonSpec],
    device: DeviceId,
    state: &crate::state::InputState,
    button_type: impl Fn(DeviceButtonId) -> Option<ButtonType>,
    first: u32,
    last: u32,
) -> usize {
    let mut found = 0;
    for button in first..last {
        if found >= out.len() {
            break;
        }
        let down = match button_type(button) {
            Some(ButtonType::Bool) => state.get_bool(button),
            Some(ButtonType::Float) => state.get_float(button) != 0.0,
            None => false,
        };
        if down {
            out[found] = DeviceButtonSpec { device, button };
            found += 1;
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::InputState;

    #[test]
    fn type_names() {
        assert_eq!(DeviceKind::Pad.type_name(), "pad");
        assert_eq!(DeviceKind::Keyboard.type_name(), "keyboard");
    }

    #[test]
    fn button_scan_truncates_at_buffer_len() {
        let mut state = InputState::new(8);
        for i in 0..6 {
            state.set_bool(i, true);
        }
        let mut out = [DeviceButtonSpec::default(); 4];
        let n = check_all_buttons_down(&mut out, 3, &state, |_| Some(ButtonType::Bool), 0, 8);
        assert_eq!(n, 4);
        assert_eq!(out[0].device, 3);
        assert_eq!(out[3].button, 3);
    }

    #[test]
    fn button_scan_counts_nonzero_axes() {
        let mut state = InputState::new(4);
        state.set_float(2, 0.7);
        let mut out = [DeviceButtonSpec::default(); 4];
        let n = check_all_buttons_down(&mut out, 0, &state, |_| Some(ButtonType::Float), 0, 4);
        assert_eq!(n, 1);
        assert_eq!(out[0].button, 2);
    }
}
