//! Generic pad event evaluation.
//!
//! Raw pad sources (joystick API events, buffered device data, HID value
//! changes) all funnel through one evaluator that de-duplicates against the
//! last known value, absorbs the first-reported value of every axis, and
//! decodes hat switches. What survives is handed to the dialect for
//! translation into canonical ids.

use crate::buttons::PadButton;

/// Maximum positive axis magnitude reported by the raw sources.
pub const MAX_AXIS_VALUE: f32 = 32767.0;

/// First-report jitter threshold: a fresh axis only starts emitting once it
/// moved further than `max_axis / 100` from its initial value.
pub const MAX_ALLOWED_JITTER: i32 = MAX_AXIS_VALUE as i32 / 100;

/// D-pad decode table for older XBox-style directional switches.
///
/// Indexed by the raw hat value; the centered position is anything >= 8.
/// Entries are `(dx, dy)` with x-positive = right, y-positive = up.
pub const DPAD_SCHEME: [(i32, i32); 9] = [
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, 0),
];

/// D-pad decode table for newer controllers (Xbox Series and friends),
/// which put the centered position at raw value 0.
pub const ALT_DPAD_SCHEME: [(i32, i32); 9] = [
    (0, 0),
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
];

/// Decodes a raw directional-switch value into `(dx, dy)`.
///
/// The two schemes differ in element 0 on purpose; devices carry an
/// `alternative_dpad_scheme` flag chosen at bind time. Diagonals yield both
/// components so both constituent buttons fire.
#[inline]
pub fn decode_dpad(raw: i32, alternative_scheme: bool) -> (i32, i32) {
    let index = if (0..9).contains(&raw) { raw as usize } else { 8 };
    if alternative_scheme {
        ALT_DPAD_SCHEME[index]
    } else {
        DPAD_SCHEME[index]
    }
}

/// The four dpad button states implied by a decoded `(dx, dy)`.
#[inline]
pub fn dpad_buttons(dx: i32, dy: i32) -> [(PadButton, bool); 4] {
    [
        (PadButton::Left, dx < 0),
        (PadButton::Right, dx > 0),
        (PadButton::Up, dy > 0),
        (PadButton::Down, dy < 0),
    ]
}

/// Clamps and rescales a raw axis value.
///
/// Symmetric (sticks): output in `[-1, 1]`. Asymmetric (triggers): output in
/// `[0, 1]`.
#[inline]
pub fn fix_up_analog(raw: f32, min_axis: f32, max_axis: f32, symmetric: bool) -> f32 {
    let mut analog = raw.clamp(min_axis, max_axis);
    analog -= min_axis;
    analog /= (min_axis.abs() + max_axis.abs()) * if symmetric { 0.5 } else { 1.0 };
    if symmetric {
        analog -= 1.0;
    }
    analog
}

#[derive(Clone, Copy, Default)]
struct AxisInfo {
    initial_value: i32,
    value: i32,
    has_initial_value: bool,
    sent_initial_value: bool,
}

/// Per-pad raw state tracker.
///
/// `evaluate_*` return what actually changed; duplicate reports and initial
/// jitter produce nothing.
pub struct JoystickEvaluator {
    axes: Vec<AxisInfo>,
    buttons: Vec<bool>,
    hats: Vec<u8>,
}

impl JoystickEvaluator {
    pub fn new(num_axes: usize, num_buttons: usize, num_hats: usize) -> Self {
        Self {
            axes: vec![AxisInfo::default(); num_axes],
            buttons: vec![false; num_buttons],
            hats: vec![0; num_hats],
        }
    }

    pub fn reset(&mut self) {
        self.axes.fill(AxisInfo::default());
        self.buttons.fill(false);
        self.hats.fill(0);
    }

    /// Feeds one raw axis sample. Accepted values are pushed to `out` as
    /// `(axis, value)`; the first post-jitter change also releases the
    /// absorbed initial value so downstream state starts coherent.
    pub fn evaluate_axis(&mut self, axis: u8, value: i32, out: &mut Vec<(u8, i32)>) {
        let Some(info) = self.axes.get_mut(axis as usize) else {
            return;
        };

        if !info.has_initial_value {
            info.initial_value = value;
            info.value = value;
            info.has_initial_value = true;
        }

        if value == info.value {
            return;
        }

        if !info.sent_initial_value {
            if (value - info.value).abs() <= MAX_ALLOWED_JITTER {
                return;
            }
            info.sent_initial_value = true;
            out.push((axis, info.initial_value));
        }

        info.value = value;
        out.push((axis, value));
    }

    /// Feeds one raw button sample; returns `true` when the state flipped.
    pub fn evaluate_button(&mut self, button: u8, pressed: bool) -> bool {
        let Some(slot) = self.buttons.get_mut(button as usize) else {
            return false;
        };
        if *slot == pressed {
            return false;
        }
        *slot = pressed;
        true
    }

    /// Feeds one raw hat sample (bit mask); returns the new mask on change.
    pub fn evaluate_hat(&mut self, hat: u8, mask: u8) -> Option<u8> {
        let slot = self.hats.get_mut(hat as usize)?;
        if *slot == mask {
            return None;
        }
        *slot = mask;
        Some(mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dpad_scheme_a() {
        // Centered.
        assert_eq!(decode_dpad(8, false), (0, 0));
        assert_eq!(decode_dpad(12, false), (0, 0));
        // Right only.
        assert_eq!(decode_dpad(2, false), (1, 0));
        // Up-left diagonal fires both constituents.
        let (dx, dy) = decode_dpad(7, false);
        let buttons = dpad_buttons(dx, dy);
        assert_eq!(buttons[0], (PadButton::Left, true));
        assert_eq!(buttons[2], (PadButton::Up, true));
        assert_eq!(buttons[1], (PadButton::Right, false));
        assert_eq!(buttons[3], (PadButton::Down, false));
    }

    #[test]
    fn dpad_scheme_b() {
        // Element 0 is centered in the alternative scheme.
        assert_eq!(decode_dpad(0, true), (0, 0));
        assert_eq!(decode_dpad(1, true), (0, 1));
        assert_eq!(decode_dpad(3, true), (1, 0));
        assert_eq!(decode_dpad(8, true), (-1, 1));
        // The two schemes must not be unified.
        assert_ne!(decode_dpad(0, false), decode_dpad(0, true));
    }

    #[test]
    fn analog_fix_up() {
        // Symmetric stick over [-32768, 32768].
        let v = fix_up_analog(0.0, -32768.0, 32768.0, true);
        assert!(v.abs() < 1e-6);
        assert!((fix_up_analog(32768.0, -32768.0, 32768.0, true) - 1.0).abs() < 1e-6);
        assert!((fix_up_analog(-32768.0, -32768.0, 32768.0, true) + 1.0).abs() < 1e-6);
        // Asymmetric trigger over [0, 255].
        assert!((fix_up_analog(255.0, 0.0, 255.0, false) - 1.0).abs() < 1e-6);
        assert!(fix_up_analog(0.0, 0.0, 255.0, false).abs() < 1e-6);
        // Out-of-range raw values clamp.
        assert!((fix_up_analog(400.0, 0.0, 255.0, false) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn axis_jitter_is_absorbed() {
        let mut ev = JoystickEvaluator::new(2, 0, 0);
        let mut out = Vec::new();

        // First report: absorbed as the initial value.
        ev.evaluate_axis(0, 100, &mut out);
        assert!(out.is_empty());

        // Movement within the jitter threshold: still nothing.
        ev.evaluate_axis(0, 100 + MAX_ALLOWED_JITTER, &mut out);
        assert!(out.is_empty());

        // Beyond the threshold: the initial value is released, then the new.
        ev.evaluate_axis(0, 2000, &mut out);
        assert_eq!(out, vec![(0, 100), (0, 2000)]);

        // From here on every change emits exactly once.
        out.clear();
        ev.evaluate_axis(0, 2000, &mut out);
        assert!(out.is_empty());
        ev.evaluate_axis(0, 2001, &mut out);
        assert_eq!(out, vec![(0, 2001)]);
    }

    #[test]
    fn button_and_hat_dedupe() {
        let mut ev = JoystickEvaluator::new(0, 2, 1);
        assert!(ev.evaluate_button(0, true));
        assert!(!ev.evaluate_button(0, true));
        assert!(ev.evaluate_button(0, false));
        // Unknown indices are garbage, not growth.
        assert!(!ev.evaluate_button(9, true));

        assert_eq!(ev.evaluate_hat(0, HAT_UP_MASK), Some(HAT_UP_MASK));
        assert_eq!(ev.evaluate_hat(0, HAT_UP_MASK), None);
        assert_eq!(ev.evaluate_hat(0, 0), Some(0));
    }

    const HAT_UP_MASK: u8 = crate::mapping::HAT_UP;
}
