//! Mouse device façade.
//!
//! Pointer axes come in two flavors: the `Standard` variant reports absolute
//! window coordinates, the `Raw` variant accumulates relative deltas against
//! a remembered baseline ([`MouseDevice::warp`] resets that baseline so a
//! warp never produces a spurious jump).
//!
//! Wheel notches are one-tick pulses: a notch stages wheel-up/down `true`
//! into the next state, and the following update force-clears it so
//! observers see exactly one `false -> true -> false` round trip.

use crate::backends::PlatformEvent;
use crate::buttons::{
    ButtonType, DeviceButtonId, MouseButton, MOUSE_AXIS_COUNT, MOUSE_BUTTON_COUNT,
    MOUSE_BUTTON_NAMES,
};
use crate::delta::DeltaState;
use crate::device::{
    check_all_buttons_down, DeviceButtonSpec, DeviceId, DeviceKind, DeviceState, DeviceVariant,
    InputDeviceOps, INVALID_DEVICE_ID,
};
use crate::state::InputState;

const MOUSE_SPACE: usize = MOUSE_BUTTON_COUNT + MOUSE_AXIS_COUNT;

/// Mutable view handed to mouse backends while they decode events.
pub struct MouseContext<'a> {
    pub device: DeviceId,
    pub next: &'a mut InputState,
    pub delta: Option<&'a mut DeltaState>,
}

impl MouseContext<'_> {
    pub fn set_button(&mut self, button: MouseButton, pressed: bool) {
        crate::delta::handle_button(
            self.device,
            self.next,
            self.delta.as_deref_mut(),
            button.id(),
            pressed,
        );
    }

    pub fn set_axis(&mut self, button: MouseButton, value: f32) {
        crate::delta::handle_axis(
            self.device,
            self.next,
            self.delta.as_deref_mut(),
            button.id(),
            0.0,
            value,
        );
    }

    /// Stages one wheel notch; the façade auto-releases it next tick.
    pub fn wheel_tick(&mut self, up: bool) {
        let button = if up {
            MouseButton::WheelUp
        } else {
            MouseButton::WheelDown
        };
        self.set_button(button, true);
    }
}

/// Platform mouse implementation.
pub trait MouseBackend: Send {
    fn variant(&self) -> DeviceVariant;

    fn device_state(&self) -> DeviceState {
        DeviceState::Ok
    }

    fn device_name(&self) -> &str {
        "mouse"
    }

    fn handle_event(&mut self, _event: &PlatformEvent, _ctx: &mut MouseContext) {}

    fn poll(&mut self, _ctx: &mut MouseContext) {}

    /// Moves the delta baseline so the next report is relative to `(x, y)`.
    fn warp(&mut self, _x: f32, _y: f32) {}
}

/// A mouse device: canonical buttons, wheel pulses, and pointer axes.
pub struct MouseDevice {
    id: DeviceId,
    index: u32,
    late_update: bool,
    state: InputState,
    previous: InputState,
    next: InputState,
    backend: Box<dyn MouseBackend>,
}

impl MouseDevice {
    pub(crate) fn new(index: u32, backend: Box<dyn MouseBackend>) -> Self {
        Self {
            id: INVALID_DEVICE_ID,
            index,
            late_update: false,
            state: InputState::new(MOUSE_SPACE),
            previous: InputState::new(MOUSE_SPACE),
            next: InputState::new(MOUSE_SPACE),
            backend,
        }
    }

    pub(crate) fn set_device_id(&mut self, id: DeviceId) {
        self.id = id;
    }

    pub(crate) fn set_late_update(&mut self, late: bool) {
        self.late_update = late;
    }

    pub(crate) fn is_late_update(&self) -> bool {
        self.late_update
    }

    /// Repositions the pointer baseline without generating a delta.
    pub fn warp(&mut self, x: f32, y: f32) {
        self.backend.warp(x, y);
    }

    pub(crate) fn handle_event(&mut self, event: &PlatformEvent, delta: Option<&mut DeltaState>) {
        let mut ctx = MouseContext {
            device: self.id,
            next: &mut self.next,
            delta,
        };
        self.backend.handle_event(event, &mut ctx);
    }

    pub(crate) fn update(&mut self, mut delta: Option<&mut DeltaState>) {
        // Wheel pulses committed last tick are force-released now, so one
        // notch reads as a one-tick press.
        for wheel in [MouseButton::WheelUp, MouseButton::WheelDown] {
            if self.state.get_bool(wheel.id()) {
                crate::delta::handle_button(
                    self.id,
                    &mut self.next,
                    delta.as_deref_mut(),
                    wheel.id(),
                    false,
                );
            }
        }

        let mut ctx = MouseContext {
            device: self.id,
            next: &mut self.next,
            delta,
        };
        self.backend.poll(&mut ctx);

        self.previous.copy_from(&self.state);
        self.state.copy_from(&self.next);
    }

    pub(crate) fn next_state_mut(&mut self) -> &mut InputState {
        &mut self.next
    }

    pub(crate) fn current_state_mut(&mut self) -> &mut InputState {
        &mut self.state
    }
}

impl InputDeviceOps for MouseDevice {
    fn kind(&self) -> DeviceKind {
        DeviceKind::Mouse
    }

    fn variant(&self) -> DeviceVariant {
        self.backend.variant()
    }

    fn index(&self) -> u32 {
        self.index
    }

    fn device_id(&self) -> DeviceId {
        self.id
    }

    fn device_state(&self) -> DeviceState {
        self.backend.device_state()
    }

    fn device_name(&self) -> &str {
        self.backend.device_name()
    }

    fn is_valid_button(&self, button: DeviceButtonId) -> bool {
        (button as usize) < MOUSE_SPACE
    }

    fn button_type(&self, button: DeviceButtonId) -> Option<ButtonType> {
        MouseButton::button_type(button)
    }

    fn button_name(&self, button: DeviceButtonId) -> Option<&'static str> {
        MOUSE_BUTTON_NAMES.get(button as usize).copied()
    }

    fn button_by_name(&self, name: &str) -> DeviceButtonId {
        MOUSE_BUTTON_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|i| i as DeviceButtonId)
            .unwrap_or(crate::buttons::INVALID_DEVICE_BUTTON_ID)
    }

    fn get_bool(&self, button: DeviceButtonId) -> bool {
        self.state.get_bool(button)
    }

    fn get_bool_previous(&self, button: DeviceButtonId) -> bool {
        self.previous.get_bool(button)
    }

    fn get_float(&self, button: DeviceButtonId) -> f32 {
        self.state.get_float(button)
    }

    fn any_button_down(&self, out: &mut [DeviceButtonSpec]) -> usize {
        check_all_buttons_down(
            out,
            self.id,
            &self.state,
            MouseButton::button_type,
            0,
            MOUSE_SPACE as u32,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::synthetic::SyntheticMouseBackend;
    use crate::backends::SyntheticEvent;

    fn synthetic_mouse() -> MouseDevice {
        let mut mouse = MouseDevice::new(0, Box::new(SyntheticMouseBackend::new(0)));
        mouse.set_device_id(2);
        mouse
    }

    #[test]
    fn wheel_round_trip_is_two_ticks() {
        let mut mouse = synthetic_mouse();
        let ev = SyntheticEvent::MouseWheel {
            index: 0,
            notches: 1,
        };
        mouse.handle_event(&PlatformEvent::Synthetic(&ev), None);

        mouse.update(None);
        assert!(mouse.get_bool(MouseButton::WheelUp.id()));

        mouse.update(None);
        assert!(!mouse.get_bool(MouseButton::WheelUp.id()));
        assert!(mouse.get_bool_previous(MouseButton::WheelUp.id()));
    }

    #[test]
    fn wheel_release_is_recorded_in_delta() {
        let mut mouse = synthetic_mouse();
        let ev = SyntheticEvent::MouseWheel {
            index: 0,
            notches: 1,
        };
        let mut delta = DeltaState::new();
        mouse.handle_event(&PlatformEvent::Synthetic(&ev), Some(&mut delta));
        mouse.update(Some(&mut delta));
        // One press recorded.
        assert!(delta
            .changes()
            .iter()
            .any(|c| c.button == MouseButton::WheelUp.id()));

        let mut delta2 = DeltaState::new();
        mouse.update(Some(&mut delta2));
        // The auto-release records old=true, new=false.
        let release = delta2
            .changes()
            .iter()
            .find(|c| c.button == MouseButton::WheelUp.id())
            .expect("release recorded");
        assert_eq!(
            release.change,
            crate::delta::ButtonChange::Bool {
                old: true,
                new: false
            }
        );
    }

    #[test]
    fn absolute_axes_commit() {
        let mut mouse = synthetic_mouse();
        let ev = SyntheticEvent::MouseMove {
            index: 0,
            x: 320.0,
            y: 200.0,
        };
        mouse.handle_event(&PlatformEvent::Synthetic(&ev), None);
        mouse.update(None);
        assert_eq!(mouse.get_float(MouseButton::AxisX.id()), 320.0);
        assert_eq!(mouse.get_float(MouseButton::AxisY.id()), 200.0);
    }

    #[test]
    fn name_services() {
        let mouse = synthetic_mouse();
        assert_eq!(mouse.button_name(MouseButton::Left.id()), Some("mouse_left"));
        assert_eq!(mouse.button_by_name("mouse_x"), MouseButton::AxisX.id());
        assert_eq!(
            mouse.button_by_name("mouse_warp"),
            crate::buttons::INVALID_DEVICE_BUTTON_ID
        );
    }
}
