//! Touch surface device façade.
//!
//! Eight fingers, each with a down button and x/y/pressure axes. Desktop
//! builds feed this through the synthetic source or embedder glue; there is
//! no OS prober.

use crate::backends::PlatformEvent;
use crate::buttons::{
    touch_button, touch_button_type, ButtonType, DeviceButtonId, TouchChannel, TOUCH_BUTTON_COUNT,
};
use crate::delta::DeltaState;
use crate::device::{
    check_all_buttons_down, DeviceButtonSpec, DeviceId, DeviceKind, DeviceState, DeviceVariant,
    InputDeviceOps, INVALID_DEVICE_ID,
};
use crate::state::InputState;

/// Mutable view handed to touch backends.
pub struct TouchContext<'a> {
    pub device: DeviceId,
    pub next: &'a mut InputState,
    pub delta: Option<&'a mut DeltaState>,
}

impl TouchContext<'_> {
    pub fn set_finger(&mut self, finger: usize, down: bool, x: f32, y: f32, pressure: f32) {
        if finger >= crate::buttons::TOUCH_FINGER_COUNT {
            return;
        }
        crate::delta::handle_button(
            self.device,
            self.next,
            self.delta.as_deref_mut(),
            touch_button(finger, TouchChannel::Down),
            down,
        );
        for (channel, value) in [
            (TouchChannel::X, x),
            (TouchChannel::Y, y),
            (TouchChannel::Pressure, pressure),
        ] {
            crate::delta::handle_axis(
                self.device,
                self.next,
                self.delta.as_deref_mut(),
                touch_button(finger, channel),
                0.0,
                value,
            );
        }
    }
}

/// Touch surface implementation.
pub trait TouchBackend: Send {
    fn variant(&self) -> DeviceVariant;

    fn device_state(&self) -> DeviceState {
        DeviceState::Ok
    }

    fn device_name(&self) -> &str {
        "touch"
    }

    fn handle_event(&mut self, _event: &PlatformEvent, _ctx: &mut TouchContext) {}

    fn poll(&mut self, _ctx: &mut TouchContext) {}
}

/// A touch surface device.
pub struct TouchDevice {
    id: DeviceId,
    index: u32,
    late_update: bool,
    state: InputState,
    previous: InputState,
    next: InputState,
    backend: Box<dyn TouchBackend>,
}

impl TouchDevice {
    pub(crate) fn new(index: u32, backend: Box<dyn TouchBackend>) -> Self {
        Self {
            id: INVALID_DEVICE_ID,
            index,
            late_update: false,
            state: InputState::new(TOUCH_BUTTON_COUNT),
            previous: InputState::new(TOUCH_BUTTON_COUNT),
            next: InputState::new(TOUCH_BUTTON_COUNT),
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

    pub(crate) fn handle_event(&mut self, event: &PlatformEvent, delta: Option<&mut DeltaState>) {
        let mut ctx = TouchContext {
            device: self.id,
            next: &mut self.next,
            delta,
        };
        self.backend.handle_event(event, &mut ctx);
    }

    pub(crate) fn update(&mut self, delta: Option<&mut DeltaState>) {
        let mut ctx = TouchContext {
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

impl InputDeviceOps for TouchDevice {
    fn kind(&self) -> DeviceKind {
        DeviceKind::Touch
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
        (button as usize) < TOUCH_BUTTON_COUNT
    }

    fn button_type(&self, button: DeviceButtonId) -> Option<ButtonType> {
        touch_button_type(button)
    }

    fn button_name(&self, _button: DeviceButtonId) -> Option<&'static str> {
        // Touch channels are addressed numerically; no name table.
        None
    }

    fn button_by_name(&self, _name: &str) -> DeviceButtonId {
        crate::buttons::INVALID_DEVICE_BUTTON_ID
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
            touch_button_type,
            0,
            TOUCH_BUTTON_COUNT as u32,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::synthetic::SyntheticTouchBackend;
    use crate::backends::SyntheticEvent;

    #[test]
    fn finger_channels_commit() {
        let mut touch = TouchDevice::new(0, Box::new(SyntheticTouchBackend::new(0)));
        touch.set_device_id(4);
        let ev = SyntheticEvent::Touch {
            index: 0,
            finger: 1,
            down: true,
            x: 0.5,
            y: 0.25,
            pressure: 1.0,
        };
        touch.handle_event(&PlatformEvent::Synthetic(&ev), None);
        touch.update(None);

        assert!(touch.get_bool(touch_button(1, TouchChannel::Down)));
        assert_eq!(touch.get_float(touch_button(1, TouchChannel::X)), 0.5);
        assert_eq!(touch.get_float(touch_button(1, TouchChannel::Y)), 0.25);
        assert!(!touch.get_bool(touch_button(0, TouchChannel::Down)));
    }
}
