//! Pad (game controller) device façade.
//!
//! A pad slot is pre-allocated by the manager and starts `Unavailable`. Its
//! backend probes for hardware on the connection cadence; once a handle is
//! bound the slot flips to `Ok`, the manager mints a fresh device id, and
//! the pad enters the registry. Losing the hardware retires the id and
//! returns the slot to the pool, ready for the next connect.
//!
//! A slot carries one platform prober (joystick API, XInput) plus an
//! optional override backend: the unified HID layer or the synthetic source
//! can take a slot over while the platform prober found nothing, and the
//! prober is restored when the override disconnects.

use std::sync::Arc;

use crate::backends::PlatformEvent;
use crate::buttons::{
    ButtonType, DeviceButtonId, PadButton, PAD_AXIS_COUNT, PAD_BUTTON_COUNT, PAD_BUTTON_NAMES,
};
use crate::delta::DeltaState;
use crate::device::{
    check_all_buttons_down, DeviceButtonSpec, DeviceId, DeviceKind, DeviceState, DeviceVariant,
    InputDeviceOps, INVALID_DEVICE_ID,
};
use crate::rumble::{RumbleEffect, RumbleScheduler, RumbleSink};
use crate::state::InputState;

const PAD_SPACE: usize = PAD_AXIS_COUNT + PAD_BUTTON_COUNT;

/// Mutable view handed to pad backends while they decode raw input.
pub struct PadContext<'a> {
    pub device: DeviceId,
    pub next: &'a mut InputState,
    pub delta: Option<&'a mut DeltaState>,
    pub dead_zones: &'a [f32],
}

impl PadContext<'_> {
    pub fn set_button(&mut self, button: PadButton, pressed: bool) {
        crate::delta::handle_button(
            self.device,
            self.next,
            self.delta.as_deref_mut(),
            button.id(),
            pressed,
        );
    }

    /// Writes a single float axis with its axial dead-zone (triggers,
    /// sensor axes; sticks go through [`PadContext::set_stick`]).
    pub fn set_axis(&mut self, button: PadButton, value: f32) {
        let dz = self
            .dead_zones
            .get(button.id() as usize)
            .copied()
            .unwrap_or(0.0);
        crate::delta::handle_axis(
            self.device,
            self.next,
            self.delta.as_deref_mut(),
            button.id(),
            dz,
            value,
        );
    }

    /// Writes one stick axis, applying the scaled radial dead-zone over the
    /// `(x, y)` pair. The partner axis is re-committed from its staged value
    /// so the pair always moves atomically.
    pub fn set_stick(&mut self, button: PadButton, value: f32) {
        let (x_button, y_button, x, y) = match button {
            PadButton::LeftStickX => (
                PadButton::LeftStickX,
                PadButton::LeftStickY,
                value,
                self.next.get_float(PadButton::LeftStickY.id()),
            ),
            PadButton::LeftStickY => (
                PadButton::LeftStickX,
                PadButton::LeftStickY,
                self.next.get_float(PadButton::LeftStickX.id()),
                value,
            ),
            PadButton::RightStickX => (
                PadButton::RightStickX,
                PadButton::RightStickY,
                value,
                self.next.get_float(PadButton::RightStickY.id()),
            ),
            PadButton::RightStickY => (
                PadButton::RightStickX,
                PadButton::RightStickY,
                self.next.get_float(PadButton::RightStickX.id()),
                value,
            ),
            other => return self.set_axis(other, value),
        };

        let dz = self
            .dead_zones
            .get(x_button.id() as usize)
            .copied()
            .unwrap_or(0.0);
        crate::delta::handle_stick_pair(
            self.device,
            self.next,
            self.delta.as_deref_mut(),
            x_button.id(),
            y_button.id(),
            dz,
            x,
            y,
        );
    }

    /// Applies a decoded dpad direction pair to all four dpad buttons.
    pub fn set_dpad(&mut self, dx: i32, dy: i32) {
        for (button, pressed) in crate::evaluate::dpad_buttons(dx, dy) {
            self.set_button(button, pressed);
        }
    }
}

/// Platform pad implementation bound to one pool slot.
pub trait PadBackend: Send {
    fn variant(&self) -> DeviceVariant;
    fn device_state(&self) -> DeviceState;

    fn device_name(&self) -> &str {
        "pad"
    }

    /// Probes hardware availability. Runs on the connection cadence; this is
    /// the only place a backend may (re-)open handles.
    fn check_connection(&mut self);

    /// Drains pending raw input into the canonical space.
    fn update(&mut self, _ctx: &mut PadContext) {}

    fn handle_event(&mut self, _event: &PlatformEvent, _ctx: &mut PadContext) {}

    fn is_valid_button(&self, button: DeviceButtonId) -> bool {
        (button as usize) < PAD_SPACE
    }

    /// One-shot vibration without a duration; `false` when unsupported.
    fn vibrate(&mut self, _left: f32, _right: f32) -> bool {
        false
    }

    /// Output-report sink for the rumble worker, when the hardware has one.
    fn rumble_sink(&self) -> Option<Arc<dyn RumbleSink>> {
        None
    }

    fn set_led_color(&mut self, _r: u8, _g: u8, _b: u8) {}

    /// Downcast hook for the synthetic source; see
    /// [`PadDevice::handle_event`].
    fn as_synthetic(&mut self) -> Option<&mut crate::backends::synthetic::SyntheticPadBackend> {
        None
    }
}

/// A pad slot in the manager's pool.
pub struct PadDevice {
    id: DeviceId,
    index: u32,
    late_update: bool,
    state: InputState,
    previous: InputState,
    next: InputState,
    dead_zones: Vec<f32>,
    backend: Box<dyn PadBackend>,
    /// Platform prober parked while an override (HID / synthetic) owns the
    /// slot.
    parked: Option<Box<dyn PadBackend>>,
}

impl PadDevice {
    pub(crate) fn new(index: u32, default_stick_dead_zone: f32, backend: Box<dyn PadBackend>) -> Self {
        let mut dead_zones = vec![0.0; PAD_SPACE];
        for button in [
            PadButton::LeftStickX,
            PadButton::LeftStickY,
            PadButton::RightStickX,
            PadButton::RightStickY,
        ] {
            dead_zones[button.id() as usize] = default_stick_dead_zone;
        }
        Self {
            id: INVALID_DEVICE_ID,
            index,
            late_update: false,
            state: InputState::new(PAD_SPACE),
            previous: InputState::new(PAD_SPACE),
            next: InputState::new(PAD_SPACE),
            dead_zones,
            backend,
            parked: None,
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

    pub fn dead_zone(&self, button: DeviceButtonId) -> f32 {
        self.dead_zones.get(button as usize).copied().unwrap_or(0.0)
    }

    pub fn set_dead_zone(&mut self, button: DeviceButtonId, dead_zone: f32) {
        if let Some(slot) = self.dead_zones.get_mut(button as usize) {
            *slot = dead_zone.clamp(0.0, 0.95);
        }
    }

    /// Hands the slot to an override backend (unified HID, synthetic),
    /// parking the platform prober for later restore.
    pub(crate) fn attach_override(&mut self, backend: Box<dyn PadBackend>) {
        if self.parked.is_none() {
            let previous = std::mem::replace(&mut self.backend, backend);
            self.parked = Some(previous);
        } else {
            self.backend = backend;
        }
    }

    pub(crate) fn has_override(&self) -> bool {
        self.parked.is_some()
    }

    /// The synthetic backend currently driving this slot, if any. Embedders
    /// use this to wire an output-report sink for rumble.
    pub fn synthetic_backend_mut(
        &mut self,
    ) -> Option<&mut crate::backends::synthetic::SyntheticPadBackend> {
        self.backend.as_synthetic()
    }

    pub(crate) fn check_connection(&mut self) {
        self.backend.check_connection();
        if self.backend.device_state() == DeviceState::Unavailable {
            // A dead override gives the slot back to the platform prober.
            if let Some(parked) = self.parked.take() {
                self.backend = parked;
                self.backend.check_connection();
            }
        }
    }

    pub(crate) fn handle_event(&mut self, event: &PlatformEvent, delta: Option<&mut DeltaState>) {
        // Synthetic connection edges take the slot over (or release it) the
        // same way a discovered HID device would.
        if let PlatformEvent::Synthetic(crate::backends::SyntheticEvent::PadConnection {
            slot,
            connected,
        }) = event
        {
            if *slot == self.index {
                if let Some(synthetic) = self.backend.as_synthetic() {
                    synthetic.set_connected(*connected);
                } else if *connected {
                    self.attach_override(Box::new(
                        crate::backends::synthetic::SyntheticPadBackend::connected(self.index),
                    ));
                }
                return;
            }
        }

        let mut ctx = PadContext {
            device: self.id,
            next: &mut self.next,
            delta,
            dead_zones: &self.dead_zones,
        };
        self.backend.handle_event(event, &mut ctx);
    }

    pub(crate) fn update(&mut self, delta: Option<&mut DeltaState>) {
        let mut ctx = PadContext {
            device: self.id,
            next: &mut self.next,
            delta,
            dead_zones: &self.dead_zones,
        };
        self.backend.update(&mut ctx);

        self.previous.copy_from(&self.state);
        self.state.copy_from(&self.next);
    }

    /// One-shot vibration; `false` when the backend cannot rumble.
    pub fn vibrate(&mut self, left: f32, right: f32) -> bool {
        if self.device_state() == DeviceState::Unavailable {
            return false;
        }
        self.backend.vibrate(left, right)
    }

    /// Queues a timed dual-motor effect on the rumble worker.
    pub fn set_rumble_effect(
        &self,
        scheduler: &RumbleScheduler,
        left: f32,
        right: f32,
        duration_ms: u32,
    ) -> bool {
        if self.device_state() == DeviceState::Unavailable {
            return false;
        }
        let Some(sink) = self.backend.rumble_sink() else {
            return false;
        };
        scheduler.enqueue(RumbleEffect {
            left,
            right,
            duration_ms,
            sink,
        })
    }

    pub fn set_led_color(&mut self, r: u8, g: u8, b: u8) {
        self.backend.set_led_color(r, g, b);
    }

    pub(crate) fn next_state_mut(&mut self) -> &mut InputState {
        &mut self.next
    }

    pub(crate) fn current_state_mut(&mut self) -> &mut InputState {
        &mut self.state
    }

    /// Clears all staged and committed state; used when the hardware drops.
    pub(crate) fn reset_state(&mut self) {
        self.next.clear();
        self.state.clear();
        self.previous.clear();
    }
}

impl InputDeviceOps for PadDevice {
    fn kind(&self) -> DeviceKind {
        DeviceKind::Pad
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
        self.backend.is_valid_button(button)
    }

    fn button_type(&self, button: DeviceButtonId) -> Option<ButtonType> {
        PadButton::button_type(button)
    }

    fn button_name(&self, button: DeviceButtonId) -> Option<&'static str> {
        PAD_BUTTON_NAMES.get(button as usize).copied()
    }

    fn button_by_name(&self, name: &str) -> DeviceButtonId {
        PAD_BUTTON_NAMES
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
            PadButton::button_type,
            0,
            PAD_SPACE as u32,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::synthetic::SyntheticPadBackend;
    use crate::backends::SyntheticEvent;

    fn synthetic_pad() -> PadDevice {
        let mut pad = PadDevice::new(0, 0.15, Box::new(SyntheticPadBackend::new(0)));
        pad.set_device_id(7);
        pad
    }

    fn feed(pad: &mut PadDevice, ev: SyntheticEvent) {
        pad.handle_event(&PlatformEvent::Synthetic(&ev), None);
    }

    #[test]
    fn stick_dead_zone_is_scaled_radial() {
        let mut pad = synthetic_pad();
        feed(
            &mut pad,
            SyntheticEvent::PadConnection {
                slot: 0,
                connected: true,
            },
        );
        // (0.1, 0.05) is inside the 0.15 radius: hard zero.
        feed(
            &mut pad,
            SyntheticEvent::PadAxis {
                slot: 0,
                button: PadButton::LeftStickY,
                value: 0.05,
            },
        );
        feed(
            &mut pad,
            SyntheticEvent::PadAxis {
                slot: 0,
                button: PadButton::LeftStickX,
                value: 0.1,
            },
        );
        pad.update(None);
        assert_eq!(pad.get_float(PadButton::LeftStickX.id()), 0.0);
        assert_eq!(pad.get_float(PadButton::LeftStickY.id()), 0.0);

        // (0.5, 0) rescales to about 0.4118.
        feed(
            &mut pad,
            SyntheticEvent::PadAxis {
                slot: 0,
                button: PadButton::LeftStickY,
                value: 0.0,
            },
        );
        feed(
            &mut pad,
            SyntheticEvent::PadAxis {
                slot: 0,
                button: PadButton::LeftStickX,
                value: 0.5,
            },
        );
        pad.update(None);
        assert!((pad.get_float(PadButton::LeftStickX.id()) - 0.4118).abs() < 1e-3);
        assert_eq!(pad.get_float(PadButton::LeftStickY.id()), 0.0);
    }

    #[test]
    fn zero_dead_zone_passes_raw_values() {
        let mut pad = synthetic_pad();
        feed(
            &mut pad,
            SyntheticEvent::PadConnection {
                slot: 0,
                connected: true,
            },
        );
        pad.set_dead_zone(PadButton::LeftStickX.id(), 0.0);
        feed(
            &mut pad,
            SyntheticEvent::PadAxis {
                slot: 0,
                button: PadButton::LeftStickX,
                value: 0.1,
            },
        );
        pad.update(None);
        assert!((pad.get_float(PadButton::LeftStickX.id()) - 0.1).abs() < 1e-6);
    }

    #[test]
    fn triggers_have_no_dead_zone_by_default() {
        let mut pad = synthetic_pad();
        feed(
            &mut pad,
            SyntheticEvent::PadConnection {
                slot: 0,
                connected: true,
            },
        );
        feed(
            &mut pad,
            SyntheticEvent::PadAxis {
                slot: 0,
                button: PadButton::Axis4,
                value: 0.05,
            },
        );
        pad.update(None);
        assert!((pad.get_float(PadButton::Axis4.id()) - 0.05).abs() < 1e-6);
    }

    #[test]
    fn connection_flips_availability() {
        let mut pad = synthetic_pad();
        assert_eq!(pad.device_state(), DeviceState::Unavailable);
        feed(
            &mut pad,
            SyntheticEvent::PadConnection {
                slot: 0,
                connected: true,
            },
        );
        assert_eq!(pad.device_state(), DeviceState::Ok);
        feed(
            &mut pad,
            SyntheticEvent::PadConnection {
                slot: 0,
                connected: false,
            },
        );
        assert_eq!(pad.device_state(), DeviceState::Unavailable);
    }

    #[test]
    fn name_services() {
        let pad = synthetic_pad();
        assert_eq!(pad.button_name(PadButton::A.id()), Some("pad_button_a"));
        assert_eq!(
            pad.button_by_name("pad_left_stick_x"),
            PadButton::LeftStickX.id()
        );
        assert_eq!(pad.button_by_name("pad_axis_4"), PadButton::Axis4.id());
        assert_eq!(
            pad.button_by_name("pad_button_zz"),
            crate::buttons::INVALID_DEVICE_BUTTON_ID
        );
    }
}
