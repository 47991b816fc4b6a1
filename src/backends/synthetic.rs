//! Synthetic backends: devices fed programmatically.
//!
//! Tests and embedder glue push [`SyntheticEvent`]s through
//! [`InputManager::handle_synthetic`](crate::manager::InputManager::handle_synthetic);
//! these backends decode them exactly like an OS backend decodes platform
//! events, so the whole pipeline behaves identically.

use std::sync::Arc;

use crate::backends::{PlatformEvent, SyntheticEvent};
use crate::device::{DeviceState, DeviceVariant};
use crate::devices::keyboard::{KeyboardBackend, KeyboardContext};
use crate::devices::mouse::{MouseBackend, MouseContext};
use crate::devices::pad::{PadBackend, PadContext};
use crate::devices::touch::{TouchBackend, TouchContext};
use crate::rumble::RumbleSink;

pub struct SyntheticKeyboardBackend {
    index: u32,
}

impl SyntheticKeyboardBackend {
    pub fn new(index: u32) -> Self {
        Self { index }
    }
}

impl KeyboardBackend for SyntheticKeyboardBackend {
    fn variant(&self) -> DeviceVariant {
        DeviceVariant::Synthetic
    }

    fn device_name(&self) -> &str {
        "synthetic keyboard"
    }

    fn handle_event(&mut self, event: &PlatformEvent, ctx: &mut KeyboardContext) {
        let PlatformEvent::Synthetic(SyntheticEvent::Key {
            index,
            key,
            pressed,
            character,
        }) = event
        else {
            return;
        };
        if *index != self.index {
            return;
        }
        if *pressed {
            if let Some(c) = character {
                ctx.push_text(*c);
            }
        }
        ctx.set_key(*key, *pressed);
    }
}

pub struct SyntheticMouseBackend {
    index: u32,
}

impl SyntheticMouseBackend {
    pub fn new(index: u32) -> Self {
        Self { index }
    }
}

impl MouseBackend for SyntheticMouseBackend {
    fn variant(&self) -> DeviceVariant {
        DeviceVariant::Synthetic
    }

    fn device_name(&self) -> &str {
        "synthetic mouse"
    }

    fn handle_event(&mut self, event: &PlatformEvent, ctx: &mut MouseContext) {
        let PlatformEvent::Synthetic(ev) = event else {
            return;
        };
        match *ev {
            SyntheticEvent::MouseButton {
                index,
                button,
                pressed,
            } if index == self.index => {
                ctx.set_button(button, pressed);
            }
            SyntheticEvent::MouseMove { index, x, y } if index == self.index => {
                ctx.set_axis(crate::buttons::MouseButton::AxisX, x);
                ctx.set_axis(crate::buttons::MouseButton::AxisY, y);
            }
            SyntheticEvent::MouseWheel { index, notches } if index == self.index => {
                for _ in 0..notches.unsigned_abs() {
                    ctx.wheel_tick(notches > 0);
                }
            }
            _ => {}
        }
    }
}

/// Synthetic pad source; also used by embedder glue for platforms whose
/// controller framework delivers pre-translated values.
pub struct SyntheticPadBackend {
    index: u32,
    connected: bool,
    sink: Option<Arc<dyn RumbleSink>>,
}

impl SyntheticPadBackend {
    pub fn new(index: u32) -> Self {
        Self {
            index,
            connected: false,
            sink: None,
        }
    }

    /// Backend that starts in the connected state.
    pub fn connected(index: u32) -> Self {
        Self {
            index,
            connected: true,
            sink: None,
        }
    }

    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    /// Injects an output-report sink so rumble flows can be observed.
    pub fn set_rumble_sink(&mut self, sink: Arc<dyn RumbleSink>) {
        self.sink = Some(sink);
    }
}

impl PadBackend for SyntheticPadBackend {
    fn variant(&self) -> DeviceVariant {
        DeviceVariant::Synthetic
    }

    fn device_state(&self) -> DeviceState {
        if self.connected {
            DeviceState::Ok
        } else {
            DeviceState::Unavailable
        }
    }

    fn device_name(&self) -> &str {
        "synthetic pad"
    }

    fn check_connection(&mut self) {}

    fn handle_event(&mut self, event: &PlatformEvent, ctx: &mut PadContext) {
        if !self.connected {
            return;
        }
        let PlatformEvent::Synthetic(ev) = event else {
            return;
        };
        match *ev {
            SyntheticEvent::PadButton {
                slot,
                button,
                pressed,
            } if slot == self.index => {
                ctx.set_button(button, pressed);
            }
            SyntheticEvent::PadAxis { slot, button, value } if slot == self.index => {
                ctx.set_stick(button, value);
            }
            _ => {}
        }
    }

    fn vibrate(&mut self, _left: f32, _right: f32) -> bool {
        self.connected
    }

    fn rumble_sink(&self) -> Option<Arc<dyn RumbleSink>> {
        self.sink.clone()
    }

    fn as_synthetic(&mut self) -> Option<&mut SyntheticPadBackend> {
        Some(self)
    }
}

pub struct SyntheticTouchBackend {
    index: u32,
}

impl SyntheticTouchBackend {
    pub fn new(index: u32) -> Self {
        Self { index }
    }
}

impl TouchBackend for SyntheticTouchBackend {
    fn variant(&self) -> DeviceVariant {
        DeviceVariant::Synthetic
    }

    fn device_name(&self) -> &str {
        "synthetic touch"
    }

    fn handle_event(&mut self, event: &PlatformEvent, ctx: &mut TouchContext) {
        let PlatformEvent::Synthetic(SyntheticEvent::Touch {
            index,
            finger,
            down,
            x,
            y,
            pressure,
        }) = event
        else {
            return;
        };
        if *index != self.index {
            return;
        }
        ctx.set_finger(*finger, *down, *x, *y, *pressure);
    }
}
