//! Null backends: valid devices that never report input.
//!
//! Used on platforms without an implementation for a requested variant and
//! as the pad prober for slots beyond a platform's native capacity.

use crate::device::{DeviceState, DeviceVariant};
use crate::devices::keyboard::KeyboardBackend;
use crate::devices::mouse::MouseBackend;
use crate::devices::pad::PadBackend;
use crate::devices::touch::TouchBackend;

pub struct NullKeyboardBackend;

impl KeyboardBackend for NullKeyboardBackend {
    fn variant(&self) -> DeviceVariant {
        DeviceVariant::Null
    }
}

pub struct NullMouseBackend;

impl MouseBackend for NullMouseBackend {
    fn variant(&self) -> DeviceVariant {
        DeviceVariant::Null
    }
}

pub struct NullPadBackend;

impl PadBackend for NullPadBackend {
    fn variant(&self) -> DeviceVariant {
        DeviceVariant::Null
    }

    fn device_state(&self) -> DeviceState {
        DeviceState::Unavailable
    }

    fn check_connection(&mut self) {}
}

pub struct NullTouchBackend;

impl TouchBackend for NullTouchBackend {
    fn variant(&self) -> DeviceVariant {
        DeviceVariant::Null
    }
}
