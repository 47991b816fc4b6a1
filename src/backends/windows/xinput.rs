//! XInput pad backend.
//!
//! Slot-based polling over `XInputGetState` (slots 0..=3). A successful
//! call while unavailable is the detect trigger; a failed call while bound
//! drops the slot back to the pool. XInput devices never go through the
//! unified HID layer (see the `IG_` filter there).

use std::sync::Arc;

use log::info;
use windows_sys::Win32::UI::Input::XboxController::*;

use crate::buttons::{DeviceButtonId, PadButton};
use crate::device::{DeviceState, DeviceVariant};
use crate::devices::pad::{PadBackend, PadContext};
use crate::rumble::RumbleSink;

pub const XINPUT_SLOT_COUNT: u32 = 4;

const ERROR_SUCCESS: u32 = 0;

/// Rumble sink translating the worker's canonical Xbox-One-BT packet onto
/// `XInputSetState`. XInput carries no duration of its own; the motors run
/// until the next write, so long effects rely on the caller's stop packet.
struct XInputRumbleSink {
    index: u32,
}

impl RumbleSink for XInputRumbleSink {
    fn write_report(&self, report: &[u8]) -> std::io::Result<usize> {
        // Bytes 4/5 of the packet are the motor strengths.
        if report.len() < 9 {
            return Err(std::io::Error::other("short rumble report"));
        }
        let mut vibration = XINPUT_VIBRATION {
            wLeftMotorSpeed: u16::from(report[4]) * 257,
            wRightMotorSpeed: u16::from(report[5]) * 257,
        };
        let result = unsafe { XInputSetState(self.index, &mut vibration) };
        if result == ERROR_SUCCESS {
            Ok(report.len())
        } else {
            Err(std::io::Error::other(format!(
                "XInputSetState failed: {result}"
            )))
        }
    }

    fn label(&self) -> String {
        format!("xinput:{}", self.index)
    }
}

pub struct XInputPadBackend {
    index: u32,
    device_state: DeviceState,
    last_packet: u32,
}

impl XInputPadBackend {
    pub fn new(index: u32) -> Self {
        Self {
            index,
            device_state: DeviceState::Unavailable,
            last_packet: 0,
        }
    }

    #[inline]
    fn normalize_thumb(v: i16) -> f32 {
        if v >= 0 {
            f32::from(v) / 32767.0
        } else {
            f32::from(v) / 32768.0
        }
    }
}

impl PadBackend for XInputPadBackend {
    fn variant(&self) -> DeviceVariant {
        DeviceVariant::Standard
    }

    fn device_state(&self) -> DeviceState {
        self.device_state
    }

    fn device_name(&self) -> &str {
        "XInput Controller"
    }

    fn check_connection(&mut self) {
        let mut state: XINPUT_STATE = unsafe { core::mem::zeroed() };
        let result = unsafe { XInputGetState(self.index, &mut state) };
        let connected = result == ERROR_SUCCESS;
        match (connected, self.device_state) {
            (true, DeviceState::Unavailable) => {
                info!("XInput pad connected on slot {}", self.index);
                self.device_state = DeviceState::Ok;
            }
            (false, DeviceState::Ok) => {
                info!("XInput pad lost on slot {}", self.index);
                self.device_state = DeviceState::Unavailable;
            }
            _ => {}
        }
    }

    fn update(&mut self, ctx: &mut PadContext) {
        if self.device_state != DeviceState::Ok {
            return;
        }

        let mut state: XINPUT_STATE = unsafe { core::mem::zeroed() };
        let result = unsafe { XInputGetState(self.index, &mut state) };
        if result != ERROR_SUCCESS {
            // No retry this tick; the connection probe re-attempts the bind.
            self.device_state = DeviceState::Unavailable;
            return;
        }
        if state.dwPacketNumber == self.last_packet {
            return;
        }
        self.last_packet = state.dwPacketNumber;

        let gamepad = state.Gamepad;
        ctx.set_stick(PadButton::LeftStickX, Self::normalize_thumb(gamepad.sThumbLX));
        ctx.set_stick(PadButton::LeftStickY, Self::normalize_thumb(gamepad.sThumbLY));
        ctx.set_stick(PadButton::RightStickX, Self::normalize_thumb(gamepad.sThumbRX));
        ctx.set_stick(PadButton::RightStickY, Self::normalize_thumb(gamepad.sThumbRY));
        ctx.set_axis(PadButton::Axis4, f32::from(gamepad.bLeftTrigger) / 255.0);
        ctx.set_axis(PadButton::Axis5, f32::from(gamepad.bRightTrigger) / 255.0);

        let buttons = gamepad.wButtons;
        for (mask, button) in [
            (XINPUT_GAMEPAD_DPAD_UP, PadButton::Up),
            (XINPUT_GAMEPAD_DPAD_DOWN, PadButton::Down),
            (XINPUT_GAMEPAD_DPAD_LEFT, PadButton::Left),
            (XINPUT_GAMEPAD_DPAD_RIGHT, PadButton::Right),
            (XINPUT_GAMEPAD_START, PadButton::Start),
            (XINPUT_GAMEPAD_BACK, PadButton::Select),
            (XINPUT_GAMEPAD_LEFT_THUMB, PadButton::L3),
            (XINPUT_GAMEPAD_RIGHT_THUMB, PadButton::R3),
            (XINPUT_GAMEPAD_LEFT_SHOULDER, PadButton::L1),
            (XINPUT_GAMEPAD_RIGHT_SHOULDER, PadButton::R1),
            (XINPUT_GAMEPAD_A, PadButton::A),
            (XINPUT_GAMEPAD_B, PadButton::B),
            (XINPUT_GAMEPAD_X, PadButton::X),
            (XINPUT_GAMEPAD_Y, PadButton::Y),
        ] {
            ctx.set_button(button, buttons & mask != 0);
        }
    }

    fn is_valid_button(&self, button: DeviceButtonId) -> bool {
        use PadButton::*;
        const SUPPORTED: &[PadButton] = &[
            LeftStickX, LeftStickY, RightStickX, RightStickY, Axis4, Axis5, Start, Select, Left,
            Right, Up, Down, A, B, X, Y, L1, R1, L3, R3,
        ];
        SUPPORTED.iter().any(|b| b.id() == button)
    }

    fn vibrate(&mut self, left: f32, right: f32) -> bool {
        if self.device_state != DeviceState::Ok {
            return false;
        }
        let mut vibration = XINPUT_VIBRATION {
            wLeftMotorSpeed: (left.clamp(0.0, 1.0) * 65535.0) as u16,
            wRightMotorSpeed: (right.clamp(0.0, 1.0) * 65535.0) as u16,
        };
        unsafe { XInputSetState(self.index, &mut vibration) == ERROR_SUCCESS }
    }

    fn rumble_sink(&self) -> Option<Arc<dyn RumbleSink>> {
        if self.device_state != DeviceState::Ok {
            return None;
        }
        Some(Arc::new(XInputRumbleSink { index: self.index }))
    }
}
