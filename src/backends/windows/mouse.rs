//! Win32 mouse backends.
//!
//! The standard variant reads pointer state from window messages
//! (`WM_MOUSEMOVE`, the button pairs, `WM_MOUSEWHEEL`). The raw variant
//! reads `WM_INPUT` mouse packets and accumulates `MOUSE_MOVE_RELATIVE`
//! deltas (absolute packets pass straight through). Either way the wheel
//! count also accumulates into the middle-button float so callers tracking
//! spin totals keep their aggregate.

use log::debug;
use windows_sys::Win32::Devices::HumanInterfaceDevice::{
    MOUSE_MOVE_ABSOLUTE, MOUSE_MOVE_RELATIVE,
};
use windows_sys::Win32::UI::Input::RIM_TYPEMOUSE;
use windows_sys::Win32::UI::WindowsAndMessaging::*;

use crate::backends::PlatformEvent;
use crate::buttons::MouseButton;
use crate::device::DeviceVariant;
use crate::devices::mouse::{MouseBackend, MouseContext};

const RI_MOUSE_BUTTON_1_DOWN: u16 = 0x0001;
const RI_MOUSE_BUTTON_1_UP: u16 = 0x0002;
const RI_MOUSE_BUTTON_2_DOWN: u16 = 0x0004;
const RI_MOUSE_BUTTON_2_UP: u16 = 0x0008;
const RI_MOUSE_BUTTON_3_DOWN: u16 = 0x0010;
const RI_MOUSE_BUTTON_3_UP: u16 = 0x0020;
const RI_MOUSE_BUTTON_4_DOWN: u16 = 0x0040;
const RI_MOUSE_BUTTON_4_UP: u16 = 0x0080;
const RI_MOUSE_BUTTON_5_DOWN: u16 = 0x0100;
const RI_MOUSE_BUTTON_5_UP: u16 = 0x0200;
const RI_MOUSE_WHEEL: u16 = 0x0400;

const WHEEL_NOTCH: i16 = 120;

pub struct WinMouseBackend {
    raw: bool,
    accumulated: (f32, f32),
    baseline: Option<(f32, f32)>,
    wheel_total: f32,
}

impl WinMouseBackend {
    pub fn new(raw: bool) -> Self {
        Self {
            raw,
            accumulated: (0.0, 0.0),
            baseline: None,
            wheel_total: 0.0,
        }
    }

    fn wheel(&mut self, ctx: &mut MouseContext, delta: i16) {
        let notches = i32::from(delta / WHEEL_NOTCH);
        if notches == 0 {
            return;
        }
        for _ in 0..notches.unsigned_abs() {
            ctx.wheel_tick(notches > 0);
        }
        self.wheel_total += notches as f32;
        ctx.set_axis(MouseButton::Middle, self.wheel_total);
    }

    fn handle_raw_packet(&mut self, ctx: &mut MouseContext, lparam: isize) {
        let Some(raw) = super::read_raw_input(lparam) else {
            return;
        };
        unsafe {
            if raw.header.dwType != RIM_TYPEMOUSE {
                return;
            }
            let mouse = raw.data.mouse;

            if mouse.usFlags & MOUSE_MOVE_ABSOLUTE != 0 {
                ctx.set_axis(MouseButton::AxisX, mouse.lLastX as f32);
                ctx.set_axis(MouseButton::AxisY, mouse.lLastY as f32);
            } else if mouse.usFlags == MOUSE_MOVE_RELATIVE {
                self.accumulated.0 += mouse.lLastX as f32;
                self.accumulated.1 += mouse.lLastY as f32;
                ctx.set_axis(MouseButton::AxisX, self.accumulated.0);
                ctx.set_axis(MouseButton::AxisY, self.accumulated.1);
            }

            let flags = mouse.Anonymous.Anonymous.usButtonFlags;
            if flags & RI_MOUSE_WHEEL != 0 {
                self.wheel(ctx, mouse.Anonymous.Anonymous.usButtonData as i16);
                return;
            }

            for (down, up, button) in [
                (RI_MOUSE_BUTTON_1_DOWN, RI_MOUSE_BUTTON_1_UP, MouseButton::Left),
                (RI_MOUSE_BUTTON_2_DOWN, RI_MOUSE_BUTTON_2_UP, MouseButton::Right),
                (RI_MOUSE_BUTTON_3_DOWN, RI_MOUSE_BUTTON_3_UP, MouseButton::Middle),
                (RI_MOUSE_BUTTON_4_DOWN, RI_MOUSE_BUTTON_4_UP, MouseButton::Button5),
                (RI_MOUSE_BUTTON_5_DOWN, RI_MOUSE_BUTTON_5_UP, MouseButton::Button6),
            ] {
                if flags & down != 0 {
                    ctx.set_button(button, true);
                }
                if flags & up != 0 {
                    ctx.set_button(button, false);
                }
            }
        }
    }
}

impl MouseBackend for WinMouseBackend {
    fn variant(&self) -> DeviceVariant {
        if self.raw {
            DeviceVariant::Raw
        } else {
            DeviceVariant::Standard
        }
    }

    fn device_name(&self) -> &str {
        "Win32 mouse"
    }

    fn warp(&mut self, x: f32, y: f32) {
        self.baseline = Some((x, y));
    }

    fn handle_event(&mut self, event: &PlatformEvent, ctx: &mut MouseContext) {
        let PlatformEvent::WinMsg(msg) = event else {
            return;
        };

        if self.raw {
            if msg.message == WM_INPUT {
                self.handle_raw_packet(ctx, msg.lParam);
            }
            return;
        }

        match msg.message {
            WM_MOUSEMOVE => {
                let x = (msg.lParam & 0xFFFF) as i16 as f32;
                let y = ((msg.lParam >> 16) & 0xFFFF) as i16 as f32;
                // A warp swallows exactly the report it requested.
                if self.baseline.take() == Some((x, y)) {
                    return;
                }
                ctx.set_axis(MouseButton::AxisX, x);
                ctx.set_axis(MouseButton::AxisY, y);
            }
            WM_LBUTTONDOWN => ctx.set_button(MouseButton::Left, true),
            WM_LBUTTONUP => ctx.set_button(MouseButton::Left, false),
            WM_RBUTTONDOWN => ctx.set_button(MouseButton::Right, true),
            WM_RBUTTONUP => ctx.set_button(MouseButton::Right, false),
            WM_MBUTTONDOWN => ctx.set_button(MouseButton::Middle, true),
            WM_MBUTTONUP => ctx.set_button(MouseButton::Middle, false),
            WM_XBUTTONDOWN => ctx.set_button(MouseButton::Button5, true),
            WM_XBUTTONUP => ctx.set_button(MouseButton::Button5, false),
            WM_MOUSEWHEEL => {
                let delta = ((msg.wParam >> 16) & 0xFFFF) as u16 as i16;
                self.wheel(ctx, delta);
            }
            other => debug!("ignored mouse message {other:#06x}"),
        }
    }
}
