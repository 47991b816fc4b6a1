//! Win32 keyboard backends.
//!
//! The standard variant consumes `WM_KEYDOWN`/`WM_KEYUP` (+ the `WM_SYSKEY`
//! pair) and takes text from `WM_CHAR`. The raw variant consumes `WM_INPUT`
//! keyboard packets, where left/right modifiers need the hardware scancode:
//! right shift reports `MakeCode` 0x36, and right Ctrl/Alt carry the
//! `RI_KEY_E0` extended-key flag.

use log::debug;
use windows_sys::Win32::UI::Input::KeyboardAndMouse::*;
use windows_sys::Win32::UI::Input::RIM_TYPEKEYBOARD;
use windows_sys::Win32::UI::WindowsAndMessaging::*;

use crate::backends::PlatformEvent;
use crate::buttons::Key;
use crate::containers::DenseHashMap;
use crate::device::DeviceVariant;
use crate::devices::keyboard::{KeyboardBackend, KeyboardContext};

const RI_KEY_BREAK: u16 = 0x0001;
const RI_KEY_E0: u16 = 0x0002;

/// Right-shift hardware scancode; VK_SHIFT alone cannot tell the sides
/// apart.
const MAKECODE_SHIFT_RIGHT: u16 = 0x36;

fn dialect() -> DenseHashMap<u32, Key> {
    let mut dialect: DenseHashMap<u32, Key> = DenseHashMap::new();
    let mut map = |vk: VIRTUAL_KEY, key: Key| {
        dialect.insert(vk as u32, key);
    };

    map(VK_ESCAPE, Key::Escape);
    map(VK_F1, Key::F1);
    map(VK_F2, Key::F2);
    map(VK_F3, Key::F3);
    map(VK_F4, Key::F4);
    map(VK_F5, Key::F5);
    map(VK_F6, Key::F6);
    map(VK_F7, Key::F7);
    map(VK_F8, Key::F8);
    map(VK_F9, Key::F9);
    map(VK_F10, Key::F10);
    map(VK_F11, Key::F11);
    map(VK_F12, Key::F12);
    map(VK_SNAPSHOT, Key::Print);
    map(VK_SCROLL, Key::ScrollLock);
    map(VK_PAUSE, Key::Break);

    map(VK_SPACE, Key::Space);
    map(VK_OEM_COMMA, Key::Comma);
    map(VK_OEM_MINUS, Key::Minus);
    map(VK_OEM_PERIOD, Key::Period);

    for (i, key) in [
        Key::N0,
        Key::N1,
        Key::N2,
        Key::N3,
        Key::N4,
        Key::N5,
        Key::N6,
        Key::N7,
        Key::N8,
        Key::N9,
    ]
    .into_iter()
    .enumerate()
    {
        dialect.insert(b'0' as u32 + i as u32, key);
    }
    for (i, key) in [
        Key::A,
        Key::B,
        Key::C,
        Key::D,
        Key::E,
        Key::F,
        Key::G,
        Key::H,
        Key::I,
        Key::J,
        Key::K,
        Key::L,
        Key::M,
        Key::N,
        Key::O,
        Key::P,
        Key::Q,
        Key::R,
        Key::S,
        Key::T,
        Key::U,
        Key::V,
        Key::W,
        Key::X,
        Key::Y,
        Key::Z,
    ]
    .into_iter()
    .enumerate()
    {
        dialect.insert(b'A' as u32 + i as u32, key);
    }

    let mut map = |vk: VIRTUAL_KEY, key: Key| {
        dialect.insert(vk as u32, key);
    };
    map(VK_LEFT, Key::Left);
    map(VK_RIGHT, Key::Right);
    map(VK_UP, Key::Up);
    map(VK_DOWN, Key::Down);
    map(VK_INSERT, Key::Insert);
    map(VK_HOME, Key::Home);
    map(VK_DELETE, Key::Delete);
    map(VK_END, Key::End);
    map(VK_PRIOR, Key::PageUp);
    map(VK_NEXT, Key::PageDown);

    map(VK_NUMLOCK, Key::NumLock);
    map(VK_DIVIDE, Key::KpDivide);
    map(VK_MULTIPLY, Key::KpMultiply);
    map(VK_SUBTRACT, Key::KpSubtract);
    map(VK_ADD, Key::KpAdd);
    map(VK_NUMPAD0, Key::KpInsert);
    map(VK_NUMPAD1, Key::KpEnd);
    map(VK_NUMPAD2, Key::KpDown);
    map(VK_NUMPAD3, Key::KpPageDown);
    map(VK_NUMPAD4, Key::KpLeft);
    map(VK_NUMPAD5, Key::KpBegin);
    map(VK_NUMPAD6, Key::KpRight);
    map(VK_NUMPAD7, Key::KpHome);
    map(VK_NUMPAD8, Key::KpUp);
    map(VK_NUMPAD9, Key::KpPageUp);
    map(VK_DECIMAL, Key::KpDelete);

    map(VK_BACK, Key::BackSpace);
    map(VK_TAB, Key::Tab);
    map(VK_RETURN, Key::Return);
    map(VK_CAPITAL, Key::CapsLock);
    map(VK_SHIFT, Key::ShiftL);
    map(VK_LSHIFT, Key::ShiftL);
    map(VK_RSHIFT, Key::ShiftR);
    map(VK_CONTROL, Key::CtrlL);
    map(VK_LCONTROL, Key::CtrlL);
    map(VK_RCONTROL, Key::CtrlR);
    map(VK_MENU, Key::AltL);
    map(VK_LMENU, Key::AltL);
    map(VK_RMENU, Key::AltR);
    map(VK_LWIN, Key::SuperL);
    map(VK_RWIN, Key::SuperR);
    map(VK_APPS, Key::Menu);

    map(VK_VOLUME_MUTE, Key::Mute);
    map(VK_VOLUME_DOWN, Key::VolumeDown);
    map(VK_VOLUME_UP, Key::VolumeUp);
    map(VK_MEDIA_PLAY_PAUSE, Key::MediaPlayPause);
    map(VK_MEDIA_STOP, Key::MediaStop);
    map(VK_MEDIA_NEXT_TRACK, Key::MediaNext);
    map(VK_MEDIA_PREV_TRACK, Key::MediaPrevious);

    map(VK_OEM_1, Key::Semicolon);
    map(VK_OEM_2, Key::Slash);
    map(VK_OEM_3, Key::Grave);
    map(VK_OEM_4, Key::BracketLeft);
    map(VK_OEM_5, Key::Backslash);
    map(VK_OEM_6, Key::BracketRight);
    map(VK_OEM_7, Key::Apostrophe);
    map(VK_OEM_PLUS, Key::Plus);

    dialect
}

pub struct WinKeyboardBackend {
    raw: bool,
    dialect: DenseHashMap<u32, Key>,
}

impl WinKeyboardBackend {
    pub fn new(raw: bool) -> Self {
        Self {
            raw,
            dialect: dialect(),
        }
    }

    fn handle_vkey(&self, ctx: &mut KeyboardContext, vkey: u32, pressed: bool) {
        match self.dialect.get(&vkey) {
            Some(key) => ctx.set_key(*key, pressed),
            None => debug!("unmapped virtual key {vkey:#04x}"),
        }
    }

    fn handle_raw_packet(&self, ctx: &mut KeyboardContext, lparam: isize) {
        let Some(raw) = super::read_raw_input(lparam) else {
            return;
        };
        unsafe {
            if raw.header.dwType != RIM_TYPEKEYBOARD {
                return;
            }
            let kbd = raw.data.keyboard;
            let pressed = kbd.Flags & RI_KEY_BREAK == 0;
            let extended = kbd.Flags & RI_KEY_E0 != 0;

            // Sided modifiers: the VKey alone is ambiguous.
            let key = match kbd.VKey as u32 {
                vk if vk == VK_SHIFT as u32 => {
                    if kbd.MakeCode == MAKECODE_SHIFT_RIGHT {
                        Some(Key::ShiftR)
                    } else {
                        Some(Key::ShiftL)
                    }
                }
                vk if vk == VK_CONTROL as u32 => {
                    Some(if extended { Key::CtrlR } else { Key::CtrlL })
                }
                vk if vk == VK_MENU as u32 => {
                    Some(if extended { Key::AltR } else { Key::AltL })
                }
                vk => self.dialect.get(&vk).copied(),
            };

            match key {
                Some(key) => ctx.set_key(key, pressed),
                None => debug!("unmapped raw virtual key {:#04x}", kbd.VKey),
            }
        }
    }
}

impl KeyboardBackend for WinKeyboardBackend {
    fn variant(&self) -> DeviceVariant {
        if self.raw {
            DeviceVariant::Raw
        } else {
            DeviceVariant::Standard
        }
    }

    fn device_name(&self) -> &str {
        "Win32 keyboard"
    }

    fn handle_event(&mut self, event: &PlatformEvent, ctx: &mut KeyboardContext) {
        let PlatformEvent::WinMsg(msg) = event else {
            return;
        };

        match msg.message {
            WM_INPUT if self.raw => self.handle_raw_packet(ctx, msg.lParam),
            WM_KEYDOWN | WM_SYSKEYDOWN if !self.raw => {
                self.handle_vkey(ctx, msg.wParam as u32, true);
            }
            WM_KEYUP | WM_SYSKEYUP if !self.raw => {
                self.handle_vkey(ctx, msg.wParam as u32, false);
            }
            WM_CHAR => {
                if let Some(c) = char::from_u32(msg.wParam as u32) {
                    if !c.is_control() {
                        ctx.push_text(c);
                    }
                }
            }
            _ => {}
        }
    }
}
