//! X11 keyboard and mouse backends.
//!
//! Keycodes are resolved through `XkbKeycodeToKeysym` and translated via an
//! `XK_*` dialect map; printable text is extracted with `XLookupString`.
//! The mouse comes in two variants: `Standard` reports absolute window
//! coordinates from `MotionNotify`, `Raw` accumulates deltas against the
//! previous absolute position so pointer-lock style consumers get unbounded
//! motion. Only `KeyPress`/`KeyRelease`/`MotionNotify`/`ButtonPress`/
//! `ButtonRelease` are inspected.

use log::debug;
use x11::keysym::*;
use x11::xlib;

use crate::backends::PlatformEvent;
use crate::buttons::{Key, MouseButton};
use crate::containers::DenseHashMap;
use crate::device::DeviceVariant;
use crate::devices::keyboard::{KeyboardBackend, KeyboardContext};
use crate::devices::mouse::{MouseBackend, MouseContext};

// XF86 media keysyms, cf. <X11/XF86keysym.h>.
const XF86XK_AUDIO_MUTE: u32 = 0x1008_FF12;
const XF86XK_AUDIO_LOWER_VOLUME: u32 = 0x1008_FF11;
const XF86XK_AUDIO_RAISE_VOLUME: u32 = 0x1008_FF13;
const XF86XK_AUDIO_PLAY: u32 = 0x1008_FF14;
const XF86XK_AUDIO_STOP: u32 = 0x1008_FF15;
const XF86XK_AUDIO_PREV: u32 = 0x1008_FF16;
const XF86XK_AUDIO_NEXT: u32 = 0x1008_FF17;

pub struct X11KeyboardBackend {
    dialect: DenseHashMap<u32, Key>,
}

impl Default for X11KeyboardBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl X11KeyboardBackend {
    pub fn new() -> Self {
        let mut dialect: DenseHashMap<u32, Key> = DenseHashMap::new();
        let mut map = |keysym: u32, key: Key| {
            dialect.insert(keysym, key);
        };

        // Cf. <X11/keysymdef.h>
        map(XK_Escape, Key::Escape);
        map(XK_F1, Key::F1);
        map(XK_F2, Key::F2);
        map(XK_F3, Key::F3);
        map(XK_F4, Key::F4);
        map(XK_F5, Key::F5);
        map(XK_F6, Key::F6);
        map(XK_F7, Key::F7);
        map(XK_F8, Key::F8);
        map(XK_F9, Key::F9);
        map(XK_F10, Key::F10);
        map(XK_F11, Key::F11);
        map(XK_F12, Key::F12);
        map(XK_Print, Key::Print);
        map(XK_Scroll_Lock, Key::ScrollLock);
        map(XK_Pause, Key::Break);

        map(XK_space, Key::Space);
        map(XK_apostrophe, Key::Apostrophe);
        map(XK_comma, Key::Comma);
        map(XK_minus, Key::Minus);
        map(XK_period, Key::Period);
        map(XK_slash, Key::Slash);

        map(XK_0, Key::N0);
        map(XK_1, Key::N1);
        map(XK_2, Key::N2);
        map(XK_3, Key::N3);
        map(XK_4, Key::N4);
        map(XK_5, Key::N5);
        map(XK_6, Key::N6);
        map(XK_7, Key::N7);
        map(XK_8, Key::N8);
        map(XK_9, Key::N9);

        map(XK_semicolon, Key::Semicolon);
        map(XK_less, Key::Less);
        map(XK_equal, Key::Equal);

        map(XK_a, Key::A);
        map(XK_b, Key::B);
        map(XK_c, Key::C);
        map(XK_d, Key::D);
        map(XK_e, Key::E);
        map(XK_f, Key::F);
        map(XK_g, Key::G);
        map(XK_h, Key::H);
        map(XK_i, Key::I);
        map(XK_j, Key::J);
        map(XK_k, Key::K);
        map(XK_l, Key::L);
        map(XK_m, Key::M);
        map(XK_n, Key::N);
        map(XK_o, Key::O);
        map(XK_p, Key::P);
        map(XK_q, Key::Q);
        map(XK_r, Key::R);
        map(XK_s, Key::S);
        map(XK_t, Key::T);
        map(XK_u, Key::U);
        map(XK_v, Key::V);
        map(XK_w, Key::W);
        map(XK_x, Key::X);
        map(XK_y, Key::Y);
        map(XK_z, Key::Z);

        map(XK_bracketleft, Key::BracketLeft);
        map(XK_backslash, Key::Backslash);
        map(XK_bracketright, Key::BracketRight);
        map(XK_grave, Key::Grave);

        map(XK_Left, Key::Left);
        map(XK_Right, Key::Right);
        map(XK_Up, Key::Up);
        map(XK_Down, Key::Down);
        map(XK_Insert, Key::Insert);
        map(XK_Home, Key::Home);
        map(XK_Delete, Key::Delete);
        map(XK_End, Key::End);
        map(XK_Page_Up, Key::PageUp);
        map(XK_Page_Down, Key::PageDown);

        map(XK_Num_Lock, Key::NumLock);
        map(XK_KP_Divide, Key::KpDivide);
        map(XK_KP_Multiply, Key::KpMultiply);
        map(XK_KP_Subtract, Key::KpSubtract);
        map(XK_KP_Add, Key::KpAdd);
        map(XK_KP_Enter, Key::KpEnter);
        map(XK_KP_Insert, Key::KpInsert);
        map(XK_KP_End, Key::KpEnd);
        map(XK_KP_Down, Key::KpDown);
        map(XK_KP_Page_Down, Key::KpPageDown);
        map(XK_KP_Left, Key::KpLeft);
        map(XK_KP_Begin, Key::KpBegin);
        map(XK_KP_Right, Key::KpRight);
        map(XK_KP_Home, Key::KpHome);
        map(XK_KP_Up, Key::KpUp);
        map(XK_KP_Page_Up, Key::KpPageUp);
        map(XK_KP_Delete, Key::KpDelete);

        map(XK_BackSpace, Key::BackSpace);
        map(XK_Tab, Key::Tab);
        map(XK_Return, Key::Return);
        map(XK_Caps_Lock, Key::CapsLock);
        map(XK_Shift_L, Key::ShiftL);
        map(XK_Control_L, Key::CtrlL);
        map(XK_Super_L, Key::SuperL);
        map(XK_Alt_L, Key::AltL);
        map(XK_Alt_R, Key::AltR);
        map(XK_Super_R, Key::SuperR);
        map(XK_Menu, Key::Menu);
        map(XK_Control_R, Key::CtrlR);
        map(XK_Shift_R, Key::ShiftR);

        map(XF86XK_AUDIO_MUTE, Key::Mute);
        map(XF86XK_AUDIO_LOWER_VOLUME, Key::VolumeDown);
        map(XF86XK_AUDIO_RAISE_VOLUME, Key::VolumeUp);
        map(XF86XK_AUDIO_PLAY, Key::MediaPlayPause);
        map(XF86XK_AUDIO_STOP, Key::MediaStop);
        map(XF86XK_AUDIO_NEXT, Key::MediaNext);
        map(XF86XK_AUDIO_PREV, Key::MediaPrevious);

        map(XK_dead_circumflex, Key::Circumflex);
        map(XK_ssharp, Key::Ssharp);
        map(XK_dead_acute, Key::Acute);
        map(XK_ISO_Level3_Shift, Key::AltGr);
        map(XK_plus, Key::Plus);
        map(XK_numbersign, Key::Numbersign);
        map(XK_udiaeresis, Key::Udiaeresis);
        map(XK_adiaeresis, Key::Adiaeresis);
        map(XK_odiaeresis, Key::Odiaeresis);
        map(XK_section, Key::Section);
        map(XK_aring, Key::Aring);
        map(XK_dead_diaeresis, Key::Diaeresis);
        map(XK_twosuperior, Key::Twosuperior);
        map(XK_parenright, Key::RightParenthesis);
        map(XK_dollar, Key::Dollar);
        map(XK_ugrave, Key::Ugrave);
        map(XK_asterisk, Key::Asterisk);
        map(XK_colon, Key::Colon);
        map(XK_exclam, Key::Exclam);

        Self { dialect }
    }
}

impl KeyboardBackend for X11KeyboardBackend {
    fn variant(&self) -> DeviceVariant {
        DeviceVariant::Standard
    }

    fn device_name(&self) -> &str {
        "X11 keyboard"
    }

    fn handle_event(&mut self, event: &PlatformEvent, ctx: &mut KeyboardContext) {
        let PlatformEvent::X11(event) = event else {
            return;
        };

        // SAFETY: the event type discriminates which union member is valid.
        unsafe {
            let ty = event.get_type();
            if ty != xlib::KeyPress && ty != xlib::KeyRelease {
                return;
            }
            let mut key_event: xlib::XKeyEvent = event.key;
            let keysym = xlib::XkbKeycodeToKeysym(key_event.display, key_event.keycode as u8, 0, 0);
            let pressed = ty == xlib::KeyPress;

            let Some(key) = self.dialect.get(&(keysym as u32)).copied() else {
                debug!("unmapped X11 keycode {} keysym {}", key_event.keycode, keysym);
                return;
            };

            if pressed {
                let mut buf = [0u8; 32];
                let len = xlib::XLookupString(
                    &mut key_event,
                    buf.as_mut_ptr() as *mut i8,
                    buf.len() as i32,
                    std::ptr::null_mut(),
                    std::ptr::null_mut(),
                );
                if len == 1 {
                    ctx.push_text(buf[0] as char);
                }
            }

            ctx.set_key(key, pressed);
        }
    }
}

/// X11 mouse backend. `raw` selects delta accumulation over absolute
/// coordinates.
pub struct X11MouseBackend {
    raw: bool,
    prev_absolute: Option<(f32, f32)>,
    accumulated: (f32, f32),
}

impl X11MouseBackend {
    pub fn new(raw: bool) -> Self {
        Self {
            raw,
            prev_absolute: None,
            accumulated: (0.0, 0.0),
        }
    }
}

impl MouseBackend for X11MouseBackend {
    fn variant(&self) -> DeviceVariant {
        if self.raw {
            DeviceVariant::Raw
        } else {
            DeviceVariant::Standard
        }
    }

    fn device_name(&self) -> &str {
        "X11 mouse"
    }

    fn warp(&mut self, x: f32, y: f32) {
        self.prev_absolute = Some((x, y));
    }

    fn handle_event(&mut self, event: &PlatformEvent, ctx: &mut MouseContext) {
        let PlatformEvent::X11(event) = event else {
            return;
        };

        // SAFETY: the event type discriminates which union member is valid.
        unsafe {
            let ty = event.get_type();
            match ty {
                xlib::MotionNotify => {
                    let motion = event.motion;
                    let (x, y) = (motion.x as f32, motion.y as f32);
                    if self.raw {
                        let (px, py) = self.prev_absolute.unwrap_or((x, y));
                        self.accumulated.0 += x - px;
                        self.accumulated.1 += y - py;
                        self.prev_absolute = Some((x, y));
                        ctx.set_axis(MouseButton::AxisX, self.accumulated.0);
                        ctx.set_axis(MouseButton::AxisY, self.accumulated.1);
                    } else {
                        ctx.set_axis(MouseButton::AxisX, x);
                        ctx.set_axis(MouseButton::AxisY, y);
                    }
                }
                xlib::ButtonPress | xlib::ButtonRelease => {
                    let button_event = event.button;
                    let pressed = ty == xlib::ButtonPress;
                    match button_event.button {
                        1 => ctx.set_button(MouseButton::Left, pressed),
                        2 => ctx.set_button(MouseButton::Middle, pressed),
                        3 => ctx.set_button(MouseButton::Right, pressed),
                        // Wheel notches arrive as press events; releases are
                        // synthesized by the façade one tick later.
                        4 if pressed => ctx.wheel_tick(true),
                        5 if pressed => ctx.wheel_tick(false),
                        8 => ctx.set_button(MouseButton::Button5, pressed),
                        9 => ctx.set_button(MouseButton::Button6, pressed),
                        other => debug!("unmapped X11 mouse button {other}"),
                    }
                }
                _ => {}
            }
        }
    }
}
