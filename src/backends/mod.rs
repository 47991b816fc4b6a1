//! Platform backends.
//!
//! Backends implement the per-kind backend traits from
//! [`crate::devices`] and translate one platform's raw events into the
//! canonical button space. The manager routes every platform event to every
//! device; backends ignore events that do not concern them.

pub mod null;
pub mod synthetic;

#[cfg(target_os = "linux")]
pub mod evdev;
#[cfg(target_os = "linux")]
pub mod joystick;
#[cfg(target_os = "linux")]
pub mod x11;

#[cfg(windows)]
pub mod windows;

#[cfg(feature = "hid")]
pub mod hid;

use crate::buttons::{Key, MouseButton, PadButton};
use crate::device::DeviceVariant;
use crate::devices::{KeyboardBackend, MouseBackend, PadBackend, TouchBackend};

/// An opaque platform event offered to every device.
///
/// The variants wrap borrowed platform payloads; the manager never inspects
/// them itself.
pub enum PlatformEvent<'a> {
    /// An X11 event (`KeyPress`/`KeyRelease`/`MotionNotify`/`ButtonPress`/
    /// `ButtonRelease` are inspected).
    #[cfg(target_os = "linux")]
    X11(&'a ::x11::xlib::XEvent),
    /// A Win32 window message.
    #[cfg(windows)]
    WinMsg(&'a windows_sys::Win32::UI::WindowsAndMessaging::MSG),
    /// A synthetic event from tests or embedder glue.
    Synthetic(&'a SyntheticEvent),
}

/// Pre-translated events for the synthetic source.
///
/// Carried through the same entry-point machinery as OS events so the full
/// translate -> stage -> commit -> notify pipeline is exercised.
#[derive(Clone, Copy, Debug)]
pub enum SyntheticEvent {
    Key {
        index: u32,
        key: Key,
        pressed: bool,
        character: Option<char>,
    },
    MouseButton {
        index: u32,
        button: MouseButton,
        pressed: bool,
    },
    MouseMove {
        index: u32,
        x: f32,
        y: f32,
    },
    MouseWheel {
        index: u32,
        /// Positive notches scroll up.
        notches: i32,
    },
    PadButton {
        slot: u32,
        button: PadButton,
        pressed: bool,
    },
    /// Raw normalized axis value, pre-dead-zone.
    PadAxis {
        slot: u32,
        button: PadButton,
        value: f32,
    },
    PadConnection {
        slot: u32,
        connected: bool,
    },
    Touch {
        index: u32,
        finger: usize,
        down: bool,
        x: f32,
        y: f32,
        pressure: f32,
    },
}

/// Picks the platform keyboard backend for a variant, falling back to the
/// null backend where the platform has no implementation.
pub(crate) fn default_keyboard_backend(index: u32, variant: DeviceVariant) -> Box<dyn KeyboardBackend> {
    match variant {
        DeviceVariant::Synthetic => Box::new(synthetic::SyntheticKeyboardBackend::new(index)),
        DeviceVariant::Null => Box::new(null::NullKeyboardBackend),
        #[cfg(target_os = "linux")]
        DeviceVariant::Standard => Box::new(x11::X11KeyboardBackend::new()),
        #[cfg(target_os = "linux")]
        DeviceVariant::Raw => match evdev::EvdevKeyboardBackend::open() {
            Some(backend) => Box::new(backend),
            None => Box::new(null::NullKeyboardBackend),
        },
        #[cfg(windows)]
        DeviceVariant::Standard => Box::new(windows::keyboard::WinKeyboardBackend::new(false)),
        #[cfg(windows)]
        DeviceVariant::Raw => Box::new(windows::keyboard::WinKeyboardBackend::new(true)),
        #[cfg(not(any(target_os = "linux", windows)))]
        _ => Box::new(null::NullKeyboardBackend),
    }
}

/// Picks the platform mouse backend for a variant.
pub(crate) fn default_mouse_backend(index: u32, variant: DeviceVariant) -> Box<dyn MouseBackend> {
    match variant {
        DeviceVariant::Synthetic => Box::new(synthetic::SyntheticMouseBackend::new(index)),
        DeviceVariant::Null => Box::new(null::NullMouseBackend),
        #[cfg(target_os = "linux")]
        DeviceVariant::Standard => Box::new(x11::X11MouseBackend::new(false)),
        #[cfg(target_os = "linux")]
        DeviceVariant::Raw => Box::new(x11::X11MouseBackend::new(true)),
        #[cfg(windows)]
        DeviceVariant::Standard => Box::new(windows::mouse::WinMouseBackend::new(false)),
        #[cfg(windows)]
        DeviceVariant::Raw => Box::new(windows::mouse::WinMouseBackend::new(true)),
        #[cfg(not(any(target_os = "linux", windows)))]
        _ => Box::new(null::NullMouseBackend),
    }
}

/// Picks the platform pad prober for a pool slot.
pub(crate) fn default_pad_backend(
    index: u32,
    mappings: &std::sync::Arc<crate::mapping::MappingDatabase>,
) -> Box<dyn PadBackend> {
    #[cfg(target_os = "linux")]
    {
        Box::new(joystick::JoystickPadBackend::with_mappings(
            index,
            mappings.clone(),
        ))
    }
    #[cfg(windows)]
    {
        let _ = mappings;
        if index < windows::xinput::XINPUT_SLOT_COUNT {
            Box::new(windows::xinput::XInputPadBackend::new(index))
        } else {
            Box::new(null::NullPadBackend)
        }
    }
    #[cfg(not(any(target_os = "linux", windows)))]
    {
        let _ = (index, mappings);
        Box::new(null::NullPadBackend)
    }
}

/// Picks the touch backend (synthetic or null on desktop platforms).
pub(crate) fn default_touch_backend(index: u32, variant: DeviceVariant) -> Box<dyn TouchBackend> {
    match variant {
        DeviceVariant::Synthetic => Box::new(synthetic::SyntheticTouchBackend::new(index)),
        _ => Box::new(null::NullTouchBackend),
    }
}
