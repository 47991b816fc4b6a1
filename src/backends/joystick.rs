//! Linux joystick pad backend.
//!
//! Each pool slot owns `/dev/input/js<index>`: an inotify watch on
//! `/dev/input/` drives hot-plug (IN_CREATE re-probes, IN_DELETE tears
//! down), and the joystick API's 8-byte event records feed the canonical
//! space through the slot's dialect.
//!
//! Dialect resolution, most specific first: a handful of controllers known
//! by name, then the GUID mapping database (keyed by the name-derived
//! Bluetooth-style GUID, which is all the legacy joystick API exposes), then
//! the built-in default mapping. DualShock 4 hardware is skipped here
//! entirely; the unified HID layer owns it.

use std::os::unix::io::RawFd;
use std::sync::Arc;

use inotify::{EventMask, Inotify, WatchMask};
use log::{debug, info, warn};

use crate::buttons::{DeviceButtonId, PadButton, PAD_AXIS_COUNT};
use crate::containers::DenseHashMap;
use crate::device::{DeviceState, DeviceVariant};
use crate::devices::pad::{PadBackend, PadContext};
use crate::mapping::{MappingDatabase, PadGuid, PadMapping, RawTarget};

use crate::evaluate::MAX_AXIS_VALUE;

const JS_EVENT_BUTTON: u8 = 0x01;
const JS_EVENT_AXIS: u8 = 0x02;
const JS_EVENT_INIT: u8 = 0x80;

#[repr(C)]
#[derive(Clone, Copy)]
struct JsEvent {
    time: u32,
    value: i16,
    type_: u8,
    number: u8,
}

const IOC_READ: libc::c_ulong = 2;

fn jsiocgname(len: usize) -> libc::c_ulong {
    (IOC_READ << 30) | ((len as libc::c_ulong) << 16) | ((b'j' as libc::c_ulong) << 8) | 0x13
}

/// Per-device translation tables; raw index to canonical id.
struct JoystickDialect {
    buttons: DenseHashMap<u32, PadButton>,
    axes: DenseHashMap<u32, PadButton>,
    /// Raw axes carrying the dpad (xpad-style hats show up as axes 6/7).
    dpad_axes: (Option<u8>, Option<u8>),
}

impl JoystickDialect {
    fn empty() -> Self {
        Self {
            buttons: DenseHashMap::new(),
            axes: DenseHashMap::new(),
            dpad_axes: (None, None),
        }
    }

    /// Identity axis layout used as the base for every dialect.
    fn identity_axes() -> Self {
        let mut dialect = Self::empty();
        for i in 0..PAD_AXIS_COUNT as u32 {
            if let Some(button) = pad_button_from_id(i) {
                dialect.axes.insert(i, button);
            }
        }
        dialect
    }

    /// Builds translation tables from a parsed mapping string.
    fn from_mapping(mapping: &PadMapping) -> Self {
        let mut dialect = Self::empty();

        for (slot, target) in mapping.buttons.iter().enumerate() {
            if let Some(RawTarget::Button(raw)) = target {
                if let Some(mapped) = mapped_button_at(slot) {
                    dialect.buttons.insert(*raw as u32, mapped);
                }
            }
        }
        for (slot, target) in mapping.axes.iter().enumerate() {
            if let Some(mapped) = mapped_axis_at(slot) {
                match target {
                    Some(RawTarget::Axis(raw)) => {
                        dialect.axes.insert(*raw as u32, mapped);
                    }
                    // Digital triggers wired to raw buttons.
                    Some(RawTarget::Button(raw)) => {
                        dialect.buttons.insert(*raw as u32, mapped);
                    }
                    _ => {}
                }
            }
        }

        // Mapping strings express the dpad as hat masks; the joystick API
        // reports those hats as a trailing axis pair.
        let has_hats = mapping.hats.iter().any(|m| *m != 0);
        if has_hats && dialect.axes.get(&6).is_none() && dialect.axes.get(&7).is_none() {
            dialect.dpad_axes = (Some(6), Some(7));
        }

        dialect
    }

    /// The wired X-Box layout (also what the Steam Deck exposes).
    fn xbox() -> Self {
        let mut dialect = Self::empty();
        for (raw, button) in [
            (0u32, PadButton::A),
            (1, PadButton::B),
            (2, PadButton::X),
            (3, PadButton::Y),
            (4, PadButton::L1),
            (5, PadButton::R1),
            (6, PadButton::Select),
            (7, PadButton::Start),
            (8, PadButton::Home),
            (9, PadButton::L3),
            (10, PadButton::R3),
        ] {
            dialect.buttons.insert(raw, button);
        }
        for (raw, axis) in [
            (0u32, PadButton::LeftStickX),
            (1, PadButton::LeftStickY),
            (2, PadButton::Axis4),
            (3, PadButton::RightStickX),
            (4, PadButton::RightStickY),
            (5, PadButton::Axis5),
        ] {
            dialect.axes.insert(raw, axis);
        }
        dialect.dpad_axes = (Some(6), Some(7));
        dialect
    }

    /// The PLAYSTATION(R)3 layout; everything is a button.
    fn ps3() -> Self {
        let mut dialect = Self::identity_axes();
        for (raw, button) in [
            (0u32, PadButton::Select),
            (1, PadButton::L3),
            (2, PadButton::R3),
            (3, PadButton::Start),
            (4, PadButton::Up),
            (5, PadButton::Right),
            (6, PadButton::Down),
            (7, PadButton::Left),
            (8, PadButton::L2),
            (9, PadButton::R2),
            (10, PadButton::L1),
            (11, PadButton::R1),
            (12, PadButton::Y),
            (13, PadButton::B),
            (14, PadButton::A),
            (15, PadButton::X),
            (16, PadButton::Home),
        ] {
            dialect.buttons.insert(raw, button);
        }
        dialect
    }
}

fn pad_button_from_id(id: DeviceButtonId) -> Option<PadButton> {
    use PadButton::*;
    const AXES: [PadButton; 6] = [
        LeftStickX, LeftStickY, RightStickX, RightStickY, Axis4, Axis5,
    ];
    AXES.get(id as usize).copied()
}

fn mapped_button_at(slot: usize) -> Option<PadButton> {
    use crate::mapping::MappedButton::*;
    const ALL: [crate::mapping::MappedButton; crate::mapping::MAPPED_BUTTON_COUNT] = [
        A,
        B,
        X,
        Y,
        Back,
        Guide,
        Start,
        LeftStick,
        RightStick,
        LeftShoulder,
        RightShoulder,
        DpadUp,
        DpadDown,
        DpadLeft,
        DpadRight,
    ];
    ALL.get(slot).map(|m| m.pad_button())
}

fn mapped_axis_at(slot: usize) -> Option<PadButton> {
    use crate::mapping::MappedAxis::*;
    const ALL: [crate::mapping::MappedAxis; crate::mapping::MAPPED_AXIS_COUNT] =
        [LeftX, LeftY, RightX, RightY, LeftTrigger, RightTrigger];
    ALL.get(slot).map(|a| a.pad_button())
}

pub struct JoystickPadBackend {
    index: u32,
    path: String,
    fd: Option<RawFd>,
    device_state: DeviceState,
    name: String,
    dialect: JoystickDialect,
    inotify: Option<Inotify>,
    mappings: Arc<MappingDatabase>,
}

impl JoystickPadBackend {
    pub fn with_mappings(index: u32, mappings: Arc<MappingDatabase>) -> Self {
        let inotify = match Inotify::init() {
            Ok(inotify) => {
                let mask = WatchMask::CREATE
                    | WatchMask::DELETE
                    | WatchMask::OPEN
                    | WatchMask::CLOSE_WRITE
                    | WatchMask::CLOSE_NOWRITE
                    | WatchMask::DELETE_SELF;
                if let Err(e) = inotify.watches().add("/dev/input", mask) {
                    warn!("inotify watch on /dev/input failed: {e}");
                }
                Some(inotify)
            }
            Err(e) => {
                warn!("inotify init failed: {e}");
                None
            }
        };

        let mut backend = Self {
            index,
            path: format!("/dev/input/js{index}"),
            fd: None,
            device_state: DeviceState::Unavailable,
            name: String::new(),
            dialect: JoystickDialect::identity_axes(),
            inotify,
            mappings,
        };
        backend.check_for_device();
        backend
    }

    fn check_for_device(&mut self) {
        if self.fd.is_some() {
            return;
        }
        self.device_state = DeviceState::Unavailable;

        let path = format!("{}\0", self.path);
        let fd = unsafe {
            libc::open(path.as_ptr() as *const libc::c_char, libc::O_RDONLY | libc::O_NONBLOCK)
        };
        if fd < 0 {
            return;
        }

        let mut name = [0u8; 128];
        let name = if unsafe { libc::ioctl(fd, jsiocgname(name.len() - 1), name.as_mut_ptr()) } < 0
        {
            "Unknown".to_string()
        } else {
            let end = name.iter().position(|b| *b == 0).unwrap_or(0);
            String::from_utf8_lossy(&name[..end]).into_owned()
        };

        // DualShock 4: leave the node alone, the unified HID layer speaks
        // its native report format (and drives the light bar).
        if name == "Sony Computer Entertainment Wireless Controller" {
            unsafe {
                libc::close(fd);
            }
            return;
        }

        self.dialect = if name == "Sony PLAYSTATION(R)3 Controller" {
            JoystickDialect::ps3()
        } else if name.contains("Microsoft X-Box") || name.contains("Steam Deck") {
            JoystickDialect::xbox()
        } else {
            let guid = PadGuid::from_bluetooth_name(&name);
            match self.mappings.find(&guid) {
                Some(entry) => {
                    debug!("joystick {} matched mapping '{}'", self.path, entry.name);
                    JoystickDialect::from_mapping(&entry.mapping)
                }
                None => JoystickDialect::from_mapping(&PadMapping::default()),
            }
        };

        info!("joystick bound on {}: {}", self.path, name);
        self.name = name;
        self.fd = Some(fd);
        self.device_state = DeviceState::Ok;
    }

    fn disconnect(&mut self) {
        if let Some(fd) = self.fd.take() {
            unsafe {
                libc::close(fd);
            }
        }
        self.device_state = DeviceState::Unavailable;
    }

    fn handle_axis(&self, ctx: &mut PadContext, number: u8, value: f32) {
        let (dpad_x, dpad_y) = self.dialect.dpad_axes;
        if dpad_x == Some(number) {
            ctx.set_button(PadButton::Left, value < 0.0);
            ctx.set_button(PadButton::Right, value > 0.0);
            return;
        }
        if dpad_y == Some(number) {
            ctx.set_button(PadButton::Up, value < 0.0);
            ctx.set_button(PadButton::Down, value > 0.0);
            return;
        }

        let Some(target) = self.dialect.axes.get(&(number as u32)).copied() else {
            debug!("unmapped joystick axis {number}");
            return;
        };
        match target {
            // Dpad directions delivered as +/- on one axis.
            PadButton::Up | PadButton::Down => {
                ctx.set_button(PadButton::Up, value < 0.0);
                ctx.set_button(PadButton::Down, value > 0.0);
            }
            PadButton::Left | PadButton::Right => {
                ctx.set_button(PadButton::Left, value < 0.0);
                ctx.set_button(PadButton::Right, value > 0.0);
            }
            // Triggers arrive in [-1, 1] and are published as [0, 1].
            PadButton::Axis4 | PadButton::Axis5 => {
                ctx.set_axis(target, 0.5 * (value + 1.0));
            }
            PadButton::LeftStickX
            | PadButton::LeftStickY
            | PadButton::RightStickX
            | PadButton::RightStickY => {
                ctx.set_stick(target, value);
            }
            other => ctx.set_axis(other, value),
        }
    }

    fn handle_button(&self, ctx: &mut PadContext, number: u8, pressed: bool) {
        let Some(target) = self.dialect.buttons.get(&(number as u32)).copied() else {
            debug!("unmapped joystick button {number}");
            return;
        };
        if (target.id() as usize) < PAD_AXIS_COUNT {
            // A digital trigger wired to a button.
            ctx.set_axis(target, if pressed { 1.0 } else { 0.0 });
        } else {
            ctx.set_button(target, pressed);
        }
    }
}

impl Drop for JoystickPadBackend {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl PadBackend for JoystickPadBackend {
    fn variant(&self) -> DeviceVariant {
        DeviceVariant::Standard
    }

    fn device_state(&self) -> DeviceState {
        self.device_state
    }

    fn device_name(&self) -> &str {
        &self.name
    }

    fn check_connection(&mut self) {
        let mut created = false;
        let mut deleted = false;
        if let Some(inotify) = self.inotify.as_mut() {
            let mut buffer = [0u8; 4096];
            if let Ok(events) = inotify.read_events(&mut buffer) {
                for event in events {
                    let Some(name) = event.name.and_then(|n| n.to_str()) else {
                        continue;
                    };
                    if !self.path.ends_with(name) {
                        continue;
                    }
                    if event.mask.contains(EventMask::CREATE) {
                        created = true;
                    } else if event.mask.contains(EventMask::DELETE) {
                        deleted = true;
                    }
                }
            }
        }

        if deleted && self.fd.is_some() {
            info!("joystick removed on {}", self.path);
            self.disconnect();
        }
        if created || self.fd.is_none() {
            self.check_for_device();
        }
    }

    fn update(&mut self, ctx: &mut PadContext) {
        let Some(fd) = self.fd else {
            return;
        };

        let mut event: JsEvent = unsafe { std::mem::zeroed() };
        let event_size = std::mem::size_of::<JsEvent>();
        loop {
            let read = unsafe {
                libc::read(fd, &mut event as *mut JsEvent as *mut libc::c_void, event_size)
            };
            if read == event_size as isize {
                let ty = event.type_ & !JS_EVENT_INIT;
                if ty == JS_EVENT_AXIS {
                    let value = f32::from(event.value) / MAX_AXIS_VALUE;
                    self.handle_axis(ctx, event.number, value);
                } else if ty == JS_EVENT_BUTTON {
                    self.handle_button(ctx, event.number, event.value != 0);
                }
                continue;
            }

            if read < 0 {
                let errno = std::io::Error::last_os_error()
                    .raw_os_error()
                    .unwrap_or(0);
                match errno {
                    libc::EAGAIN => {}
                    libc::EBADF | libc::ECONNRESET | libc::ENOTCONN | libc::EIO
                    | libc::ENXIO | libc::ENODEV => {
                        // Hardware is gone; the next probe may re-bind it.
                        warn!("joystick lost on {}", self.path);
                        self.disconnect();
                    }
                    other => debug!("joystick read errno {other} on {}", self.path),
                }
            }
            break;
        }
    }

    fn is_valid_button(&self, button: DeviceButtonId) -> bool {
        if self.dialect.buttons.is_empty() {
            return (button as usize) < PAD_AXIS_COUNT + crate::buttons::PAD_BUTTON_COUNT;
        }
        let dpad = matches!(
            pad_button_checked(button),
            Some(PadButton::Up) | Some(PadButton::Down) | Some(PadButton::Left)
                | Some(PadButton::Right)
        ) && (self.dialect.dpad_axes.0.is_some() || self.dialect.dpad_axes.1.is_some());
        dpad || self
            .dialect
            .buttons
            .values()
            .chain(self.dialect.axes.values())
            .any(|b| b.id() == button)
    }
}

fn pad_button_checked(id: DeviceButtonId) -> Option<PadButton> {
    use PadButton::*;
    for b in [Up, Down, Left, Right] {
        if b.id() == id {
            return Some(b);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapping_to_dialect_tables() {
        let mapping = PadMapping::default();
        let dialect = JoystickDialect::from_mapping(&mapping);
        assert_eq!(dialect.buttons.get(&1).copied(), Some(PadButton::A));
        assert_eq!(dialect.buttons.get(&12).copied(), Some(PadButton::Home));
        assert_eq!(dialect.axes.get(&0).copied(), Some(PadButton::LeftStickX));
        assert_eq!(dialect.axes.get(&5).copied(), Some(PadButton::RightStickY));
        // Digital triggers land in the button table as axis targets.
        assert_eq!(dialect.buttons.get(&6).copied(), Some(PadButton::Axis4));
        // Hat entries claim the trailing axis pair.
        assert_eq!(dialect.dpad_axes, (Some(6), Some(7)));
    }

    #[test]
    fn xbox_dialect_layout() {
        let dialect = JoystickDialect::xbox();
        assert_eq!(dialect.buttons.get(&0).copied(), Some(PadButton::A));
        assert_eq!(dialect.axes.get(&2).copied(), Some(PadButton::Axis4));
        assert_eq!(dialect.dpad_axes, (Some(6), Some(7)));
    }

    #[test]
    fn ps3_dialect_is_button_heavy() {
        let dialect = JoystickDialect::ps3();
        assert_eq!(dialect.buttons.get(&14).copied(), Some(PadButton::A));
        assert_eq!(dialect.buttons.get(&8).copied(), Some(PadButton::L2));
        assert_eq!(dialect.buttons.get(&4).copied(), Some(PadButton::Up));
        assert_eq!(dialect.axes.get(&0).copied(), Some(PadButton::LeftStickX));
    }
}
