//! evdev keyboard backend.
//!
//! Polls `/dev/input/eventN` in non-blocking mode, reading `input_event`
//! records straight from the kernel. Device discovery sniffs the event
//! bitmasks (`EVIOCGBIT`) the same way the joystick layer does: a node that
//! reports `EV_KEY` with both `KEY_A` and `KEY_Q` is taken as a keyboard.
//!
//! This raw variant carries no layout information, so it produces key
//! transitions but no text input.

use std::os::unix::io::RawFd;

use log::{debug, warn};

use crate::buttons::Key;
use crate::containers::DenseHashMap;
use crate::device::{DeviceState, DeviceVariant};
use crate::devices::keyboard::{KeyboardBackend, KeyboardContext};

const EVDEV_DEVICE_COUNT: usize = 10;

const EV_KEY: u16 = 0x01;

// ioctl request builders, cf. <linux/input.h>.
const IOC_READ: libc::c_ulong = 2;

fn eviocgbit(ev: u32, len: usize) -> libc::c_ulong {
    (IOC_READ << 30) | ((len as libc::c_ulong) << 16) | ((b'E' as libc::c_ulong) << 8) | ((0x20 + ev) as libc::c_ulong)
}

fn eviocgname(len: usize) -> libc::c_ulong {
    (IOC_READ << 30) | ((len as libc::c_ulong) << 16) | ((b'E' as libc::c_ulong) << 8) | 0x06
}

fn has_bit(bits: &[u8], bit: usize) -> bool {
    bits.get(bit / 8).is_some_and(|b| b & (1 << (bit % 8)) != 0)
}

// Input event codes for discovery, cf. <linux/input-event-codes.h>.
const KEY_A_CODE: usize = 30;
const KEY_Q_CODE: usize = 16;

/// Opens `/dev/input/eventN` and sniffs its capabilities.
fn open_keyboard_fd() -> Option<(RawFd, String)> {
    for index in 0..EVDEV_DEVICE_COUNT {
        let path = format!("/dev/input/event{index}\0");
        let fd = unsafe {
            libc::open(path.as_ptr() as *const libc::c_char, libc::O_RDONLY | libc::O_NONBLOCK)
        };
        if fd < 0 {
            continue;
        }

        let mut ev_bits = [0u8; 4];
        let mut key_bits = [0u8; 96];
        let ok = unsafe {
            libc::ioctl(fd, eviocgbit(0, ev_bits.len()), ev_bits.as_mut_ptr()) >= 0
                && libc::ioctl(fd, eviocgbit(EV_KEY as u32, key_bits.len()), key_bits.as_mut_ptr())
                    >= 0
        };
        if ok
            && has_bit(&ev_bits, EV_KEY as usize)
            && has_bit(&key_bits, KEY_A_CODE)
            && has_bit(&key_bits, KEY_Q_CODE)
        {
            let mut name = [0u8; 128];
            unsafe {
                libc::ioctl(fd, eviocgname(name.len() - 1), name.as_mut_ptr());
            }
            let end = name.iter().position(|b| *b == 0).unwrap_or(0);
            let name = String::from_utf8_lossy(&name[..end]).into_owned();
            debug!("evdev keyboard on /dev/input/event{index}: {name}");
            return Some((fd, name));
        }

        unsafe {
            libc::close(fd);
        }
    }
    None
}

fn keyboard_dialect() -> DenseHashMap<u32, Key> {
    let mut dialect: DenseHashMap<u32, Key> = DenseHashMap::new();
    let mut map = |code: u32, key: Key| {
        dialect.insert(code, key);
    };

    // Cf. <linux/input-event-codes.h>
    map(1, Key::Escape);
    map(2, Key::N1);
    map(3, Key::N2);
    map(4, Key::N3);
    map(5, Key::N4);
    map(6, Key::N5);
    map(7, Key::N6);
    map(8, Key::N7);
    map(9, Key::N8);
    map(10, Key::N9);
    map(11, Key::N0);
    map(12, Key::Minus);
    map(13, Key::Equal);
    map(14, Key::BackSpace);
    map(15, Key::Tab);
    map(16, Key::Q);
    map(17, Key::W);
    map(18, Key::E);
    map(19, Key::R);
    map(20, Key::T);
    map(21, Key::Y);
    map(22, Key::U);
    map(23, Key::I);
    map(24, Key::O);
    map(25, Key::P);
    map(26, Key::BracketLeft);
    map(27, Key::BracketRight);
    map(28, Key::Return);
    map(29, Key::CtrlL);
    map(30, Key::A);
    map(31, Key::S);
    map(32, Key::D);
    map(33, Key::F);
    map(34, Key::G);
    map(35, Key::H);
    map(36, Key::J);
    map(37, Key::K);
    map(38, Key::L);
    map(39, Key::Semicolon);
    map(40, Key::Apostrophe);
    map(41, Key::Grave);
    map(42, Key::ShiftL);
    map(43, Key::Backslash);
    map(44, Key::Z);
    map(45, Key::X);
    map(46, Key::C);
    map(47, Key::V);
    map(48, Key::B);
    map(49, Key::N);
    map(50, Key::M);
    map(51, Key::Comma);
    map(52, Key::Period);
    map(53, Key::Slash);
    map(54, Key::ShiftR);
    map(55, Key::KpMultiply);
    map(56, Key::AltL);
    map(57, Key::Space);
    map(58, Key::CapsLock);
    map(59, Key::F1);
    map(60, Key::F2);
    map(61, Key::F3);
    map(62, Key::F4);
    map(63, Key::F5);
    map(64, Key::F6);
    map(65, Key::F7);
    map(66, Key::F8);
    map(67, Key::F9);
    map(68, Key::F10);
    map(69, Key::NumLock);
    map(70, Key::ScrollLock);
    map(71, Key::KpHome);
    map(72, Key::KpUp);
    map(73, Key::KpPageUp);
    map(74, Key::KpSubtract);
    map(75, Key::KpLeft);
    map(76, Key::KpBegin);
    map(77, Key::KpRight);
    map(78, Key::KpAdd);
    map(79, Key::KpEnd);
    map(80, Key::KpDown);
    map(81, Key::KpPageDown);
    map(82, Key::KpInsert);
    map(83, Key::KpDelete);
    map(87, Key::F11);
    map(88, Key::F12);
    map(96, Key::KpEnter);
    map(97, Key::CtrlR);
    map(98, Key::KpDivide);
    map(99, Key::Print);
    map(100, Key::AltR);
    map(102, Key::Home);
    map(103, Key::Up);
    map(104, Key::PageUp);
    map(105, Key::Left);
    map(106, Key::Right);
    map(107, Key::End);
    map(108, Key::Down);
    map(109, Key::PageDown);
    map(110, Key::Insert);
    map(111, Key::Delete);
    map(113, Key::Mute);
    map(114, Key::VolumeDown);
    map(115, Key::VolumeUp);
    map(119, Key::Break);
    map(125, Key::SuperL);
    map(126, Key::SuperR);
    map(127, Key::Menu);
    map(163, Key::MediaNext);
    map(164, Key::MediaPlayPause);
    map(165, Key::MediaPrevious);
    map(166, Key::MediaStop);

    dialect
}

pub struct EvdevKeyboardBackend {
    fd: RawFd,
    name: String,
    dialect: DenseHashMap<u32, Key>,
}

impl EvdevKeyboardBackend {
    /// Scans the event nodes for a keyboard; `None` when none is readable.
    pub fn open() -> Option<Self> {
        let (fd, name) = open_keyboard_fd()?;
        Some(Self {
            fd,
            name,
            dialect: keyboard_dialect(),
        })
    }
}

impl Drop for EvdevKeyboardBackend {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.fd);
        }
    }
}

impl KeyboardBackend for EvdevKeyboardBackend {
    fn variant(&self) -> DeviceVariant {
        DeviceVariant::Raw
    }

    fn device_state(&self) -> DeviceState {
        DeviceState::Ok
    }

    fn device_name(&self) -> &str {
        &self.name
    }

    fn poll(&mut self, ctx: &mut KeyboardContext) {
        let mut event: libc::input_event = unsafe { std::mem::zeroed() };
        let event_size = std::mem::size_of::<libc::input_event>();

        loop {
            let read = unsafe {
                libc::read(
                    self.fd,
                    &mut event as *mut libc::input_event as *mut libc::c_void,
                    event_size,
                )
            };
            if read != event_size as isize {
                if read < 0 {
                    let errno = std::io::Error::last_os_error();
                    if errno.kind() != std::io::ErrorKind::WouldBlock {
                        warn!("evdev keyboard read failed: {errno}");
                    }
                }
                break;
            }

            if event.type_ != EV_KEY {
                continue;
            }
            // 0 = release, 1 = press, 2 = autorepeat.
            if event.value == 2 {
                continue;
            }
            match self.dialect.get(&(event.code as u32)) {
                Some(key) => ctx.set_key(*key, event.value != 0),
                None => debug!("unmapped evdev key code {}", event.code),
            }
        }
    }
}
