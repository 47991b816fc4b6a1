//! Unified HID pad layer.
//!
//! Discovers controllers through `hidapi` and parses their raw input
//! reports. The layer owns the PlayStation family (DualShock 4, DualSense),
//! whose report formats are fixed and whose rumble/light-bar output goes
//! through HID output reports; everything XInput-shaped is deliberately
//! filtered out so a pad never binds twice (the known-product-id table plus
//! the `IG_` device-path check, the canonical technique).
//!
//! Discovered candidates are offered to free pool slots by the manager; the
//! backend reads non-blocking on the update thread and hands its open
//! handle to the rumble worker as an output sink.

use std::collections::HashSet;
use std::sync::Arc;

use hidapi::{DeviceInfo, HidApi};
use log::{debug, info, warn};

use crate::buttons::{DeviceButtonId, PadButton};
use crate::device::{DeviceState, DeviceVariant};
use crate::devices::pad::{PadBackend, PadContext};
use crate::evaluate::{decode_dpad, fix_up_analog, JoystickEvaluator};
use crate::mapping::PadGuid;
use crate::rumble::{HidSink, RumbleFormat, RumbleSink};

/// Raw analog bytes are rescaled into the evaluator's signed-16 space so
/// its duplicate/jitter suppression applies uniformly.
const BYTE_SCALE: i32 = 257;

#[inline]
fn scale_byte(b: u8) -> i32 {
    i32::from(b) * BYTE_SCALE - 32768
}

/// Evaluator axis slots for the six analog channels.
const AXIS_LX: u8 = 0;
const AXIS_LY: u8 = 1;
const AXIS_RX: u8 = 2;
const AXIS_RY: u8 = 3;
const AXIS_L2: u8 = 4;
const AXIS_R2: u8 = 5;

const SONY_VENDOR_ID: u16 = 0x054C;
const DUALSHOCK_4_PRODUCT_ID: u16 = 0x05C4;
const DUALSHOCK_4_V2_PRODUCT_ID: u16 = 0x09CC;
const DUALSENSE_PRODUCT_ID: u16 = 0x0CE6;
const DUALSENSE_EDGE_PRODUCT_ID: u16 = 0x0DF2;

/// Vendor/product pairs that surface through XInput and must not be bound
/// over HID.
const XINPUT_PRODUCT_IDS: &[(u16, u16)] = &[
    (0x28DE, 0x11FF), // Valve Streaming Gamepad
    (0x045E, 0x02A1), // X360 wired
    (0x045E, 0x028E), // X360 wireless
    (0x045E, 0x02FF), // Xbox One wired
    (0x045E, 0x02DD), // Xbox One wireless
    (0x045E, 0x02D1), // Xbox One (3.5mm)
    (0x045E, 0x02EA), // Xbox One S wireless
    (0x045E, 0x02E0), // Xbox One S Bluetooth
    (0x045E, 0x02E3), // Xbox One Elite
];

/// True when a HID interface belongs to an XInput controller.
pub fn is_xinput_device(vendor_id: u16, product_id: u16, path: &str) -> bool {
    XINPUT_PRODUCT_IDS.contains(&(vendor_id, product_id)) || path.contains("IG_")
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PsModel {
    DualShock4,
    DualSense,
}

fn ps_model(vendor_id: u16, product_id: u16) -> Option<PsModel> {
    if vendor_id != SONY_VENDOR_ID {
        return None;
    }
    match product_id {
        DUALSHOCK_4_PRODUCT_ID | DUALSHOCK_4_V2_PRODUCT_ID => Some(PsModel::DualShock4),
        DUALSENSE_PRODUCT_ID | DUALSENSE_EDGE_PRODUCT_ID => Some(PsModel::DualSense),
        _ => None,
    }
}

/// One discovered, not-yet-bound controller.
pub struct HidCandidate {
    pub path: std::ffi::CString,
    pub vendor_id: u16,
    pub product_id: u16,
    pub name: String,
    pub guid: PadGuid,
    model: PsModel,
}

/// Manager-side discovery state.
pub struct HidDiscovery {
    api: HidApi,
    claimed: HashSet<std::ffi::CString>,
}

impl HidDiscovery {
    pub fn new() -> Option<Self> {
        match HidApi::new() {
            Ok(api) => Some(Self {
                api,
                claimed: HashSet::new(),
            }),
            Err(e) => {
                // Degrade to "no HID pads"; the next probe retries nothing,
                // matching a failed platform enumeration.
                warn!("HID enumeration unavailable: {e}");
                None
            }
        }
    }

    /// Re-enumerates and returns unclaimed supported controllers. Claims
    /// whose device path vanished from the enumeration are dropped so a
    /// re-plugged controller can bind again.
    pub fn scan(&mut self) -> Vec<HidCandidate> {
        if let Err(e) = self.api.refresh_devices() {
            warn!("HID refresh failed: {e}");
            return Vec::new();
        }

        let present: HashSet<std::ffi::CString> = self
            .api
            .device_list()
            .map(|info| info.path().to_owned())
            .collect();
        self.claimed.retain(|path| present.contains(path));

        let mut found = Vec::new();
        for info in self.api.device_list() {
            let path = info.path().to_owned();
            if self.claimed.contains(&path) {
                continue;
            }
            let Some(model) = ps_model(info.vendor_id(), info.product_id()) else {
                continue;
            };
            if is_xinput_device(
                info.vendor_id(),
                info.product_id(),
                &path.to_string_lossy(),
            ) {
                continue;
            }
            found.push(HidCandidate {
                vendor_id: info.vendor_id(),
                product_id: info.product_id(),
                name: product_name(info),
                guid: PadGuid::from_usb_ids(
                    info.vendor_id(),
                    info.product_id(),
                    info.release_number(),
                ),
                model,
                path,
            });
        }
        found
    }

    /// Opens a candidate and marks its path claimed.
    pub fn open(&mut self, candidate: &HidCandidate) -> Option<HidPadBackend> {
        let device = match self.api.open_path(&candidate.path) {
            Ok(device) => device,
            Err(e) => {
                warn!("HID open failed for {}: {e}", candidate.name);
                return None;
            }
        };
        if let Err(e) = device.set_blocking_mode(false) {
            warn!("HID non-blocking mode failed for {}: {e}", candidate.name);
            return None;
        }

        self.claimed.insert(candidate.path.clone());
        info!("HID pad bound: {}", candidate.name);
        Some(HidPadBackend::new(candidate.model, candidate.name.clone(), device))
    }

}

fn product_name(info: &DeviceInfo) -> String {
    info.product_string()
        .map(str::to_owned)
        .unwrap_or_else(|| format!("{:04x}:{:04x}", info.vendor_id(), info.product_id()))
}

/// Evaluator button slots shared by both report layouts.
const PS_BUTTONS: [PadButton; 13] = [
    PadButton::X,
    PadButton::A,
    PadButton::B,
    PadButton::Y,
    PadButton::L1,
    PadButton::R1,
    PadButton::L2,
    PadButton::R2,
    PadButton::Select,
    PadButton::Start,
    PadButton::L3,
    PadButton::R3,
    PadButton::Home,
];

/// Pad backend speaking raw PlayStation HID reports.
pub struct HidPadBackend {
    model: PsModel,
    name: String,
    sink: Arc<HidSink>,
    device_state: DeviceState,
    eval: JoystickEvaluator,
    axis_events: Vec<(u8, i32)>,
}

impl HidPadBackend {
    fn new(model: PsModel, name: String, device: hidapi::HidDevice) -> Self {
        // The sink owns the wire format, so the rumble worker and the
        // synchronous paths below emit identical packets.
        let sink = Arc::new(HidSink::new(device, name.clone(), RumbleFormat::PlayStation));
        sink.set_led(0, 0, 64);
        Self {
            sink,
            model,
            name,
            device_state: DeviceState::Ok,
            eval: JoystickEvaluator::new(6, PS_BUTTONS.len(), 1),
            axis_events: Vec::new(),
        }
    }

    fn apply_report(&mut self, ctx: &mut PadContext, report: &[u8]) {
        // Both models use report id 0x01 over USB; sticks are the first
        // four analog bytes either way.
        let (min_len, trigger_bytes, buttons_at) = match self.model {
            // Hat + face at 5, shoulders at 6, PS at 7, trigger analogs 8/9.
            PsModel::DualShock4 => (10, (8usize, 9usize), (5usize, 6usize, 7usize)),
            // Trigger analogs at 5/6, hat + face at 8, shoulders at 9,
            // PS at 10.
            PsModel::DualSense => (11, (5, 6), (8, 9, 10)),
        };
        if report.len() < min_len || report[0] != 0x01 {
            debug!(
                "{}: unsupported report id {:#04x}",
                self.name,
                report.first().unwrap_or(&0)
            );
            return;
        }

        // Every analog channel funnels through the evaluator, which eats
        // duplicate reports and the initial jitter.
        self.axis_events.clear();
        for (slot, byte) in [
            (AXIS_LX, report[1]),
            (AXIS_LY, report[2]),
            (AXIS_RX, report[3]),
            (AXIS_RY, report[4]),
            (AXIS_L2, report[trigger_bytes.0]),
            (AXIS_R2, report[trigger_bytes.1]),
        ] {
            self.eval.evaluate_axis(slot, scale_byte(byte), &mut self.axis_events);
        }
        for (slot, value) in self.axis_events.drain(..) {
            let value = value as f32;
            match slot {
                // The wire is down-positive; the engine wants up-positive.
                AXIS_LX => ctx.set_stick(
                    PadButton::LeftStickX,
                    fix_up_analog(value, -32768.0, 32767.0, true),
                ),
                AXIS_LY => ctx.set_stick(
                    PadButton::LeftStickY,
                    -fix_up_analog(value, -32768.0, 32767.0, true),
                ),
                AXIS_RX => ctx.set_stick(
                    PadButton::RightStickX,
                    fix_up_analog(value, -32768.0, 32767.0, true),
                ),
                AXIS_RY => ctx.set_stick(
                    PadButton::RightStickY,
                    -fix_up_analog(value, -32768.0, 32767.0, true),
                ),
                AXIS_L2 => ctx.set_axis(
                    PadButton::Axis4,
                    fix_up_analog(value, -32768.0, 32767.0, false),
                ),
                AXIS_R2 => ctx.set_axis(
                    PadButton::Axis5,
                    fix_up_analog(value, -32768.0, 32767.0, false),
                ),
                _ => {}
            }
        }

        let (b1_at, b2_at, b3_at) = buttons_at;
        let b1 = report[b1_at];
        let b2 = report[b2_at];
        let pressed = [
            b1 & 0x10 != 0, // square
            b1 & 0x20 != 0, // cross
            b1 & 0x40 != 0, // circle
            b1 & 0x80 != 0, // triangle
            b2 & 0x01 != 0, // L1
            b2 & 0x02 != 0, // R1
            b2 & 0x04 != 0, // L2 click
            b2 & 0x08 != 0, // R2 click
            b2 & 0x10 != 0, // share / create
            b2 & 0x20 != 0, // options
            b2 & 0x40 != 0, // L3
            b2 & 0x80 != 0, // R3
            report[b3_at] & 0x01 != 0, // PS
        ];
        for (slot, down) in pressed.into_iter().enumerate() {
            if self.eval.evaluate_button(slot as u8, down) {
                ctx.set_button(PS_BUTTONS[slot], down);
            }
        }

        if let Some(hat) = self.eval.evaluate_hat(0, b1 & 0x0F) {
            let (dx, dy) = decode_dpad(i32::from(hat), false);
            ctx.set_dpad(dx, dy);
        }
    }

    fn write_feedback(&self, left: f32, right: f32) -> bool {
        let report = self.sink.build_report(left, right, 0);
        match self.sink.write_report(&report) {
            Ok(_) => true,
            Err(e) => {
                warn!("{}: feedback report failed: {e}", self.name);
                false
            }
        }
    }
}

impl PadBackend for HidPadBackend {
    fn variant(&self) -> DeviceVariant {
        DeviceVariant::Raw
    }

    fn device_state(&self) -> DeviceState {
        self.device_state
    }

    fn device_name(&self) -> &str {
        &self.name
    }

    fn check_connection(&mut self) {}

    fn update(&mut self, ctx: &mut PadContext) {
        if self.device_state != DeviceState::Ok {
            return;
        }

        let mut buf = [0u8; 64];
        loop {
            let read = self.sink.read_timeout(&mut buf, 0);
            match read {
                Ok(0) => break,
                Ok(n) => self.apply_report(ctx, &buf[..n]),
                Err(e) => {
                    // Read failure means the cable is gone; the slot goes
                    // back to the pool and rebinds on a later probe.
                    warn!("{}: HID read failed: {e}", self.name);
                    self.device_state = DeviceState::Unavailable;
                    break;
                }
            }
        }
    }

    fn is_valid_button(&self, button: DeviceButtonId) -> bool {
        use PadButton::*;
        const SUPPORTED: &[PadButton] = &[
            LeftStickX, LeftStickY, RightStickX, RightStickY, Axis4, Axis5, Start, Select, Left,
            Right, Up, Down, A, B, X, Y, L1, R1, L2, R2, L3, R3, Home,
        ];
        SUPPORTED.iter().any(|b| b.id() == button)
    }

    fn vibrate(&mut self, left: f32, right: f32) -> bool {
        self.write_feedback(left, right)
    }

    fn rumble_sink(&self) -> Option<Arc<dyn RumbleSink>> {
        Some(self.sink.clone())
    }

    fn set_led_color(&mut self, r: u8, g: u8, b: u8) {
        self.sink.set_led(r, g, b);
        // Re-send with motors idle so the color applies immediately.
        self.write_feedback(0.0, 0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xinput_filter_catches_known_products_and_ig_paths() {
        assert!(is_xinput_device(0x045E, 0x028E, "/dev/hidraw3"));
        assert!(is_xinput_device(0x1234, 0x5678, "\\\\?\\HID#VID_1234&PID_5678&IG_00"));
        assert!(!is_xinput_device(0x054C, 0x05C4, "/dev/hidraw1"));
    }

    #[test]
    fn ps_models() {
        assert_eq!(ps_model(0x054C, 0x05C4), Some(PsModel::DualShock4));
        assert_eq!(ps_model(0x054C, 0x0CE6), Some(PsModel::DualSense));
        assert_eq!(ps_model(0x054C, 0x9999), None);
        assert_eq!(ps_model(0x045E, 0x028E), None);
    }
}
