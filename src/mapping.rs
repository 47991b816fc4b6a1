//! Gamepad dialect database.
//!
//! Controllers report vendor-specific button/axis/hat codes; a *dialect*
//! translates them into the canonical pad space. Dialects are keyed by a
//! 16-byte hardware GUID and expressed as SDL-community
//! `gamecontrollerdb.txt` mapping strings:
//!
//! ```text
//! <guidhex>,<display-name>,a:b1,b:b2,leftx:a0,lefty:a1,dpup:h0.1,...
//! ```
//!
//! - `b<n>` targets raw button index `n`
//! - `a<n>` targets raw axis index `n`
//! - `h0.<mask>` targets a hat bit mask (1=up, 2=right, 4=down, 8=left)
//!
//! Unknown controllers fall back to a built-in default mapping. Legacy GUIDs
//! carrying the ASCII `"504944564944"` ("PIDVID") tail are rewritten to the
//! 2.0.5 form bit-exact, so databases written by either convention interop.

use std::fmt;
use std::path::Path;

use crate::buttons::PadButton;
use crate::containers::{murmur3_x86_32, DenseHashMap, HashKey, HASH_SEED};
use crate::error::{Error, Result};

pub const HARDWARE_BUS_USB: u16 = 0x03;
pub const HARDWARE_BUS_BLUETOOTH: u16 = 0x05;

/// Hat direction bit masks.
pub const HAT_CENTERED: u8 = 0x00;
pub const HAT_UP: u8 = 0x01;
pub const HAT_RIGHT: u8 = 0x02;
pub const HAT_DOWN: u8 = 0x04;
pub const HAT_LEFT: u8 = 0x08;

/// Directional-switch value (0..=7, clockwise from up) to hat mask.
pub const HAT_VALS: [u8; 8] = [
    HAT_UP,
    HAT_UP | HAT_RIGHT,
    HAT_RIGHT,
    HAT_DOWN | HAT_RIGHT,
    HAT_DOWN,
    HAT_DOWN | HAT_LEFT,
    HAT_LEFT,
    HAT_UP | HAT_LEFT,
];

/// 16-byte hardware GUID in the SDL layout.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PadGuid(pub [u8; 16]);

impl fmt::Debug for PadGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PadGuid({})", self.to_hex())
    }
}

impl HashKey for PadGuid {
    #[inline]
    fn key_hash(&self) -> u32 {
        murmur3_x86_32(&self.0, HASH_SEED)
    }
}

impl PadGuid {
    /// GUID for a USB device:
    /// `{bus, 0, vendor, 0, product, 0, version, 0}` as little-endian words.
    pub fn from_usb_ids(vendor: u16, product: u16, version: u16) -> Self {
        let mut data = [0u8; 16];
        data[0..2].copy_from_slice(&HARDWARE_BUS_USB.to_le_bytes());
        data[4..6].copy_from_slice(&vendor.to_le_bytes());
        data[8..10].copy_from_slice(&product.to_le_bytes());
        data[12..14].copy_from_slice(&version.to_le_bytes());
        PadGuid(data)
    }

    /// GUID for a Bluetooth device: bus word followed by name bytes.
    pub fn from_bluetooth_name(name: &str) -> Self {
        let mut data = [0u8; 16];
        data[0..2].copy_from_slice(&HARDWARE_BUS_BLUETOOTH.to_le_bytes());
        let bytes = name.as_bytes();
        let n = bytes.len().min(12);
        data[4..4 + n].copy_from_slice(&bytes[..n]);
        PadGuid(data)
    }

    pub fn to_hex(self) -> String {
        let mut s = String::with_capacity(32);
        for b in self.0 {
            s.push_str(&format!("{b:02x}"));
        }
        s
    }

    /// Parses a 32-char hex GUID, applying the legacy PIDVID fix-up first.
    pub fn parse_hex(hex: &str) -> Option<Self> {
        let fixed = fix_up_legacy_guid(hex);
        let hex = fixed.as_deref().unwrap_or(hex);
        if hex.len() != 32 {
            return None;
        }
        let mut data = [0u8; 16];
        for (i, chunk) in hex.as_bytes().chunks_exact(2).enumerate() {
            let hi = nibble(chunk[0])?;
            let lo = nibble(chunk[1])?;
            data[i] = (hi << 4) | lo;
        }
        Some(PadGuid(data))
    }
}

#[inline]
fn nibble(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 0x0a),
        b'A'..=b'F' => Some(c - b'A' + 0x0a),
        _ => None,
    }
}

/// Rewrites a pre-2.0.5 GUID string (ASCII `"504944564944"` at chars 20..32)
/// into the modern layout. Returns `None` when no fix-up applies.
///
/// The shuffle is the SDL community convention and must stay bit-exact:
/// zero the PIDVID tail, move chars 4..8 to 16..20, chars 0..4 to 8..12, and
/// stamp `"03000000"` (USB bus) over the head.
pub fn fix_up_legacy_guid(guid: &str) -> Option<String> {
    if guid.len() != 32 || &guid[20..32] != "504944564944" {
        return None;
    }
    let mut out = [b'0'; 32];
    out[..32].copy_from_slice(guid.as_bytes());
    out[20..32].copy_from_slice(b"000000000000");
    let (head, tail) = out.split_at_mut(16);
    tail[0..4].copy_from_slice(&head[4..8]);
    let (a, b) = head.split_at_mut(8);
    b[0..4].copy_from_slice(&a[0..4]);
    out[0..8].copy_from_slice(b"03000000");
    Some(String::from_utf8_lossy(&out).into_owned())
}

/// Canonical buttons addressable by a mapping string.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(usize)]
pub enum MappedButton {
    A = 0,
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
}

pub const MAPPED_BUTTON_COUNT: usize = 15;

/// Canonical axes addressable by a mapping string.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(usize)]
pub enum MappedAxis {
    LeftX = 0,
    LeftY,
    RightX,
    RightY,
    LeftTrigger,
    RightTrigger,
}

pub const MAPPED_AXIS_COUNT: usize = 6;

/// Hat slots: four cardinals plus the derived diagonals.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(usize)]
pub enum MappedHat {
    Up = 0,
    Right,
    Down,
    Left,
    LeftUp,
    LeftDown,
    RightUp,
    RightDown,
}

pub const MAPPED_HAT_COUNT: usize = 8;

impl MappedButton {
    fn from_field(name: &str) -> Option<Self> {
        Some(match name {
            "a" => Self::A,
            "b" => Self::B,
            "x" => Self::X,
            "y" => Self::Y,
            "back" => Self::Back,
            "guide" => Self::Guide,
            "start" => Self::Start,
            "leftstick" => Self::LeftStick,
            "rightstick" => Self::RightStick,
            "leftshoulder" => Self::LeftShoulder,
            "rightshoulder" => Self::RightShoulder,
            _ => return None,
        })
    }

    /// Canonical pad button this mapped slot feeds.
    pub fn pad_button(self) -> PadButton {
        match self {
            Self::A => PadButton::A,
            Self::B => PadButton::B,
            Self::X => PadButton::X,
            Self::Y => PadButton::Y,
            Self::Back => PadButton::Select,
            Self::Guide => PadButton::Home,
            Self::Start => PadButton::Start,
            Self::LeftStick => PadButton::L3,
            Self::RightStick => PadButton::R3,
            Self::LeftShoulder => PadButton::L1,
            Self::RightShoulder => PadButton::R1,
            Self::DpadUp => PadButton::Up,
            Self::DpadDown => PadButton::Down,
            Self::DpadLeft => PadButton::Left,
            Self::DpadRight => PadButton::Right,
        }
    }
}

impl MappedAxis {
    fn from_field(name: &str) -> Option<Self> {
        Some(match name {
            "leftx" => Self::LeftX,
            "lefty" => Self::LeftY,
            "rightx" => Self::RightX,
            "righty" => Self::RightY,
            "lefttrigger" => Self::LeftTrigger,
            "righttrigger" => Self::RightTrigger,
            _ => return None,
        })
    }

    pub fn pad_button(self) -> PadButton {
        match self {
            Self::LeftX => PadButton::LeftStickX,
            Self::LeftY => PadButton::LeftStickY,
            Self::RightX => PadButton::RightStickX,
            Self::RightY => PadButton::RightStickY,
            Self::LeftTrigger => PadButton::Axis4,
            Self::RightTrigger => PadButton::Axis5,
        }
    }
}

/// Raw control a canonical slot is wired to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RawTarget {
    Button(u8),
    Axis(u8),
    Hat(u8),
}

fn parse_target(s: &str) -> Option<RawTarget> {
    if let Some(rest) = s.strip_prefix('b') {
        return rest.parse().ok().map(RawTarget::Button);
    }
    if let Some(rest) = s.strip_prefix('a') {
        return rest.parse().ok().map(RawTarget::Axis);
    }
    if let Some(rest) = s.strip_prefix("h0.") {
        return rest.parse().ok().map(RawTarget::Hat);
    }
    None
}

/// Default mapping applied when a controller is not in the database.
pub const DEFAULT_MAPPING: &str = "a:b1,b:b2,y:b3,x:b0,start:b9,guide:b12,back:b8,leftstick:b10,rightstick:b11,leftshoulder:b4,rightshoulder:b5,dpup:h0.1,dpleft:h0.8,dpdown:h0.4,dpright:h0.2,leftx:a0,lefty:a1,rightx:a2,righty:a5,lefttrigger:b6,righttrigger:b7";

/// A parsed dialect for one controller model.
#[derive(Clone, Debug)]
pub struct PadMapping {
    pub buttons: [Option<RawTarget>; MAPPED_BUTTON_COUNT],
    pub axes: [Option<RawTarget>; MAPPED_AXIS_COUNT],
    /// Hat bit mask per [`MappedHat`] slot; diagonals are OR-composed from
    /// the cardinals after parsing.
    pub hats: [u8; MAPPED_HAT_COUNT],
}

impl Default for PadMapping {
    fn default() -> Self {
        Self::parse(DEFAULT_MAPPING)
    }
}

impl PadMapping {
    /// Parses a mapping body (the fields after GUID and name).
    ///
    /// Unknown field names are skipped so newer database files keep loading.
    pub fn parse(mapping: &str) -> Self {
        let mut out = Self {
            buttons: [None; MAPPED_BUTTON_COUNT],
            axes: [None; MAPPED_AXIS_COUNT],
            hats: [HAT_CENTERED; MAPPED_HAT_COUNT],
        };

        for field in mapping.split(',') {
            let Some((name, target)) = field.split_once(':') else {
                continue;
            };
            let Some(target) = parse_target(target.trim()) else {
                continue;
            };
            let name = name.trim();

            if let Some(button) = MappedButton::from_field(name) {
                out.buttons[button as usize] = Some(target);
            } else if let Some(axis) = MappedAxis::from_field(name) {
                out.axes[axis as usize] = Some(target);
            } else {
                let hat = match name {
                    "dpup" => Some(MappedHat::Up),
                    "dpdown" => Some(MappedHat::Down),
                    "dpleft" => Some(MappedHat::Left),
                    "dpright" => Some(MappedHat::Right),
                    _ => None,
                };
                if let Some(hat) = hat {
                    match target {
                        RawTarget::Hat(mask) => out.hats[hat as usize] = mask,
                        // D-pads wired to plain buttons are stored in the
                        // button table under the dpad slots.
                        other => {
                            let slot = match hat {
                                MappedHat::Up => MappedButton::DpadUp,
                                MappedHat::Down => MappedButton::DpadDown,
                                MappedHat::Left => MappedButton::DpadLeft,
                                MappedHat::Right => MappedButton::DpadRight,
                                _ => unreachable!(),
                            };
                            out.buttons[slot as usize] = Some(other);
                        }
                    }
                }
            }
        }

        out.hats[MappedHat::LeftUp as usize] =
            out.hats[MappedHat::Left as usize] | out.hats[MappedHat::Up as usize];
        out.hats[MappedHat::LeftDown as usize] =
            out.hats[MappedHat::Left as usize] | out.hats[MappedHat::Down as usize];
        out.hats[MappedHat::RightUp as usize] =
            out.hats[MappedHat::Right as usize] | out.hats[MappedHat::Up as usize];
        out.hats[MappedHat::RightDown as usize] =
            out.hats[MappedHat::Right as usize] | out.hats[MappedHat::Down as usize];

        out
    }

    /// Canonical button wired to raw button index `raw`, if any.
    pub fn button_for_raw(&self, raw: u8) -> Option<MappedButton> {
        for (i, target) in self.buttons.iter().enumerate() {
            if *target == Some(RawTarget::Button(raw)) {
                return mapped_button_from_index(i);
            }
        }
        None
    }

    /// Canonical axis wired to raw axis index `raw`, if any.
    pub fn axis_for_raw(&self, raw: u8) -> Option<MappedAxis> {
        for (i, target) in self.axes.iter().enumerate() {
            if *target == Some(RawTarget::Axis(raw)) {
                return mapped_axis_from_index(i);
            }
        }
        None
    }

    /// Canonical axis wired to raw *button* index `raw` (digital triggers).
    pub fn axis_for_raw_button(&self, raw: u8) -> Option<MappedAxis> {
        for (i, target) in self.axes.iter().enumerate() {
            if *target == Some(RawTarget::Button(raw)) {
                return mapped_axis_from_index(i);
            }
        }
        None
    }
}

fn mapped_button_from_index(i: usize) -> Option<MappedButton> {
    const ALL: [MappedButton; MAPPED_BUTTON_COUNT] = [
        MappedButton::A,
        MappedButton::B,
        MappedButton::X,
        MappedButton::Y,
        MappedButton::Back,
        MappedButton::Guide,
        MappedButton::Start,
        MappedButton::LeftStick,
        MappedButton::RightStick,
        MappedButton::LeftShoulder,
        MappedButton::RightShoulder,
        MappedButton::DpadUp,
        MappedButton::DpadDown,
        MappedButton::DpadLeft,
        MappedButton::DpadRight,
    ];
    ALL.get(i).copied()
}

fn mapped_axis_from_index(i: usize) -> Option<MappedAxis> {
    const ALL: [MappedAxis; MAPPED_AXIS_COUNT] = [
        MappedAxis::LeftX,
        MappedAxis::LeftY,
        MappedAxis::RightX,
        MappedAxis::RightY,
        MappedAxis::LeftTrigger,
        MappedAxis::RightTrigger,
    ];
    ALL.get(i).copied()
}

/// One database record.
#[derive(Clone, Debug)]
pub struct MappingEntry {
    pub name: String,
    pub mapping: PadMapping,
}

/// Built-in mapping table, a curated subset of the community database.
static BUILTIN_MAPPINGS: &[&str] = &[
    "030000005e0400008e02000014010000,Microsoft X-Box 360 pad,a:b0,b:b1,x:b2,y:b3,back:b6,guide:b8,start:b7,leftstick:b9,rightstick:b10,leftshoulder:b4,rightshoulder:b5,dpup:h0.1,dpdown:h0.4,dpleft:h0.8,dpright:h0.2,leftx:a0,lefty:a1,rightx:a3,righty:a4,lefttrigger:a2,righttrigger:a5",
    "030000005e040000ea02000001030000,Xbox One Wireless Controller,a:b0,b:b1,x:b2,y:b3,back:b6,guide:b8,start:b7,leftstick:b9,rightstick:b10,leftshoulder:b4,rightshoulder:b5,dpup:h0.1,dpdown:h0.4,dpleft:h0.8,dpright:h0.2,leftx:a0,lefty:a1,rightx:a3,righty:a4,lefttrigger:a2,righttrigger:a5",
    "030000004c050000c405000011010000,Sony DualShock 4,a:b1,b:b2,x:b0,y:b3,back:b8,guide:b12,start:b9,leftstick:b10,rightstick:b11,leftshoulder:b4,rightshoulder:b5,dpup:h0.1,dpdown:h0.4,dpleft:h0.8,dpright:h0.2,leftx:a0,lefty:a1,rightx:a2,righty:a5,lefttrigger:a3,righttrigger:a4",
    "030000004c050000e60c000011810000,Sony DualSense,a:b0,b:b1,x:b3,y:b2,back:b8,guide:b10,start:b9,leftstick:b11,rightstick:b12,leftshoulder:b4,rightshoulder:b5,dpup:h0.1,dpdown:h0.4,dpleft:h0.8,dpright:h0.2,leftx:a0,lefty:a1,rightx:a3,righty:a4,lefttrigger:a2,righttrigger:a5",
    "03000000de280000ff11000001000000,Valve Streaming Gamepad,a:b0,b:b1,x:b2,y:b3,back:b6,guide:b8,start:b7,leftstick:b9,rightstick:b10,leftshoulder:b4,rightshoulder:b5,dpup:h0.1,dpdown:h0.4,dpleft:h0.8,dpright:h0.2,leftx:a0,lefty:a1,rightx:a3,righty:a4,lefttrigger:a2,righttrigger:a5",
];

/// GUID-indexed dialect database.
pub struct MappingDatabase {
    entries: DenseHashMap<PadGuid, MappingEntry>,
}

impl Default for MappingDatabase {
    fn default() -> Self {
        Self::builtin()
    }
}

impl MappingDatabase {
    /// Database seeded with the embedded table.
    pub fn builtin() -> Self {
        let mut db = Self {
            entries: DenseHashMap::new(),
        };
        for line in BUILTIN_MAPPINGS {
            // Embedded lines are well-formed by construction.
            let _ = db.add_line(line);
        }
        db
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Adds one `gamecontrollerdb.txt` line, replacing any previous entry
    /// for the same GUID.
    pub fn add_line(&mut self, line: &str) -> Result<()> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(());
        }
        let mut parts = line.splitn(3, ',');
        let guid_hex = parts.next().unwrap_or("");
        let name = parts
            .next()
            .ok_or_else(|| Error::Mapping(format!("missing name field: {line}")))?;
        let mapping = parts
            .next()
            .ok_or_else(|| Error::Mapping(format!("missing mapping fields: {line}")))?;
        let guid = PadGuid::parse_hex(guid_hex)
            .ok_or_else(|| Error::Mapping(format!("bad GUID: {guid_hex}")))?;
        self.entries.insert(
            guid,
            MappingEntry {
                name: name.to_string(),
                mapping: PadMapping::parse(mapping),
            },
        );
        Ok(())
    }

    /// Merges a `gamecontrollerdb.txt` file over the current entries.
    /// Malformed lines are skipped with a warning.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let text =
            std::fs::read_to_string(path).map_err(|e| Error::Mapping(e.to_string()))?;
        let mut added = 0;
        for line in text.lines() {
            match self.add_line(line) {
                Ok(()) => added += 1,
                Err(e) => log::warn!("skipping mapping line: {e}"),
            }
        }
        Ok(added)
    }

    /// Merges a JSON array of mapping strings (the config-file friendly
    /// shape: `["<guid>,<name>,a:b1,...", ...]`).
    pub fn load_json_str(&mut self, json: &str) -> Result<usize> {
        let lines: Vec<String> =
            serde_json::from_str(json).map_err(|e| Error::Mapping(e.to_string()))?;
        let mut added = 0;
        for line in &lines {
            self.add_line(line)?;
            added += 1;
        }
        Ok(added)
    }

    pub fn find(&self, guid: &PadGuid) -> Option<&MappingEntry> {
        self.entries.get(guid)
    }

    /// Dialect for `guid`, falling back to the built-in default mapping.
    pub fn mapping_or_default(&self, guid: &PadGuid) -> PadMapping {
        self.find(guid)
            .map(|e| e.mapping.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usb_guid_layout() {
        let g = PadGuid::from_usb_ids(0x045e, 0x028e, 0x0114);
        assert_eq!(g.to_hex(), "030000005e0400008e02000014010000");
    }

    #[test]
    fn legacy_pidvid_fix_up_is_bit_exact() {
        // 0x045e/0x028e in the pre-2.0.5 layout: vid word at chars 0..4,
        // pid word at 4..8, zeros, PIDVID ASCII tail at 20..32.
        let legacy = "5e048e02000000000000504944564944";
        assert_eq!(legacy.len(), 32);
        let fixed = fix_up_legacy_guid(legacy).unwrap();
        assert_eq!(fixed, "030000005e0400008e02000000000000");
        assert_eq!(
            PadGuid::parse_hex(legacy),
            Some(PadGuid::from_usb_ids(0x045e, 0x028e, 0))
        );

        // Wrong length or missing tail: untouched.
        assert_eq!(fix_up_legacy_guid("5e048e02"), None);
        assert_eq!(
            fix_up_legacy_guid("030000005e0400008e02000014010000"),
            None
        );
    }

    #[test]
    fn parse_default_mapping() {
        let m = PadMapping::default();
        assert_eq!(
            m.buttons[MappedButton::A as usize],
            Some(RawTarget::Button(1))
        );
        assert_eq!(
            m.buttons[MappedButton::Guide as usize],
            Some(RawTarget::Button(12))
        );
        assert_eq!(m.axes[MappedAxis::RightY as usize], Some(RawTarget::Axis(5)));
        assert_eq!(
            m.axes[MappedAxis::LeftTrigger as usize],
            Some(RawTarget::Button(6))
        );
        assert_eq!(m.hats[MappedHat::Up as usize], HAT_UP);
        assert_eq!(m.hats[MappedHat::Left as usize], HAT_LEFT);
    }

    #[test]
    fn diagonal_hats_are_or_composed() {
        let m = PadMapping::parse("dpup:h0.1,dpdown:h0.4,dpleft:h0.8,dpright:h0.2");
        assert_eq!(m.hats[MappedHat::LeftUp as usize], HAT_LEFT | HAT_UP);
        assert_eq!(m.hats[MappedHat::RightDown as usize], HAT_RIGHT | HAT_DOWN);
    }

    #[test]
    fn reverse_lookups() {
        let m = PadMapping::default();
        assert_eq!(m.button_for_raw(1), Some(MappedButton::A));
        assert_eq!(m.button_for_raw(12), Some(MappedButton::Guide));
        assert_eq!(m.button_for_raw(40), None);
        assert_eq!(m.axis_for_raw(0), Some(MappedAxis::LeftX));
        assert_eq!(m.axis_for_raw_button(6), Some(MappedAxis::LeftTrigger));
    }

    #[test]
    fn database_lookup_and_fallback() {
        let db = MappingDatabase::builtin();
        let x360 = PadGuid::from_usb_ids(0x045e, 0x028e, 0x0114);
        let entry = db.find(&x360).expect("builtin X360 entry");
        assert!(entry.name.contains("X-Box 360"));
        assert_eq!(
            entry.mapping.buttons[MappedButton::A as usize],
            Some(RawTarget::Button(0))
        );

        let unknown = PadGuid::from_usb_ids(0x1234, 0x5678, 0);
        assert!(db.find(&unknown).is_none());
        let fallback = db.mapping_or_default(&unknown);
        assert_eq!(
            fallback.buttons[MappedButton::A as usize],
            Some(RawTarget::Button(1))
        );
    }

    #[test]
    fn json_override_merges() {
        let mut db = MappingDatabase::builtin();
        let json = r#"[
            "030000001234000056780000aa000000,Custom Pad,a:b3,b:b4,leftx:a0,lefty:a1"
        ]"#;
        assert_eq!(db.load_json_str(json).unwrap(), 1);
        let guid = PadGuid::parse_hex("030000001234000056780000aa000000").unwrap();
        let entry = db.find(&guid).unwrap();
        assert_eq!(entry.name, "Custom Pad");
        assert_eq!(
            entry.mapping.buttons[MappedButton::A as usize],
            Some(RawTarget::Button(3))
        );
        // Malformed JSON is rejected as a whole.
        assert!(db.load_json_str("not json").is_err());
    }

    #[test]
    fn db_line_with_legacy_guid_resolves_to_modern_key() {
        let mut db = MappingDatabase::builtin();
        let legacy_line = format!(
            "{}{}{},Old Pad,a:b0,b:b1",
            "34127856", "000000000000", "504944564944"
        );
        db.add_line(&legacy_line).unwrap();
        let modern = PadGuid::from_usb_ids(0x1234, 0x5678, 0);
        let entry = db.find(&modern).expect("fix-up places entry at modern GUID");
        assert_eq!(entry.name, "Old Pad");
    }
}
