//! Canonical button and axis id spaces.
//!
//! Every device exposes a dense `DeviceButtonId` space. Each id is either a
//! boolean button or a float axis; a device's `button_type` reports which.
//! The string names published here are part of the ABI: bindings and config
//! files refer to buttons by these exact names (`"KeyA"`, `"mouse_left"`,
//! `"pad_button_a"`, `"pad_left_stick_x"`, ...), so they must stay stable.

/// Dense per-device button/axis identifier.
pub type DeviceButtonId = u32;

/// Sentinel returned by name lookups that do not match any button.
pub const INVALID_DEVICE_BUTTON_ID: DeviceButtonId = DeviceButtonId::MAX;

/// Whether a device button carries a boolean or a float value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ButtonType {
    Bool,
    Float,
}

macro_rules! keys {
    ($($name:ident $(= $lit:literal)?),+ $(,)?) => {
        /// Canonical keyboard keys.
        ///
        /// The discriminant is the key's `DeviceButtonId` on keyboard
        /// devices. All keys are boolean buttons.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        #[repr(u32)]
        pub enum Key {
            $($name),+
        }

        /// ABI-stable key names, indexed by key id.
        pub const KEY_NAMES: &[&str] = &[$(keys!(@name $name $(= $lit)?)),+];

        const ALL_KEYS: &[Key] = &[$(Key::$name),+];
    };
    (@name $name:ident = $lit:literal) => { $lit };
    (@name $name:ident) => { concat!("Key", stringify!($name)) };
}

keys! {
    Escape,
    F1, F2, F3, F4, F5, F6, F7, F8, F9, F10, F11, F12,
    Print, ScrollLock, Break,
    Space, Apostrophe, Comma, Minus, Period, Slash,
    N0 = "Key0", N1 = "Key1", N2 = "Key2", N3 = "Key3", N4 = "Key4",
    N5 = "Key5", N6 = "Key6", N7 = "Key7", N8 = "Key8", N9 = "Key9",
    Semicolon, Less, Equal,
    A, B, C, D, E, F, G, H, I, J, K, L, M,
    N, O, P, Q, R, S, T, U, V, W, X, Y, Z,
    BracketLeft, Backslash, BracketRight, Grave,
    Left, Right, Up, Down,
    Insert, Home, Delete, End, PageUp, PageDown,
    NumLock,
    KpDivide, KpMultiply, KpSubtract, KpAdd, KpEnter,
    KpInsert, KpEnd, KpDown, KpPageDown, KpLeft, KpBegin,
    KpRight, KpHome, KpUp, KpPageUp, KpDelete,
    BackSpace, Tab, Return, CapsLock,
    ShiftL, CtrlL, SuperL, AltL, AltR, SuperR, Menu, CtrlR, ShiftR,
    Mute, VolumeDown, VolumeUp,
    MediaPlayPause, MediaStop, MediaNext, MediaPrevious,
    Circumflex, Ssharp, Acute, AltGr, Plus, Numbersign,
    Udiaeresis, Adiaeresis, Odiaeresis, Section, Aring, Diaeresis,
    Twosuperior, RightParenthesis, Dollar, Ugrave, Asterisk, Colon, Exclam,
}

/// Number of canonical keyboard keys.
pub const KEY_COUNT: usize = KEY_NAMES.len();

impl Key {
    #[inline]
    pub const fn id(self) -> DeviceButtonId {
        self as DeviceButtonId
    }

    pub fn from_id(id: DeviceButtonId) -> Option<Key> {
        ALL_KEYS.get(id as usize).copied()
    }

    pub fn name(self) -> &'static str {
        KEY_NAMES[self as usize]
    }

    pub fn from_name(name: &str) -> Option<Key> {
        KEY_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|i| ALL_KEYS[i])
    }
}

/// Canonical mouse buttons and axes.
///
/// Buttons 0..=20 are boolean; `AxisX`/`AxisY` are float axes. Buttons 3/4
/// carry wheel up/down notches as one-tick pulses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum MouseButton {
    Left = 0,
    Middle = 1,
    Right = 2,
    WheelUp = 3,
    WheelDown = 4,
    Button5 = 5,
    Button6 = 6,
    Button7 = 7,
    Button8 = 8,
    Button9 = 9,
    Button10 = 10,
    Button11 = 11,
    Button12 = 12,
    Button13 = 13,
    Button14 = 14,
    Button15 = 15,
    Button16 = 16,
    Button17 = 17,
    Button18 = 18,
    Button19 = 19,
    Button20 = 20,
    AxisX = 21,
    AxisY = 22,
}

pub const MOUSE_BUTTON_COUNT: usize = 21;
pub const MOUSE_AXIS_COUNT: usize = 2;

pub(crate) static MOUSE_BUTTON_NAMES: [&str; MOUSE_BUTTON_COUNT + MOUSE_AXIS_COUNT] = [
    "mouse_left",
    "mouse_middle",
    "mouse_right",
    "mouse_wheel_up",
    "mouse_wheel_down",
    "mouse_5",
    "mouse_6",
    "mouse_7",
    "mouse_8",
    "mouse_9",
    "mouse_10",
    "mouse_11",
    "mouse_12",
    "mouse_13",
    "mouse_14",
    "mouse_15",
    "mouse_16",
    "mouse_17",
    "mouse_18",
    "mouse_19",
    "mouse_20",
    "mouse_x",
    "mouse_y",
];

impl MouseButton {
    #[inline]
    pub const fn id(self) -> DeviceButtonId {
        self as DeviceButtonId
    }

    pub fn button_type(id: DeviceButtonId) -> Option<ButtonType> {
        match id as usize {
            i if i < MOUSE_BUTTON_COUNT => Some(ButtonType::Bool),
            i if i < MOUSE_BUTTON_COUNT + MOUSE_AXIS_COUNT => Some(ButtonType::Float),
            _ => None,
        }
    }
}

/// Canonical pad buttons and axes.
///
/// Float axes occupy ids 0..=43 (sticks, triggers on axis 4/5, reserved
/// axes, motion sensors), boolean buttons 44..=75. The layout and names are
/// fixed; backends translate vendor codes into this space via their dialect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum PadButton {
    LeftStickX = 0,
    LeftStickY = 1,
    RightStickX = 2,
    RightStickY = 3,
    Axis4 = 4,
    Axis5 = 5,
    Axis6 = 6,
    Axis7 = 7,
    Axis8 = 8,
    Axis9 = 9,
    Axis10 = 10,
    Axis11 = 11,
    Axis12 = 12,
    Axis13 = 13,
    Axis14 = 14,
    Axis15 = 15,
    Axis16 = 16,
    Axis17 = 17,
    Axis18 = 18,
    Axis19 = 19,
    Axis20 = 20,
    Axis21 = 21,
    Axis22 = 22,
    Axis23 = 23,
    Axis24 = 24,
    Axis25 = 25,
    Axis26 = 26,
    Axis27 = 27,
    Axis28 = 28,
    Axis29 = 29,
    Axis30 = 30,
    Axis31 = 31,
    AccelerationX = 32,
    AccelerationY = 33,
    AccelerationZ = 34,
    GravityX = 35,
    GravityY = 36,
    GravityZ = 37,
    GyroscopeX = 38,
    GyroscopeY = 39,
    GyroscopeZ = 40,
    MagneticFieldX = 41,
    MagneticFieldY = 42,
    MagneticFieldZ = 43,
    Start = 44,
    Select = 45,
    Left = 46,
    Right = 47,
    Up = 48,
    Down = 49,
    A = 50,
    B = 51,
    X = 52,
    Y = 53,
    L1 = 54,
    R1 = 55,
    L2 = 56,
    R2 = 57,
    L3 = 58,
    R3 = 59,
    Home = 60,
    Button17 = 61,
    Button18 = 62,
    Button19 = 63,
    Button20 = 64,
    Button21 = 65,
    Button22 = 66,
    Button23 = 67,
    Button24 = 68,
    Button25 = 69,
    Button26 = 70,
    Button27 = 71,
    Button28 = 72,
    Button29 = 73,
    Button30 = 74,
    Button31 = 75,
}

pub const PAD_AXIS_COUNT: usize = 44;
pub const PAD_BUTTON_COUNT: usize = 32;

pub(crate) static PAD_BUTTON_NAMES: [&str; PAD_AXIS_COUNT + PAD_BUTTON_COUNT] = [
    "pad_left_stick_x",
    "pad_left_stick_y",
    "pad_right_stick_x",
    "pad_right_stick_y",
    "pad_axis_4",
    "pad_axis_5",
    "pad_axis_6",
    "pad_axis_7",
    "pad_axis_8",
    "pad_axis_9",
    "pad_axis_10",
    "pad_axis_11",
    "pad_axis_12",
    "pad_axis_13",
    "pad_axis_14",
    "pad_axis_15",
    "pad_axis_16",
    "pad_axis_17",
    "pad_axis_18",
    "pad_axis_19",
    "pad_axis_20",
    "pad_axis_21",
    "pad_axis_22",
    "pad_axis_23",
    "pad_axis_24",
    "pad_axis_25",
    "pad_axis_26",
    "pad_axis_27",
    "pad_axis_28",
    "pad_axis_29",
    "pad_axis_30",
    "pad_axis_31",
    "pad_acceleration_x",
    "pad_acceleration_y",
    "pad_acceleration_z",
    "pad_gravity_x",
    "pad_gravity_y",
    "pad_gravity_z",
    "pad_gyroscope_x",
    "pad_gyroscope_y",
    "pad_gyroscope_z",
    "pad_magneticfield_x",
    "pad_magneticfield_y",
    "pad_magneticfield_z",
    "pad_button_start",
    "pad_button_select",
    "pad_button_left",
    "pad_button_right",
    "pad_button_up",
    "pad_button_down",
    "pad_button_a",
    "pad_button_b",
    "pad_button_x",
    "pad_button_y",
    "pad_button_l1",
    "pad_button_r1",
    "pad_button_l2",
    "pad_button_r2",
    "pad_button_l3",
    "pad_button_r3",
    "pad_button_home",
    "pad_button_17",
    "pad_button_18",
    "pad_button_19",
    "pad_button_20",
    "pad_button_21",
    "pad_button_22",
    "pad_button_23",
    "pad_button_24",
    "pad_button_25",
    "pad_button_26",
    "pad_button_27",
    "pad_button_28",
    "pad_button_29",
    "pad_button_30",
    "pad_button_31",
];

impl PadButton {
    #[inline]
    pub const fn id(self) -> DeviceButtonId {
        self as DeviceButtonId
    }

    pub fn button_type(id: DeviceButtonId) -> Option<ButtonType> {
        match id as usize {
            i if i < PAD_AXIS_COUNT => Some(ButtonType::Float),
            i if i < PAD_AXIS_COUNT + PAD_BUTTON_COUNT => Some(ButtonType::Bool),
            _ => None,
        }
    }
}

/// Canonical touch channels: 8 fingers, each with down/x/y/pressure.
///
/// Finger `f` occupies ids `f * 4 ..= f * 4 + 3`; channel 0 (down) is a
/// boolean, channels 1..=3 are float axes.
pub const TOUCH_FINGER_COUNT: usize = 8;
pub const TOUCH_CHANNELS_PER_FINGER: usize = 4;
pub const TOUCH_BUTTON_COUNT: usize = TOUCH_FINGER_COUNT * TOUCH_CHANNELS_PER_FINGER;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum TouchChannel {
    Down = 0,
    X = 1,
    Y = 2,
    Pressure = 3,
}

/// Id of one channel of one finger.
#[inline]
pub const fn touch_button(finger: usize, channel: TouchChannel) -> DeviceButtonId {
    (finger * TOUCH_CHANNELS_PER_FINGER) as DeviceButtonId + channel as DeviceButtonId
}

pub(crate) fn touch_button_type(id: DeviceButtonId) -> Option<ButtonType> {
    if (id as usize) >= TOUCH_BUTTON_COUNT {
        return None;
    }
    if id as usize % TOUCH_CHANNELS_PER_FINGER == 0 {
        Some(ButtonType::Bool)
    } else {
        Some(ButtonType::Float)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_names_are_symbolic() {
        assert_eq!(Key::A.name(), "KeyA");
        assert_eq!(Key::Space.name(), "KeySpace");
        assert_eq!(Key::KpEnter.name(), "KeyKpEnter");
        assert_eq!(Key::N0.name(), "Key0");
        assert_eq!(Key::from_name("KeyShiftL"), Some(Key::ShiftL));
        assert_eq!(Key::from_name("KeyBogus"), None);
    }

    #[test]
    fn key_table_is_dense() {
        assert_eq!(KEY_NAMES.len(), KEY_COUNT);
        for id in 0..KEY_COUNT as u32 {
            let key = Key::from_id(id).unwrap();
            assert_eq!(key.id(), id);
            assert_eq!(Key::from_name(key.name()), Some(key));
        }
    }

    #[test]
    fn pad_layout_matches_names() {
        assert_eq!(PAD_BUTTON_NAMES[PadButton::A.id() as usize], "pad_button_a");
        assert_eq!(
            PAD_BUTTON_NAMES[PadButton::LeftStickX.id() as usize],
            "pad_left_stick_x"
        );
        assert_eq!(PAD_BUTTON_NAMES[PadButton::Axis4.id() as usize], "pad_axis_4");
        assert_eq!(
            PadButton::button_type(PadButton::LeftStickY.id()),
            Some(ButtonType::Float)
        );
        assert_eq!(
            PadButton::button_type(PadButton::Home.id()),
            Some(ButtonType::Bool)
        );
        assert_eq!(PadButton::button_type(76), None);
    }

    #[test]
    fn mouse_layout() {
        assert_eq!(MOUSE_BUTTON_NAMES[MouseButton::Left.id() as usize], "mouse_left");
        assert_eq!(MOUSE_BUTTON_NAMES[MouseButton::AxisX.id() as usize], "mouse_x");
        assert_eq!(
            MouseButton::button_type(MouseButton::WheelUp.id()),
            Some(ButtonType::Bool)
        );
        assert_eq!(
            MouseButton::button_type(MouseButton::AxisY.id()),
            Some(ButtonType::Float)
        );
    }

    #[test]
    fn touch_channel_ids() {
        assert_eq!(touch_button(0, TouchChannel::Down), 0);
        assert_eq!(touch_button(2, TouchChannel::Y), 10);
        assert_eq!(touch_button_type(0), Some(ButtonType::Bool));
        assert_eq!(touch_button_type(10), Some(ButtonType::Float));
        assert_eq!(touch_button_type(32), None);
    }
}
