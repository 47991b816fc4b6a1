//! Keyboard device façade.
//!
//! Backends translate platform keycodes into canonical [`Key`] ids through
//! their dialect map and stage presses into the `next` state. When text
//! input is enabled, printable characters are appended to a bounded text
//! queue that is cleared at the start of every update; overflow silently
//! truncates.

use crate::backends::PlatformEvent;
use crate::buttons::{ButtonType, DeviceButtonId, Key, KEY_COUNT, KEY_NAMES};
use crate::delta::DeltaState;
use crate::device::{
    check_all_buttons_down, DeviceButtonSpec, DeviceId, DeviceKind, DeviceState, DeviceVariant,
    InputDeviceOps, INVALID_DEVICE_ID,
};
use crate::state::InputState;

/// Bounded per-tick text input queue.
pub struct TextQueue {
    chars: Vec<char>,
    capacity: usize,
}

impl TextQueue {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            chars: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends a character; drops it when the tick's budget is spent.
    pub fn push(&mut self, c: char) {
        if self.chars.len() < self.capacity {
            self.chars.push(c);
        }
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    pub(crate) fn clear(&mut self) {
        self.chars.clear();
    }
}

/// Mutable view handed to keyboard backends while they decode events.
pub struct KeyboardContext<'a> {
    pub device: DeviceId,
    pub next: &'a mut InputState,
    pub delta: Option<&'a mut DeltaState>,
    /// `None` while text input is disabled.
    pub text: Option<&'a mut TextQueue>,
}

impl KeyboardContext<'_> {
    /// Stages a key transition into the next state.
    pub fn set_key(&mut self, key: Key, pressed: bool) {
        crate::delta::handle_button(self.device, self.next, self.delta.as_deref_mut(), key.id(), pressed);
    }

    /// Queues a printable character when text input is on.
    pub fn push_text(&mut self, c: char) {
        if let Some(text) = self.text.as_deref_mut() {
            text.push(c);
        }
    }
}

/// Platform keyboard implementation.
pub trait KeyboardBackend: Send {
    fn variant(&self) -> DeviceVariant;

    fn device_state(&self) -> DeviceState {
        DeviceState::Ok
    }

    fn device_name(&self) -> &str {
        "keyboard"
    }

    /// Translates one platform event, if it concerns this backend.
    fn handle_event(&mut self, _event: &PlatformEvent, _ctx: &mut KeyboardContext) {}

    /// Pulls pending input on polling backends (evdev). Runs each tick
    /// before the state commit.
    fn poll(&mut self, _ctx: &mut KeyboardContext) {}
}

/// A keyboard device: canonical key state plus the text queue.
pub struct KeyboardDevice {
    id: DeviceId,
    index: u32,
    late_update: bool,
    state: InputState,
    previous: InputState,
    next: InputState,
    text: TextQueue,
    text_input_enabled: bool,
    backend: Box<dyn KeyboardBackend>,
}

impl KeyboardDevice {
    pub(crate) fn new(index: u32, text_capacity: usize, backend: Box<dyn KeyboardBackend>) -> Self {
        Self {
            id: INVALID_DEVICE_ID,
            index,
            late_update: false,
            state: InputState::new(KEY_COUNT),
            previous: InputState::new(KEY_COUNT),
            next: InputState::new(KEY_COUNT),
            text: TextQueue::new(text_capacity),
            text_input_enabled: true,
            backend,
        }
    }

    pub(crate) fn set_device_id(&mut self, id: DeviceId) {
        self.id = id;
    }

    pub(crate) fn set_late_update(&mut self, late: bool) {
        self.late_update = late;
    }

    pub(crate) fn is_late_update(&self) -> bool {
        self.late_update
    }

    pub fn is_text_input_enabled(&self) -> bool {
        self.text_input_enabled
    }

    pub fn set_text_input_enabled(&mut self, enabled: bool) {
        self.text_input_enabled = enabled;
    }

    /// Characters typed since the last update.
    pub fn text_input(&self) -> &[char] {
        self.text.chars()
    }

    pub(crate) fn handle_event(&mut self, event: &PlatformEvent, delta: Option<&mut DeltaState>) {
        let mut ctx = KeyboardContext {
            device: self.id,
            next: &mut self.next,
            delta,
            text: self.text_input_enabled.then_some(&mut self.text),
        };
        self.backend.handle_event(event, &mut ctx);
    }

    pub(crate) fn update(&mut self, delta: Option<&mut DeltaState>) {
        self.text.clear();

        let mut ctx = KeyboardContext {
            device: self.id,
            next: &mut self.next,
            delta,
            text: self.text_input_enabled.then_some(&mut self.text),
        };
        self.backend.poll(&mut ctx);

        self.previous.copy_from(&self.state);
        self.state.copy_from(&self.next);
    }

    /// Direct access for the concurrent-queue drain.
    pub(crate) fn next_state_mut(&mut self) -> &mut InputState {
        &mut self.next
    }

    /// Committed-state access for modifiers and focus-loss clearing.
    pub(crate) fn current_state_mut(&mut self) -> &mut InputState {
        &mut self.state
    }
}

impl InputDeviceOps for KeyboardDevice {
    fn kind(&self) -> DeviceKind {
        DeviceKind::Keyboard
    }

    fn variant(&self) -> DeviceVariant {
        self.backend.variant()
    }

    fn index(&self) -> u32 {
        self.index
    }

    fn device_id(&self) -> DeviceId {
        self.id
    }

    fn device_state(&self) -> DeviceState {
        self.backend.device_state()
    }

    fn device_name(&self) -> &str {
        self.backend.device_name()
    }

    fn is_valid_button(&self, button: DeviceButtonId) -> bool {
        (button as usize) < KEY_COUNT
    }

    fn button_type(&self, button: DeviceButtonId) -> Option<ButtonType> {
        self.is_valid_button(button).then_some(ButtonType::Bool)
    }

    fn button_name(&self, button: DeviceButtonId) -> Option<&'static str> {
        KEY_NAMES.get(button as usize).copied()
    }

    fn button_by_name(&self, name: &str) -> DeviceButtonId {
        Key::from_name(name)
            .map(Key::id)
            .unwrap_or(crate::buttons::INVALID_DEVICE_BUTTON_ID)
    }

    fn get_bool(&self, button: DeviceButtonId) -> bool {
        self.state.get_bool(button)
    }

    fn get_bool_previous(&self, button: DeviceButtonId) -> bool {
        self.previous.get_bool(button)
    }

    fn get_float(&self, button: DeviceButtonId) -> f32 {
        self.state.get_float(button)
    }

    fn any_button_down(&self, out: &mut [DeviceButtonSpec]) -> usize {
        check_all_buttons_down(
            out,
            self.id,
            &self.state,
            |b| ((b as usize) < KEY_COUNT).then_some(ButtonType::Bool),
            0,
            KEY_COUNT as u32,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::synthetic::SyntheticKeyboardBackend;
    use crate::backends::SyntheticEvent;

    fn synthetic_keyboard() -> KeyboardDevice {
        let mut kb = KeyboardDevice::new(0, 8, Box::new(SyntheticKeyboardBackend::new(0)));
        kb.set_device_id(1);
        kb
    }

    #[test]
    fn key_events_stage_then_commit() {
        let mut kb = synthetic_keyboard();
        let ev = SyntheticEvent::Key {
            index: 0,
            key: Key::H,
            pressed: true,
            character: Some('H'),
        };
        kb.handle_event(&PlatformEvent::Synthetic(&ev), None);

        // Staged but not yet committed.
        assert!(!kb.get_bool(Key::H.id()));
        kb.update(None);
        assert!(kb.get_bool(Key::H.id()));
        assert!(!kb.get_bool_previous(Key::H.id()));
    }

    #[test]
    fn text_queue_cleared_by_update_and_truncates() {
        let mut kb = synthetic_keyboard();
        for c in "Hello world!".chars() {
            let ev = SyntheticEvent::Key {
                index: 0,
                key: Key::A,
                pressed: true,
                character: Some(c),
            };
            kb.handle_event(&PlatformEvent::Synthetic(&ev), None);
        }
        // Capacity is 8: silent truncation.
        let text: String = kb.text_input().iter().collect();
        assert_eq!(text, "Hello wo");

        kb.update(None);
        assert!(kb.text_input().is_empty());
    }

    #[test]
    fn disabled_text_input_collects_nothing() {
        let mut kb = synthetic_keyboard();
        kb.set_text_input_enabled(false);
        let ev = SyntheticEvent::Key {
            index: 0,
            key: Key::A,
            pressed: true,
            character: Some('a'),
        };
        kb.handle_event(&PlatformEvent::Synthetic(&ev), None);
        assert!(kb.text_input().is_empty());
    }

    #[test]
    fn name_services() {
        let kb = synthetic_keyboard();
        assert_eq!(kb.button_name(Key::Space.id()), Some("KeySpace"));
        assert_eq!(kb.button_by_name("KeyKpEnter"), Key::KpEnter.id());
        assert_eq!(
            kb.button_by_name("NoSuchKey"),
            crate::buttons::INVALID_DEVICE_BUTTON_ID
        );
        assert_eq!(kb.button_type(Key::A.id()), Some(ButtonType::Bool));
        assert_eq!(kb.button_type(10_000), None);
    }
}
