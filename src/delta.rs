//! Delta state and listener dispatch.
//!
//! While a tick runs, every button/axis write is recorded into a
//! [`DeltaState`] as `(device, button, old, new)`. After all devices have
//! updated, the recorded changes are flushed to listeners in descending
//! priority order; a listener may consume a change to stop its propagation.
//!
//! Writes are recorded even when `old == new`. Backends rely on this: the
//! mouse wheel auto-release must surface a `true -> false` transition on the
//! tick after the notch even though the staged value never flips within a
//! single tick.

use crate::buttons::DeviceButtonId;
use crate::containers::DenseHashMap;
use crate::device::DeviceId;
use crate::state::InputState;

/// Identifier handed out by `add_listener`; monotonically increasing.
pub type ListenerId = u64;

/// One recorded state change.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ButtonChange {
    Bool { old: bool, new: bool },
    Float { old: f32, new: f32 },
}

#[derive(Clone, Copy, Debug)]
pub struct DeltaChange {
    pub device: DeviceId,
    pub button: DeviceButtonId,
    pub change: ButtonChange,
}

/// Observer of per-tick state changes.
///
/// Callbacks return `true` to consume the change, stopping propagation to
/// lower-priority listeners. Callbacks run on the input thread and must not
/// block.
pub trait InputListener: Send {
    /// Higher priorities are notified first. Fixed per listener.
    fn priority(&self) -> i32 {
        0
    }

    fn on_bool_change(
        &mut self,
        device: DeviceId,
        button: DeviceButtonId,
        old: bool,
        new: bool,
        delta_seconds: f32,
    ) -> bool {
        let _ = (device, button, old, new, delta_seconds);
        false
    }

    fn on_float_change(
        &mut self,
        device: DeviceId,
        button: DeviceButtonId,
        old: f32,
        new: f32,
        delta_seconds: f32,
    ) -> bool {
        let _ = (device, button, old, new, delta_seconds);
        false
    }
}

/// Accumulates changes during one tick, flushed to listeners afterwards.
#[derive(Default)]
pub struct DeltaState {
    changes: Vec<DeltaChange>,
}

impl DeltaState {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn add_bool_change(
        &mut self,
        device: DeviceId,
        button: DeviceButtonId,
        old: bool,
        new: bool,
    ) {
        self.changes.push(DeltaChange {
            device,
            button,
            change: ButtonChange::Bool { old, new },
        });
    }

    #[inline]
    pub fn add_float_change(
        &mut self,
        device: DeviceId,
        button: DeviceButtonId,
        old: f32,
        new: f32,
    ) {
        self.changes.push(DeltaChange {
            device,
            button,
            change: ButtonChange::Float { old, new },
        });
    }

    pub fn changes(&self) -> &[DeltaChange] {
        &self.changes
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Flushes every recorded change to the listeners in `sorted` order
    /// (descending priority). A listener returning `true` consumes that
    /// specific change.
    pub fn notify_listeners(
        &self,
        delta_seconds: f32,
        sorted: &[ListenerId],
        listeners: &mut DenseHashMap<ListenerId, Box<dyn InputListener>>,
    ) {
        for dc in &self.changes {
            for id in sorted {
                let Some(listener) = listeners.get_mut(id) else {
                    continue;
                };
                let consumed = match dc.change {
                    ButtonChange::Bool { old, new } => {
                        listener.on_bool_change(dc.device, dc.button, old, new, delta_seconds)
                    }
                    ButtonChange::Float { old, new } => {
                        listener.on_float_change(dc.device, dc.button, old, new, delta_seconds)
                    }
                };
                if consumed {
                    break;
                }
            }
        }
    }

    pub fn clear(&mut self) {
        self.changes.clear();
    }
}

/// Writes a boolean button into `state`, recording the transition when a
/// delta is attached.
#[inline]
pub(crate) fn handle_button(
    device: DeviceId,
    state: &mut InputState,
    delta: Option<&mut DeltaState>,
    button: DeviceButtonId,
    value: bool,
) {
    if let Some(delta) = delta {
        let old = state.get_bool(button);
        delta.add_bool_change(device, button, old, value);
    }
    state.set_bool(button, value);
}

/// Writes a float axis into `state` after applying an axial dead-zone.
///
/// Used for single axes (triggers, wheels); stick pairs go through
/// [`handle_stick_pair`] instead so the dead-zone stays radial.
#[inline]
pub(crate) fn handle_axis(
    device: DeviceId,
    state: &mut InputState,
    delta: Option<&mut DeltaState>,
    button: DeviceButtonId,
    dead_zone: f32,
    mut value: f32,
) {
    if dead_zone > 0.0 {
        let abs = value.abs();
        let sign = if value < 0.0 { -1.0 } else { 1.0 };
        if abs < dead_zone {
            value = 0.0;
        } else {
            value -= sign * dead_zone;
            value *= 1.0 / (1.0 - dead_zone);
        }
    }

    if let Some(delta) = delta {
        let old = state.get_float(button);
        delta.add_float_change(device, button, old, value);
    }
    state.set_float(button, value);
}

/// Writes both axes of a stick, treating the pair as a 2-vector for the
/// dead-zone (scaled radial). Both axes are committed in the same call so
/// observers never see a half-updated pair.
#[inline]
pub(crate) fn handle_stick_pair(
    device: DeviceId,
    state: &mut InputState,
    mut delta: Option<&mut DeltaState>,
    x_button: DeviceButtonId,
    y_button: DeviceButtonId,
    dead_zone: f32,
    x: f32,
    y: f32,
) {
    let (x, y) = scaled_radial_dead_zone(x, y, dead_zone);

    if let Some(delta) = delta.as_deref_mut() {
        delta.add_float_change(device, x_button, state.get_float(x_button), x);
    }
    state.set_float(x_button, x);

    if let Some(delta) = delta {
        delta.add_float_change(device, y_button, state.get_float(y_button), y);
    }
    state.set_float(y_button, y);
}

/// Scaled radial dead-zone over a stick pair.
///
/// Inside the dead-zone radius the output is zero; outside, the magnitude is
/// rescaled onto `[0, 1]` while the direction is preserved.
#[inline]
pub fn scaled_radial_dead_zone(x: f32, y: f32, dead_zone: f32) -> (f32, f32) {
    if dead_zone <= 0.0 {
        return (x, y);
    }
    let magnitude = (x * x + y * y).sqrt();
    if magnitude < dead_zone {
        (0.0, 0.0)
    } else {
        let scale = (magnitude - dead_zone) / (1.0 - dead_zone) / magnitude;
        (x * scale, y * scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Recorder {
        prio: i32,
        calls: Arc<AtomicUsize>,
        consume: bool,
    }

    impl InputListener for Recorder {
        fn priority(&self) -> i32 {
            self.prio
        }
        fn on_bool_change(
            &mut self,
            _d: DeviceId,
            _b: DeviceButtonId,
            _o: bool,
            _n: bool,
            _dt: f32,
        ) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.consume
        }
    }

    #[test]
    fn handle_button_records_unconditionally() {
        let mut state = InputState::new(4);
        let mut delta = DeltaState::new();
        handle_button(1, &mut state, Some(&mut delta), 2, true);
        // Same value again: still recorded (wheel auto-release depends on it).
        handle_button(1, &mut state, Some(&mut delta), 2, true);
        assert_eq!(delta.changes().len(), 2);
        assert!(state.get_bool(2));
    }

    #[test]
    fn axial_dead_zone_rescales() {
        let mut state = InputState::new(2);
        handle_axis(0, &mut state, None, 0, 0.2, 0.1);
        assert_eq!(state.get_float(0), 0.0);
        handle_axis(0, &mut state, None, 0, 0.2, 0.6);
        assert!((state.get_float(0) - 0.5).abs() < 1e-6);
        handle_axis(0, &mut state, None, 0, 0.0, 0.6);
        assert_eq!(state.get_float(0), 0.6);
    }

    #[test]
    fn radial_dead_zone_magnitude_bounded() {
        // Inside the zone: hard zero.
        assert_eq!(scaled_radial_dead_zone(0.1, 0.05, 0.15), (0.0, 0.0));
        // Outside: rescaled, magnitude within [0, 1].
        let (x, y) = scaled_radial_dead_zone(0.5, 0.0, 0.15);
        assert!((x - (0.5 - 0.15) / 0.85).abs() < 1e-5);
        assert_eq!(y, 0.0);
        let (x, y) = scaled_radial_dead_zone(1.0, 0.0, 0.15);
        assert!((x - 1.0).abs() < 1e-6 && y == 0.0);
        // Zero dead-zone passes raw values through.
        assert_eq!(scaled_radial_dead_zone(0.3, -0.4, 0.0), (0.3, -0.4));
    }

    #[test]
    fn consumption_stops_propagation() {
        let mut listeners: DenseHashMap<ListenerId, Box<dyn InputListener>> = DenseHashMap::new();
        let high_calls = Arc::new(AtomicUsize::new(0));
        let low_calls = Arc::new(AtomicUsize::new(0));
        listeners.insert(
            0,
            Box::new(Recorder {
                prio: 10,
                calls: high_calls.clone(),
                consume: true,
            }),
        );
        listeners.insert(
            1,
            Box::new(Recorder {
                prio: 5,
                calls: low_calls.clone(),
                consume: false,
            }),
        );

        let mut delta = DeltaState::new();
        delta.add_bool_change(0, 0, false, true);
        delta.notify_listeners(0.016, &[0, 1], &mut listeners);

        assert_eq!(high_calls.load(Ordering::SeqCst), 1);
        assert_eq!(low_calls.load(Ordering::SeqCst), 0);
    }
}
