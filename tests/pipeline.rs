//! End-to-end pipeline tests driven through the synthetic source.
//!
//! These exercise the full translate -> stage -> tick -> delta -> listener
//! path the way an engine embeds the manager, without requiring hardware.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use intake::prelude::*;
use intake::rumble::RumbleSink;

const DT: f32 = 1.0 / 60.0;

fn manager() -> InputManager {
    let mut manager = InputManager::new(InputConfig::default());
    manager.init().expect("init");
    manager
}

#[derive(Clone, Default)]
struct Record {
    bools: Arc<Mutex<Vec<(DeviceId, DeviceButtonId, bool, bool)>>>,
    floats: Arc<Mutex<Vec<(DeviceId, DeviceButtonId, f32, f32)>>>,
}

struct RecordingListener {
    record: Record,
    priority: i32,
    consume: bool,
    calls: Arc<AtomicUsize>,
}

impl RecordingListener {
    fn new(record: Record, priority: i32, consume: bool, calls: Arc<AtomicUsize>) -> Box<Self> {
        Box::new(Self {
            record,
            priority,
            consume,
            calls,
        })
    }
}

impl InputListener for RecordingListener {
    fn priority(&self) -> i32 {
        self.priority
    }

    fn on_bool_change(
        &mut self,
        device: DeviceId,
        button: DeviceButtonId,
        old: bool,
        new: bool,
        _dt: f32,
    ) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.record.bools.lock().unwrap().push((device, button, old, new));
        self.consume
    }

    fn on_float_change(
        &mut self,
        device: DeviceId,
        button: DeviceButtonId,
        old: f32,
        new: f32,
        _dt: f32,
    ) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.record
            .floats
            .lock()
            .unwrap()
            .push((device, button, old, new));
        self.consume
    }
}

#[test]
fn lifecycle_guards() {
    let mut manager = InputManager::new(InputConfig::default());
    assert!(manager.update(DT).is_err());
    assert!(manager.exit().is_err());
    manager.init().unwrap();
    assert!(manager.init().is_err());
    manager.exit().unwrap();
    assert!(manager.update(DT).is_err());
    manager.init().unwrap();
}

#[test]
fn keyboard_text_round_trip() {
    let mut manager = manager();
    let id = manager.create_keyboard(DeviceVariant::Synthetic).unwrap();

    for (key, c) in [(Key::H, 'H'), (Key::I, 'i')] {
        manager.handle_synthetic(&SyntheticEvent::Key {
            index: 0,
            key,
            pressed: true,
            character: Some(c),
        });
    }

    // Before the tick: text is readable, keys are not yet committed.
    let text: String = manager.keyboard(id).unwrap().text_input().iter().collect();
    assert_eq!(text, "Hi");
    assert!(!manager.get_device(id).unwrap().get_bool(Key::H.id()));

    manager.update(DT).unwrap();

    assert!(manager.keyboard(id).unwrap().text_input().is_empty());
    let device = manager.get_device(id).unwrap();
    assert!(device.get_bool(Key::H.id()));
    assert!(device.get_bool(Key::I.id()));
}

#[test]
fn wheel_auto_release_over_two_ticks() {
    let mut manager = manager();
    let id = manager.create_mouse(DeviceVariant::Synthetic).unwrap();

    let record = Record::default();
    let calls = Arc::new(AtomicUsize::new(0));
    manager.add_listener(RecordingListener::new(record.clone(), 0, false, calls));

    manager.handle_synthetic(&SyntheticEvent::MouseWheel {
        index: 0,
        notches: 1,
    });
    manager.update(DT).unwrap();

    let wheel = MouseButton::WheelUp.id();
    {
        let bools = record.bools.lock().unwrap();
        assert!(bools.contains(&(id, wheel, false, true)));
    }
    assert!(manager.get_device(id).unwrap().get_bool(wheel));

    record.bools.lock().unwrap().clear();
    manager.update(DT).unwrap();

    let bools = record.bools.lock().unwrap();
    assert!(bools.contains(&(id, wheel, true, false)));
    assert!(!manager.get_device(id).unwrap().get_bool(wheel));
}

#[test]
fn stick_dead_zone_through_the_manager() {
    let mut manager = manager();
    manager.create_controllers(2).unwrap();
    manager.handle_synthetic(&SyntheticEvent::PadConnection {
        slot: 0,
        connected: true,
    });
    manager.update(DT).unwrap();
    let id = manager.find_device_id(DeviceKind::Pad, 0).expect("pad bound");

    // Inside the radius: both axes zero.
    manager.handle_synthetic(&SyntheticEvent::PadAxis {
        slot: 0,
        button: PadButton::LeftStickY,
        value: 0.05,
    });
    manager.handle_synthetic(&SyntheticEvent::PadAxis {
        slot: 0,
        button: PadButton::LeftStickX,
        value: 0.1,
    });
    manager.update(DT).unwrap();
    let device = manager.get_device(id).unwrap();
    assert_eq!(device.get_float(PadButton::LeftStickX.id()), 0.0);
    assert_eq!(device.get_float(PadButton::LeftStickY.id()), 0.0);

    // Outside: rescaled, magnitude stays within [0, 1].
    manager.handle_synthetic(&SyntheticEvent::PadAxis {
        slot: 0,
        button: PadButton::LeftStickY,
        value: 0.0,
    });
    manager.handle_synthetic(&SyntheticEvent::PadAxis {
        slot: 0,
        button: PadButton::LeftStickX,
        value: 0.5,
    });
    manager.update(DT).unwrap();
    let device = manager.get_device(id).unwrap();
    assert!((device.get_float(PadButton::LeftStickX.id()) - 0.4118).abs() < 1e-3);
}

#[test]
fn pad_hot_plug_mints_and_retires_ids() {
    let mut manager = manager();
    manager.create_controllers(2).unwrap();

    let events: Arc<Mutex<Vec<(DeviceId, bool)>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    manager.set_device_listener(Some(Box::new(move |id, kind, index, added| {
        if kind == DeviceKind::Pad {
            assert_eq!(index, 0);
            sink.lock().unwrap().push((id, added));
        }
    })));

    // Slot 0 starts unbound.
    assert!(manager.find_device_id(DeviceKind::Pad, 0).is_none());

    manager.handle_synthetic(&SyntheticEvent::PadConnection {
        slot: 0,
        connected: true,
    });
    manager.update(DT).unwrap();

    let first_id = manager.find_device_id(DeviceKind::Pad, 0).expect("bound");
    assert_eq!(manager.get_device(first_id).unwrap().device_state(), DeviceState::Ok);
    {
        let events = events.lock().unwrap();
        assert_eq!(events.as_slice(), &[(first_id, true)]);
    }

    // Input flows while bound.
    manager.handle_synthetic(&SyntheticEvent::PadButton {
        slot: 0,
        button: PadButton::A,
        pressed: true,
    });
    manager.update(DT).unwrap();
    assert!(manager.get_device(first_id).unwrap().get_bool(PadButton::A.id()));

    // Unplug: the id is retired and never reused.
    manager.handle_synthetic(&SyntheticEvent::PadConnection {
        slot: 0,
        connected: false,
    });
    manager.update(DT).unwrap();
    assert!(manager.get_device(first_id).is_none());
    assert!(manager.find_device_id(DeviceKind::Pad, 0).is_none());
    {
        let events = events.lock().unwrap();
        assert_eq!(events.as_slice(), &[(first_id, true), (first_id, false)]);
    }

    // Replug: a fresh, larger id.
    manager.handle_synthetic(&SyntheticEvent::PadConnection {
        slot: 0,
        connected: true,
    });
    manager.update(DT).unwrap();
    let second_id = manager.find_device_id(DeviceKind::Pad, 0).expect("rebound");
    assert!(second_id > first_id);
    // The fresh binding starts from a cleared state.
    assert!(!manager.get_device(second_id).unwrap().get_bool(PadButton::A.id()));
}

#[derive(Default)]
struct CapturedReports {
    reports: Mutex<Vec<Vec<u8>>>,
}

impl RumbleSink for CapturedReports {
    fn write_report(&self, report: &[u8]) -> std::io::Result<usize> {
        self.reports.lock().unwrap().push(report.to_vec());
        Ok(report.len())
    }
}

#[test]
fn rumble_effect_reaches_the_worker() {
    let mut manager = manager();
    manager.create_controllers(1).unwrap();
    manager.handle_synthetic(&SyntheticEvent::PadConnection {
        slot: 0,
        connected: true,
    });
    manager.update(DT).unwrap();
    let id = manager.find_device_id(DeviceKind::Pad, 0).unwrap();

    let sink = Arc::new(CapturedReports::default());
    manager
        .pad_mut(id)
        .unwrap()
        .synthetic_backend_mut()
        .unwrap()
        .set_rumble_sink(sink.clone());

    assert!(manager.set_rumble_effect(id, 0.5, 0.5, 100));

    // The worker drains asynchronously.
    let deadline = std::time::Instant::now() + Duration::from_secs(2);
    while sink.reports.lock().unwrap().is_empty() && std::time::Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(2));
    }
    {
        let reports = sink.reports.lock().unwrap();
        assert_eq!(reports.len(), 1);
        let report = &reports[0];
        assert_eq!(report.len(), 9);
        assert_eq!(&report[..2], &[0x03, 0x0F]);
        assert_eq!(report[4], 127);
        assert_eq!(report[5], 127);
        assert_eq!(report[6], 10); // 100 ms in 10 ms units
        assert_eq!(report[8], 0);
    }

    // Effect elapsed: the caller pushes a stop packet.
    assert!(manager.set_rumble_effect(id, 0.0, 0.0, 0));
    let deadline = std::time::Instant::now() + Duration::from_secs(2);
    while sink.reports.lock().unwrap().len() < 2 && std::time::Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(2));
    }
    let reports = sink.reports.lock().unwrap();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[1][4], 0);
    assert_eq!(reports[1][5], 0);
}

#[test]
fn listener_priority_and_consumption() {
    let mut manager = manager();
    let id = manager.create_keyboard(DeviceVariant::Synthetic).unwrap();

    // B registers first but has the lower priority.
    let b_calls = Arc::new(AtomicUsize::new(0));
    let a_calls = Arc::new(AtomicUsize::new(0));
    manager.add_listener(RecordingListener::new(
        Record::default(),
        5,
        false,
        b_calls.clone(),
    ));
    manager.add_listener(RecordingListener::new(
        Record::default(),
        10,
        true, // A consumes
        a_calls.clone(),
    ));

    manager.handle_synthetic(&SyntheticEvent::Key {
        index: 0,
        key: Key::Space,
        pressed: true,
        character: None,
    });
    manager.update(DT).unwrap();

    assert_eq!(a_calls.load(Ordering::SeqCst), 1);
    assert_eq!(b_calls.load(Ordering::SeqCst), 0);
    assert!(manager.get_device(id).unwrap().get_bool(Key::Space.id()));
}

#[test]
fn concurrent_queue_drains_into_next_tick() {
    let mut manager = manager();
    let id = manager.create_keyboard(DeviceVariant::Synthetic).unwrap();

    let record = Record::default();
    manager.add_listener(RecordingListener::new(
        record.clone(),
        0,
        false,
        Arc::new(AtomicUsize::new(0)),
    ));

    // Producer thread pushes through the queue handle.
    let queue = manager.queue();
    let t = std::thread::spawn(move || {
        queue.enqueue_bool(id, Key::A.id(), true);
        queue.enqueue_float(id, Key::B.id() /* unused float slot */, 0.0);
    });
    t.join().unwrap();

    manager.update(DT).unwrap();
    assert!(manager.get_device(id).unwrap().get_bool(Key::A.id()));
    // Delta recorded the transition, and the committed state matches it.
    {
        let bools = record.bools.lock().unwrap();
        let change = bools
            .iter()
            .find(|(d, b, _, _)| *d == id && *b == Key::A.id())
            .expect("change recorded");
        assert_eq!((change.2, change.3), (false, true));
    }

    // Draining is idempotent on a quiescent producer.
    record.bools.lock().unwrap().clear();
    manager.update(DT).unwrap();
    assert!(record.bools.lock().unwrap().is_empty());
}

#[test]
fn embedder_device_input_path() {
    let mut manager = manager();
    manager.create_controllers(1).unwrap();

    // Connection edge delivered like platform glue would.
    manager.handle_device_input(DeviceInput {
        kind: DeviceKind::Pad,
        index: 0,
        button: 0,
        value: DeviceInputValue::Connection(true),
    });
    manager.update(DT).unwrap();
    // The connect is consumed during this tick's drain; binding is
    // reconciled within the same update.
    let id = manager.find_device_id(DeviceKind::Pad, 0).expect("bound");

    manager.handle_device_input(DeviceInput {
        kind: DeviceKind::Pad,
        index: 0,
        button: PadButton::B.id(),
        value: DeviceInputValue::Bool(true),
    });
    manager.update(DT).unwrap();
    assert!(manager.get_device(id).unwrap().get_bool(PadButton::B.id()));
}

#[test]
fn any_button_down_truncates() {
    let mut manager = manager();
    let id = manager.create_keyboard(DeviceVariant::Synthetic).unwrap();

    for key in [Key::A, Key::B, Key::C, Key::D] {
        manager.handle_synthetic(&SyntheticEvent::Key {
            index: 0,
            key,
            pressed: true,
            character: None,
        });
    }
    manager.update(DT).unwrap();

    let mut out = [DeviceButtonSpec::default(); 2];
    let n = manager.any_button_down(&mut out);
    assert_eq!(n, 2);
    assert!(out.iter().all(|spec| spec.device == id));
}

#[test]
fn clear_all_states_releases_everything() {
    let mut manager = manager();
    let id = manager.create_keyboard(DeviceVariant::Synthetic).unwrap();
    manager.handle_synthetic(&SyntheticEvent::Key {
        index: 0,
        key: Key::W,
        pressed: true,
        character: None,
    });
    manager.update(DT).unwrap();
    assert!(manager.get_device(id).unwrap().get_bool(Key::W.id()));

    manager.clear_all_states(id);
    assert!(!manager.get_device(id).unwrap().get_bool(Key::W.id()));
    // The staged state was cleared too, so the release sticks.
    manager.update(DT).unwrap();
    assert!(!manager.get_device(id).unwrap().get_bool(Key::W.id()));
}

#[test]
fn time_advances_without_drift() {
    let mut manager = manager();
    // 1000 ticks of 1/3 ms each: exactly 333333 us, despite per-tick
    // fractions.
    for _ in 0..1000 {
        manager.update(1.0 / 3000.0).unwrap();
    }
    let us = manager.time_us();
    assert!((333_000..=334_000).contains(&us), "time drifted: {us}");
}

#[test]
fn modifier_runs_between_early_and_late() {
    struct Inverter {
        target: DeviceId,
    }
    impl DeviceStateModifier for Inverter {
        fn update(
            &mut self,
            devices: &mut intake::manager::DeviceRegistry,
            delta: Option<&mut DeltaState>,
        ) {
            let value = devices
                .get(self.target)
                .map(|d| d.get_float(MouseButton::AxisX.id()))
                .unwrap_or(0.0);
            devices.modify_float(self.target, MouseButton::AxisX.id(), -value, delta);
        }
    }

    let mut manager = manager();
    let id = manager.create_mouse(DeviceVariant::Synthetic).unwrap();
    manager.add_device_state_modifier(Box::new(Inverter { target: id }));

    manager.handle_synthetic(&SyntheticEvent::MouseMove {
        index: 0,
        x: 100.0,
        y: 0.0,
    });
    manager.update(DT).unwrap();
    assert_eq!(
        manager.get_device(id).unwrap().get_float(MouseButton::AxisX.id()),
        -100.0
    );
}
