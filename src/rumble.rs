//! Rumble / haptics scheduling.
//!
//! Timed dual-motor effects are queued from any thread into a small bounded
//! array guarded by a mutex + condition variable and drained by a single
//! worker thread, which emits output reports. The worker is the only
//! long-lived thread in the crate; it parks on the condition variable until
//! an effect arrives or shutdown is requested.
//!
//! Each sink reports effects in its own hardware format
//! ([`RumbleFormat`]):
//! - Xbox-One-BT rumble: 9 bytes
//!   `{0x03, 0x0F, 0, 0, left, right, dur10ms, 0, loop_count}`, with the
//!   duration encoded on-device.
//! - PlayStation-family feedback: 32 bytes with header
//!   `{0x05, 0xFF, 0, 0, right, left, R, G, B, 0, ...}`. The packet carries
//!   no duration; the motors run until the next write (callers send an
//!   explicit stop).

use std::sync::Arc;
use std::thread::JoinHandle;

use log::{debug, warn};
use parking_lot::{Condvar, Mutex};

use crate::error::{Error, Result};

/// Output report formats understood by the worker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RumbleFormat {
    /// 9-byte Xbox-One-BT packet.
    XboxOneBt,
    /// 32-byte PlayStation feedback packet (rumble + light bar).
    PlayStation,
}

/// Builds the output report for one effect in the given format. `led` only
/// matters for the PlayStation layout, which re-states the light bar color
/// in every packet.
pub fn build_effect_report(
    format: RumbleFormat,
    left: f32,
    right: f32,
    duration_ms: u32,
    led: (u8, u8, u8),
) -> Vec<u8> {
    match format {
        RumbleFormat::XboxOneBt => xbox_one_bt_report(left, right, duration_ms).to_vec(),
        RumbleFormat::PlayStation => {
            let (r, g, b) = led;
            ps_feedback_report(left, right, r, g, b).to_vec()
        }
    }
}

/// Destination for output reports. Implemented for open HID device handles;
/// tests substitute a recording sink.
///
/// The sink decides what an effect looks like on the wire: the worker asks
/// it to build the report and then writes it back through the same sink, so
/// a PlayStation pad never receives an Xbox-shaped packet.
pub trait RumbleSink: Send + Sync {
    fn write_report(&self, report: &[u8]) -> std::io::Result<usize>;

    /// Report for one effect; the default is the Xbox-One-BT packet.
    fn build_report(&self, left: f32, right: f32, duration_ms: u32) -> Vec<u8> {
        build_effect_report(RumbleFormat::XboxOneBt, left, right, duration_ms, (0, 0, 0))
    }

    /// Identifier used in log lines.
    fn label(&self) -> String {
        "hid".to_string()
    }
}

/// [`RumbleSink`] over an open `hidapi` device.
///
/// Also tracks the light bar color so PlayStation packets (which re-state it
/// on every write) stay consistent between the worker and the synchronous
/// vibrate/LED paths.
pub struct HidSink {
    device: Mutex<hidapi::HidDevice>,
    label: String,
    format: RumbleFormat,
    led: Mutex<(u8, u8, u8)>,
}

impl HidSink {
    pub fn new(device: hidapi::HidDevice, label: impl Into<String>, format: RumbleFormat) -> Self {
        Self {
            device: Mutex::new(device),
            label: label.into(),
            format,
            led: Mutex::new((0, 0, 0)),
        }
    }

    pub fn set_led(&self, r: u8, g: u8, b: u8) {
        *self.led.lock() = (r, g, b);
    }

    pub fn led(&self) -> (u8, u8, u8) {
        *self.led.lock()
    }

    /// Non-blocking input-report read for the owning backend; the handle is
    /// shared between the update thread (reads) and the rumble worker
    /// (writes).
    pub fn read_timeout(&self, buf: &mut [u8], timeout_ms: i32) -> std::io::Result<usize> {
        self.device
            .lock()
            .read_timeout(buf, timeout_ms)
            .map_err(|e| std::io::Error::other(e.to_string()))
    }
}

impl RumbleSink for HidSink {
    fn write_report(&self, report: &[u8]) -> std::io::Result<usize> {
        self.device
            .lock()
            .write(report)
            .map_err(|e| std::io::Error::other(e.to_string()))
    }

    fn build_report(&self, left: f32, right: f32, duration_ms: u32) -> Vec<u8> {
        build_effect_report(self.format, left, right, duration_ms, self.led())
    }

    fn label(&self) -> String {
        self.label.clone()
    }
}

/// One queued effect.
#[derive(Clone)]
pub struct RumbleEffect {
    pub left: f32,
    pub right: f32,
    pub duration_ms: u32,
    pub sink: Arc<dyn RumbleSink>,
}

/// Encodes a millisecond duration into the report's
/// `(duration10ms, loop_count)` pair.
///
/// The duration byte counts 10 ms units. Durations beyond 2.55 s divide the
/// 10 ms count across up to 255 loops; the count itself saturates at 255.
pub fn encode_duration(duration_ms: u32) -> (u8, u8) {
    let duration_packet = duration_ms / 10;
    if duration_packet > 255 {
        let scaled = duration_packet / 255;
        (scaled.min(255) as u8, 255)
    } else {
        (duration_packet as u8, 0)
    }
}

/// Builds the 9-byte Xbox-One-BT rumble packet.
pub fn xbox_one_bt_report(left: f32, right: f32, duration_ms: u32) -> [u8; 9] {
    let (duration10ms, loop_count) = encode_duration(duration_ms);
    [
        0x03,
        0x0F,
        0x00,
        0x00,
        (left.clamp(0.0, 1.0) * 255.0) as u8,
        (right.clamp(0.0, 1.0) * 255.0) as u8,
        duration10ms,
        0x00,
        loop_count,
    ]
}

/// Builds the 32-byte PlayStation-family feedback packet (rumble + LED).
pub fn ps_feedback_report(left: f32, right: f32, r: u8, g: u8, b: u8) -> [u8; 32] {
    let mut report = [0u8; 32];
    report[0] = 0x05;
    report[1] = 0xFF;
    report[4] = (right.clamp(0.0, 1.0) * 255.0) as u8;
    report[5] = (left.clamp(0.0, 1.0) * 255.0) as u8;
    report[6] = r;
    report[7] = g;
    report[8] = b;
    report
}

struct SchedulerState {
    effects: Vec<RumbleEffect>,
    quit: bool,
}

struct Shared {
    state: Mutex<SchedulerState>,
    signal: Condvar,
}

/// Owns the rumble worker thread and its bounded effect queue.
pub struct RumbleScheduler {
    shared: Arc<Shared>,
    capacity: usize,
    worker: Option<JoinHandle<()>>,
}

impl RumbleScheduler {
    /// Spawns the worker. `capacity` bounds the queue (one slot per pad).
    pub fn new(capacity: usize) -> Result<Self> {
        let shared = Arc::new(Shared {
            state: Mutex::new(SchedulerState {
                effects: Vec::with_capacity(capacity),
                quit: false,
            }),
            signal: Condvar::new(),
        });

        let worker_shared = shared.clone();
        let worker = std::thread::Builder::new()
            .name("intake-rumble".to_string())
            .spawn(move || run_worker(worker_shared))
            .map_err(|e| Error::RumbleWorker(e.to_string()))?;

        Ok(Self {
            shared,
            capacity,
            worker: Some(worker),
        })
    }

    /// Queues an effect. Returns `false` when the queue is full (the effect
    /// is dropped; producers never block on a full queue).
    pub fn enqueue(&self, effect: RumbleEffect) -> bool {
        {
            let mut state = self.shared.state.lock();
            if state.effects.len() >= self.capacity {
                warn!("rumble queue full, dropping effect");
                return false;
            }
            state.effects.push(effect);
        }
        self.shared.signal.notify_one();
        true
    }

    /// Signals the worker to quit and joins it. Pending effects are
    /// discarded.
    pub fn shutdown(&mut self) {
        {
            let mut state = self.shared.state.lock();
            state.quit = true;
            state.effects.clear();
        }
        self.shared.signal.notify_one();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for RumbleScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_worker(shared: Arc<Shared>) {
    let mut state = shared.state.lock();
    loop {
        while state.effects.is_empty() && !state.quit {
            shared.signal.wait(&mut state);
        }
        if state.quit {
            return;
        }

        // Drain from the top index down. The sink supplies the report in
        // its own hardware format.
        while let Some(effect) = state.effects.pop() {
            let report = effect
                .sink
                .build_report(effect.left, effect.right, effect.duration_ms);
            match effect.sink.write_report(&report) {
                Ok(_) => debug!(
                    "rumble {} l={:.2} r={:.2} {}ms",
                    effect.sink.label(),
                    effect.left,
                    effect.right,
                    effect.duration_ms
                ),
                // One failed write is not fatal; the next effect still runs.
                Err(e) => warn!("rumble report write failed on {}: {e}", effect.sink.label()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct RecordingSink {
        format: RumbleFormat,
        reports: Mutex<Vec<Vec<u8>>>,
        writes: AtomicUsize,
    }

    impl RecordingSink {
        fn new(format: RumbleFormat) -> Self {
            Self {
                format,
                reports: Mutex::new(Vec::new()),
                writes: AtomicUsize::new(0),
            }
        }
    }

    impl RumbleSink for RecordingSink {
        fn write_report(&self, report: &[u8]) -> std::io::Result<usize> {
            self.reports.lock().push(report.to_vec());
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(report.len())
        }

        fn build_report(&self, left: f32, right: f32, duration_ms: u32) -> Vec<u8> {
            build_effect_report(self.format, left, right, duration_ms, (10, 20, 30))
        }
    }

    #[test]
    fn duration_encoding() {
        assert_eq!(encode_duration(2550), (255, 0));
        assert_eq!(encode_duration(26000), (10, 255));
        assert_eq!(encode_duration(0), (0, 0));
        assert_eq!(encode_duration(100), (10, 0));
        // Saturates instead of wrapping for absurd durations.
        assert_eq!(encode_duration(u32::MAX), (255, 255));
    }

    #[test]
    fn xbox_report_layout() {
        let report = xbox_one_bt_report(0.5, 1.0, 100);
        assert_eq!(report[0], 0x03);
        assert_eq!(report[1], 0x0F);
        assert_eq!(report[4], 127);
        assert_eq!(report[5], 255);
        assert_eq!(report[6], 10);
        assert_eq!(report[8], 0);
    }

    #[test]
    fn ps_report_layout() {
        let report = ps_feedback_report(0.25, 1.0, 10, 20, 30);
        assert_eq!(report.len(), 32);
        assert_eq!(report[0], 0x05);
        assert_eq!(report[1], 0xFF);
        assert_eq!(report[4], 255); // right
        assert_eq!(report[5], 63); // left
        assert_eq!(&report[6..9], &[10, 20, 30]);
    }

    #[test]
    fn effect_report_follows_the_sink_format() {
        let xbox = build_effect_report(RumbleFormat::XboxOneBt, 0.5, 1.0, 100, (1, 2, 3));
        assert_eq!(xbox, xbox_one_bt_report(0.5, 1.0, 100).to_vec());

        let ps = build_effect_report(RumbleFormat::PlayStation, 0.25, 1.0, 100, (10, 20, 30));
        assert_eq!(ps.len(), 32);
        assert_eq!(ps[0], 0x05);
        assert_eq!(ps[4], 255); // right
        assert_eq!(ps[5], 63); // left
        // The light bar color rides along in every packet.
        assert_eq!(&ps[6..9], &[10, 20, 30]);
    }

    #[test]
    fn worker_writes_then_stop_packet() {
        let sink = Arc::new(RecordingSink::new(RumbleFormat::XboxOneBt));
        let mut scheduler = RumbleScheduler::new(4).expect("spawn worker");

        assert!(scheduler.enqueue(RumbleEffect {
            left: 0.5,
            right: 0.5,
            duration_ms: 100,
            sink: sink.clone(),
        }));

        // Wait for the worker to drain the first effect.
        for _ in 0..200 {
            if sink.writes.load(Ordering::SeqCst) >= 1 {
                break;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        assert_eq!(sink.writes.load(Ordering::SeqCst), 1);

        // Effect over: the caller pushes an explicit stop.
        assert!(scheduler.enqueue(RumbleEffect {
            left: 0.0,
            right: 0.0,
            duration_ms: 0,
            sink: sink.clone(),
        }));
        for _ in 0..200 {
            if sink.writes.load(Ordering::SeqCst) >= 2 {
                break;
            }
            std::thread::sleep(Duration::from_millis(2));
        }

        let reports = sink.reports.lock().clone();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0][4], 127);
        assert_eq!(reports[0][6], 10);
        assert_eq!(reports[1][4], 0);
        assert_eq!(reports[1][5], 0);

        scheduler.shutdown();
    }

    #[test]
    fn worker_emits_ps_packets_for_ps_sinks() {
        let sink = Arc::new(RecordingSink::new(RumbleFormat::PlayStation));
        let mut scheduler = RumbleScheduler::new(4).expect("spawn worker");

        assert!(scheduler.enqueue(RumbleEffect {
            left: 1.0,
            right: 0.5,
            duration_ms: 100,
            sink: sink.clone(),
        }));

        for _ in 0..200 {
            if sink.writes.load(Ordering::SeqCst) >= 1 {
                break;
            }
            std::thread::sleep(Duration::from_millis(2));
        }

        let reports = sink.reports.lock().clone();
        assert_eq!(reports.len(), 1);
        let report = &reports[0];
        assert_eq!(report.len(), 32);
        assert_eq!(report[0], 0x05);
        assert_eq!(report[4], 127); // right
        assert_eq!(report[5], 255); // left
        assert_eq!(&report[6..9], &[10, 20, 30]);

        scheduler.shutdown();
    }

    #[test]
    fn full_queue_drops() {
        let sink: Arc<dyn RumbleSink> = Arc::new(RecordingSink::new(RumbleFormat::XboxOneBt));
        let shared = Arc::new(Shared {
            state: Mutex::new(SchedulerState {
                effects: Vec::new(),
                quit: false,
            }),
            signal: Condvar::new(),
        });
        // Build a scheduler whose worker never runs so the queue stays full.
        let mut scheduler = RumbleScheduler {
            shared,
            capacity: 1,
            worker: None,
        };
        let effect = RumbleEffect {
            left: 1.0,
            right: 1.0,
            duration_ms: 10,
            sink,
        };
        assert!(scheduler.enqueue(effect.clone()));
        assert!(!scheduler.enqueue(effect));
        scheduler.shutdown();
    }
}
