//! Cross-thread input queue.
//!
//! The only conduit between producer threads (platform callbacks, the HID
//! worker, embedder glue) and the single-threaded tick. Multi-producer /
//! single-consumer; per producer FIFO holds, across producers only the
//! channel's acquire/release ordering applies.
//!
//! The queue is bounded. A full queue drops the incoming item with a log
//! warning rather than blocking a producer thread.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use log::warn;

use crate::buttons::DeviceButtonId;
use crate::device::{DeviceId, DeviceInput};

/// A staged state change addressed by device id.
#[derive(Clone, Copy, Debug)]
pub struct Change {
    pub device: DeviceId,
    pub button: DeviceButtonId,
    pub value: ChangeValue,
}

#[derive(Clone, Copy, Debug)]
pub enum ChangeValue {
    Bool(bool),
    Float(f32),
}

#[derive(Clone, Copy, Debug)]
pub(crate) enum QueueItem {
    Change(Change),
    /// Embedder record addressed by `(kind, index)`, resolved at drain time.
    Input(DeviceInput),
}

/// Cloneable producer handle onto the manager's input queue.
///
/// Obtained from [`InputManager::queue`](crate::manager::InputManager::queue)
/// and safe to move to any thread.
#[derive(Clone)]
pub struct InputQueue {
    tx: Sender<QueueItem>,
}

impl InputQueue {
    pub fn enqueue_bool(&self, device: DeviceId, button: DeviceButtonId, value: bool) {
        self.push(QueueItem::Change(Change {
            device,
            button,
            value: ChangeValue::Bool(value),
        }));
    }

    pub fn enqueue_float(&self, device: DeviceId, button: DeviceButtonId, value: f32) {
        self.push(QueueItem::Change(Change {
            device,
            button,
            value: ChangeValue::Float(value),
        }));
    }

    pub fn enqueue_device_input(&self, input: DeviceInput) {
        self.push(QueueItem::Input(input));
    }

    fn push(&self, item: QueueItem) {
        match self.tx.try_send(item) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => warn!("input queue full, dropping change"),
            Err(TrySendError::Disconnected(_)) => {}
        }
    }
}

pub(crate) struct QueuePair {
    pub producer: InputQueue,
    pub consumer: Receiver<QueueItem>,
}

pub(crate) fn input_queue(capacity: usize) -> QueuePair {
    let (tx, rx) = bounded(capacity.max(1));
    QueuePair {
        producer: InputQueue { tx },
        consumer: rx,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn producer_order_is_fifo() {
        let pair = input_queue(16);
        pair.producer.enqueue_bool(1, 2, true);
        pair.producer.enqueue_float(1, 3, 0.5);
        let first = pair.consumer.try_recv().unwrap();
        let second = pair.consumer.try_recv().unwrap();
        assert!(matches!(
            first,
            QueueItem::Change(Change {
                device: 1,
                button: 2,
                value: ChangeValue::Bool(true),
            })
        ));
        assert!(matches!(
            second,
            QueueItem::Change(Change {
                button: 3,
                value: ChangeValue::Float(v),
                ..
            }) if v == 0.5
        ));
        assert!(pair.consumer.try_recv().is_err());
    }

    #[test]
    fn full_queue_drops_instead_of_blocking() {
        let pair = input_queue(2);
        for i in 0..10 {
            pair.producer.enqueue_bool(0, i, true);
        }
        // Exactly the capacity survives.
        let mut drained = 0;
        while pair.consumer.try_recv().is_ok() {
            drained += 1;
        }
        assert_eq!(drained, 2);
    }

    #[test]
    fn works_across_threads() {
        let pair = input_queue(64);
        let q = pair.producer.clone();
        let t = std::thread::spawn(move || {
            for i in 0..32 {
                q.enqueue_bool(0, i, i % 2 == 0);
            }
        });
        t.join().unwrap();
        let mut seen = 0;
        while pair.consumer.try_recv().is_ok() {
            seen += 1;
        }
        assert_eq!(seen, 32);
    }
}
