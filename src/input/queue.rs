// InputQueue - bounded SPSC event queue with coalescing overflow
//
// Events travel through an rtrb ring buffer. When the ring is full the
// producer does not block and does not overwrite: encoder deltas are summed
// into a side accumulator, a panic request is latched, and any other event is
// counted as dropped. The consumer folds the accumulated overflow back in on
// its next drain, so encoder motion and panic are never lost.

use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU64, Ordering};
use std::sync::Arc;

use rtrb::{Consumer, Producer, PushError, RingBuffer};

use super::InputEvent;

/// Overflow accumulators shared between the two queue ends
#[derive(Debug, Default)]
struct Overflow {
    encoder_delta: AtomicI32,
    panic: AtomicBool,
    dropped: AtomicU64,
}

/// Factory for the queue's two ends
pub struct InputQueue;

impl InputQueue {
    /// Create a queue holding up to `capacity` events (at least 1)
    #[allow(clippy::new_ret_no_self)]
    pub fn new(capacity: usize) -> (InputProducer, InputConsumer) {
        let (producer, consumer) = RingBuffer::new(capacity.max(1));
        let overflow = Arc::new(Overflow::default());

        (
            InputProducer {
                producer,
                overflow: Arc::clone(&overflow),
            },
            InputConsumer { consumer, overflow },
        )
    }
}

/// Producer end; `Send`, may live in another context
pub struct InputProducer {
    producer: Producer<InputEvent>,
    overflow: Arc<Overflow>,
}

impl InputProducer {
    /// Enqueue an event, coalescing on overflow
    ///
    /// Returns `false` only when the event had to be dropped.
    pub fn push(&mut self, event: InputEvent) -> bool {
        match self.producer.push(event) {
            Ok(()) => true,
            Err(PushError::Full(event)) => self.coalesce(event),
        }
    }

    fn coalesce(&self, event: InputEvent) -> bool {
        match event {
            InputEvent::Encoder { delta } => {
                self.overflow
                    .encoder_delta
                    .fetch_add(delta, Ordering::AcqRel);
                true
            }
            InputEvent::Panic => {
                self.overflow.panic.store(true, Ordering::Release);
                true
            }
            other => {
                self.overflow.dropped.fetch_add(1, Ordering::AcqRel);
                log::warn!("[Input] Queue full, dropped {:?}", other);
                false
            }
        }
    }

    pub fn encoder(&mut self, delta: i32) -> bool {
        self.push(InputEvent::Encoder { delta })
    }

    pub fn panic(&mut self) -> bool {
        self.push(InputEvent::Panic)
    }
}

/// Events taken by one drain
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainedInput {
    pub events: Vec<InputEvent>,
    /// Events discarded on overflow since the previous drain
    pub dropped: u64,
}

/// Consumer end, owned by the control loop
pub struct InputConsumer {
    consumer: Consumer<InputEvent>,
    overflow: Arc<Overflow>,
}

impl InputConsumer {
    /// Take the events present at the start of the call plus coalesced overflow
    ///
    /// Events pushed while draining wait for the next iteration. Overflowed
    /// encoder motion is appended as one `Encoder` event and a latched panic
    /// as one `Panic` event.
    pub fn drain(&mut self) -> DrainedInput {
        let available = self.consumer.slots();
        let mut events = Vec::with_capacity(available + 2);
        for _ in 0..available {
            match self.consumer.pop() {
                Ok(event) => events.push(event),
                Err(_) => break,
            }
        }

        let delta = self.overflow.encoder_delta.swap(0, Ordering::AcqRel);
        if delta != 0 {
            events.push(InputEvent::Encoder { delta });
        }
        if self.overflow.panic.swap(false, Ordering::AcqRel) {
            events.push(InputEvent::Panic);
        }
        let dropped = self.overflow.dropped.swap(0, Ordering::AcqRel);

        DrainedInput { events, dropped }
    }

    pub fn is_empty(&self) -> bool {
        self.consumer.is_empty()
            && self.overflow.encoder_delta.load(Ordering::Acquire) == 0
            && !self.overflow.panic.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::CalibrationTarget;

    #[test]
    fn test_events_drain_in_order() {
        let (mut producer, mut consumer) = InputQueue::new(8);
        producer.encoder(1);
        producer.push(InputEvent::SetRootNote { root_note: 62 });
        producer.panic();

        let drained = consumer.drain();
        assert_eq!(
            drained.events,
            vec![
                InputEvent::Encoder { delta: 1 },
                InputEvent::SetRootNote { root_note: 62 },
                InputEvent::Panic,
            ]
        );
        assert_eq!(drained.dropped, 0);
        assert!(consumer.is_empty());
    }

    #[test]
    fn test_overflow_sums_encoder_deltas() {
        let (mut producer, mut consumer) = InputQueue::new(1);
        assert!(producer.encoder(2));
        assert!(producer.encoder(3));
        assert!(producer.encoder(-1));

        let drained = consumer.drain();
        assert_eq!(
            drained.events,
            vec![
                InputEvent::Encoder { delta: 2 },
                InputEvent::Encoder { delta: 2 },
            ]
        );
    }

    #[test]
    fn test_overflow_latches_panic() {
        let (mut producer, mut consumer) = InputQueue::new(1);
        producer.encoder(1);
        assert!(producer.panic());
        assert!(producer.panic());

        let drained = consumer.drain();
        assert_eq!(
            drained.events,
            vec![InputEvent::Encoder { delta: 1 }, InputEvent::Panic]
        );
        assert!(consumer.drain().events.is_empty());
    }

    #[test]
    fn test_overflow_drops_other_events() {
        let (mut producer, mut consumer) = InputQueue::new(1);
        producer.panic();
        let accepted = producer.push(InputEvent::RequestCalibration {
            channel: 0,
            target: CalibrationTarget::DarkOffset,
        });

        assert!(!accepted);
        let drained = consumer.drain();
        assert_eq!(drained.events, vec![InputEvent::Panic]);
        assert_eq!(drained.dropped, 1);
        assert_eq!(consumer.drain().dropped, 0);
    }

    #[test]
    fn test_producer_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<InputProducer>();
    }

    #[test]
    fn test_producer_on_another_thread() {
        let (mut producer, mut consumer) = InputQueue::new(64);
        let handle = std::thread::spawn(move || {
            for _ in 0..10 {
                producer.encoder(1);
            }
        });
        handle.join().unwrap();

        let total: i32 = consumer
            .drain()
            .events
            .iter()
            .map(|e| match e {
                InputEvent::Encoder { delta } => *delta,
                _ => 0,
            })
            .sum();
        assert_eq!(total, 10);
    }
}
