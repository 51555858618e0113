//! Frame-to-signal demultiplexing and status transmission.

use thiserror::Error;
use tracing::{debug, trace};

use torqbus_hal::{CanFrame, CanTransport, SystemMonitor, TransportError};

use crate::catalog::{self, MotorControl};
use crate::queue::FrameQueue;

/// Number of handler registrations the dispatch table can hold. Sized for
/// one handler per catalog signal with a little slack.
pub const HANDLER_CAPACITY: usize = 8;

/// Identifier of one decoded application signal.
///
/// The enumeration order is also the dispatch order within one decoded
/// frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalId {
    /// RPM setpoint for motor 1.
    Rpm1,
    /// RPM setpoint for motor 2.
    Rpm2,
    /// Current setpoint for motor 1.
    Current1,
    /// Current setpoint for motor 2.
    Current2,
    /// Operating-mode request for motor 1.
    Mode1,
    /// Operating-mode request for motor 2.
    Mode2,
}

impl SignalId {
    /// All signals in dispatch order.
    pub const ALL: [SignalId; 6] = [
        SignalId::Rpm1,
        SignalId::Rpm2,
        SignalId::Current1,
        SignalId::Current2,
        SignalId::Mode1,
        SignalId::Mode2,
    ];
}

/// A decoded, typed value extracted from one bus frame.
///
/// Signals are transient views: a handler receives a borrowed `Signal`
/// valid only for the duration of the callback and must copy out anything
/// it wants to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signal {
    /// Which signal this is.
    pub id: SignalId,
    /// The decoded value. Mode signals carry their 4-bit code widened to
    /// `i32`.
    pub value: i32,
}

/// Error from [`SignalHandler::send_motor_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SendError {
    /// A value does not fit its signal field; nothing was transmitted.
    #[error("status value outside the encodable signal range")]
    OutOfRange,
    /// The transport refused the frame.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

type HandlerFn = Box<dyn FnMut(&Signal) + Send>;

/// Bridges raw bus frames and typed application signals with bounded
/// buffering and synchronous dispatch.
///
/// [`SignalHandler::listener`] runs in receive-interrupt context and only
/// validates and buffers; [`SignalHandler::process`] runs in task context
/// and does the decoding and dispatch. The caller serializes the two (see
/// [`FrameQueue`]).
pub struct SignalHandler<T, M> {
    queue: FrameQueue,
    handlers: [Option<(SignalId, HandlerFn)>; HANDLER_CAPACITY],
    registered: usize,
    transport: T,
    monitor: M,
}

impl<T: CanTransport, M: SystemMonitor> SignalHandler<T, M> {
    /// Create a handler with an empty queue and dispatch table.
    pub fn new(transport: T, monitor: M) -> Self {
        SignalHandler {
            queue: FrameQueue::new(),
            handlers: core::array::from_fn(|_| None),
            registered: 0,
            transport,
            monitor,
        }
    }

    /// Accept a frame from the receive interrupt.
    ///
    /// Only frames carrying the motor-control message id with the exact
    /// expected length are buffered; everything else is silently discarded.
    /// When the queue is full the incoming frame is dropped, never a queued
    /// one.
    pub fn listener(&mut self, frame: &CanFrame) {
        if frame.id != catalog::MOTOR_CONTROL_ID || frame.dlc != catalog::MOTOR_CONTROL_DLC {
            trace!(id = frame.id, dlc = frame.dlc, "discarding unrecognized frame");
            return;
        }
        if !self.queue.push(*frame) {
            trace!(id = frame.id, "frame queue full, dropping incoming frame");
        }
    }

    /// Drain buffered frames and dispatch their signals.
    ///
    /// Drains at most the frames queued on entry. Every decoded signal is
    /// delivered synchronously to each handler registered for its id, in
    /// catalog order. Bus activity is reported when at least one frame was
    /// handled; the watchdog is fed exactly once per call either way.
    pub fn process(&mut self) {
        let pending = self.queue.len();
        let mut handled = 0usize;
        for _ in 0..pending {
            let Some(frame) = self.queue.pop() else { break };
            // The listener filters on id and length, so this only fails if
            // something corrupted the queue.
            let Some(message) = MotorControl::decode(&frame) else {
                continue;
            };
            self.dispatch(&message);
            handled += 1;
        }
        if handled > 0 {
            debug!(frames = handled, "processed control frames");
            self.monitor.report_activity();
        }
        self.monitor.feed_watchdog();
    }

    fn dispatch(&mut self, message: &MotorControl) {
        for id in SignalId::ALL {
            let value = match id {
                SignalId::Rpm1 => message.rpm1,
                SignalId::Rpm2 => message.rpm2,
                SignalId::Current1 => message.current1,
                SignalId::Current2 => message.current2,
                SignalId::Mode1 => i32::from(message.mode1),
                SignalId::Mode2 => i32::from(message.mode2),
            };
            let signal = Signal { id, value };
            for (registered_id, callback) in self.handlers.iter_mut().flatten() {
                if *registered_id == id {
                    callback(&signal);
                }
            }
        }
    }

    /// Register a callback for one signal id.
    ///
    /// Multiple handlers may be registered for the same id; each receives
    /// the signal in registration order.
    ///
    /// # Panics
    ///
    /// Panics when the dispatch table is already at capacity. Running out
    /// of handler slots is a programming error, not a runtime condition.
    pub fn register_handler(&mut self, id: SignalId, callback: impl FnMut(&Signal) + Send + 'static) {
        assert!(
            self.registered < HANDLER_CAPACITY,
            "signal handler table full ({} entries)",
            HANDLER_CAPACITY
        );
        self.handlers[self.registered] = Some((id, Box::new(callback)));
        self.registered += 1;
    }

    /// Encode and transmit the motor-status message.
    ///
    /// Every value is range-checked before anything is encoded; an
    /// out-of-range argument fails the whole call with zero transmit
    /// attempts. Transport failures are propagated, not retried.
    ///
    /// # Errors
    ///
    /// [`SendError::OutOfRange`] when a value does not fit its signal
    /// field, or the transport's error.
    pub fn send_motor_status(
        &mut self,
        rpm1: i32,
        current1: i32,
        rpm2: i32,
        current2: i32,
        status: u8,
    ) -> Result<(), SendError> {
        let frame = catalog::encode_motor_status(rpm1, current1, rpm2, current2, status)
            .ok_or(SendError::OutOfRange)?;
        self.transport.transmit(&frame)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use crate::queue::FRAME_QUEUE_DEPTH;

    #[derive(Clone, Default)]
    struct MockTransport {
        sent: Arc<Mutex<Vec<CanFrame>>>,
        fail: Arc<Mutex<bool>>,
    }

    impl CanTransport for MockTransport {
        fn transmit(&mut self, frame: &CanFrame) -> Result<(), TransportError> {
            if *self.fail.lock().unwrap() {
                return Err(TransportError::MailboxFull);
            }
            self.sent.lock().unwrap().push(*frame);
            Ok(())
        }
    }

    #[derive(Default)]
    struct MockMonitor {
        feeds: AtomicUsize,
        activity: AtomicUsize,
    }

    impl SystemMonitor for MockMonitor {
        fn feed_watchdog(&self) {
            self.feeds.fetch_add(1, Ordering::Relaxed);
        }

        fn report_activity(&self) {
            self.activity.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn handler() -> (
        SignalHandler<MockTransport, Arc<MockMonitor>>,
        MockTransport,
        Arc<MockMonitor>,
    ) {
        let transport = MockTransport::default();
        let monitor = Arc::new(MockMonitor::default());
        let handler = SignalHandler::new(transport.clone(), Arc::clone(&monitor));
        (handler, transport, monitor)
    }

    fn control_frame(rpm1: i32) -> CanFrame {
        MotorControl {
            rpm1,
            rpm2: 0,
            current1: 0,
            current2: 0,
            mode1: 0,
            mode2: 0,
        }
        .encode()
        .unwrap()
    }

    #[test]
    fn test_end_to_end_single_frame() {
        let (mut handler, _, monitor) = handler();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        handler.register_handler(SignalId::Rpm1, move |signal| {
            sink.lock().unwrap().push(signal.value);
        });

        handler.listener(&control_frame(1));
        handler.process();

        assert_eq!(*seen.lock().unwrap(), vec![1]);
        assert_eq!(monitor.activity.load(Ordering::Relaxed), 1);
        assert_eq!(monitor.feeds.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_invalid_size_frames_are_filtered() {
        let (mut handler, _, monitor) = handler();
        let dispatched = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&dispatched);
        handler.register_handler(SignalId::Rpm1, move |_| {
            counter.fetch_add(1, Ordering::Relaxed);
        });

        // Recognized id, wrong lengths: filtered at listener time.
        for dlc in [0u8, 7] {
            let frame = CanFrame {
                id: catalog::MOTOR_CONTROL_ID,
                dlc,
                data: [0; 8],
            };
            handler.listener(&frame);
        }
        handler.process();

        assert_eq!(dispatched.load(Ordering::Relaxed), 0);
        assert_eq!(monitor.activity.load(Ordering::Relaxed), 0);
        // The watchdog is fed even on an empty cycle.
        assert_eq!(monitor.feeds.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_unknown_id_is_filtered() {
        let (mut handler, _, _) = handler();
        let dispatched = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&dispatched);
        handler.register_handler(SignalId::Rpm1, move |_| {
            counter.fetch_add(1, Ordering::Relaxed);
        });

        let frame = CanFrame {
            id: 0x7DF,
            dlc: 8,
            data: [0; 8],
        };
        handler.listener(&frame);
        handler.process();
        assert_eq!(dispatched.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_queue_overflow_drops_newest_frame() {
        let (mut handler, _, _) = handler();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        handler.register_handler(SignalId::Rpm1, move |signal| {
            sink.lock().unwrap().push(signal.value);
        });

        // One more valid frame than the queue holds.
        for rpm in 1..=(FRAME_QUEUE_DEPTH as i32 + 1) {
            handler.listener(&control_frame(rpm));
        }
        handler.process();

        // Exactly the first five arrive, in order; frame six was dropped.
        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_dispatch_order_follows_catalog() {
        let (mut handler, _, _) = handler();
        let order = Arc::new(Mutex::new(Vec::new()));
        for id in SignalId::ALL.into_iter().rev().take(4) {
            let sink = Arc::clone(&order);
            handler.register_handler(id, move |signal| {
                sink.lock().unwrap().push(signal.id);
            });
        }

        let frame = MotorControl {
            rpm1: 10,
            rpm2: 20,
            current1: 30,
            current2: 40,
            mode1: 1,
            mode2: 2,
        }
        .encode()
        .unwrap();
        handler.listener(&frame);
        handler.process();

        // Registration order was reversed; dispatch still follows the
        // catalog order.
        assert_eq!(
            *order.lock().unwrap(),
            vec![
                SignalId::Current1,
                SignalId::Current2,
                SignalId::Mode1,
                SignalId::Mode2
            ]
        );
    }

    #[test]
    fn test_process_only_drains_frames_queued_at_entry() {
        let (mut handler, _, monitor) = handler();
        handler.listener(&control_frame(1));
        handler.listener(&control_frame(2));
        handler.process();
        assert_eq!(monitor.activity.load(Ordering::Relaxed), 1);

        // Nothing queued: no activity report, watchdog still fed.
        handler.process();
        assert_eq!(monitor.activity.load(Ordering::Relaxed), 1);
        assert_eq!(monitor.feeds.load(Ordering::Relaxed), 2);
    }

    #[test]
    #[should_panic(expected = "signal handler table full")]
    fn test_register_beyond_capacity_panics() {
        let (mut handler, _, _) = handler();
        for _ in 0..=HANDLER_CAPACITY {
            handler.register_handler(SignalId::Rpm1, |_| {});
        }
    }

    #[test]
    fn test_send_status_out_of_range_transmits_nothing() {
        let (mut handler, transport, _) = handler();
        let result = handler.send_motor_status(20_000, 0, 0, 0, 0);
        assert_eq!(result, Err(SendError::OutOfRange));
        let result = handler.send_motor_status(0, 10_000, 0, 0, 0);
        assert_eq!(result, Err(SendError::OutOfRange));
        assert!(transport.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn test_send_status_transmits_exactly_one_frame() {
        let (mut handler, transport, _) = handler();
        handler.send_motor_status(100, 200, -300, -400, 0x12).unwrap();
        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].id, catalog::MOTOR_STATUS_ID);
        assert_eq!(sent[0].dlc, catalog::MOTOR_STATUS_DLC);
    }

    #[test]
    fn test_send_status_propagates_transport_failure() {
        let (mut handler, transport, _) = handler();
        *transport.fail.lock().unwrap() = true;
        let result = handler.send_motor_status(0, 0, 0, 0, 0);
        assert_eq!(result, Err(SendError::Transport(TransportError::MailboxFull)));
    }
}
