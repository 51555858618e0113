//! Bounded FIFO buffer for raw CAN frames.

use torqbus_hal::CanFrame;

/// Number of frames the queue can hold.
pub const FRAME_QUEUE_DEPTH: usize = 5;

/// Fixed-capacity FIFO of raw frames between the receive interrupt and the
/// periodic task.
///
/// The queue is written by exactly one producer (the listener, interrupt
/// context) and drained by exactly one consumer (`process`, task context).
/// It does no locking of its own; the caller serializes access with a brief
/// critical section — on hardware by masking the receive interrupt around
/// the enqueue/dequeue, on the host with a mutex around the owning handler.
///
/// Overflow drops the incoming frame, never a queued one: frames already
/// accepted stay deliverable in arrival order.
#[derive(Debug, Clone)]
pub struct FrameQueue {
    slots: [CanFrame; FRAME_QUEUE_DEPTH],
    head: usize,
    len: usize,
}

const EMPTY_SLOT: CanFrame = CanFrame {
    id: 0,
    dlc: 0,
    data: [0; 8],
};

impl FrameQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        FrameQueue {
            slots: [EMPTY_SLOT; FRAME_QUEUE_DEPTH],
            head: 0,
            len: 0,
        }
    }

    /// Append a frame at the back.
    ///
    /// # Returns
    ///
    /// `false` when the queue is full; the frame is discarded in that case.
    pub fn push(&mut self, frame: CanFrame) -> bool {
        if self.len == FRAME_QUEUE_DEPTH {
            return false;
        }
        let tail = (self.head + self.len) % FRAME_QUEUE_DEPTH;
        self.slots[tail] = frame;
        self.len += 1;
        true
    }

    /// Remove and return the oldest frame, if any.
    pub fn pop(&mut self) -> Option<CanFrame> {
        if self.len == 0 {
            return None;
        }
        let frame = self.slots[self.head];
        self.head = (self.head + 1) % FRAME_QUEUE_DEPTH;
        self.len -= 1;
        Some(frame)
    }

    /// Number of queued frames.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the queue holds no frames.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Drop all queued frames.
    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }
}

impl Default for FrameQueue {
    fn default() -> Self {
        Self::new()
    }
}
