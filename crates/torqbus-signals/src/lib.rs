//! CAN signal handling for the motor controller board.
//!
//! This crate bridges raw bus frames and typed application signals: the
//! [`SignalHandler`] validates incoming frames, buffers them in a bounded
//! FIFO, decodes them into signals and dispatches those to registered
//! handlers, and encodes the outgoing motor-status message. The
//! [`catalog`] module is the application's CAN message database.

pub mod catalog;
pub mod handler;
pub mod queue;

pub use handler::{SendError, Signal, SignalHandler, SignalId, HANDLER_CAPACITY};
pub use queue::{FrameQueue, FRAME_QUEUE_DEPTH};
