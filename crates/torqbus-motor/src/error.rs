//! Error types for motor controller construction.

use thiserror::Error;
use torqbus_hal::BoardError;
use torqbus_pid::PidError;

/// Error building a [`MotorController`](crate::MotorController).
///
/// Construction is the only fallible path; the running control loop absorbs
/// driver conditions internally and panics on caller programming errors.
#[derive(Debug, Error)]
pub enum MotorControllerError {
    /// The board could not provide a driver for a configured slot.
    #[error("board failed to provide motor {index}")]
    Board {
        /// The motor slot that failed.
        index: usize,
        /// The board's reason.
        #[source]
        source: BoardError,
    },
    /// The configured PID gains are unusable.
    #[error("invalid PID configuration")]
    Pid(#[from] PidError),
}
