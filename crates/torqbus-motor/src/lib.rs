//! Motor orchestration for the controller board.
//!
//! The [`MotorController`] owns up to [`MAX_MOTORS`] motor instances, each
//! pairing a hardware driver with two PID loops (RPM and current). It turns
//! external setpoints into bounded PID targets, runs the control law on a
//! fixed 10 ms cadence decoupled from fast driver polling, and exposes
//! run/coast/brake transitions and status queries.

pub mod controller;
pub mod error;

pub use controller::{MotorController, MotorReport, MAX_MOTORS};
pub use error::MotorControllerError;
