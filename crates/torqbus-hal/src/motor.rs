//! Motor driver and board traits.

use crate::error::BoardError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Operating status reported by a motor driver.
///
/// The motor controller observes these states and guards its transitions on
/// them; it does not define run/coast/brake semantics itself.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorStatus {
    /// Output stage disabled, motor spins freely.
    Coast,
    /// Closed-loop drive active.
    Run,
    /// Output stage shorted, motor brakes.
    Brake,
    /// Driver latched a fault; needs external recovery.
    Fault,
}

impl MotorStatus {
    /// Wire code used in the status message.
    pub fn as_u8(self) -> u8 {
        match self {
            MotorStatus::Coast => 0,
            MotorStatus::Run => 1,
            MotorStatus::Brake => 2,
            MotorStatus::Fault => 3,
        }
    }
}

impl core::fmt::Display for MotorStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            MotorStatus::Coast => write!(f, "Coast"),
            MotorStatus::Run => write!(f, "Run"),
            MotorStatus::Brake => write!(f, "Brake"),
            MotorStatus::Fault => write!(f, "Fault"),
        }
    }
}

/// Core trait defining the interface to one physical motor driver.
///
/// The hot control path treats the driver as infallible: a driver that hits
/// a hardware problem reports it through [`MotorDriver::status`] as
/// [`MotorStatus::Fault`] rather than through return values.
pub trait MotorDriver {
    /// Poll the driver; called every scheduler tick, ahead of any control
    /// evaluation.
    fn update(&mut self);

    /// Measured shaft speed in RPM, signed by direction.
    fn rpm(&self) -> i32;

    /// Measured winding current in milliamperes, signed by direction.
    fn current(&self) -> i32;

    /// Command a speed value in controller output units.
    fn set_speed(&mut self, speed: i32);

    /// Enable closed-loop drive.
    fn run(&mut self);

    /// Disable the output stage and let the motor spin freely.
    fn coast(&mut self);

    /// Short the output stage to brake the motor.
    fn brake(&mut self);

    /// Current operating status.
    fn status(&self) -> MotorStatus;

    /// Accumulated encoder position in counts.
    fn position(&self) -> i32;
}

/// Per-board wiring: which driver sits at which motor slot, plus board-level
/// electrical limits.
pub trait Board {
    /// The motor driver type this board provides.
    type Driver: MotorDriver;

    /// Construct the driver wired at `index`.
    ///
    /// # Errors
    ///
    /// Returns a [`BoardError`] when the slot is unpopulated or the
    /// peripheral fails to come up.
    fn motor_driver(&self, index: usize) -> Result<Self::Driver, BoardError>;

    /// Maximum continuous current the board can deliver, in milliamperes.
    fn max_current(&self) -> u32;
}
