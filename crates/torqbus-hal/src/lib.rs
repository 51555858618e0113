//! Hardware abstraction layer for the motor controller board.
//!
//! This crate defines the trait seams between the real-time control core and
//! its collaborators: the CAN transport, the motor driver, the persisted
//! configuration, the board, the time source and the watchdog monitor. The
//! core only ever talks to these traits, so the same control code runs
//! against real peripherals, simulations and test mocks.

pub mod can;
pub mod config;
pub mod error;
pub mod monitor;
pub mod motor;
pub mod time;

pub use can::{CanFrame, CanTransport};
pub use config::{ConfigProvider, PidGain};
pub use error::{BoardError, FrameError, TransportError};
pub use monitor::SystemMonitor;
pub use motor::{Board, MotorDriver, MotorStatus};
pub use time::Clock;
