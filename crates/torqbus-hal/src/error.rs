//! Error types shared across the hardware abstraction traits.

use thiserror::Error;

/// Error constructing a [`CanFrame`](crate::can::CanFrame).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FrameError {
    /// The payload exceeds the 8-byte classic CAN data field.
    #[error("payload of {0} bytes exceeds the 8-byte CAN data field")]
    PayloadTooLong(usize),
}

/// Error reported by a [`CanTransport`](crate::can::CanTransport).
///
/// Transmit failures are propagated to the immediate caller and never
/// retried inside the control core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The controller could not queue the frame for transmission.
    #[error("transmit mailbox full")]
    MailboxFull,
    /// The bus is unavailable (bus-off, not initialized, ...).
    #[error("CAN bus unavailable")]
    BusUnavailable,
}

/// Error reported by a [`Board`](crate::motor::Board) when handing out a
/// motor driver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    /// No motor is wired at the requested slot.
    #[error("no motor at slot {0}")]
    NoSuchMotor(usize),
    /// The peripheral behind the slot failed to initialize.
    #[error("motor peripheral at slot {0} failed to initialize")]
    PeripheralFailure(usize),
}
