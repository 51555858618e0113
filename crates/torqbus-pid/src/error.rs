//! This module defines the error types used by the `torqbus-pid` crate.

#![warn(missing_docs)]

/// Error type for PID controller configuration.
///
/// This enum encapsulates the ways a controller can be misconfigured at
/// construction or reconfiguration time. Runtime evaluation itself is
/// infallible once a controller has been built.
#[derive(Debug, PartialEq, Eq)]
pub enum PidError {
    /// Error for an invalid scale divisor.
    /// This variant is returned when the fixed-point scale is zero.
    InvalidScale(&'static str),
    /// Error for an invalid output window.
    /// This variant is returned when `cvmin` exceeds `cvmax`.
    InvalidOutputLimits(&'static str),
    /// Error for an invalid integral window.
    /// This variant is returned when `imin` exceeds `imax`.
    InvalidIntegralLimits(&'static str),
}

impl core::fmt::Display for PidError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PidError::InvalidScale(msg) => write!(f, "Invalid scale: {}", msg),
            PidError::InvalidOutputLimits(msg) => write!(f, "Invalid output limits: {}", msg),
            PidError::InvalidIntegralLimits(msg) => {
                write!(f, "Invalid integral limits: {}", msg)
            }
        }
    }
}

impl core::error::Error for PidError {}
