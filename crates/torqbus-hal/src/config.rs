//! Persisted configuration provider trait.

/// Named PID gain slots stored in persisted configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PidGain {
    /// Proportional gain.
    Kp,
    /// Integral gain.
    Ki,
    /// Derivative gain.
    Kd,
    /// Upper integral clamp.
    IMax,
    /// Lower integral clamp.
    IMin,
}

/// Read access to the board's persisted configuration.
///
/// Values come from non-volatile storage on real hardware and from a TOML
/// file in the host simulation; the control core only sees this trait.
pub trait ConfigProvider {
    /// Number of populated motor slots. The motor controller asserts this
    /// against its compile-time capacity.
    fn motor_count(&self) -> u32;

    /// Encoder counts per output-shaft revolution.
    fn counts_per_rev(&self) -> u32;

    /// No-load speed of the fitted motor, in RPM.
    fn no_load_rpm(&self) -> u32;

    /// No-load current of the fitted motor, in milliamperes.
    fn no_load_current(&self) -> u32;

    /// Stall current of the fitted motor, in milliamperes.
    fn stall_current(&self) -> u32;

    /// Stored value for one PID gain slot.
    fn pid_gain(&self, gain: PidGain) -> u32;
}
