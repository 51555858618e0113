//! A `no_std` integer PID controller for closed-loop motor control.
//!
//! This crate provides a discrete-time PID evaluator with bipolar output
//! clamping and saturation-aware anti-windup, one instance per control
//! channel.

#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub mod error;
pub use error::PidError;

/// Tuning and clamping parameters for a [`Pid`] instance.
///
/// All values are signed 32-bit. `kp`, `ki` and `kd` are fixed-point gains;
/// each term of the control law is divided by `scale` (truncating toward
/// zero), so a gain of 15 with `scale = 10` acts as 1.5.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PidParameters {
    /// Proportional gain.
    pub kp: i32,
    /// Integral gain.
    pub ki: i32,
    /// Derivative gain.
    pub kd: i32,
    /// Upper clamp for the accumulated integral term.
    pub imax: i32,
    /// Lower clamp for the accumulated integral term.
    pub imin: i32,
    /// Upper clamp for the control variable.
    pub cvmax: i32,
    /// Lower clamp for the control variable.
    pub cvmin: i32,
    /// Fixed-point divisor applied to every term. Must be nonzero.
    pub scale: i32,
}

impl PidParameters {
    fn validate(&self) -> Result<(), PidError> {
        if self.scale == 0 {
            return Err(PidError::InvalidScale("must be nonzero"));
        }
        if self.cvmin > self.cvmax {
            return Err(PidError::InvalidOutputLimits("cvmin must not exceed cvmax"));
        }
        if self.imin > self.imax {
            return Err(PidError::InvalidIntegralLimits("imin must not exceed imax"));
        }
        Ok(())
    }
}

/// A discrete-time PID controller.
///
/// The controller is a plain caller-owned value with no interior state
/// machine: after construction it is ready, and every call to
/// [`Pid::update`] advances it by one sample. `reset` clears the
/// accumulated history while retaining parameters and setpoint, which is
/// what a motor stop/start sequence needs.
///
/// # Anti-windup
///
/// While the output sits at the positive rail (`cv >= cvmax`) the integral
/// term holds its previous value instead of accumulating. The negative rail
/// does not freeze the integral; the integral window `[imin, imax]` bounds
/// it there. This asymmetry is part of the controller's contract.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pid {
    params: PidParameters,
    sp: i32,
    cv: i32,
    last_error: i64,
    last_integral: i64,
}

impl Pid {
    /// Construct a controller with zeroed history and setpoint.
    ///
    /// # Arguments
    ///
    /// * `params`: Gains and clamp windows, validated up front.
    ///
    /// # Errors
    ///
    /// Returns a [`PidError`] when `scale` is zero or either clamp window
    /// is inverted.
    pub fn new(params: PidParameters) -> Result<Self, PidError> {
        params.validate()?;
        Ok(Pid {
            params,
            sp: 0,
            cv: 0,
            last_error: 0,
            last_integral: 0,
        })
    }

    /// Advance the controller by one sample.
    ///
    /// # Arguments
    ///
    /// * `input`: The measured process variable (RPM, current, ...).
    ///
    /// # Returns
    ///
    /// The new control variable, always within `[cvmin, cvmax]`.
    pub fn update(&mut self, input: i32) -> i32 {
        let p = &self.params;
        let error = i64::from(self.sp) - i64::from(input);

        // Integral accumulation freezes while the output is saturated at
        // the positive rail. The negative rail does not freeze it.
        let integral = if self.cv >= p.cvmax {
            self.last_integral
        } else {
            (self.last_integral + error).clamp(i64::from(p.imin), i64::from(p.imax))
        };

        let derivative = error - self.last_error;

        let scale = i64::from(p.scale);
        let sum = i64::from(p.kp) * error / scale
            + i64::from(p.ki) * integral / scale
            + i64::from(p.kd) * derivative / scale;
        let cv = sum.clamp(i64::from(p.cvmin), i64::from(p.cvmax)) as i32;

        self.last_error = error;
        self.last_integral = integral;
        self.cv = cv;
        cv
    }

    /// Clear the control variable, last error and accumulated integral.
    ///
    /// Parameters and setpoint are retained.
    pub fn reset(&mut self) {
        self.cv = 0;
        self.last_error = 0;
        self.last_integral = 0;
    }

    /// Set the target value the controller drives toward.
    pub fn set_setpoint(&mut self, sp: i32) {
        self.sp = sp;
    }

    /// The current setpoint.
    pub fn setpoint(&self) -> i32 {
        self.sp
    }

    /// Replace the tuning parameters.
    ///
    /// The stored control variable is re-clamped so it stays inside the new
    /// output window.
    ///
    /// # Errors
    ///
    /// Returns a [`PidError`] for the same conditions as [`Pid::new`];
    /// the previous parameters are kept on failure.
    pub fn set_parameters(&mut self, params: PidParameters) -> Result<(), PidError> {
        params.validate()?;
        self.params = params;
        self.cv = self.cv.clamp(params.cvmin, params.cvmax);
        Ok(())
    }

    /// The current tuning parameters.
    pub fn parameters(&self) -> PidParameters {
        self.params
    }

    /// Swap the bipolar output window at runtime.
    ///
    /// Used by the motor controller to restrict drive direction by setpoint
    /// sign. The stored control variable is re-clamped into the new window.
    ///
    /// # Panics
    ///
    /// Panics when `cvmin > cvmax`; an inverted window is a programming
    /// error, not a runtime condition.
    pub fn set_output_limits(&mut self, cvmin: i32, cvmax: i32) {
        assert!(cvmin <= cvmax, "inverted output window: [{}, {}]", cvmin, cvmax);
        self.params.cvmin = cvmin;
        self.params.cvmax = cvmax;
        self.cv = self.cv.clamp(cvmin, cvmax);
    }

    /// The most recently computed control variable.
    pub fn output(&self) -> i32 {
        self.cv
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> PidParameters {
        PidParameters {
            kp: 10,
            ki: 5,
            kd: 0,
            imax: 10_000,
            imin: -10_000,
            cvmax: 1000,
            cvmin: -1000,
            scale: 10,
        }
    }

    #[test]
    fn test_new_rejects_zero_scale() {
        let result = Pid::new(PidParameters { scale: 0, ..params() });
        assert_eq!(result, Err(PidError::InvalidScale("must be nonzero")));
    }

    #[test]
    fn test_new_rejects_inverted_output_window() {
        let result = Pid::new(PidParameters { cvmin: 10, cvmax: -10, ..params() });
        assert_eq!(
            result,
            Err(PidError::InvalidOutputLimits("cvmin must not exceed cvmax"))
        );
    }

    #[test]
    fn test_new_rejects_inverted_integral_window() {
        let result = Pid::new(PidParameters { imin: 1, imax: 0, ..params() });
        assert_eq!(
            result,
            Err(PidError::InvalidIntegralLimits("imin must not exceed imax"))
        );
    }

    #[test]
    fn test_output_converges_to_positive_rail_and_holds() {
        let mut pid = Pid::new(params()).unwrap();
        pid.set_setpoint(500);

        // Fixed positive setpoint with a zero measurement: the integral
        // ramps the output up to cvmax.
        let mut saturated = 0;
        for _ in 0..100 {
            let cv = pid.update(0);
            assert!(cv <= 1000 && cv >= -1000);
            if cv == 1000 {
                saturated += 1;
            }
        }
        assert!(saturated > 0, "output never reached cvmax");
        // Once saturated it stays there while the error is positive.
        assert_eq!(pid.update(0), 1000);
        assert_eq!(pid.output(), 1000);
    }

    #[test]
    fn test_output_converges_to_negative_rail_and_holds() {
        let mut pid = Pid::new(params()).unwrap();
        pid.set_setpoint(-500);

        for _ in 0..100 {
            let cv = pid.update(0);
            assert!(cv <= 1000 && cv >= -1000);
        }
        assert_eq!(pid.update(0), -1000);
        assert_eq!(pid.output(), -1000);
    }

    #[test]
    fn test_integral_freezes_at_positive_rail() {
        let mut pid = Pid::new(PidParameters {
            kp: 1,
            ki: 1,
            kd: 0,
            imax: 10_000,
            imin: -10_000,
            cvmax: 30,
            cvmin: -30,
            scale: 1,
        })
        .unwrap();
        pid.set_setpoint(10);

        assert_eq!(pid.update(0), 20); // p 10 + i 10
        assert_eq!(pid.update(0), 30); // p 10 + i 20, exactly at the rail
        assert_eq!(pid.update(0), 30); // saturated: integral held at 20
        assert_eq!(pid.update(0), 30);

        // When the error clears, the output drops to the frozen integral
        // (20). Without the freeze the integral would have kept growing and
        // the output would still be pinned at the rail here.
        pid.set_setpoint(0);
        assert_eq!(pid.update(0), 20);
    }

    #[test]
    fn test_integral_does_not_freeze_at_negative_rail() {
        let mut pid = Pid::new(PidParameters {
            kp: 0,
            ki: 1,
            kd: 0,
            imax: 10_000,
            imin: -10_000,
            cvmax: 30,
            cvmin: -30,
            scale: 1,
        })
        .unwrap();
        pid.set_setpoint(-10);

        assert_eq!(pid.update(0), -10);
        assert_eq!(pid.update(0), -20);
        assert_eq!(pid.update(0), -30); // at the negative rail
        pid.update(0); // integral keeps accumulating: -40
        pid.set_setpoint(10);
        // The extra accumulated sample has to drain first (-40 + 10 = -30
        // still pins the rail); had the integral frozen at -30, this first
        // update would already read -20. This asymmetry with the positive
        // rail is deliberate.
        assert_eq!(pid.update(0), -30);
        assert_eq!(pid.update(0), -20);
    }

    #[test]
    fn test_integral_window_bounds_accumulation() {
        let mut pid = Pid::new(PidParameters {
            kp: 0,
            ki: 1,
            kd: 0,
            imax: 25,
            imin: -25,
            cvmax: 1000,
            cvmin: -1000,
            scale: 1,
        })
        .unwrap();
        pid.set_setpoint(10);

        for _ in 0..50 {
            pid.update(0);
        }
        // integral clamped at imax = 25, kp and kd contribute nothing
        assert_eq!(pid.output(), 25);
    }

    #[test]
    fn test_derivative_term_responds_to_error_change() {
        let mut pid = Pid::new(PidParameters {
            kp: 0,
            ki: 0,
            kd: 10,
            imax: 0,
            imin: 0,
            cvmax: 1000,
            cvmin: -1000,
            scale: 10,
        })
        .unwrap();
        pid.set_setpoint(100);

        // First sample: derivative = error - 0 = 100.
        assert_eq!(pid.update(0), 100);
        // Steady error: derivative = 0.
        assert_eq!(pid.update(0), 0);
        // Error shrinks by 40: derivative = -40.
        assert_eq!(pid.update(40), -40);
    }

    #[test]
    fn test_per_term_truncating_division() {
        let mut pid = Pid::new(PidParameters {
            kp: 1,
            ki: 1,
            kd: 0,
            imax: 10_000,
            imin: -10_000,
            cvmax: 1000,
            cvmin: -1000,
            scale: 10,
        })
        .unwrap();
        pid.set_setpoint(5);

        // kp*5/10 = 0 and ki*5/10 = 0 when divided per term; a combined
        // (kp*e + ki*i)/scale would give 1.
        assert_eq!(pid.update(0), 0);
    }

    #[test]
    fn test_reset_clears_history_keeps_configuration() {
        let mut pid = Pid::new(params()).unwrap();
        pid.set_setpoint(500);
        for _ in 0..10 {
            pid.update(0);
        }
        assert_ne!(pid.output(), 0);

        pid.reset();
        assert_eq!(pid.output(), 0);
        assert_eq!(pid.setpoint(), 500);
        assert_eq!(pid.parameters(), params());

        // History is genuinely gone: the first post-reset sample matches a
        // freshly constructed controller.
        let mut fresh = Pid::new(params()).unwrap();
        fresh.set_setpoint(500);
        assert_eq!(pid.update(0), fresh.update(0));
    }

    #[test]
    fn test_set_output_limits_reclamps_output() {
        let mut pid = Pid::new(params()).unwrap();
        pid.set_setpoint(500);
        for _ in 0..100 {
            pid.update(0);
        }
        assert_eq!(pid.output(), 1000);

        pid.set_output_limits(-1000, 0);
        assert_eq!(pid.output(), 0);
        assert_eq!(pid.parameters().cvmax, 0);
        assert_eq!(pid.parameters().cvmin, -1000);
    }

    #[test]
    #[should_panic(expected = "inverted output window")]
    fn test_set_output_limits_panics_on_inverted_window() {
        let mut pid = Pid::new(params()).unwrap();
        pid.set_output_limits(1, -1);
    }

    #[test]
    fn test_set_parameters_keeps_previous_on_error() {
        let mut pid = Pid::new(params()).unwrap();
        let result = pid.set_parameters(PidParameters { scale: 0, ..params() });
        assert!(result.is_err());
        assert_eq!(pid.parameters(), params());
    }
}
