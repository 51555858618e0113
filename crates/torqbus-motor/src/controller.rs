//! The motor controller/orchestrator.

use tracing::{debug, info, trace};

use torqbus_hal::{Board, Clock, ConfigProvider, MotorDriver, MotorStatus, PidGain, SystemMonitor};
use torqbus_pid::{Pid, PidParameters};

use crate::error::MotorControllerError;

/// Compile-time capacity of the motor slot array.
pub const MAX_MOTORS: usize = 2;

/// Control-variable rail handed to every PID instance.
const CV_MAX: i32 = 1000;
const CV_MIN: i32 = -1000;
/// Fixed-point divisor for the configured gains.
const PID_SCALE: i32 = 10;
/// Control-law cadence in milliseconds.
const UPDATE_PERIOD_MS: u32 = 10;

/// One motor slot: the hardware driver plus its two control loops.
struct Motor<D> {
    driver: D,
    rpm_pid: Pid,
    current_pid: Pid,
    rpm_limit: i32,
    current_limit: i32,
}

/// Snapshot of one motor's actual and target values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotorReport {
    /// Measured shaft speed in RPM.
    pub actual_rpm: i32,
    /// Active RPM setpoint.
    pub target_rpm: i32,
    /// Measured winding current in milliamperes.
    pub actual_current: i32,
    /// Active current setpoint in milliamperes.
    pub target_current: i32,
    /// Driver-reported operating status.
    pub status: MotorStatus,
}

/// Orchestrates the configured motors through setpoint application,
/// periodic control evaluation and mode transitions.
///
/// [`MotorController::update`] is called every scheduler tick; it polls
/// every driver unconditionally and runs the PID control law only when the
/// 10 ms cadence has elapsed, so fast driver polling stays decoupled from
/// the slower control loop. Per cadence tick each running motor commands
/// the *smaller* of its RPM and current control variables — the current
/// loop cross-limits the RPM loop rather than averaging with it.
///
/// Out-of-range motor indices are programming errors and panic; everything
/// the drivers report is absorbed internally.
pub struct MotorController<D, C, M> {
    motors: [Option<Motor<D>>; MAX_MOTORS],
    count: usize,
    clock: C,
    monitor: M,
    update_at: u32,
}

impl<D, C, M> MotorController<D, C, M>
where
    D: MotorDriver,
    C: Clock,
    M: SystemMonitor,
{
    /// Build a controller from the board's drivers and the persisted
    /// configuration.
    ///
    /// Each configured slot gets a driver from the board and two PID
    /// instances sharing the configuration-derived gains, with the fixed
    /// output rails `[-1000, 1000]` and scale 10. The RPM request limit is
    /// the motor's no-load RPM; the current request limit is the lesser of
    /// the board maximum and the configured stall current.
    ///
    /// # Errors
    ///
    /// Returns a [`MotorControllerError`] when the board cannot provide a
    /// configured driver or the stored gains are unusable.
    ///
    /// # Panics
    ///
    /// Panics when the configuration claims more motors than
    /// [`MAX_MOTORS`].
    pub fn new<B, P>(
        board: &B,
        config: &P,
        clock: C,
        monitor: M,
    ) -> Result<Self, MotorControllerError>
    where
        B: Board<Driver = D>,
        P: ConfigProvider,
    {
        let count = config.motor_count() as usize;
        assert!(
            count <= MAX_MOTORS,
            "configured motor count {} exceeds capacity {}",
            count,
            MAX_MOTORS
        );

        let params = PidParameters {
            kp: config.pid_gain(PidGain::Kp) as i32,
            ki: config.pid_gain(PidGain::Ki) as i32,
            kd: config.pid_gain(PidGain::Kd) as i32,
            imax: config.pid_gain(PidGain::IMax) as i32,
            imin: config.pid_gain(PidGain::IMin) as i32,
            cvmax: CV_MAX,
            cvmin: CV_MIN,
            scale: PID_SCALE,
        };
        let rpm_limit = config.no_load_rpm() as i32;
        let current_limit = board.max_current().min(config.stall_current()) as i32;

        let mut motors: [Option<Motor<D>>; MAX_MOTORS] = core::array::from_fn(|_| None);
        for (index, slot) in motors.iter_mut().enumerate().take(count) {
            let driver = board
                .motor_driver(index)
                .map_err(|source| MotorControllerError::Board { index, source })?;
            *slot = Some(Motor {
                driver,
                rpm_pid: Pid::new(params)?,
                current_pid: Pid::new(params)?,
                rpm_limit,
                current_limit,
            });
        }

        info!(
            motors = count,
            rpm_limit, current_limit, "motor controller initialized"
        );
        let update_at = clock.now();
        Ok(MotorController {
            motors,
            count,
            clock,
            monitor,
            update_at,
        })
    }

    /// Scheduler tick: poll every driver, and run the control law when the
    /// cadence has elapsed.
    ///
    /// On a cadence tick every motor whose driver reports `Run` evaluates
    /// its RPM PID against measured RPM and its current PID against
    /// measured current, then commands the smaller of the two control
    /// variables. The watchdog is fed once per cadence tick.
    pub fn update(&mut self) {
        for motor in self.motors.iter_mut().flatten() {
            motor.driver.update();
        }

        if self.clock.elapsed_since(self.update_at) < UPDATE_PERIOD_MS {
            return;
        }

        for (index, motor) in self.motors.iter_mut().flatten().enumerate() {
            if motor.driver.status() != MotorStatus::Run {
                continue;
            }
            let cv_rpm = motor.rpm_pid.update(motor.driver.rpm());
            let cv_current = motor.current_pid.update(motor.driver.current());
            // The current loop cross-limits the speed loop: whichever asks
            // for less drive wins.
            let speed = cv_rpm.min(cv_current);
            trace!(index, cv_rpm, cv_current, speed, "control law evaluated");
            motor.driver.set_speed(speed);
        }

        self.monitor.feed_watchdog();
        self.update_at = self.clock.now();
    }

    /// Apply an RPM setpoint to one motor.
    ///
    /// The request is clamped to the motor's no-load RPM in either
    /// direction. A positive setpoint restricts the PID output to
    /// `[0, cvmax]`, a negative one to `[cvmin, 0]`; a zero setpoint keeps
    /// the previous window so the limits don't flap while decelerating
    /// through zero.
    ///
    /// # Panics
    ///
    /// Panics when `index` is not a configured motor.
    pub fn set_rpm(&mut self, index: usize, rpm: i32) {
        let motor = self.motor_mut(index);
        let rpm = rpm.clamp(-motor.rpm_limit, motor.rpm_limit);
        debug!(index, rpm, "rpm setpoint");
        apply_setpoint(&mut motor.rpm_pid, rpm);
    }

    /// Apply a current setpoint (milliamperes) to one motor.
    ///
    /// Same clamping and output-window policy as [`MotorController::set_rpm`],
    /// with the request bounded by the lesser of board max current and
    /// stall current.
    ///
    /// # Panics
    ///
    /// Panics when `index` is not a configured motor.
    pub fn set_current(&mut self, index: usize, current: i32) {
        let motor = self.motor_mut(index);
        let current = current.clamp(-motor.current_limit, motor.current_limit);
        debug!(index, current, "current setpoint");
        apply_setpoint(&mut motor.current_pid, current);
    }

    /// Enable closed-loop drive on one motor. No-op when already running.
    ///
    /// # Panics
    ///
    /// Panics when `index` is not a configured motor.
    pub fn run(&mut self, index: usize) {
        let motor = self.motor_mut(index);
        if motor.driver.status() == MotorStatus::Run {
            return;
        }
        info!(index, "motor run");
        motor.driver.run();
    }

    /// Let one motor spin freely. No-op when already coasting.
    ///
    /// Both PID histories are cleared so stale integral state cannot carry
    /// across the stop; tuning and setpoints survive.
    ///
    /// # Panics
    ///
    /// Panics when `index` is not a configured motor.
    pub fn coast(&mut self, index: usize) {
        let motor = self.motor_mut(index);
        if motor.driver.status() == MotorStatus::Coast {
            return;
        }
        info!(index, "motor coast");
        motor.driver.coast();
        motor.rpm_pid.reset();
        motor.current_pid.reset();
    }

    /// Brake one motor. No-op when already braking.
    ///
    /// Clears both PID histories, like [`MotorController::coast`].
    ///
    /// # Panics
    ///
    /// Panics when `index` is not a configured motor.
    pub fn brake(&mut self, index: usize) {
        let motor = self.motor_mut(index);
        if motor.driver.status() == MotorStatus::Brake {
            return;
        }
        info!(index, "motor brake");
        motor.driver.brake();
        motor.rpm_pid.reset();
        motor.current_pid.reset();
    }

    /// Accumulated encoder position of one motor, in counts.
    ///
    /// # Panics
    ///
    /// Panics when `index` is not a configured motor.
    pub fn position(&self, index: usize) -> i32 {
        self.motor(index).driver.position()
    }

    /// Actual-versus-target snapshot of one motor.
    ///
    /// # Panics
    ///
    /// Panics when `index` is not a configured motor.
    pub fn status(&self, index: usize) -> MotorReport {
        let motor = self.motor(index);
        MotorReport {
            actual_rpm: motor.driver.rpm(),
            target_rpm: motor.rpm_pid.setpoint(),
            actual_current: motor.driver.current(),
            target_current: motor.current_pid.setpoint(),
            status: motor.driver.status(),
        }
    }

    /// Number of configured motors.
    pub fn motor_count(&self) -> usize {
        self.count
    }

    fn motor(&self, index: usize) -> &Motor<D> {
        assert!(
            index < self.count,
            "motor index {} out of range ({} configured)",
            index,
            self.count
        );
        self.motors[index].as_ref().expect("slot within configured count")
    }

    fn motor_mut(&mut self, index: usize) -> &mut Motor<D> {
        assert!(
            index < self.count,
            "motor index {} out of range ({} configured)",
            index,
            self.count
        );
        self.motors[index].as_mut().expect("slot within configured count")
    }
}

/// Select the PID output window by setpoint sign, then apply the setpoint.
///
/// Zero keeps the previous window on purpose: flipping the limits at every
/// zero crossing would chatter during deceleration.
fn apply_setpoint(pid: &mut Pid, setpoint: i32) {
    match setpoint.cmp(&0) {
        core::cmp::Ordering::Greater => pid.set_output_limits(0, CV_MAX),
        core::cmp::Ordering::Less => pid.set_output_limits(CV_MIN, 0),
        core::cmp::Ordering::Equal => {}
    }
    pid.set_setpoint(setpoint);
}
