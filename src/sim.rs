//! Simulated hardware collaborators for the host binary.
//!
//! These stand in for the board peripherals: a first-order DC motor model
//! behind the [`MotorDriver`] trait, a loopback CAN transport, a wall-clock
//! time source and a counting watchdog monitor.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace};

use torqbus_hal::{
    Board, BoardError, CanFrame, CanTransport, Clock, MotorDriver, MotorStatus, SystemMonitor,
    TransportError,
};

use crate::settings::Settings;

/// First-order DC motor model with measurement noise.
///
/// The shaft speed lags the commanded speed with a single time constant;
/// the winding current rises with slip (the gap between commanded and
/// actual speed). Good enough to give the PID loops something to chew on.
pub struct SimMotor {
    no_load_rpm: f64,
    no_load_current: f64,
    stall_current: f64,
    counts_per_rev: f64,
    status: MotorStatus,
    speed_cmd: i32,
    rpm: f64,
    position: f64,
    measured_rpm: i32,
    measured_current: i32,
    rng: StdRng,
}

impl SimMotor {
    fn new(settings: &Settings, seed: u64) -> Self {
        SimMotor {
            no_load_rpm: f64::from(settings.motors.no_load_rpm),
            no_load_current: f64::from(settings.motors.no_load_current),
            stall_current: f64::from(settings.motors.stall_current),
            counts_per_rev: f64::from(settings.motors.counts_per_rev),
            status: MotorStatus::Coast,
            speed_cmd: 0,
            rpm: 0.0,
            position: 0.0,
            measured_rpm: 0,
            measured_current: 0,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl MotorDriver for SimMotor {
    fn update(&mut self) {
        let (target, alpha) = match self.status {
            MotorStatus::Run => (f64::from(self.speed_cmd) / 1000.0 * self.no_load_rpm, 0.02),
            MotorStatus::Coast => (0.0, 0.002),
            MotorStatus::Brake => (0.0, 0.05),
            MotorStatus::Fault => (0.0, 0.0),
        };
        self.rpm += (target - self.rpm) * alpha;
        self.position += self.rpm / 60_000.0 * self.counts_per_rev;

        let current = if self.status == MotorStatus::Run {
            let slip = ((target - self.rpm).abs() / self.no_load_rpm).min(1.0);
            self.no_load_current + (self.stall_current - self.no_load_current) * slip
        } else {
            0.0
        };

        self.measured_rpm = (self.rpm + self.rng.random_range(-3.0..=3.0)) as i32;
        self.measured_current = (current + self.rng.random_range(-2.0..=2.0)) as i32;
    }

    fn rpm(&self) -> i32 {
        self.measured_rpm
    }

    fn current(&self) -> i32 {
        self.measured_current
    }

    fn set_speed(&mut self, speed: i32) {
        self.speed_cmd = speed;
    }

    fn run(&mut self) {
        self.status = MotorStatus::Run;
    }

    fn coast(&mut self) {
        self.status = MotorStatus::Coast;
    }

    fn brake(&mut self) {
        self.status = MotorStatus::Brake;
        self.speed_cmd = 0;
    }

    fn status(&self) -> MotorStatus {
        self.status
    }

    fn position(&self) -> i32 {
        self.position as i32
    }
}

/// Simulated board: hands out one [`SimMotor`] per configured slot.
pub struct SimBoard {
    settings: Settings,
}

impl SimBoard {
    pub fn new(settings: &Settings) -> Self {
        SimBoard {
            settings: settings.clone(),
        }
    }
}

impl Board for SimBoard {
    type Driver = SimMotor;

    fn motor_driver(&self, index: usize) -> Result<SimMotor, BoardError> {
        if index >= self.settings.motors.count as usize {
            return Err(BoardError::NoSuchMotor(index));
        }
        Ok(SimMotor::new(&self.settings, 0x7041 + index as u64))
    }

    fn max_current(&self) -> u32 {
        self.settings.board.max_current
    }
}

/// Loopback CAN transport that records every transmitted frame.
#[derive(Clone, Default)]
pub struct BusLog {
    frames: Arc<Mutex<Vec<CanFrame>>>,
}

impl BusLog {
    pub fn transmitted(&self) -> usize {
        self.frames.lock().len()
    }
}

impl CanTransport for BusLog {
    fn transmit(&mut self, frame: &CanFrame) -> Result<(), TransportError> {
        debug!(id = frame.id, dlc = frame.dlc, "status frame transmitted");
        self.frames.lock().push(*frame);
        Ok(())
    }
}

/// Monotonic wall-clock milliseconds since construction.
#[derive(Clone)]
pub struct WallClock {
    epoch: Instant,
}

impl WallClock {
    pub fn new() -> Self {
        WallClock {
            epoch: Instant::now(),
        }
    }
}

impl Clock for WallClock {
    fn now(&self) -> u32 {
        self.epoch.elapsed().as_millis() as u32
    }
}

/// Counting watchdog/activity monitor.
#[derive(Default)]
pub struct ActivityMonitor {
    feeds: AtomicU32,
    activity: AtomicU32,
}

impl ActivityMonitor {
    pub fn feeds(&self) -> u32 {
        self.feeds.load(Ordering::Relaxed)
    }

    pub fn activity(&self) -> u32 {
        self.activity.load(Ordering::Relaxed)
    }
}

impl SystemMonitor for ActivityMonitor {
    fn feed_watchdog(&self) {
        self.feeds.fetch_add(1, Ordering::Relaxed);
        trace!("watchdog fed");
    }

    fn report_activity(&self) {
        self.activity.fetch_add(1, Ordering::Relaxed);
    }
}
