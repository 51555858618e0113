//! Configuration loading for the host binary.
//!
//! The simulation stands in for the board's non-volatile storage: settings
//! come from a TOML file and are exposed to the control core through the
//! [`ConfigProvider`] trait.

use anyhow::Context;
use config::{Config, File, FileFormat};
use serde::Deserialize;
use tracing::info;

use torqbus_hal::{ConfigProvider, PidGain};

const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub motors: MotorSettings,
    pub gains: GainSettings,
    pub board: BoardSettings,
    pub schedule: ScheduleSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MotorSettings {
    pub count: u32,
    pub counts_per_rev: u32,
    pub no_load_rpm: u32,
    pub no_load_current: u32,
    pub stall_current: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GainSettings {
    pub kp: i32,
    pub ki: i32,
    pub kd: i32,
    pub imax: i32,
    pub imin: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BoardSettings {
    pub max_current: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleSettings {
    pub tick_ms: u64,
    pub status_period_ms: u64,
    pub run_ms: u64,
}

pub fn load() -> anyhow::Result<Settings> {
    let settings: Settings = Config::builder()
        .add_source(File::new(DEFAULT_CONFIG_PATH, FileFormat::Toml).required(true))
        .build()
        .with_context(|| format!("reading {}", DEFAULT_CONFIG_PATH))?
        .try_deserialize()
        .with_context(|| format!("deserializing {}", DEFAULT_CONFIG_PATH))?;
    info!(path = DEFAULT_CONFIG_PATH, "configuration loaded");
    Ok(settings)
}

impl ConfigProvider for Settings {
    fn motor_count(&self) -> u32 {
        self.motors.count
    }

    fn counts_per_rev(&self) -> u32 {
        self.motors.counts_per_rev
    }

    fn no_load_rpm(&self) -> u32 {
        self.motors.no_load_rpm
    }

    fn no_load_current(&self) -> u32 {
        self.motors.no_load_current
    }

    fn stall_current(&self) -> u32 {
        self.motors.stall_current
    }

    // Gains are stored signed in the TOML file; the trait carries them as
    // raw u32 the way the persisted store does, and the consumer casts
    // back.
    fn pid_gain(&self, gain: PidGain) -> u32 {
        let value = match gain {
            PidGain::Kp => self.gains.kp,
            PidGain::Ki => self.gains.ki,
            PidGain::Kd => self.gains.kd,
            PidGain::IMax => self.gains.imax,
            PidGain::IMin => self.gains.imin,
        };
        value as u32
    }
}
