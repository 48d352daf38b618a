//! Startup configuration, loaded once from TOML before the loop arms.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Gains and output limits for one PID unit.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PidConfig {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    pub limit_low: f64,
    pub limit_high: f64,
}

/// Vehicle parameters, loop rate, and the six PID blocks. Not reloaded at
/// runtime; gains change through the tuning store instead.
#[derive(Debug, Clone, Deserialize)]
pub struct ControlConfig {
    pub mass: f64,
    pub rotor_c: f64,
    pub rotor_num: u32,
    /// Loop rate in Hz.
    #[serde(default = "default_rate")]
    pub rate: f64,
    pub pid_x: PidConfig,
    pub pid_vx: PidConfig,
    pub pid_y: PidConfig,
    pub pid_vy: PidConfig,
    pub pid_z: PidConfig,
    pub pid_vz: PidConfig,
}

fn default_rate() -> f64 {
    100.0
}

impl ControlConfig {
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        let cfg: ControlConfig = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Nominal tick period derived from the configured rate.
    pub fn period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.rate)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.mass.is_finite() && self.mass > 0.0) {
            return Err(ConfigError::Invalid(format!("mass must be positive, got {}", self.mass)));
        }
        if !(self.rotor_c.is_finite() && self.rotor_c > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "rotor_c must be positive, got {}",
                self.rotor_c
            )));
        }
        if self.rotor_num == 0 {
            return Err(ConfigError::Invalid("rotor_num must be at least 1".into()));
        }
        if !(self.rate.is_finite() && self.rate > 0.0) {
            return Err(ConfigError::Invalid(format!("rate must be positive, got {}", self.rate)));
        }
        for (name, pid) in [
            ("pid_x", &self.pid_x),
            ("pid_vx", &self.pid_vx),
            ("pid_y", &self.pid_y),
            ("pid_vy", &self.pid_vy),
            ("pid_z", &self.pid_z),
            ("pid_vz", &self.pid_vz),
        ] {
            pid.validate(name)?;
        }
        Ok(())
    }
}

impl PidConfig {
    fn validate(&self, name: &str) -> Result<(), ConfigError> {
        let values = [self.kp, self.ki, self.kd, self.limit_low, self.limit_high];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ConfigError::Invalid(format!("{name}: all values must be finite")));
        }
        if self.limit_low >= self.limit_high {
            return Err(ConfigError::Invalid(format!(
                "{name}: limit_low ({}) must be below limit_high ({})",
                self.limit_low, self.limit_high
            )));
        }
        Ok(())
    }
}

pub fn load_config(path: impl AsRef<Path>) -> Result<ControlConfig, ConfigError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    ControlConfig::from_toml(&contents)
}
