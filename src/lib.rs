pub mod cascade;
pub mod config;
pub mod controller;
pub mod diagnostics;
pub mod ipc;
pub mod metrics;
pub mod pid;
pub mod runner;
pub mod tuning;

pub use cascade::{hover_speed, AxisCascade, GRAVITY};
pub use config::{load_config, ConfigError, ControlConfig, PidConfig};
pub use controller::{ControlMode, PositionController};
pub use diagnostics::{AttitudeRef, EventLog, PidReport, TickOutput};
pub use ipc::{ControlChannels, Vec3};
pub use metrics::{LoopMetrics, LoopReport};
pub use pid::Pid;
pub use runner::{spawn_control_loop, ControlStats, LoopState};
pub use tuning::{AxisGains, GainSet, GainStore};
