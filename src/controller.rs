//! Orchestrator core: six PID units arranged as three axis cascades, the
//! current setpoint/measurement vectors, and the per-tick computation.
//!
//! The fixed-rate loop around this lives in `runner`; everything here is
//! synchronous and deterministic, which is what the tests drive directly.

use crate::cascade::{hover_speed, AxisCascade};
use crate::config::{ControlConfig, PidConfig};
use crate::diagnostics::{AttitudeRef, TickOutput};
use crate::ipc::Vec3;
use crate::pid::Pid;
use crate::tuning::{AxisGains, GainSet};

/// Which reference the inner loops track. Receiving a position setpoint
/// selects `Position`; receiving a raw velocity setpoint selects
/// `DirectVelocity` (inner-loop-only testing, outer loop bypassed).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMode {
    Position,
    DirectVelocity,
}

pub struct PositionController {
    x: AxisCascade,
    y: AxisCascade,
    z: AxisCascade,

    pos_sp: Vec3,
    vel_sp: Vec3,
    pos_mv: Vec3,
    vel_mv: Vec3,
    mode: ControlMode,

    hover_speed: f64,
}

fn pid_from(cfg: &PidConfig) -> Pid {
    Pid::new(cfg.kp, cfg.ki, cfg.kd, cfg.limit_low, cfg.limit_high)
}

impl PositionController {
    pub fn new(cfg: &ControlConfig) -> Self {
        Self {
            x: AxisCascade::new(pid_from(&cfg.pid_x), pid_from(&cfg.pid_vx)),
            y: AxisCascade::new(pid_from(&cfg.pid_y), pid_from(&cfg.pid_vy)),
            z: AxisCascade::new(pid_from(&cfg.pid_z), pid_from(&cfg.pid_vz)),
            // Default hover target one meter up, so an armed vehicle with no
            // setpoint yet holds a sane reference.
            pos_sp: Vec3::new(0.0, 0.0, 1.0),
            vel_sp: Vec3::default(),
            pos_mv: Vec3::default(),
            vel_mv: Vec3::default(),
            mode: ControlMode::Position,
            hover_speed: hover_speed(cfg.mass, cfg.rotor_c, cfg.rotor_num),
        }
    }

    pub fn set_position_measurement(&mut self, p: Vec3) {
        self.pos_mv = p;
    }

    pub fn set_velocity_measurement(&mut self, v: Vec3) {
        self.vel_mv = v;
    }

    pub fn set_position_setpoint(&mut self, p: Vec3) {
        self.pos_sp = p;
        self.mode = ControlMode::Position;
    }

    pub fn set_velocity_setpoint(&mut self, v: Vec3) {
        self.vel_sp = v;
        self.mode = ControlMode::DirectVelocity;
    }

    pub fn mode(&self) -> ControlMode {
        self.mode
    }

    pub fn hover_speed(&self) -> f64 {
        self.hover_speed
    }

    /// One control step. All six units advance with the same dt; a
    /// non-positive dt makes every unit hold its previous output, so the
    /// tick still completes.
    pub fn tick(&mut self, dt: f64) -> TickOutput {
        let (ux, uy, uz) = match self.mode {
            ControlMode::Position => (
                self.x.advance(self.pos_sp.x, self.pos_mv.x, self.vel_mv.x, dt),
                self.y.advance(self.pos_sp.y, self.pos_mv.y, self.vel_mv.y, dt),
                self.z.advance(self.pos_sp.z, self.pos_mv.z, self.vel_mv.z, dt),
            ),
            ControlMode::DirectVelocity => (
                self.x.advance_velocity(self.vel_sp.x, self.vel_mv.x, dt),
                self.y.advance_velocity(self.vel_sp.y, self.vel_mv.y, dt),
                self.z.advance_velocity(self.vel_sp.z, self.vel_mv.z, dt),
            ),
        };

        let (rx, rvx) = self.x.reports();
        let (ry, rvy) = self.y.reports();
        let (rz, rvz) = self.z.reports();

        TickOutput {
            attitude: AttitudeRef {
                // Body-frame convention: x error tilts pitch, y error tilts
                // roll with inverted sign.
                roll: -uy,
                pitch: ux,
            },
            motor_speed: self.hover_speed + uz,
            reports: [rx, rvx, ry, rvy, rz, rvz],
        }
    }

    /// Clear the integral/previous-error history of all six units. Gains,
    /// limits, setpoints, and the hover feed-forward are untouched.
    pub fn reset(&mut self) {
        self.x.reset();
        self.y.reset();
        self.z.reset();
    }

    /// Live gains of all six units, for seeding the reconfiguration store.
    pub fn snapshot(&self) -> GainSet {
        let gains = |pid: &Pid| AxisGains::new(pid.kp(), pid.ki(), pid.kd());
        GainSet {
            x: gains(self.x.outer()),
            vx: gains(self.x.inner()),
            y: gains(self.y.outer()),
            vy: gains(self.y.inner()),
            z: gains(self.z.outer()),
            vz: gains(self.z.inner()),
        }
    }

    /// Push store values down into the six units. No bounds validation; the
    /// external store checks ranges before submitting.
    pub fn apply_gains(&mut self, gains: &GainSet) {
        let apply = |pid: &mut Pid, g: &AxisGains| {
            pid.set_kp(g.kp);
            pid.set_ki(g.ki);
            pid.set_kd(g.kd);
        };
        apply(self.x.outer_mut(), &gains.x);
        apply(self.x.inner_mut(), &gains.vx);
        apply(self.y.outer_mut(), &gains.y);
        apply(self.y.inner_mut(), &gains.vy);
        apply(self.z.outer_mut(), &gains.z);
        apply(self.z.inner_mut(), &gains.vz);
    }
}
