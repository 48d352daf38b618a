//! Two-stage cascade for one axis: position loop feeding a velocity loop.

use crate::diagnostics::PidReport;
use crate::pid::Pid;

pub const GRAVITY: f64 = 9.81;

/// Rotor speed that balances gravity, `sqrt(g * mass / (rotor_c * rotor_num))`.
/// Computed once at startup and never recomputed, even if mass parameters
/// change later.
pub fn hover_speed(mass: f64, rotor_c: f64, rotor_num: u32) -> f64 {
    (GRAVITY * mass / (rotor_c * f64::from(rotor_num))).sqrt()
}

/// Outer (position -> velocity target) and inner (velocity -> command) PID
/// units for one axis. Both units always advance with the same dt.
#[derive(Debug, Clone)]
pub struct AxisCascade {
    outer: Pid,
    inner: Pid,
}

impl AxisCascade {
    pub fn new(outer: Pid, inner: Pid) -> Self {
        Self { outer, inner }
    }

    /// Full cascade step: the outer unit turns position error into a
    /// velocity target, the inner unit turns velocity error into a command.
    pub fn advance(&mut self, pos_ref: f64, pos_meas: f64, vel_meas: f64, dt: f64) -> f64 {
        let vel_ref = self.outer.compute(pos_ref, pos_meas, dt);
        self.inner.compute(vel_ref, vel_meas, dt)
    }

    /// Inner loop only, for direct velocity tracking. The outer unit is left
    /// untouched.
    pub fn advance_velocity(&mut self, vel_ref: f64, vel_meas: f64, dt: f64) -> f64 {
        self.inner.compute(vel_ref, vel_meas, dt)
    }

    pub fn reset(&mut self) {
        self.outer.reset();
        self.inner.reset();
    }

    pub fn reports(&self) -> (PidReport, PidReport) {
        (self.outer.report(), self.inner.report())
    }

    pub fn outer(&self) -> &Pid {
        &self.outer
    }

    pub fn outer_mut(&mut self) -> &mut Pid {
        &mut self.outer
    }

    pub fn inner(&self) -> &Pid {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut Pid {
        &mut self.inner
    }
}
