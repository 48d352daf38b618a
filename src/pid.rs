//! Single-axis PID unit with output clamping and integral anti-windup.

use crate::diagnostics::PidReport;

/// Discrete PID controller for one axis of the cascade.
///
/// The integral accumulator already carries the `ki` factor, and is clamped
/// to the output range so the integral contribution alone can never exceed
/// the limits (windup protection). A call with `dt <= 0` performs no state
/// update and returns the previously held output.
#[derive(Debug, Clone)]
pub struct Pid {
    kp: f64,
    ki: f64,
    kd: f64,
    lim_low: f64,
    lim_high: f64,
    enabled: bool,

    integral: f64,
    prev_error: f64,

    // Terms of the most recent compute, kept for the diagnostic record.
    last_reference: f64,
    last_measurement: f64,
    last_p: f64,
    last_d: f64,
    last_output: f64,
}

impl Pid {
    pub fn new(kp: f64, ki: f64, kd: f64, lim_low: f64, lim_high: f64) -> Self {
        Self {
            kp,
            ki,
            kd,
            lim_low,
            lim_high,
            enabled: true,
            integral: 0.0,
            prev_error: 0.0,
            last_reference: 0.0,
            last_measurement: 0.0,
            last_p: 0.0,
            last_d: 0.0,
            last_output: 0.0,
        }
    }

    /// Advance the controller by one step and return the clamped output.
    pub fn compute(&mut self, reference: f64, measurement: f64, dt: f64) -> f64 {
        if !self.enabled || dt <= 0.0 {
            return self.last_output;
        }

        let error = reference - measurement;

        let p = self.kp * error;
        self.integral = (self.integral + self.ki * error * dt).clamp(self.lim_low, self.lim_high);
        let d = self.kd * (error - self.prev_error) / dt;

        let output = (p + self.integral + d).clamp(self.lim_low, self.lim_high);

        self.prev_error = error;
        self.last_reference = reference;
        self.last_measurement = measurement;
        self.last_p = p;
        self.last_d = d;
        self.last_output = output;

        output
    }

    /// Clear integral, previous error, and the held output. Gains and limits
    /// keep their tuned values.
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = 0.0;
        self.last_reference = 0.0;
        self.last_measurement = 0.0;
        self.last_p = 0.0;
        self.last_d = 0.0;
        self.last_output = 0.0;
    }

    /// Diagnostic record of the most recent compute.
    pub fn report(&self) -> PidReport {
        PidReport {
            reference: self.last_reference,
            measurement: self.last_measurement,
            proportional: self.last_p,
            integral: self.integral,
            derivative: self.last_d,
            total: self.last_output,
        }
    }

    pub fn kp(&self) -> f64 {
        self.kp
    }

    pub fn set_kp(&mut self, kp: f64) {
        self.kp = kp;
    }

    pub fn ki(&self) -> f64 {
        self.ki
    }

    pub fn set_ki(&mut self, ki: f64) {
        self.ki = ki;
    }

    pub fn kd(&self) -> f64 {
        self.kd
    }

    pub fn set_kd(&mut self, kd: f64) {
        self.kd = kd;
    }

    pub fn lim_low(&self) -> f64 {
        self.lim_low
    }

    /// Takes effect on the next `compute`; a stale integral accumulator is
    /// not re-clamped here.
    pub fn set_lim_low(&mut self, lim_low: f64) {
        self.lim_low = lim_low;
    }

    pub fn lim_high(&self) -> f64 {
        self.lim_high
    }

    pub fn set_lim_high(&mut self, lim_high: f64) {
        self.lim_high = lim_high;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// A disabled unit holds its previous output and performs no updates.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}
