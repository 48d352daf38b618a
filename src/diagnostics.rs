//! Per-tick diagnostic records and the shared event log.

use parking_lot::RwLock;
use std::collections::VecDeque;
use std::sync::Arc;

/// Internal terms of one PID unit for one tick. One record per unit is
/// emitted with every control output; downstream tooling uses these for
/// gain tuning.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PidReport {
    pub reference: f64,
    pub measurement: f64,
    pub proportional: f64,
    pub integral: f64,
    pub derivative: f64,
    pub total: f64,
}

/// Attitude angle reference consumed by the downstream attitude controller.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AttitudeRef {
    pub roll: f64,
    pub pitch: f64,
}

/// Everything one tick produces: the attitude/thrust command plus the six
/// diagnostic records in (x, vx, y, vy, z, vz) order.
#[derive(Debug, Clone, Copy)]
pub struct TickOutput {
    pub attitude: AttitudeRef,
    pub motor_speed: f64,
    pub reports: [PidReport; 6],
}

// Bounded ring buffer of loop events (state transitions, jitter flags).
#[derive(Clone)]
pub struct EventLog {
    entries: Arc<RwLock<VecDeque<String>>>,
    max_size: usize,
}

impl EventLog {
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(VecDeque::with_capacity(max_size))),
            max_size,
        }
    }

    pub fn record(&self, message: impl Into<String>) {
        let mut log = self.entries.write();
        log.push_back(message.into());
        if log.len() > self.max_size {
            log.pop_front();
        }
    }

    pub fn read_all(&self) -> Vec<String> {
        self.entries.read().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}
