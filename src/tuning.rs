//! Runtime gain reconfiguration surface: the 18 tunable gains exchanged
//! with an external reconfiguration store.
//!
//! The exchange happens in two explicit phases. At startup the control loop
//! seeds the store with a snapshot of its live gains, so the store begins
//! synchronized instead of at its own defaults. Afterwards the store submits
//! new values and the loop picks them up between ticks. No bounds checking
//! happens on this path; the store validates ranges before submitting.

use parking_lot::Mutex;
use std::sync::Arc;

/// kp/ki/kd for one PID unit. Output limits are startup-only and not part of
/// the runtime surface.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AxisGains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

impl AxisGains {
    pub fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self { kp, ki, kd }
    }
}

/// Gains for all six PID units.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GainSet {
    pub x: AxisGains,
    pub vx: AxisGains,
    pub y: AxisGains,
    pub vy: AxisGains,
    pub z: AxisGains,
    pub vz: AxisGains,
}

#[derive(Default)]
struct GainStoreInner {
    current: Option<GainSet>,
    pending: Option<GainSet>,
}

/// Shared store bridging the external reconfiguration collaborator and the
/// control loop.
#[derive(Clone, Default)]
pub struct GainStore {
    inner: Arc<Mutex<GainStoreInner>>,
}

impl GainStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// First phase: the loop publishes its live gains at startup.
    pub fn seed(&self, gains: GainSet) {
        let mut inner = self.inner.lock();
        inner.current = Some(gains);
    }

    /// What the store currently believes the live gains are.
    pub fn current(&self) -> Option<GainSet> {
        self.inner.lock().current
    }

    /// Second phase: the external store pushes new values down.
    pub fn submit(&self, gains: GainSet) {
        let mut inner = self.inner.lock();
        inner.current = Some(gains);
        inner.pending = Some(gains);
    }

    /// Drained by the loop between ticks; returns at most one pending set.
    pub fn take_pending(&self) -> Option<GainSet> {
        self.inner.lock().pending.take()
    }
}
