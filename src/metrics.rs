//! Loop timing metrics: dt and compute-time histograms plus jitter counters.

use hdrhistogram::Histogram;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct LoopMetrics {
    dt_hist: Arc<Mutex<Histogram<u64>>>,
    compute_hist: Arc<Mutex<Histogram<u64>>>,
    ticks: Arc<AtomicU64>,
    jitter_violations: Arc<AtomicU64>,
}

impl LoopMetrics {
    pub fn new() -> Self {
        Self {
            dt_hist: Arc::new(Mutex::new(Histogram::new(3).unwrap())),
            compute_hist: Arc::new(Mutex::new(Histogram::new(3).unwrap())),
            ticks: Arc::new(AtomicU64::new(0)),
            jitter_violations: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Record one tick's measured dt. `within_tolerance` is false when dt
    /// deviated more than 5% from the nominal period; that is diagnostic
    /// only and never stops the loop.
    pub fn record_tick(&self, dt: Duration, within_tolerance: bool) {
        self.dt_hist.lock().record(dt.as_nanos() as u64).ok();
        self.ticks.fetch_add(1, Ordering::Relaxed);
        if !within_tolerance {
            self.jitter_violations.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_compute(&self, duration: Duration) {
        self.compute_hist.lock().record(duration.as_nanos() as u64).ok();
    }

    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    pub fn jitter_violations(&self) -> u64 {
        self.jitter_violations.load(Ordering::Relaxed)
    }

    pub fn report(&self) -> LoopReport {
        let dt = self.dt_hist.lock();
        let compute = self.compute_hist.lock();

        LoopReport {
            dt_p50: Duration::from_nanos(dt.value_at_quantile(0.5)),
            dt_p99: Duration::from_nanos(dt.value_at_quantile(0.99)),
            compute_p50: Duration::from_nanos(compute.value_at_quantile(0.5)),
            compute_p99: Duration::from_nanos(compute.value_at_quantile(0.99)),
            ticks: self.ticks(),
            jitter_violations: self.jitter_violations(),
        }
    }
}

impl Default for LoopMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LoopReport {
    pub dt_p50: Duration,
    pub dt_p99: Duration,
    pub compute_p50: Duration,
    pub compute_p99: Duration,
    pub ticks: u64,
    pub jitter_violations: u64,
}
