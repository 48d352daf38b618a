//! Fixed-rate control loop thread and its armed/waiting state machine.

use crossbeam::channel::TrySendError;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::ControlConfig;
use crate::controller::PositionController;
use crate::diagnostics::EventLog;
use crate::ipc::ControlChannels;
use crate::metrics::LoopMetrics;
use crate::tuning::GainStore;

/// Poll interval while no position measurement has arrived yet.
const WAIT_POLL: Duration = Duration::from_millis(100);

/// Relative dt deviation from the nominal period that gets flagged.
const JITTER_TOLERANCE: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LoopState {
    Uninitialized = 0,
    WaitingForMeasurement = 1,
    Running = 2,
}

pub struct ControlStats {
    state: AtomicU8,
    pub ticks: AtomicU64,
    pub jitter_violations: AtomicU64,
    pub resets: AtomicU64,
    pub shutdown: AtomicBool,
}

impl ControlStats {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            state: AtomicU8::new(LoopState::Uninitialized as u8),
            ticks: AtomicU64::new(0),
            jitter_violations: AtomicU64::new(0),
            resets: AtomicU64::new(0),
            shutdown: AtomicBool::new(false),
        })
    }

    pub fn state(&self) -> LoopState {
        match self.state.load(Ordering::Acquire) {
            0 => LoopState::Uninitialized,
            1 => LoopState::WaitingForMeasurement,
            _ => LoopState::Running,
        }
    }

    fn set_state(&self, state: LoopState) {
        self.state.store(state as u8, Ordering::Release);
    }
}

/// Everything the inbound drain observed between two ticks.
#[derive(Default)]
struct DrainResult {
    got_position: bool,
    got_reset: bool,
}

/// Apply all queued messages to the controller. Runs between ticks, never
/// during one, so a tick always sees whole (x, y, z) triples.
fn drain_inputs(
    controller: &mut PositionController,
    channels: &ControlChannels,
    gains: &GainStore,
) -> DrainResult {
    let mut result = DrainResult::default();

    while let Ok(p) = channels.position_rx.try_recv() {
        controller.set_position_measurement(p);
        result.got_position = true;
    }
    while let Ok(v) = channels.velocity_rx.try_recv() {
        controller.set_velocity_measurement(v);
    }
    while let Ok(p) = channels.position_ref_rx.try_recv() {
        controller.set_position_setpoint(p);
    }
    while let Ok(v) = channels.velocity_ref_rx.try_recv() {
        controller.set_velocity_setpoint(v);
    }
    while channels.reset_rx.try_recv().is_ok() {
        result.got_reset = true;
    }
    if let Some(g) = gains.take_pending() {
        controller.apply_gains(&g);
    }

    result
}

/// Spawn the control loop. The loop arms (WaitingForMeasurement) as soon as
/// the thread starts, transitions to Running on the first position sample,
/// and falls back to WaitingForMeasurement on reset. Measurement intake is
/// armed exactly once, at channel creation; re-arming after a reset is the
/// state transition itself, so it can never create a duplicate delivery
/// path.
pub fn spawn_control_loop(
    cfg: ControlConfig,
    channels: ControlChannels,
    gains: GainStore,
    events: EventLog,
    metrics: LoopMetrics,
) -> (thread::JoinHandle<()>, Arc<ControlStats>) {
    let stats = ControlStats::new();
    let stats_clone = stats.clone();

    let handle = thread::spawn(move || {
        let mut controller = PositionController::new(&cfg);
        // First phase of the reconfiguration contract: publish live gains so
        // the external store starts synchronized.
        gains.seed(controller.snapshot());

        let period = cfg.period();
        let nominal = period.as_secs_f64();

        stats_clone.set_state(LoopState::WaitingForMeasurement);
        info!(rate = cfg.rate, "control loop armed, waiting for position measurements");
        events.record("armed, waiting for position measurements");

        let mut t_old = Instant::now();

        loop {
            if stats_clone.shutdown.load(Ordering::Relaxed) {
                info!("control loop shutting down");
                break;
            }

            match stats_clone.state() {
                LoopState::Running => {
                    // Cadence by sleeping the nominal period; no catch-up if
                    // a tick overruns.
                    thread::sleep(period);

                    let drained = drain_inputs(&mut controller, &channels, &gains);
                    if drained.got_reset {
                        controller.reset();
                        stats_clone.resets.fetch_add(1, Ordering::Relaxed);
                        stats_clone.set_state(LoopState::WaitingForMeasurement);
                        info!("reset received, waiting for position measurements");
                        events.record("reset, waiting for position measurements");
                        continue;
                    }

                    let now = Instant::now();
                    let dt = now.duration_since(t_old);
                    t_old = now;

                    let dt_s = dt.as_secs_f64();
                    let within = (dt_s - nominal).abs() <= JITTER_TOLERANCE * nominal;
                    if !within {
                        stats_clone.jitter_violations.fetch_add(1, Ordering::Relaxed);
                        warn!(dt_ms = dt_s * 1e3, nominal_ms = nominal * 1e3, "tick jitter");
                        events.record(format!(
                            "jitter: dt {:.3} ms vs nominal {:.3} ms",
                            dt_s * 1e3,
                            nominal * 1e3
                        ));
                    }
                    metrics.record_tick(dt, within);

                    let compute_start = Instant::now();
                    let output = controller.tick(dt_s);
                    metrics.record_compute(compute_start.elapsed());
                    stats_clone.ticks.fetch_add(1, Ordering::Relaxed);

                    // Never block the loop on a slow consumer; a stale
                    // command is worthless, so a full channel drops it.
                    match channels.output_tx.try_send(output) {
                        Ok(()) => {}
                        Err(TrySendError::Full(_)) => {
                            debug!("output channel full, dropping tick output");
                        }
                        Err(TrySendError::Disconnected(_)) => {
                            debug!("output channel closed, stopping loop");
                            break;
                        }
                    }
                }
                _ => {
                    thread::sleep(WAIT_POLL);

                    let drained = drain_inputs(&mut controller, &channels, &gains);
                    if drained.got_reset {
                        // Already waiting; just make sure the history is
                        // clean.
                        controller.reset();
                    }
                    if drained.got_position {
                        t_old = Instant::now();
                        stats_clone.set_state(LoopState::Running);
                        info!("first position measurement received, control running");
                        events.record("first position measurement, running");
                    }
                }
            }
        }
    });

    (handle, stats)
}
