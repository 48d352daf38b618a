use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing_subscriber::EnvFilter;

use uav_position_control::{
    load_config, spawn_control_loop, ControlChannels, EventLog, GainStore, LoopMetrics, Vec3,
};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config/position_control.toml".to_string());
    let cfg = load_config(&path).with_context(|| format!("loading {path}"))?;

    println!("===========================================");
    println!("UAV position control loop ({} Hz)", cfg.rate);
    println!("===========================================\n");

    let channels = ControlChannels::new(256);
    let gains = GainStore::new();
    let events = EventLog::new(1000);
    let metrics = LoopMetrics::new();

    let (handle, stats) = spawn_control_loop(
        cfg.clone(),
        channels.clone(),
        gains.clone(),
        events.clone(),
        metrics.clone(),
    );

    // Synthetic measurement feeder standing in for the state estimator:
    // noisy samples around a fixed hover pose.
    let feeder_channels = channels.clone();
    let feeder_stats = stats.clone();
    let sample_period = cfg.period();
    let feeder = thread::spawn(move || {
        let mut rng = StdRng::seed_from_u64(42);
        while !feeder_stats.shutdown.load(Ordering::Relaxed) {
            let noise = |rng: &mut StdRng| rng.gen_range(-0.02..0.02);
            let pos = Vec3::new(noise(&mut rng), noise(&mut rng), 1.0 + noise(&mut rng));
            let vel = Vec3::new(noise(&mut rng), noise(&mut rng), noise(&mut rng));
            if feeder_channels.position_tx.send(pos).is_err() {
                break;
            }
            if feeder_channels.velocity_tx.send(vel).is_err() {
                break;
            }
            thread::sleep(sample_period);
        }
    });

    // Command a climb to two meters.
    channels.position_ref_tx.send(Vec3::new(0.0, 0.0, 2.0))?;

    let mut outputs = 0u64;
    let mut last = None;
    let deadline = std::time::Instant::now() + Duration::from_secs(3);
    while std::time::Instant::now() < deadline {
        if let Ok(out) = channels.output_rx.recv_timeout(Duration::from_millis(200)) {
            outputs += 1;
            last = Some(out);
        }
    }

    stats.shutdown.store(true, Ordering::Relaxed);
    let _ = handle.join();
    let _ = feeder.join();

    println!("\n===========================================");
    println!("RESULTS");
    println!("===========================================");
    println!("Ticks: {}", stats.ticks.load(Ordering::Relaxed));
    println!("Outputs received: {outputs}");
    if let Some(out) = last {
        println!(
            "Last command: roll {:.4} rad, pitch {:.4} rad, motor speed {:.2} rad/s",
            out.attitude.roll, out.attitude.pitch, out.motor_speed
        );
        let vz = out.reports[5];
        println!(
            "pid_vz: ref {:.3}, meas {:.3}, P {:.3}, I {:.3}, D {:.3}, total {:.3}",
            vz.reference, vz.measurement, vz.proportional, vz.integral, vz.derivative, vz.total
        );
    }

    let report = metrics.report();
    println!("\n=== Timing ===");
    println!("dt P50: {:?}, P99: {:?}", report.dt_p50, report.dt_p99);
    println!("compute P50: {:?}, P99: {:?}", report.compute_p50, report.compute_p99);
    println!(
        "jitter violations: {} of {} ticks",
        report.jitter_violations, report.ticks
    );

    Ok(())
}
