//! Behavioral tests for the single-axis PID unit.

use uav_position_control::Pid;

#[test]
fn output_always_within_limits() {
    let cases = [
        (1.0, 0.0, 0.0, -10.0, 10.0),
        (5.0, 2.0, 0.5, -1.0, 1.0),
        (0.0, 100.0, 0.0, -0.5, 0.5),
        (2.0, 0.1, 10.0, -20.0, 20.0),
    ];
    let inputs = [
        (5.0, 2.0),
        (1000.0, -1000.0),
        (-1e6, 1e6),
        (0.0, 0.0),
        (1e-9, -1e-9),
        (42.0, 41.5),
    ];

    for (kp, ki, kd, low, high) in cases {
        let mut pid = Pid::new(kp, ki, kd, low, high);
        for (reference, measurement) in inputs {
            let out = pid.compute(reference, measurement, 0.01);
            assert!(
                (low..=high).contains(&out),
                "output {out} escaped [{low}, {high}] for gains ({kp}, {ki}, {kd})"
            );
        }
    }
}

#[test]
fn worked_example() {
    let mut pid = Pid::new(1.0, 0.0, 0.0, -10.0, 10.0);
    let out = pid.compute(5.0, 2.0, 0.01);
    assert!((out - 3.0).abs() < 1e-12);
}

#[test]
fn reset_matches_fresh_unit() {
    let mut used = Pid::new(2.0, 0.5, 0.1, -10.0, 10.0);
    for i in 0..20 {
        used.compute(5.0, f64::from(i) * 0.1, 0.01);
    }
    used.reset();

    let mut fresh = Pid::new(2.0, 0.5, 0.1, -10.0, 10.0);

    let a = used.compute(3.0, 1.0, 0.01);
    let b = fresh.compute(3.0, 1.0, 0.01);
    assert_eq!(a, b, "after reset the first compute must match a fresh unit");
    assert_eq!(used.report(), fresh.report());
}

#[test]
fn integral_contribution_is_clamped() {
    let mut pid = Pid::new(0.0, 100.0, 0.0, -2.0, 2.0);
    for _ in 0..1000 {
        pid.compute(10.0, 0.0, 0.1);
    }
    let report = pid.report();
    assert!((report.integral - 2.0).abs() < 1e-12, "accumulator must saturate at the limit");
    assert!(report.total <= 2.0);

    // Error sign flips; the accumulator unwinds from the clamp, not from an
    // unbounded sum.
    let out = pid.compute(-10.0, 0.0, 0.1);
    assert!(out < 2.0);
}

#[test]
fn limit_change_is_not_retroactive() {
    let mut pid = Pid::new(0.0, 1.0, 0.0, -10.0, 10.0);
    for _ in 0..20 {
        pid.compute(1.0, 0.0, 1.0);
    }
    assert!((pid.report().integral - 10.0).abs() < 1e-12);

    pid.set_lim_high(5.0);
    // Stale accumulator survives until the next compute.
    assert!((pid.report().integral - 10.0).abs() < 1e-12);

    pid.compute(0.0, 0.0, 1.0);
    assert!((pid.report().integral - 5.0).abs() < 1e-12);
}

#[test]
fn gain_accessors_round_trip() {
    let mut pid = Pid::new(1.0, 2.0, 3.0, -4.0, 5.0);
    assert_eq!((pid.kp(), pid.ki(), pid.kd()), (1.0, 2.0, 3.0));
    assert_eq!((pid.lim_low(), pid.lim_high()), (-4.0, 5.0));

    pid.set_kp(10.0);
    pid.set_ki(20.0);
    pid.set_kd(30.0);
    pid.set_lim_low(-40.0);
    pid.set_lim_high(50.0);
    assert_eq!((pid.kp(), pid.ki(), pid.kd()), (10.0, 20.0, 30.0));
    assert_eq!((pid.lim_low(), pid.lim_high()), (-40.0, 50.0));
}

#[test]
fn zero_dt_never_divides() {
    let mut pid = Pid::new(1.0, 1.0, 1.0, -10.0, 10.0);
    let out = pid.compute(5.0, 0.0, 0.0);
    assert!(out.is_finite());
    assert_eq!(out, 0.0, "fresh unit holds its zero output on dt = 0");

    let held = pid.compute(5.0, 0.0, 0.01);
    assert_eq!(pid.compute(-100.0, 100.0, 0.0), held);
}
