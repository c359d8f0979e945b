extern crate moonshot;
extern crate pretty_env_logger as pel;

use approx::{assert_abs_diff_eq, assert_relative_eq};
use moonshot::dynamics::{Osculating, TwoBody};
use moonshot::linalg::DVector;
use moonshot::propagators::*;
use moonshot::time::Unit;
use rstest::*;

fn growth(_t: f64, y: &DVector<f64>) -> DVector<f64> {
    y.clone()
}

fn ramp(t: f64, _y: &DVector<f64>) -> DVector<f64> {
    DVector::from_element(1, t)
}

#[fixture]
fn y0() -> DVector<f64> {
    DVector::from_element(1, 1.0)
}

#[rstest]
fn exponential_growth(y0: DVector<f64>) {
    let _ = pel::try_init();
    let e = 1.0_f64.exp();

    let rk4 = Propagator::rk4(0.1);
    let sol = rk4.solve(&growth, 0.0, &y0, 0.1, 10, None).unwrap();
    assert_eq!(sol.len(), 11);
    let (t, y) = last_state(&sol).unwrap();
    assert_abs_diff_eq!(*t, 1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(y[0], e, epsilon = 1e-3);

    let euler = Propagator::euler(0.1);
    let sol = euler.solve(&growth, 0.0, &y0, 0.1, 10, None).unwrap();
    let (_, y) = last_state(&sol).unwrap();
    // (1.1)^10 = 2.5937...
    assert_abs_diff_eq!(y[0], 1.1_f64.powi(10), epsilon = 1e-12);
    assert!((y[0] - e).abs() >= 1e-2);
}

#[rstest]
#[case(IntegratorKind::Euler)]
#[case(IntegratorKind::Rk4)]
#[case(IntegratorKind::Rkf45)]
fn bit_identical_runs(#[case] kind: IntegratorKind, y0: DVector<f64>) {
    let prop = Propagator::from_kind(kind, PropOpts::with_fixed_step_s(0.05));
    let first = prop.solve(&growth, 0.0, &y0, 0.05, 40, None).unwrap();
    let second = prop.solve(&growth, 0.0, &y0, 0.05, 40, None).unwrap();
    assert_eq!(first, second);
}

#[rstest]
#[case(0.1)]
#[case(1.0)]
#[case(10.0)]
fn rkf45_integrates_ramp(#[case] h: f64) {
    let prop = Propagator::default_rkf45();
    let zero = DVector::from_element(1, 0.0);
    let next = prop.solve_step(&ramp, 0.0, &zero, h).unwrap();
    assert_abs_diff_eq!(next[0], h * h / 2.0, epsilon = 1e-6);

    // Same through the adaptive solver: the error estimate of a polynomial this simple is null
    let sol = prop.solve(&ramp, 0.0, &zero, h, 1, None).unwrap();
    let (t, y) = last_state(&sol).unwrap();
    assert_abs_diff_eq!(*t, h, epsilon = 1e-15);
    assert_abs_diff_eq!(y[0], h * h / 2.0, epsilon = 1e-6);
}

#[rstest]
fn adaptive_step_grows_and_meets_tolerance(y0: DVector<f64>) {
    let opts = PropOpts::with_adaptive_step_s(1e-6, 0.5, 1e-10, RmsError);
    let prop = Propagator::rkf45(opts);
    let dynamics = growth;
    let mut instance = prop.with(&dynamics, 0.0, y0);
    instance.set_step(1e-3, false);
    let y = instance.for_duration(2.0 * Unit::Second).unwrap();
    assert_abs_diff_eq!(instance.t, 2.0, epsilon = 1e-12);
    assert_relative_eq!(y[0], 2.0_f64.exp(), max_relative = 1e-8);
    let details = instance.latest_details();
    assert!(details.error <= 1e-10);
    // The step grew far beyond the initial guess, without exceeding the maximum
    assert!(instance.step_size() > 1e-3);
    assert!(instance.step_size() <= 0.5);
}

#[rstest]
#[case(0.0086)]
#[case(0.02)]
#[case(0.05)]
fn final_step_meets_tolerance(#[case] h0: f64, y0: DVector<f64>) {
    let tol = 1e-10;
    let prop = Propagator::rkf45(PropOpts::with_adaptive_step_s(1e-8, 1.0, tol, RmsError));
    let dynamics = growth;
    let mut instance = prop.with(&dynamics, 0.0, y0);
    instance.set_step(h0, false);
    instance.single_step().unwrap();
    // The proposed step may be several times the accepted one and was never checked
    let proposed = instance.step_size();
    let start = instance.t;
    let duration = 0.99 * proposed * Unit::Second;
    let y = instance.for_duration(duration).unwrap();

    assert!(instance.latest_details().error <= tol);
    assert_abs_diff_eq!(instance.t, start + duration.to_seconds(), epsilon = 1e-12);
    assert_relative_eq!(y[0], instance.t.exp(), max_relative = 1e-8);
}

#[rstest]
fn non_convergence_is_an_error(y0: DVector<f64>) {
    let opts = PropOpts::builder()
        .init_step(1.0 * Unit::Second)
        .min_step(0.5 * Unit::Second)
        .max_step(1.0 * Unit::Second)
        .tolerance(1e-14)
        .attempts(3)
        .error_ctrl(RmsError)
        .build();
    let prop = Propagator::rkf45(opts);
    let dynamics = growth;
    let mut instance = prop.with(&dynamics, 0.0, y0.clone());
    let err = instance.single_step().unwrap_err();
    assert!(matches!(err, PropagationError::NonConvergence { .. }));
    // Nothing was committed
    assert_eq!(instance.t, 0.0);
    assert_eq!(instance.state, y0);

    let err = prop.solve(&growth, 0.0, &y0, 1.0, 5, None).unwrap_err();
    assert!(matches!(err, PropagationError::NonConvergence { .. }));
}

#[rstest]
fn circular_orbit_closes() {
    let _ = pel::try_init();
    let gm = 398_600.441_5;
    let radius: f64 = 7_000.0;
    let speed = (gm / radius).sqrt();
    let period = 2.0 * std::f64::consts::PI * (radius.powi(3) / gm).sqrt();
    let y0 = DVector::from_vec(vec![radius, 0.0, 0.0, 0.0, speed, 0.0]);

    let prop = Propagator::rkf45(PropOpts::with_adaptive_step_s(0.1, 120.0, 1e-9, RmsError));
    let dynamics = TwoBody::new(gm);
    let mut instance = prop.with(&dynamics, 0.0, y0.clone());
    let mut steps = 0;
    let y = instance
        .for_duration_with_callback(period * Unit::Second, |_, _| steps += 1)
        .unwrap();
    assert!(steps > 10);
    assert_abs_diff_eq!(instance.t, period, epsilon = 1e-6);
    assert_abs_diff_eq!((&y - &y0).rows(0, 3).norm(), 0.0, epsilon = 1e-3);

    let start = Osculating::new(
        gm,
        &y0.fixed_rows::<3>(0).into_owned(),
        &y0.fixed_rows::<3>(3).into_owned(),
    );
    let end = Osculating::new(
        gm,
        &y.fixed_rows::<3>(0).into_owned(),
        &y.fixed_rows::<3>(3).into_owned(),
    );
    assert_relative_eq!(start.sma_km, end.sma_km, max_relative = 1e-8);
}

#[test]
fn invalid_steps() {
    let prop = Propagator::rk4(1.0);
    let y0 = DVector::from_element(1, 1.0);
    for step in [0.0, -1.0, f64::NAN] {
        assert!(matches!(
            prop.solve(&growth, 0.0, &y0, step, 3, None),
            Err(PropagationError::InvalidStep { .. })
        ));
        assert!(prop.solve_step(&growth, 0.0, &y0, step).is_err());
    }
    assert_eq!(last_state(&[]), Err(PropagationError::EmptySolution));
}
