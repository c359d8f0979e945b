extern crate moonshot;

use moonshot::linalg::DVector;
use moonshot::propagators::*;

fn growth(_t: f64, y: &DVector<f64>) -> DVector<f64> {
    y.clone()
}

#[test]
fn stop_at_start() {
    let y0 = DVector::from_element(1, 1.0);
    let always = |_t: f64, _y: &DVector<f64>| true;
    for prop in [Propagator::euler(0.1), Propagator::rk4(0.1), Propagator::default_rkf45()] {
        let sol = prop.solve(&growth, 0.0, &y0, 0.1, 10, Some(&always)).unwrap();
        assert_eq!(sol.len(), 1);
        assert_eq!(sol[0], (0.0, y0.clone()));
    }
}

#[test]
fn stop_on_threshold() {
    let y0 = DVector::from_element(1, 1.0);
    let above_two = |_t: f64, y: &DVector<f64>| y[0] > 2.0;
    let prop = Propagator::rk4(0.1);
    let sol = prop.solve(&growth, 0.0, &y0, 0.1, 100, Some(&above_two)).unwrap();
    // e^0.7 = 2.01 is the first state above two
    assert_eq!(sol.len(), 8);
    let (t, y) = last_state(&sol).unwrap();
    assert!((t - 0.7).abs() < 1e-12);
    assert!(y[0] > 2.0);
    assert!(sol[..sol.len() - 1].iter().all(|(_, y)| y[0] <= 2.0));

    // Never triggered: full length
    let never = |_t: f64, _y: &DVector<f64>| false;
    let sol = prop.solve(&growth, 0.0, &y0, 0.1, 20, Some(&never)).unwrap();
    assert_eq!(sol.len(), 21);
}
