extern crate moonshot;
extern crate pretty_env_logger as pel;

use approx::{assert_abs_diff_eq, assert_relative_eq};
use moonshot::cosmic::planets::{earth_moon, solar_system, EARTH, MOON, SUN};
use moonshot::cosmic::{position_of, Body, BodySet, GRAVITATIONAL_CONSTANT};
use moonshot::dynamics::{Dynamics, NBodyDynamics, PhysicsConfig};
use moonshot::linalg::Vector3;
use moonshot::propagators::{PropOpts, Propagator, RmsError};
use moonshot::time::Unit;
use rstest::*;

const MASS_KG: f64 = 1e22;

fn pair(distance_km: f64) -> BodySet {
    BodySet::new(vec![
        Body::new("A", MASS_KG, 1.0, Vector3::zeros(), Vector3::zeros()),
        Body::new(
            "B",
            MASS_KG,
            1.0,
            Vector3::new(distance_km, 0.0, 0.0),
            Vector3::zeros(),
        ),
    ])
    .unwrap()
}

#[rstest]
fn softened_pair_acceleration(
    #[values(1.0, 150.0, 42_000.0, 1e7)] distance_km: f64,
    #[values(0.0, 1.0, 500.0)] softening_km: f64,
) {
    let set = pair(distance_km);
    let physics = PhysicsConfig {
        softening_km,
        ..Default::default()
    };
    let dynamics = NBodyDynamics::new(&set, &physics).unwrap();
    let d_x = dynamics.eom(0.0, &set.to_state_vector()).unwrap();

    let gm = GRAVITATIONAL_CONSTANT * MASS_KG;
    let expected = gm * distance_km / (distance_km.powi(2) + softening_km.powi(2)).powf(1.5);
    let accel_a = d_x.fixed_rows::<3>(3).into_owned();
    let accel_b = d_x.fixed_rows::<3>(9).into_owned();
    assert_relative_eq!(accel_a.norm(), expected, max_relative = 1e-12);
    assert_relative_eq!(accel_b.norm(), expected, max_relative = 1e-12);
    // Mutual attraction
    assert!(accel_a.x > 0.0 && accel_b.x < 0.0);
    assert_abs_diff_eq!((accel_a + accel_b).norm(), 0.0, epsilon = 1e-12 * expected);

    if softening_km == 0.0 {
        assert_relative_eq!(accel_a.norm(), gm / distance_km.powi(2), max_relative = 1e-12);
    }
}

#[rstest]
fn coincident_bodies_stay_finite() {
    let set = pair(0.0);
    let dynamics = NBodyDynamics::new(&set, &PhysicsConfig::default()).unwrap();
    let d_x = dynamics.eom(0.0, &set.to_state_vector()).unwrap();
    assert!(d_x.iter().all(|v| v.is_finite()));
}

#[rstest]
fn earth_moon_energy_is_conserved() {
    let _ = pel::try_init();
    let set = earth_moon(GRAVITATIONAL_CONSTANT).unwrap();
    let dynamics = NBodyDynamics::new(&set, &PhysicsConfig::default()).unwrap();
    let y0 = set.to_state_vector();
    let e0 = dynamics.energy(&y0).unwrap();

    let prop = Propagator::rkf45(PropOpts::with_adaptive_step_s(1.0, 3600.0, 1e-6, RmsError));
    let mut instance = prop.with(&dynamics, 0.0, y0);
    let y = instance.for_duration(2 * Unit::Day).unwrap();
    assert_abs_diff_eq!(instance.t, 172_800.0, epsilon = 1e-9);
    assert_relative_eq!(dynamics.energy(&y).unwrap(), e0, max_relative = 1e-8);

    // The Moon remains at the same distance on its circular orbit
    let separation = (position_of(&y, 1) - position_of(&y, 0)).norm();
    assert_relative_eq!(separation, 384_400.0, max_relative = 1e-4);
}

#[rstest]
fn pinned_sun_stays_put() {
    let mut set = solar_system(GRAVITATIONAL_CONSTANT).unwrap();
    let physics = PhysicsConfig {
        pinned_body: Some(SUN.to_string()),
        ..Default::default()
    };
    let dynamics = NBodyDynamics::new(&set, &physics).unwrap();
    let prop = Propagator::rk4(600.0);
    let y = prop
        .with(&dynamics, 0.0, set.to_state_vector())
        .for_duration(1 * Unit::Day)
        .unwrap();
    assert_eq!(position_of(&y, 0), Vector3::zeros());

    set.set_state_vector(&y).unwrap();
    dynamics.update_accelerations(&mut set).unwrap();
    assert_eq!(set.get(SUN).unwrap().acceleration_km_s2, Vector3::zeros());
    // The Earth is mostly pulled by the Sun
    let earth = set.get(EARTH).unwrap();
    assert!(earth.acceleration_km_s2.dot(&earth.position_km) < 0.0);
    assert!(set.distance_between(EARTH, MOON).unwrap() > 3e5);
}
