extern crate moonshot;
extern crate pretty_env_logger as pel;

use super::{cislunar, quick_config};
use approx::assert_relative_eq;
use moonshot::cosmic::planets::{solar_system, EARTH};
use moonshot::cosmic::{Propulsion, Spacecraft, GRAVITATIONAL_CONSTANT};
use moonshot::linalg::Vector3;
use moonshot::md::{
    fitness_score, BurnSchedule, EvaluationError, EvaluatorConfig, LaunchGene, TrajectoryEvaluator,
};
use moonshot::time::Unit;
use std::sync::Arc;

fn launch_towards_moon(evaluator: &TrajectoryEvaluator, speed_km_s: f64) -> LaunchGene {
    let to_moon = (evaluator.target().position_km - evaluator.source().position_km).normalize();
    LaunchGene::new(to_moon * evaluator.source().radius_km, to_moon * speed_km_s)
}

#[test]
fn evaluation_is_pure() {
    let _ = pel::try_init();
    let evaluator = TrajectoryEvaluator::new(cislunar(), quick_config()).unwrap();
    let gene = launch_towards_moon(&evaluator, 10.9);

    let first = evaluator.evaluate(&gene).unwrap();
    let second = evaluator.evaluate(&gene).unwrap();
    assert_eq!(first, second);
    assert_eq!(evaluator.evaluate_slice(gene.to_vector().as_slice()).unwrap(), first);

    // 1440 steps of one minute
    assert_eq!(first.steps, 1440);
    let initial = evaluator.source().distance_to(evaluator.target()) - evaluator.source().radius_km;
    assert!(first.min_distance_km < initial);
    assert!(first.time_of_closest_approach_s > 0.0);
    assert_relative_eq!(first.fitness, fitness_score(first.min_distance_km));

    // The shared table is untouched
    assert_eq!(evaluator.table().len(), 2);
}

#[test]
fn faster_launch_gets_closer() {
    let evaluator = TrajectoryEvaluator::new(cislunar(), quick_config()).unwrap();
    // Low circular orbit: the probe never leaves the vicinity of the Earth
    let mut low_orbit = launch_towards_moon(&evaluator, 0.0);
    low_orbit.velocity_km_s = Vector3::new(0.0, 7.9, 0.0);
    let parked = evaluator.evaluate(&low_orbit).unwrap();
    let fast = evaluator.evaluate(&launch_towards_moon(&evaluator, 10.9)).unwrap();
    assert!(fast.fitness > parked.fitness);
    assert!(parked.min_distance_km > 3.7e5);
}

#[test]
fn wrong_gene_dimension() {
    let evaluator = TrajectoryEvaluator::new(cislunar(), quick_config()).unwrap();
    assert_eq!(
        evaluator.evaluate_slice(&[1.0; 5]),
        Err(EvaluationError::GeneDimension {
            expected: 6,
            got: 5
        })
    );
}

#[test]
fn full_solar_system() {
    let table = Arc::new(solar_system(GRAVITATIONAL_CONSTANT).unwrap());
    let config = EvaluatorConfig::builder()
        .duration(6 * Unit::Hour)
        .step(60.0 * Unit::Second)
        .integrator(moonshot::propagators::IntegratorKind::Rk4)
        .build();
    let evaluator = TrajectoryEvaluator::new(table, config).unwrap();
    assert_eq!(evaluator.source().name, EARTH);
    let eval = evaluator
        .evaluate(&launch_towards_moon(&evaluator, 10.9))
        .unwrap();
    assert_eq!(eval.steps, 360);
    assert!(eval.min_distance_km.is_finite());
}

fn propulsion() -> Propulsion {
    Propulsion {
        max_thrust_n: 500.0,
        isp_s: 320.0,
        dry_mass_kg: 800.0,
        fuel_mass_kg: 200.0,
    }
}

/// A spacecraft on a circular orbit 3000 km from the center of the Moon
fn lunar_orbiter(evaluator: &TrajectoryEvaluator) -> Spacecraft {
    let moon = evaluator.target();
    let speed = (evaluator.target_gm() / 3000.0).sqrt();
    Spacecraft::new(
        "Orbiter",
        moon.position_km + Vector3::new(0.0, 0.0, 3000.0),
        moon.velocity_km_s + Vector3::new(speed, 0.0, 0.0),
        propulsion(),
    )
}

#[test]
fn schedule_simulation() {
    let evaluator = TrajectoryEvaluator::new(cislunar(), quick_config()).unwrap();
    let orbiter = lunar_orbiter(&evaluator);

    let coast = BurnSchedule::for_propulsion(3, 600.0 * Unit::Second, &orbiter.propulsion).unwrap();
    let outcome = evaluator.simulate_schedule(&orbiter, &coast).unwrap();
    assert_eq!(outcome.elapsed_s, 1800.0);
    assert_eq!(outcome.total_fuel_kg(), 0.0);
    // Still orbiting the Moon
    assert!(outcome.osculating(evaluator.target_gm()).is_bound());
    assert_relative_eq!(outcome.relative_position_km.norm(), 3000.0, max_relative = 1e-2);

    let mut burns = coast.clone();
    burns
        .set_delta_v_at(0, Vector3::new(0.0, 50.0, 0.0))
        .unwrap();
    burns
        .set_delta_v_at(2, Vector3::new(-20.0, 0.0, 0.0))
        .unwrap();
    let outcome = evaluator.simulate_schedule(&orbiter, &burns).unwrap();
    assert_eq!(outcome.fuel_used_kg.len(), 3);
    assert!(outcome.fuel_used_kg[0] > 0.0);
    assert_eq!(outcome.fuel_used_kg[1], 0.0);
    assert_relative_eq!(
        outcome.spacecraft.propulsion.fuel_mass_kg,
        200.0 - outcome.total_fuel_kg(),
        max_relative = 1e-12
    );
    // Fuel accounting of the schedule matches the simulation
    for (slot, used) in burns.slots().iter().zip(&outcome.fuel_used_kg) {
        assert_relative_eq!(slot.fuel_kg, *used, max_relative = 1e-12);
    }
    let mut accounted = burns.clone();
    assert_relative_eq!(
        accounted.update_fuel(&orbiter.propulsion).unwrap(),
        outcome.total_fuel_kg(),
        max_relative = 1e-12
    );

    // A schedule sized for another engine may ask for more fuel than on board: setup error
    let mut starved = orbiter.clone();
    starved.propulsion.fuel_mass_kg = 1.0;
    let err = evaluator.simulate_schedule(&starved, &burns).unwrap_err();
    assert!(matches!(err, EvaluationError::Propulsion { .. }));
    assert!(!err.is_recoverable());
}
