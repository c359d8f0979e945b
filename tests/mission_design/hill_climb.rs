extern crate moonshot;
extern crate pretty_env_logger as pel;

use super::{cislunar, quick_config};
use moonshot::cosmic::{Propulsion, Spacecraft};
use moonshot::linalg::Vector3;
use moonshot::md::opti::{
    climb, ClimbConfig, CostFunction, InsertionGoal, ModeledInsertionCost,
    SimulatedInsertionCost,
};
use moonshot::md::{BurnSchedule, TrajectoryEvaluator};
use moonshot::time::Unit;
use rstest::*;

const MOON_GM: f64 = 4_902.800_066;

#[fixture]
fn propulsion() -> Propulsion {
    Propulsion {
        max_thrust_n: 400.0,
        isp_s: 320.0,
        dry_mass_kg: 800.0,
        fuel_mass_kg: 200.0,
    }
}

fn assert_monotonic(history: &[f64]) {
    assert!(history.windows(2).all(|w| w[1] <= w[0]));
}

/// Every burn of the schedule reports its fuel, within what the engine carries
fn assert_fuel_accounted(schedule: &BurnSchedule, propulsion: &Propulsion) {
    for slot in schedule.slots() {
        if slot.delta_v_m_s.norm() > 0.0 {
            assert!(slot.fuel_kg > 0.0);
        } else {
            assert_eq!(slot.fuel_kg, 0.0);
        }
    }
    assert!(schedule.total_fuel_kg() <= propulsion.fuel_mass_kg);
    let mut replay = schedule.clone();
    let total = replay.update_fuel(propulsion).unwrap();
    assert!((total - schedule.total_fuel_kg()).abs() <= 1e-9 * total.max(1.0));
}

#[rstest]
fn modeled_insertion_improves(propulsion: Propulsion) {
    let _ = pel::try_init();
    // Fast flyby at 5000 km from the Moon, should end on a 3000 km orbit
    let goal = InsertionGoal {
        target_radius_km: 3_000.0,
        penalty: 3.0,
    };
    let cost = ModeledInsertionCost::new(
        MOON_GM,
        Vector3::new(5_000.0, 0.0, 0.0),
        Vector3::new(0.0, 1.6, 0.0),
        propulsion,
        goal,
        30.0,
    );
    let initial = BurnSchedule::for_propulsion(4, 300.0 * Unit::Second, &propulsion).unwrap();
    let initial_cost = cost.cost(&initial).unwrap();

    let config = ClimbConfig {
        iterations: 150,
        restart_every: 50,
        perturbation_m_s: 20.0,
        seed: 5,
    };
    let solution = climb(&cost, initial, &config).unwrap();
    assert_eq!(solution.history.len(), 150);
    assert_monotonic(&solution.history);
    assert!(solution.cost < initial_cost);
    assert!(solution.schedule.total_delta_v_m_s() > 0.0);
    assert_eq!(solution.restarts, 3);
    for slot in solution.schedule.slots() {
        assert!(slot.delta_v_m_s.norm() <= solution.schedule.max_delta_v_per_slot_m_s() + 1e-9);
    }
    assert_fuel_accounted(&solution.schedule, &propulsion);

    // Same seed, same solution
    let again = climb(
        &cost,
        BurnSchedule::for_propulsion(4, 300.0 * Unit::Second, &propulsion).unwrap(),
        &config,
    )
    .unwrap();
    assert_eq!(again, solution);
}

#[rstest]
fn simulated_insertion_is_monotonic(propulsion: Propulsion) {
    let evaluator = TrajectoryEvaluator::new(cislunar(), quick_config()).unwrap();
    let moon = evaluator.target();
    let orbiter = Spacecraft::new(
        "Orbiter",
        moon.position_km + Vector3::new(0.0, 5_000.0, 0.0),
        moon.velocity_km_s + Vector3::new(1.5, 0.0, 0.0),
        propulsion,
    );
    let goal = InsertionGoal {
        target_radius_km: 4_000.0,
        penalty: 0.5,
    };
    let cost = SimulatedInsertionCost::new(&evaluator, orbiter, goal);
    let initial = BurnSchedule::for_propulsion(3, 600.0 * Unit::Second, &propulsion).unwrap();
    let initial_cost = cost.cost(&initial).unwrap();

    let config = ClimbConfig {
        iterations: 40,
        restart_every: 0,
        perturbation_m_s: 25.0,
        seed: 9,
    };
    let solution = climb(&cost, initial, &config).unwrap();
    assert_monotonic(&solution.history);
    assert!(solution.cost <= initial_cost);
    assert_eq!(solution.restarts, 0);
    assert_fuel_accounted(&solution.schedule, &propulsion);
}
