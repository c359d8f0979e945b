extern crate moonshot;
extern crate pretty_env_logger as pel;

use super::{cislunar, quick_config};
use moonshot::cosmic::SystemError;
use moonshot::linalg::Vector3;
use moonshot::md::opti::{GaConfig, GeneticSearch, SearchError};
use moonshot::md::{EvaluationError, EvaluatorConfig, LaunchGene, TrajectoryEvaluator};
use moonshot::propagators::IntegratorKind;
use moonshot::time::Unit;
use rstest::*;

#[fixture]
fn evaluator() -> TrajectoryEvaluator {
    TrajectoryEvaluator::new(cislunar(), quick_config()).unwrap()
}

fn small_run(seed: u64) -> GaConfig {
    GaConfig {
        population_size: 8,
        generations: 3,
        elite_count: 2,
        tournament_size: 3,
        mutation_rate: 0.3,
        seed,
        ..Default::default()
    }
}

#[rstest]
fn same_seed_same_solution(evaluator: TrajectoryEvaluator) {
    let _ = pel::try_init();
    let search = GeneticSearch::new(&evaluator, small_run(2024)).unwrap();
    let first = search.run().unwrap();
    let second = search.run().unwrap();
    assert_eq!(first, second);
    assert_eq!(first.generations, 3);
    assert_eq!(first.history.len(), 3);
    assert!(!first.reached_threshold);

    // Elites survive unchanged, so the best fitness never decreases
    assert!(first.history.windows(2).all(|w| w[1] >= w[0]));
    assert_eq!(first.best.fitness(), *first.history.last().unwrap());

    let best = first.best.gene;
    assert!((best.offset_km.norm() - search.radius_km()).abs() < 1e-6);
    assert!(best.velocity_km_s.norm() <= search.config().max_delta_v_km_s + 1e-12);

    // Independent searches with their own seed
    let other = GeneticSearch::new(&evaluator, small_run(7)).unwrap().run().unwrap();
    let again = GeneticSearch::new(&evaluator, small_run(7)).unwrap().run().unwrap();
    assert_eq!(other, again);
}

#[rstest]
fn threshold_stops_early(evaluator: TrajectoryEvaluator) {
    let config = GaConfig {
        fitness_threshold: Some(0.0),
        ..small_run(1)
    };
    let solution = GeneticSearch::new(&evaluator, config).unwrap().run().unwrap();
    assert!(solution.reached_threshold);
    assert_eq!(solution.generations, 1);
    assert_eq!(solution.history.len(), 1);
}

#[test]
fn numerical_failures_score_zero() {
    let _ = pel::try_init();
    // A single attempt at the minimum step with an unreachable tolerance: every step fails
    let config = EvaluatorConfig::builder()
        .duration(1 * Unit::Hour)
        .step(60.0 * Unit::Second)
        .min_step(60.0 * Unit::Second)
        .max_step(60.0 * Unit::Second)
        .integrator(IntegratorKind::Rkf45)
        .tolerance(1e-300)
        .attempts(1)
        .build();
    let evaluator = TrajectoryEvaluator::new(cislunar(), config).unwrap();
    let solution = GeneticSearch::new(&evaluator, small_run(4))
        .unwrap()
        .run()
        .unwrap();
    assert_eq!(solution.generations, 3);
    assert_eq!(solution.best.evaluation, None);
    assert_eq!(solution.best.fitness(), 0.0);
    assert!(solution.history.iter().all(|&best| best == 0.0));
}

#[test]
fn structural_failures_abort() {
    // The table accepts the evaluator, but no probe of null mass can join it
    let config = EvaluatorConfig::builder()
        .probe_mass_kg(0.0)
        .duration(1 * Unit::Hour)
        .integrator(IntegratorKind::Rk4)
        .build();
    let evaluator = TrajectoryEvaluator::new(cislunar(), config).unwrap();
    let search = GeneticSearch::new(&evaluator, small_run(4)).unwrap();
    let gene = LaunchGene::new(search.launch_point_km(), Vector3::new(0.0, 11.0, 0.0));
    assert!(matches!(
        search.evaluate_genes(vec![gene]),
        Err(SearchError::Evaluation {
            source: EvaluationError::System {
                source: SystemError::InvalidMass { .. }
            }
        })
    ));
    assert!(matches!(
        search.run(),
        Err(SearchError::Evaluation { .. })
    ));
}
