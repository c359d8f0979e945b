/*
    Moonshot, N-body trajectory search for lunar orbit insertion
    Copyright (C) 2023 Christopher Rabotin <christopher.rabotin@gmail.com>

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Affero General Public License for more details.

    You should have received a copy of the GNU Affero General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

use super::{
    BurnSchedule, DegenerateGeometrySnafu, DynamicsSnafu, EvaluationError, GeneDimensionSnafu,
    PropagationSnafu, PropulsionSnafu, SystemSnafu,
};
use crate::cosmic::planets::{EARTH, MOON};
use crate::cosmic::{position_of, velocity_of, Body, BodySet, Spacecraft, SystemError, STATE_PER_BODY};
use crate::dynamics::{NBodyDynamics, Osculating, PhysicsConfig};
use crate::linalg::{DVector, Vector3};
use crate::propagators::{IntegratorKind, PropOpts, PropagationError, Propagator, RmsError};
use crate::time::{Duration, Unit};
use snafu::{ensure, ResultExt};
use std::fmt;
use std::sync::Arc;
use typed_builder::TypedBuilder;

/// Number of reals in a flattened launch gene: offset then relative velocity.
pub const GENE_SIZE: usize = 6;

/// Maps a closest approach distance in km to a higher-is-better fitness.
pub fn fitness_score(min_distance_km: f64) -> f64 {
    1e6 / (min_distance_km + 1000.0)
}

/// Launch conditions of a probe, relative to the source body.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LaunchGene {
    /// Launch point relative to the source body center, in km
    pub offset_km: Vector3<f64>,
    /// Launch velocity relative to the source body, in km/s
    pub velocity_km_s: Vector3<f64>,
}

impl LaunchGene {
    pub fn new(offset_km: Vector3<f64>, velocity_km_s: Vector3<f64>) -> Self {
        Self {
            offset_km,
            velocity_km_s,
        }
    }

    /// Builds a gene from its flattened form, which must have exactly six components.
    pub fn from_slice(gene: &[f64]) -> Result<Self, EvaluationError> {
        ensure!(
            gene.len() == GENE_SIZE,
            GeneDimensionSnafu {
                expected: GENE_SIZE,
                got: gene.len()
            }
        );
        Ok(Self {
            offset_km: Vector3::from_column_slice(&gene[..3]),
            velocity_km_s: Vector3::from_column_slice(&gene[3..]),
        })
    }

    pub fn to_vector(&self) -> DVector<f64> {
        DVector::from_iterator(
            GENE_SIZE,
            self.offset_km.iter().chain(self.velocity_km_s.iter()).cloned(),
        )
    }
}

impl fmt::Display for LaunchGene {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "offset [{:.3}, {:.3}, {:.3}] km, v_rel [{:.6}, {:.6}, {:.6}] km/s",
            self.offset_km.x,
            self.offset_km.y,
            self.offset_km.z,
            self.velocity_km_s.x,
            self.velocity_km_s.y,
            self.velocity_km_s.z
        )
    }
}

/// Setup of a trajectory evaluation.
#[derive(Clone, Debug, PartialEq, TypedBuilder)]
#[builder(doc)]
pub struct EvaluatorConfig {
    /// Body the probe launches from
    #[builder(default = String::from(EARTH), setter(into))]
    pub source: String,
    /// Body the probe should reach
    #[builder(default = String::from(MOON), setter(into))]
    pub target: String,
    #[builder(default = String::from("Probe"), setter(into))]
    pub probe_name: String,
    #[builder(default = 1000.0)]
    pub probe_mass_kg: f64,
    /// Simulated duration of each evaluation
    #[builder(default_code = "365.25 * Unit::Day")]
    pub duration: Duration,
    /// Fixed step, or initial step of an adaptive integrator
    #[builder(default_code = "60.0 * Unit::Second")]
    pub step: Duration,
    #[builder(default)]
    pub integrator: IntegratorKind,
    /// Tolerance of an adaptive integrator, in km and km/s
    #[builder(default = 1e-6)]
    pub tolerance: f64,
    /// Attempts of an adaptive integrator at a single step
    #[builder(default = 50)]
    pub attempts: u8,
    #[builder(default_code = "1.0 * Unit::Second")]
    pub min_step: Duration,
    #[builder(default_code = "1.0 * Unit::Day")]
    pub max_step: Duration,
    #[builder(default)]
    pub physics: PhysicsConfig,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl EvaluatorConfig {
    /// Builds the propagator matching this configuration.
    pub fn propagator(&self) -> Result<Propagator<RmsError>, PropagationError> {
        let step_s = self.step.to_seconds();
        if !(step_s > 0.0 && step_s.is_finite()) {
            return Err(PropagationError::InvalidStep { step_s });
        }
        Ok(match self.integrator {
            IntegratorKind::Rkf45 => Propagator::rkf45(
                PropOpts::builder()
                    .init_step(self.step)
                    .min_step(self.min_step)
                    .max_step(self.max_step)
                    .tolerance(self.tolerance)
                    .attempts(self.attempts)
                    .error_ctrl(RmsError)
                    .build(),
            ),
            kind => Propagator::from_kind(kind, PropOpts::with_fixed_step(self.step)),
        })
    }
}

/// Result of the evaluation of one launch gene.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Evaluation {
    /// Smallest probe to target distance over all sampled steps, in km
    pub min_distance_km: f64,
    /// Seconds from launch of the closest approach
    pub time_of_closest_approach_s: f64,
    /// Number of integration steps taken
    pub steps: usize,
    /// `fitness_score` of the closest approach, higher is better
    pub fitness: f64,
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "closest approach {:.3} km at t = {} (fitness {:.6}, {} steps)",
            self.min_distance_km,
            self.time_of_closest_approach_s * Unit::Second,
            self.fitness,
            self.steps
        )
    }
}

/// Probe state at the end of a burn schedule, relative to the target.
#[derive(Clone, Debug, PartialEq)]
pub struct ScheduleOutcome {
    pub relative_position_km: Vector3<f64>,
    pub relative_velocity_km_s: Vector3<f64>,
    /// Fuel used by each slot, in kg
    pub fuel_used_kg: Vec<f64>,
    /// The spacecraft after the schedule, in inertial coordinates and with its remaining fuel
    pub spacecraft: Spacecraft,
    pub elapsed_s: f64,
}

impl ScheduleOutcome {
    /// Osculating elements about the target, of gravitational parameter `target_gm`.
    pub fn osculating(&self, target_gm: f64) -> Osculating {
        Osculating::new(
            target_gm,
            &self.relative_position_km,
            &self.relative_velocity_km_s,
        )
    }

    pub fn total_fuel_kg(&self) -> f64 {
        self.fuel_used_kg.iter().sum()
    }
}

/// Scores trajectories by propagating a probe in a clone of a shared, read only, body table.
///
/// An evaluation is a pure function of its inputs and of this evaluator, so a single evaluator is
/// shared between all the workers of a search.
#[derive(Clone, Debug)]
pub struct TrajectoryEvaluator {
    table: Arc<BodySet>,
    config: EvaluatorConfig,
    propagator: Propagator<RmsError>,
    source_idx: usize,
    target_idx: usize,
}

impl TrajectoryEvaluator {
    /// Checks that the source and target exist in the table and that the probe name is free.
    pub fn new(table: Arc<BodySet>, config: EvaluatorConfig) -> Result<Self, EvaluationError> {
        let source_idx = table.index_of(&config.source).context(SystemSnafu)?;
        let target_idx = table.index_of(&config.target).context(SystemSnafu)?;
        ensure!(
            source_idx != target_idx,
            DegenerateGeometrySnafu {
                action: "source and target are the same body"
            }
        );
        if table.index_of(&config.probe_name).is_ok() {
            return Err(SystemError::DuplicateBody {
                name: config.probe_name.clone(),
            })
            .context(SystemSnafu);
        }
        // Fails early on a pinned body missing from the table
        NBodyDynamics::new(&table, &config.physics).context(DynamicsSnafu)?;
        let propagator = config.propagator().context(PropagationSnafu)?;

        debug!(
            "evaluator from {} to {} for {} with {}",
            config.source, config.target, config.duration, config.integrator
        );

        Ok(Self {
            table,
            config,
            propagator,
            source_idx,
            target_idx,
        })
    }

    pub fn table(&self) -> &BodySet {
        &self.table
    }

    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    pub fn propagator(&self) -> &Propagator<RmsError> {
        &self.propagator
    }

    pub fn source(&self) -> &Body {
        &self.table.bodies()[self.source_idx]
    }

    pub fn target(&self) -> &Body {
        &self.table.bodies()[self.target_idx]
    }

    /// Gravitational parameter of the target in km^3/s^2
    pub fn target_gm(&self) -> f64 {
        self.target().gm(self.config.physics.gravitational_constant)
    }

    /// Inertial position and velocity of a probe launched with this gene.
    pub fn launch_state(&self, gene: &LaunchGene) -> (Vector3<f64>, Vector3<f64>) {
        let source = self.source();
        (
            source.position_km + gene.offset_km,
            source.velocity_km_s + gene.velocity_km_s,
        )
    }

    /// Evaluates a flattened gene, cf. [`LaunchGene::from_slice`].
    pub fn evaluate_slice(&self, gene: &[f64]) -> Result<Evaluation, EvaluationError> {
        self.evaluate(&LaunchGene::from_slice(gene)?)
    }

    /// Propagates a probe launched with this gene for the configured duration and reports its
    /// closest approach to the target.
    pub fn evaluate(&self, gene: &LaunchGene) -> Result<Evaluation, EvaluationError> {
        let mut set = (*self.table).clone();
        let (position_km, velocity_km_s) = self.launch_state(gene);
        let probe = Body::new(
            &self.config.probe_name,
            self.config.probe_mass_kg,
            0.0,
            position_km,
            velocity_km_s,
        );
        let probe_idx = set.push(probe).context(SystemSnafu)?;
        let dynamics = NBodyDynamics::new(&set, &self.config.physics).context(DynamicsSnafu)?;

        let target_idx = self.target_idx;
        let separation =
            |y: &DVector<f64>| (position_of(y, probe_idx) - position_of(y, target_idx)).norm();

        let state = set.to_state_vector();
        let mut min_distance_km = separation(&state);
        let mut time_of_closest_approach_s = 0.0;
        let mut steps = 0;

        let mut instance = self.propagator.with(&dynamics, 0.0, state);
        instance
            .for_duration_with_callback(self.config.duration, |t, y| {
                steps += 1;
                let distance = separation(y);
                if distance < min_distance_km {
                    min_distance_km = distance;
                    time_of_closest_approach_s = t;
                }
            })
            .context(PropagationSnafu)?;

        Ok(Evaluation {
            min_distance_km,
            time_of_closest_approach_s,
            steps,
            fitness: fitness_score(min_distance_km),
        })
    }

    /// Flies a spacecraft through a burn schedule: each slot's ΔV is applied impulsively at the
    /// start of the slot, debiting the fuel, then the spacecraft coasts for the slot duration.
    ///
    /// The spacecraft state is inertial and its name must not collide with the table.
    pub fn simulate_schedule(
        &self,
        spacecraft: &Spacecraft,
        schedule: &BurnSchedule,
    ) -> Result<ScheduleOutcome, EvaluationError> {
        let mut set = (*self.table).clone();
        let mut spacecraft = spacecraft.clone();
        let probe_idx = set.push(spacecraft.body.clone()).context(SystemSnafu)?;
        let mut state = set.to_state_vector();
        let mut t = 0.0;
        let mut fuel_used_kg = Vec::with_capacity(schedule.len());

        for slot in schedule.slots() {
            spacecraft.body.position_km = position_of(&state, probe_idx);
            spacecraft.body.velocity_km_s = velocity_of(&state, probe_idx);
            fuel_used_kg.push(
                spacecraft
                    .impulse(&slot.delta_v_m_s)
                    .context(PropulsionSnafu)?,
            );
            state
                .fixed_rows_mut::<3>(STATE_PER_BODY * probe_idx + 3)
                .copy_from(&spacecraft.body.velocity_km_s);
            // The probe is lighter after each burn
            set.bodies_mut()[probe_idx].mass_kg = spacecraft.body.mass_kg;

            let dynamics =
                NBodyDynamics::new(&set, &self.config.physics).context(DynamicsSnafu)?;
            let mut instance = self.propagator.with(&dynamics, t, state);
            state = instance
                .for_duration(schedule.slot_duration())
                .context(PropagationSnafu)?;
            t = instance.t;
        }

        spacecraft.body.position_km = position_of(&state, probe_idx);
        spacecraft.body.velocity_km_s = velocity_of(&state, probe_idx);

        Ok(ScheduleOutcome {
            relative_position_km: spacecraft.body.position_km - position_of(&state, self.target_idx),
            relative_velocity_km_s: spacecraft.body.velocity_km_s
                - velocity_of(&state, self.target_idx),
            fuel_used_kg,
            spacecraft,
            elapsed_s: t,
        })
    }
}

#[cfg(test)]
mod ut_evaluator {
    use super::*;
    use crate::cosmic::planets::earth_moon;
    use crate::cosmic::GRAVITATIONAL_CONSTANT;
    use approx::assert_relative_eq;

    fn table() -> Arc<BodySet> {
        Arc::new(earth_moon(GRAVITATIONAL_CONSTANT).unwrap())
    }

    #[test]
    fn gene_dimension() {
        let gene = LaunchGene::from_slice(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        assert_eq!(gene.offset_km, Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(gene.velocity_km_s, Vector3::new(4.0, 5.0, 6.0));
        assert_eq!(gene.to_vector().as_slice(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

        assert_eq!(
            LaunchGene::from_slice(&[1.0, 2.0]),
            Err(EvaluationError::GeneDimension {
                expected: GENE_SIZE,
                got: 2
            })
        );
    }

    #[test]
    fn structural_checks() {
        let missing = EvaluatorConfig::builder().target("Europa").build();
        assert!(matches!(
            TrajectoryEvaluator::new(table(), missing),
            Err(EvaluationError::System {
                source: SystemError::BodyNotFound { .. }
            })
        ));

        let collision = EvaluatorConfig::builder().probe_name(MOON).build();
        assert!(matches!(
            TrajectoryEvaluator::new(table(), collision),
            Err(EvaluationError::System {
                source: SystemError::DuplicateBody { .. }
            })
        ));

        let same = EvaluatorConfig::builder().target(EARTH).build();
        assert!(matches!(
            TrajectoryEvaluator::new(table(), same),
            Err(EvaluationError::DegenerateGeometry { .. })
        ));
    }

    #[test]
    fn fitness_is_monotonic() {
        assert_relative_eq!(fitness_score(0.0), 1000.0);
        assert!(fitness_score(10.0) > fitness_score(1e5));
    }
}
