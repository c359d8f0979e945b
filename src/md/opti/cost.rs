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

use crate::cosmic::{Propulsion, Spacecraft};
use crate::dynamics::{Osculating, TwoBody};
use crate::linalg::{DVector, Vector3};
use crate::md::{
    BurnSchedule, EvaluationError, PropagationSnafu, PropulsionSnafu, TrajectoryEvaluator,
};
use crate::propagators::{Propagator, RmsError};
use serde_derive::{Deserialize, Serialize};
use snafu::ResultExt;

/// Scores a burn schedule, lower is better.
///
/// Any closure of the form `Fn(&BurnSchedule) -> Result<f64, EvaluationError>` is a cost function.
pub trait CostFunction: Send + Sync {
    fn cost(&self, schedule: &BurnSchedule) -> Result<f64, EvaluationError>;
}

impl<F> CostFunction for F
where
    F: Fn(&BurnSchedule) -> Result<f64, EvaluationError> + Send + Sync,
{
    fn cost(&self, schedule: &BurnSchedule) -> Result<f64, EvaluationError> {
        self(schedule)
    }
}

/// The orbit a schedule should end on, and how hard to push for it.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InsertionGoal {
    /// Radius of the desired orbit about the target, in km
    pub target_radius_km: f64,
    /// Cost in m/s of ΔV per km of radius error
    pub penalty: f64,
}

impl InsertionGoal {
    /// Total ΔV plus the weighted radius error
    pub fn cost(&self, total_delta_v_m_s: f64, radius_km: f64) -> f64 {
        total_delta_v_m_s + self.penalty * (radius_km - self.target_radius_km).abs()
    }

    /// The semi major axis of a bound orbit, the current distance otherwise
    pub fn resulting_radius_km(osculating: &Osculating) -> f64 {
        if osculating.is_bound() {
            osculating.sma_km
        } else {
            osculating.rmag_km
        }
    }
}

/// Flies the schedule in the full N-body model of the evaluator.
pub struct SimulatedInsertionCost<'a> {
    evaluator: &'a TrajectoryEvaluator,
    spacecraft: Spacecraft,
    goal: InsertionGoal,
}

impl<'a> SimulatedInsertionCost<'a> {
    /// The spacecraft state is inertial, at the start of the schedule.
    pub fn new(evaluator: &'a TrajectoryEvaluator, spacecraft: Spacecraft, goal: InsertionGoal) -> Self {
        Self {
            evaluator,
            spacecraft,
            goal,
        }
    }
}

impl CostFunction for SimulatedInsertionCost<'_> {
    fn cost(&self, schedule: &BurnSchedule) -> Result<f64, EvaluationError> {
        let outcome = self.evaluator.simulate_schedule(&self.spacecraft, schedule)?;
        let osculating = outcome.osculating(self.evaluator.target_gm());
        Ok(self.goal.cost(
            schedule.total_delta_v_m_s(),
            InsertionGoal::resulting_radius_km(&osculating),
        ))
    }
}

/// Flies the schedule in a two body model about the target, with a fixed step RK4.
///
/// Much cheaper than [`SimulatedInsertionCost`] and good enough once the probe is deep in the
/// sphere of influence of the target.
pub struct ModeledInsertionCost {
    dynamics: TwoBody,
    position_km: Vector3<f64>,
    velocity_km_s: Vector3<f64>,
    propulsion: Propulsion,
    goal: InsertionGoal,
    propagator: Propagator<RmsError>,
}

impl ModeledInsertionCost {
    /// Position and velocity are relative to the target, of gravitational parameter `target_gm`.
    pub fn new(
        target_gm: f64,
        position_km: Vector3<f64>,
        velocity_km_s: Vector3<f64>,
        propulsion: Propulsion,
        goal: InsertionGoal,
        step_s: f64,
    ) -> Self {
        Self {
            dynamics: TwoBody::new(target_gm),
            position_km,
            velocity_km_s,
            propulsion,
            goal,
            propagator: Propagator::rk4(step_s),
        }
    }

    /// Final position and velocity relative to the target after flying the schedule.
    pub fn fly(&self, schedule: &BurnSchedule) -> Result<(Vector3<f64>, Vector3<f64>), EvaluationError> {
        let mut engine = self.propulsion;
        let mut state = DVector::from_iterator(
            6,
            self.position_km.iter().chain(self.velocity_km_s.iter()).cloned(),
        );
        let mut t = 0.0;
        for slot in schedule.slots() {
            engine
                .burn(slot.delta_v_m_s.norm())
                .context(PropulsionSnafu)?;
            let mut velocity = state.fixed_rows_mut::<3>(3);
            velocity += slot.delta_v_m_s * 1e-3;

            let mut instance = self.propagator.with(&self.dynamics, t, state);
            state = instance
                .for_duration(schedule.slot_duration())
                .context(PropagationSnafu)?;
            t = instance.t;
        }
        Ok((
            state.fixed_rows::<3>(0).into_owned(),
            state.fixed_rows::<3>(3).into_owned(),
        ))
    }
}

impl CostFunction for ModeledInsertionCost {
    fn cost(&self, schedule: &BurnSchedule) -> Result<f64, EvaluationError> {
        let (position_km, velocity_km_s) = self.fly(schedule)?;
        let osculating = Osculating::new(self.dynamics.gm, &position_km, &velocity_km_s);
        Ok(self.goal.cost(
            schedule.total_delta_v_m_s(),
            InsertionGoal::resulting_radius_km(&osculating),
        ))
    }
}
