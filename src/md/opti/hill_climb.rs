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

use super::{CostFunction, EvaluationSnafu, InvalidSettingSnafu, SearchError};
use crate::linalg::Vector3;
use crate::md::{BurnSchedule, EvaluationError};
use crate::utils::random_vector_within;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;
use serde_derive::{Deserialize, Serialize};
use snafu::{ensure, ResultExt};
use std::fmt;

/// Settings of the burn schedule hill climber.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClimbConfig {
    pub iterations: usize,
    /// A random schedule is tried every this many iterations, zero disables restarts
    pub restart_every: usize,
    /// Largest ΔV perturbation of one slot per move, in m/s
    pub perturbation_m_s: f64,
    pub seed: u64,
}

impl Default for ClimbConfig {
    fn default() -> Self {
        Self {
            iterations: 500,
            restart_every: 100,
            perturbation_m_s: 5.0,
            seed: 0,
        }
    }
}

impl ClimbConfig {
    pub fn validate(&self) -> Result<(), SearchError> {
        ensure!(
            self.perturbation_m_s > 0.0 && self.perturbation_m_s.is_finite(),
            InvalidSettingSnafu {
                setting: "perturbation_m_s",
                reason: "must be positive"
            }
        );
        Ok(())
    }
}

/// Result of a hill climb.
#[derive(Clone, Debug, PartialEq)]
pub struct ClimbSolution {
    pub schedule: BurnSchedule,
    pub cost: f64,
    /// Best cost after each iteration, never increasing
    pub history: Vec<f64>,
    /// Number of accepted neighbor moves
    pub accepted: usize,
    /// Number of random restarts tried
    pub restarts: usize,
    /// Number of random restarts which replaced the best schedule
    pub restarts_accepted: usize,
}

impl fmt::Display for ClimbSolution {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "cost {:.6} after {} iterations ({} moves accepted, {}/{} restarts accepted)\n{}",
            self.cost,
            self.history.len(),
            self.accepted,
            self.restarts_accepted,
            self.restarts,
            self.schedule
        )
    }
}

/// Evaluates a trial schedule: recoverable failures reject it, others abort.
fn trial_cost<C: CostFunction + ?Sized>(
    cost_fn: &C,
    schedule: &BurnSchedule,
) -> Result<Option<f64>, SearchError> {
    match cost_fn.cost(schedule) {
        Ok(cost) if cost.is_finite() => Ok(Some(cost)),
        Ok(cost) => {
            debug!("rejected schedule with a cost of {cost}");
            Ok(None)
        }
        Err(e) if e.is_recoverable() => {
            debug!("rejected schedule: {e}");
            Ok(None)
        }
        Err(e) => Err(e).context(EvaluationSnafu),
    }
}

/// A schedule shaped like `template` where every slot has a random ΔV within its maximum.
/// Slots are drawn in order, so the later ones get what remains of the fuel budget.
pub fn random_schedule<R: Rng + ?Sized>(
    template: &BurnSchedule,
    rng: &mut R,
) -> Result<BurnSchedule, EvaluationError> {
    let mut schedule = template.clone();
    for slot in 0..schedule.len() {
        schedule.set_delta_v_at(slot, Vector3::zeros())?;
    }
    let max = template.max_delta_v_per_slot_m_s();
    for slot in 0..schedule.len() {
        schedule.set_delta_v_at(slot, random_vector_within(rng, max))?;
    }
    Ok(schedule)
}

/// Refines `initial` by random single slot perturbations, keeping only strict improvements.
///
/// Every `restart_every` iterations, a random schedule replaces the best one only if it is
/// strictly better, so the best cost never increases.
///
/// Moves and restarts go through [`BurnSchedule::set_delta_v_at`]: a schedule built for a
/// propulsion system never exceeds its fuel, and the returned one carries the fuel of each slot.
pub fn climb<C: CostFunction + ?Sized>(
    cost_fn: &C,
    initial: BurnSchedule,
    config: &ClimbConfig,
) -> Result<ClimbSolution, SearchError> {
    config.validate()?;
    ensure!(!initial.is_empty(), super::EmptyScheduleSnafu);
    let mut rng = Pcg64Mcg::seed_from_u64(config.seed);

    let mut best_cost = cost_fn.cost(&initial).context(EvaluationSnafu)?;
    let mut best = initial;
    let mut history = Vec::with_capacity(config.iterations);
    let mut accepted = 0;
    let mut restarts = 0;
    let mut restarts_accepted = 0;

    info!(
        "hill climbing {} slots for {} iterations from a cost of {best_cost:.6}",
        best.len(),
        config.iterations
    );

    for iteration in 1..=config.iterations {
        let slot = rng.gen_range(0..best.len());
        let mut neighbor = best.clone();
        let current = neighbor.delta_v_at(slot).unwrap_or_else(Vector3::zeros);
        neighbor
            .set_delta_v_at(slot, current + random_vector_within(&mut rng, config.perturbation_m_s))
            .context(EvaluationSnafu)?;
        if let Some(cost) = trial_cost(cost_fn, &neighbor)? {
            if cost < best_cost {
                best = neighbor;
                best_cost = cost;
                accepted += 1;
            }
        }

        if config.restart_every > 0 && iteration % config.restart_every == 0 {
            restarts += 1;
            let restart = random_schedule(&best, &mut rng).context(EvaluationSnafu)?;
            if let Some(cost) = trial_cost(cost_fn, &restart)? {
                if cost < best_cost {
                    debug!("restart at iteration {iteration} improved the cost to {cost:.6}");
                    best = restart;
                    best_cost = cost;
                    restarts_accepted += 1;
                }
            }
        }

        history.push(best_cost);
    }

    info!("hill climbing done: cost {best_cost:.6} with {accepted} moves accepted");

    Ok(ClimbSolution {
        schedule: best,
        cost: best_cost,
        history,
        accepted,
        restarts,
        restarts_accepted,
    })
}
