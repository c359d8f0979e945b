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

use super::{EvaluationSnafu, InvalidSettingSnafu, SearchError};
use crate::linalg::Vector3;
use crate::md::{EvaluationError, Evaluation, LaunchGene, TrajectoryEvaluator};
use crate::utils::{
    cartesian_to_spherical, clamp_norm, is_zero_vector, random_vector_within,
    spherical_to_cartesian, unit_vector_or_zero,
};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;
use rayon::prelude::*;
use serde_derive::{Deserialize, Serialize};
use snafu::{ensure, ResultExt};
use std::fmt;

/// Settings of the genetic search over launch conditions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GaConfig {
    pub population_size: usize,
    /// Number of generations evaluated, including the initial population
    pub generations: usize,
    /// Probability that an offspring is mutated
    pub mutation_rate: f64,
    /// Number of best candidates copied unchanged into the next generation
    pub elite_count: usize,
    pub tournament_size: usize,
    /// Largest launch velocity relative to the source body, in km/s
    pub max_delta_v_km_s: f64,
    /// Largest angular perturbation of the launch point per spherical angle, in radians
    pub mutation_angle_rad: f64,
    /// Largest velocity perturbation of a mutation, in km/s
    pub mutation_delta_v_km_s: f64,
    /// Stops the search as soon as the best fitness reaches this value
    pub fitness_threshold: Option<f64>,
    pub seed: u64,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            population_size: 40,
            generations: 30,
            mutation_rate: 0.1,
            elite_count: 2,
            tournament_size: 3,
            max_delta_v_km_s: 12.0,
            mutation_angle_rad: 0.05,
            mutation_delta_v_km_s: 0.1,
            fitness_threshold: None,
            seed: 0,
        }
    }
}

impl GaConfig {
    pub fn validate(&self) -> Result<(), SearchError> {
        ensure!(
            self.population_size > 0,
            InvalidSettingSnafu {
                setting: "population_size",
                reason: "must be at least one"
            }
        );
        ensure!(
            self.generations > 0,
            InvalidSettingSnafu {
                setting: "generations",
                reason: "must be at least one"
            }
        );
        ensure!(
            self.elite_count < self.population_size,
            InvalidSettingSnafu {
                setting: "elite_count",
                reason: format!(
                    "{} elites leave no room for offspring in a population of {}",
                    self.elite_count, self.population_size
                )
            }
        );
        ensure!(
            self.tournament_size > 0,
            InvalidSettingSnafu {
                setting: "tournament_size",
                reason: "must be at least one"
            }
        );
        ensure!(
            (0.0..=1.0).contains(&self.mutation_rate),
            InvalidSettingSnafu {
                setting: "mutation_rate",
                reason: format!("{} is not a probability", self.mutation_rate)
            }
        );
        ensure!(
            self.max_delta_v_km_s > 0.0 && self.max_delta_v_km_s.is_finite(),
            InvalidSettingSnafu {
                setting: "max_delta_v_km_s",
                reason: "must be positive"
            }
        );
        for (setting, value) in [
            ("mutation_angle_rad", self.mutation_angle_rad),
            ("mutation_delta_v_km_s", self.mutation_delta_v_km_s),
        ] {
            ensure!(
                value >= 0.0 && value.is_finite(),
                InvalidSettingSnafu {
                    setting,
                    reason: format!("{value} is not a finite, non negative perturbation")
                }
            );
        }
        Ok(())
    }
}

/// An individual of the population. Its gene never changes once evaluated.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Candidate {
    pub gene: LaunchGene,
    /// None if the evaluation failed numerically
    pub evaluation: Option<Evaluation>,
}

impl Candidate {
    /// Failed evaluations have a null fitness
    pub fn fitness(&self) -> f64 {
        self.evaluation.map_or(0.0, |e| e.fitness)
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.evaluation {
            Some(eval) => write!(f, "{} => {}", self.gene, eval),
            None => write!(f, "{} => failed", self.gene),
        }
    }
}

/// Result of a genetic search.
#[derive(Clone, Debug, PartialEq)]
pub struct GaSolution {
    pub best: Candidate,
    /// Best fitness of each generation
    pub history: Vec<f64>,
    pub generations: usize,
    /// Whether the fitness threshold stopped the search before the last generation
    pub reached_threshold: bool,
}

impl fmt::Display for GaSolution {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "best after {} generations{}: {}",
            self.generations,
            if self.reached_threshold {
                " (threshold reached)"
            } else {
                ""
            },
            self.best
        )
    }
}

/// Evolves launch conditions from the surface of the source body, scoring each candidate with a
/// full propagation.
pub struct GeneticSearch<'a> {
    evaluator: &'a TrajectoryEvaluator,
    config: GaConfig,
    radius_km: f64,
    launch_point_km: Vector3<f64>,
}

impl<'a> GeneticSearch<'a> {
    pub fn new(evaluator: &'a TrajectoryEvaluator, config: GaConfig) -> Result<Self, SearchError> {
        config.validate()?;
        let source = evaluator.source();
        let towards_target =
            unit_vector_or_zero(&(evaluator.target().position_km - source.position_km));
        if is_zero_vector(&towards_target) || source.radius_km <= 0.0 {
            return Err(EvaluationError::DegenerateGeometry {
                action: "no launch point on the source surface faces the target",
            })
            .context(EvaluationSnafu);
        }
        Ok(Self {
            evaluator,
            radius_km: source.radius_km,
            launch_point_km: towards_target * source.radius_km,
            config,
        })
    }

    pub fn config(&self) -> &GaConfig {
        &self.config
    }

    /// Surface point of the source body on the line towards the target
    pub fn launch_point_km(&self) -> Vector3<f64> {
        self.launch_point_km
    }

    /// Radius of the launch sphere, in km
    pub fn radius_km(&self) -> f64 {
        self.radius_km
    }

    /// A gene launching from the fixed launch point with a random velocity within the maximum ΔV.
    pub fn random_gene<R: Rng + ?Sized>(&self, rng: &mut R) -> LaunchGene {
        LaunchGene::new(
            self.launch_point_km,
            random_vector_within(rng, self.config.max_delta_v_km_s),
        )
    }

    /// Evaluates all genes on the rayon pool. Numerical failures are logged and score zero,
    /// structural ones abort.
    pub fn evaluate_genes(&self, genes: Vec<LaunchGene>) -> Result<Vec<Candidate>, SearchError> {
        let results: Vec<Result<Evaluation, EvaluationError>> = genes
            .par_iter()
            .map(|gene| self.evaluator.evaluate(gene))
            .collect();

        genes
            .into_iter()
            .zip(results)
            .map(|(gene, result)| match result {
                Ok(evaluation) => Ok(Candidate {
                    gene,
                    evaluation: Some(evaluation),
                }),
                Err(e) if e.is_recoverable() => {
                    warn!("candidate {gene} scored zero: {e}");
                    Ok(Candidate {
                        gene,
                        evaluation: None,
                    })
                }
                Err(e) => Err(e).context(EvaluationSnafu),
            })
            .collect()
    }

    /// Draws `tournament_size` candidates with replacement and returns the fittest.
    pub fn tournament<'p, R: Rng + ?Sized>(
        &self,
        population: &'p [Candidate],
        rng: &mut R,
    ) -> &'p Candidate {
        let mut best = &population[rng.gen_range(0..population.len())];
        for _ in 1..self.config.tournament_size {
            let contender = &population[rng.gen_range(0..population.len())];
            if contender.fitness() > best.fitness() {
                best = contender;
            }
        }
        best
    }

    /// Blends two parents with a random weight in [0, 1). The launch point is projected back onto
    /// the source surface and the velocity clamped to the maximum ΔV.
    pub fn crossover<R: Rng + ?Sized>(
        &self,
        a: &LaunchGene,
        b: &LaunchGene,
        rng: &mut R,
    ) -> LaunchGene {
        let t: f64 = rng.gen();
        let blended = a.offset_km + t * (b.offset_km - a.offset_km);
        // Antipodal parents blend through the center of the body
        let mut direction = unit_vector_or_zero(&blended);
        if is_zero_vector(&direction) {
            direction = unit_vector_or_zero(&a.offset_km);
        }
        if is_zero_vector(&direction) {
            direction = unit_vector_or_zero(&self.launch_point_km);
        }
        let velocity = a.velocity_km_s + t * (b.velocity_km_s - a.velocity_km_s);
        LaunchGene::new(
            direction * self.radius_km,
            clamp_norm(&velocity, self.config.max_delta_v_km_s),
        )
    }

    /// With the mutation probability, moves the launch point by a small angle along the surface
    /// and perturbs the velocity.
    pub fn mutate<R: Rng + ?Sized>(&self, gene: LaunchGene, rng: &mut R) -> LaunchGene {
        if rng.gen::<f64>() >= self.config.mutation_rate {
            return gene;
        }
        let angle = self.config.mutation_angle_rad;
        let (_, theta, phi) = cartesian_to_spherical(&gene.offset_km);
        let theta = theta + rng.gen_range(-angle..=angle);
        let phi = phi + rng.gen_range(-angle..=angle);
        let velocity =
            gene.velocity_km_s + random_vector_within(rng, self.config.mutation_delta_v_km_s);
        LaunchGene::new(
            spherical_to_cartesian(self.radius_km, theta, phi),
            clamp_norm(&velocity, self.config.max_delta_v_km_s),
        )
    }

    /// Runs the search from the configured seed. Two runs with the same evaluator and settings
    /// return the same solution.
    pub fn run(&self) -> Result<GaSolution, SearchError> {
        let mut rng = Pcg64Mcg::seed_from_u64(self.config.seed);
        let population_size = self.config.population_size;
        let elites = self.config.elite_count;

        info!(
            "genetic search: {} candidates for {} generations from {}",
            population_size,
            self.config.generations,
            self.evaluator.source().name
        );

        let genes = (0..population_size)
            .map(|_| self.random_gene(&mut rng))
            .collect();
        let mut population = self.evaluate_genes(genes)?;

        let mut history = Vec::with_capacity(self.config.generations);
        let mut reached_threshold = false;
        loop {
            population.sort_by(|a, b| b.fitness().total_cmp(&a.fitness()));
            let best = population[0].fitness();
            history.push(best);
            info!(
                "generation {}/{}: best fitness {:.6} ({})",
                history.len(),
                self.config.generations,
                best,
                population[0]
            );

            if let Some(threshold) = self.config.fitness_threshold {
                if best >= threshold {
                    reached_threshold = true;
                    break;
                }
            }
            if history.len() >= self.config.generations {
                break;
            }

            let offspring = (elites..population_size)
                .map(|_| {
                    let a = self.tournament(&population, &mut rng).gene;
                    let b = self.tournament(&population, &mut rng).gene;
                    let child = self.crossover(&a, &b, &mut rng);
                    self.mutate(child, &mut rng)
                })
                .collect();

            let mut next = population[..elites].to_vec();
            next.extend(self.evaluate_genes(offspring)?);
            population = next;
        }

        Ok(GaSolution {
            best: population[0],
            generations: history.len(),
            history,
            reached_threshold,
        })
    }
}
