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

use super::error_ctrl::ErrorCtrl;
use super::{DynamicsSnafu, IntegrationDetails, NonConvergenceSnafu, PropagationError, Propagator};
use crate::dynamics::Dynamics;
use crate::linalg::DVector;
use crate::time::{Duration, Unit};
use snafu::ResultExt;

/// A PropInstance integrates a given set of dynamics from a given state.
/// It includes the current time and state, the options of its propagator, the integrator details
/// of the previous step, and the pre-allocated stage vectors.
#[derive(Debug)]
pub struct PropInstance<'a, D: Dynamics, E: ErrorCtrl> {
    /// Time of the current state, in seconds
    pub t: f64,
    /// Flattened state at `t`
    pub state: DVector<f64>,
    /// Butcher table and options
    pub prop: &'a Propagator<E>,
    /// The dynamics being integrated
    pub dynamics: &'a D,
    /// Step size, error and attempts of the last accepted step
    pub details: IntegrationDetails,
    pub(crate) step_size: f64, // Stores the adapted step for the _next_ call, in seconds
    pub(crate) fixed_step: bool,
    // Stage derivatives, allocated once per instance
    pub(crate) k: Vec<DVector<f64>>,
}

impl<'a, D: Dynamics, E: ErrorCtrl> PropInstance<'a, D, E> {
    pub(crate) fn new(prop: &'a Propagator<E>, dynamics: &'a D, t: f64, state: DVector<f64>) -> Self {
        let k = vec![DVector::zeros(state.len()); prop.stages];
        let step_size = prop.opts.init_step.to_seconds();
        Self {
            t,
            state,
            prop,
            dynamics,
            details: IntegrationDetails {
                step_s: step_size,
                error: 0.0,
                attempts: 1,
            },
            step_size,
            fixed_step: !prop.is_adaptive(),
            k,
        }
    }

    /// Allows setting the step size of the propagator, in seconds.
    /// Methods without an embedded error estimate always use a fixed step.
    pub fn set_step(&mut self, step_s: f64, fixed: bool) {
        self.step_size = step_s;
        self.fixed_step = fixed || !self.prop.is_adaptive();
    }

    /// Step size which will be attempted on the next call, in seconds
    pub fn step_size(&self) -> f64 {
        self.step_size
    }

    /// Propagates the dynamics for the provided duration and returns the final state.
    pub fn for_duration(&mut self, duration: Duration) -> Result<DVector<f64>, PropagationError> {
        self.for_duration_with_callback(duration, |_, _| {})
    }

    /// Propagates the dynamics for the provided duration, calling `on_step` after every accepted
    /// step with the new time and state. The last step is shortened to land exactly on the end time.
    pub fn for_duration_with_callback<F>(
        &mut self,
        duration: Duration,
        mut on_step: F,
    ) -> Result<DVector<f64>, PropagationError>
    where
        F: FnMut(f64, &DVector<f64>),
    {
        if duration <= 0 * Unit::Second {
            return Ok(self.state.clone());
        }
        let stop_time = self.t + duration.to_seconds();
        let log_progress = duration >= 1 * Unit::Day;

        if log_progress {
            info!("Propagating for {} until t = {} s", duration, stop_time);
        }

        loop {
            let remaining_s = stop_time - self.t;
            if remaining_s <= 0.0 {
                // Already at the end time
                return Ok(self.state.clone());
            }
            if self.step_size < remaining_s {
                self.single_step()?;
                on_step(self.t, &self.state);
                continue;
            }
            // Final step capped on the end time. It remains under error control: a rejected
            // attempt is retried with a smaller step and the loop resumes from there.
            let resume_step_s = self.step_size;
            self.step_size = remaining_s;
            self.single_step()?;
            if self.details.step_s < remaining_s {
                on_step(self.t, &self.state);
                continue;
            }
            // Avoid accumulating round-off on the end time
            self.t = stop_time;
            on_step(self.t, &self.state);
            self.step_size = resume_step_s;

            if log_progress {
                info!("Done at t = {} s", self.t);
            }

            return Ok(self.state.clone());
        }
    }

    /// Take a single propagator step, updating the time and the state only on success.
    pub fn single_step(&mut self) -> Result<(), PropagationError> {
        let (step_s, next_state) = self.derive()?;
        self.t += step_s;
        self.state = next_state;
        Ok(())
    }

    /// This method integrates the dynamics of this instance. Everything is in **seconds**.
    ///
    /// Returns the step size used and y_{n+1} = y_n + h Σ b_i k_i, leaving `t` and `state`
    /// untouched. The attempt details are stored in `self.details`.
    fn derive(&mut self) -> Result<(f64, DVector<f64>), PropagationError> {
        let state_vec = &self.state;
        let t = self.t;
        // The error is overwritten by every attempt
        self.details.attempts = 1;
        // Mutable because an adaptive step may shrink it below
        let mut step_size = self.step_size;
        // The first stage does not depend on the step size
        self.k[0] = self.dynamics.eom(t, state_vec).context(DynamicsSnafu)?;
        loop {
            let mut a_idx: usize = 0;
            for i in 0..(self.prop.stages - 1) {
                // Consistent tables: c_i is the sum of the a_ij of row i
                let mut ci: f64 = 0.0;
                // w_i = Σ_j a_ij k_j
                let mut wi = DVector::<f64>::zeros(state_vec.len());
                for kj in &self.k[0..i + 1] {
                    let a_ij = self.prop.a_coeffs[a_idx];
                    ci += a_ij;
                    wi += a_ij * kj;
                    a_idx += 1;
                }

                self.k[i + 1] = self
                    .dynamics
                    .eom(t + ci * step_size, &(state_vec + step_size * wi))
                    .context(DynamicsSnafu)?;
            }
            // Propagated solution, and its difference with the embedded one
            let mut next_state = state_vec.clone();
            let mut error_est = DVector::<f64>::zeros(state_vec.len());
            for (i, ki) in self.k.iter().enumerate() {
                let b_i = self.prop.b_coeffs[i];
                if !self.fixed_step {
                    let b_i_star = self.prop.b_coeffs[i + self.prop.stages];
                    error_est += step_size * (b_i - b_i_star) * ki;
                }
                next_state += step_size * b_i * ki;
            }

            if self.fixed_step {
                self.details.step_s = step_size;
                self.details.error = 0.0;
                return Ok((step_size, next_state));
            }

            self.details.error = E::estimate(&error_est, &next_state, state_vec);
            if self.details.error <= self.prop.opts.tolerance {
                self.details.step_s = step_size;
                // Grow (or keep) the step for the next call
                self.step_size =
                    self.prop
                        .opts
                        .next_step_s(step_size, self.details.error, self.prop.order);
                return Ok((step_size, next_state));
            }

            if self.details.attempts >= self.prop.opts.attempts
                || step_size <= self.prop.opts.min_step.to_seconds()
            {
                warn!(
                    "Could not further decrease step size at t = {} s: error {:.3e} after {} attempts",
                    t, self.details.error, self.details.attempts
                );
                return NonConvergenceSnafu {
                    t,
                    error: self.details.error,
                    attempts: self.details.attempts,
                    step_s: step_size,
                }
                .fail();
            }

            // Retry with a smaller step
            self.details.attempts += 1;
            step_size = self
                .prop
                .opts
                .next_step_s(step_size, self.details.error, self.prop.order);
        }
    }

    /// Details of the last accepted step.
    pub fn latest_details(&self) -> IntegrationDetails {
        self.details
    }
}
