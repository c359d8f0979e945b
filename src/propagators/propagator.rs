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

use super::error_ctrl::{ErrorCtrl, RmsError};
use super::{
    Euler, IntegratorKind, InvalidStepSnafu, PropInstance, PropOpts, PropagationError, RK, RK4,
    RKF45,
};
use crate::dynamics::Dynamics;
use crate::linalg::DVector;
use snafu::ensure;

/// A stop condition is checked on the current (t, y) before each step is taken.
pub type StopCondition<'s> = &'s dyn Fn(f64, &DVector<f64>) -> bool;

/// A Propagator is a Runge Kutta method and its options: it holds no state and no dynamics, and
/// can therefore be shared between threads. Call `with` to get an instance which integrates a
/// specific state under specific dynamics.
#[derive(Clone, Debug)]
pub struct Propagator<E: ErrorCtrl> {
    pub opts: PropOpts<E>, // Stores the integration options (tolerance, min/max step, init step, etc.)
    pub(crate) order: u8,  // Order of the integrator
    pub(crate) stages: usize, // Number of stages, i.e. how many times the derivatives will be called
    pub(crate) a_coeffs: &'static [f64],
    pub(crate) b_coeffs: &'static [f64],
}

impl<E: ErrorCtrl> Propagator<E> {
    /// Each propagator must be initialized with `new` which stores propagator information.
    pub fn new<T: RK>(opts: PropOpts<E>) -> Self {
        Self {
            opts,
            stages: T::STAGES,
            order: T::ORDER,
            a_coeffs: T::A_COEFFS,
            b_coeffs: T::B_COEFFS,
        }
    }

    /// Builds the propagator of the requested kind.
    pub fn from_kind(kind: IntegratorKind, opts: PropOpts<E>) -> Self {
        match kind {
            IntegratorKind::Euler => Self::new::<Euler>(opts),
            IntegratorKind::Rk4 => Self::new::<RK4>(opts),
            IntegratorKind::Rkf45 => Self::new::<RKF45>(opts),
        }
    }

    /// An RKF45 propagator with custom propagator options.
    pub fn rkf45(opts: PropOpts<E>) -> Self {
        Self::new::<RKF45>(opts)
    }

    /// Whether this propagator carries an embedded error estimate and is set to use it
    pub fn is_adaptive(&self) -> bool {
        !self.opts.fixed_step && self.b_coeffs.len() == 2 * self.stages
    }

    /// Order of the propagated solution
    pub fn order(&self) -> u8 {
        self.order
    }

    /// Starts an integration of `dynamics` from `state` at time `t` (in seconds).
    pub fn with<'a, D: Dynamics>(
        &'a self,
        dynamics: &'a D,
        t: f64,
        state: DVector<f64>,
    ) -> PropInstance<'a, D, E> {
        PropInstance::new(self, dynamics, t, state)
    }

    /// Integrates `dynamics` from (t0, y0) for `steps` steps, starting with a step of `step_s` seconds.
    ///
    /// For fixed step methods every step is `step_s`, for adaptive methods it is only the initial
    /// step. The returned sequence starts with (t0, y0) and is shorter than `steps + 1` if `stop`
    /// returned true on one of the states, in which case that state is the last one.
    pub fn solve<D: Dynamics>(
        &self,
        dynamics: &D,
        t0: f64,
        y0: &DVector<f64>,
        step_s: f64,
        steps: usize,
        stop: Option<StopCondition>,
    ) -> Result<Vec<(f64, DVector<f64>)>, PropagationError> {
        ensure!(step_s > 0.0 && step_s.is_finite(), InvalidStepSnafu { step_s });
        let mut instance = self.with(dynamics, t0, y0.clone());
        instance.set_step(step_s, !self.is_adaptive());

        let mut solution = Vec::with_capacity(steps + 1);
        solution.push((t0, y0.clone()));
        for _ in 0..steps {
            if let Some(stop) = stop {
                if stop(instance.t, &instance.state) {
                    debug!("stop condition met at t = {} s", instance.t);
                    break;
                }
            }
            instance.single_step()?;
            solution.push((instance.t, instance.state.clone()));
        }
        Ok(solution)
    }

    /// Takes exactly one step of `step_s` seconds from (t, y) and returns the next state.
    ///
    /// No error control is applied, even for embedded methods: the step is always taken.
    pub fn solve_step<D: Dynamics>(
        &self,
        dynamics: &D,
        t: f64,
        y: &DVector<f64>,
        step_s: f64,
    ) -> Result<DVector<f64>, PropagationError> {
        ensure!(step_s > 0.0 && step_s.is_finite(), InvalidStepSnafu { step_s });
        let mut instance = self.with(dynamics, t, y.clone());
        instance.set_step(step_s, true);
        instance.single_step()?;
        Ok(instance.state)
    }
}

impl Propagator<RmsError> {
    /// Default propagator is an RKF45 with the default PropOpts.
    pub fn default_rkf45() -> Self {
        Self::new::<RKF45>(PropOpts::default())
    }

    /// A fixed step RK4 propagator.
    pub fn rk4(step_s: f64) -> Self {
        Self::new::<RK4>(PropOpts::with_fixed_step_s(step_s))
    }

    /// A fixed step forward Euler propagator.
    pub fn euler(step_s: f64) -> Self {
        Self::new::<Euler>(PropOpts::with_fixed_step_s(step_s))
    }
}
