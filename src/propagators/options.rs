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

use std::fmt;

use crate::time::{Duration, Unit};

use super::{ErrorCtrl, RmsError};
use typed_builder::TypedBuilder;

/// PropOpts stores the integrator options: the step bounds, the tolerance, and the parameters of
/// the step size controller.
///
/// Only adaptive methods use the step bounds and the tolerance. With `fixed_step` set, even an
/// embedded method (RKF45) propagates its higher order solution with a constant step.
#[derive(Clone, Copy, Debug, TypedBuilder)]
#[builder(doc)]
pub struct PropOpts<E: ErrorCtrl> {
    #[builder(default_code = "60.0 * Unit::Second")]
    pub init_step: Duration,
    #[builder(default_code = "0.001 * Unit::Second")]
    pub min_step: Duration,
    #[builder(default_code = "2700.0 * Unit::Second")]
    pub max_step: Duration,
    #[builder(default = 1e-9)]
    pub tolerance: f64,
    /// Attempts at a single step before it is declared non convergent
    #[builder(default = 50)]
    pub attempts: u8,
    #[builder(default = false)]
    pub fixed_step: bool,
    #[builder(default = 0.9)]
    pub safety: f64,
    /// Lower bound of the step ratio between two attempts
    #[builder(default = 0.2)]
    pub min_scale: f64,
    /// Upper bound of the step ratio after an accepted step
    #[builder(default = 5.0)]
    pub max_scale: f64,
    pub error_ctrl: E,
}

impl<E: ErrorCtrl> PropOpts<E> {
    /// Adaptive options starting at the maximum step, with the default controller settings.
    pub fn with_adaptive_step(
        min_step: Duration,
        max_step: Duration,
        tolerance: f64,
        error_ctrl: E,
    ) -> Self {
        Self::builder()
            .init_step(max_step)
            .min_step(min_step)
            .max_step(max_step)
            .tolerance(tolerance)
            .error_ctrl(error_ctrl)
            .build()
    }

    /// Same as `with_adaptive_step` with the bounds in seconds.
    pub fn with_adaptive_step_s(
        min_step_s: f64,
        max_step_s: f64,
        tolerance: f64,
        error_ctrl: E,
    ) -> Self {
        Self::with_adaptive_step(
            min_step_s * Unit::Second,
            max_step_s * Unit::Second,
            tolerance,
            error_ctrl,
        )
    }

    /// Computes the next step size from the error of the current attempt:
    /// `clamp(safety (tol/err)^(1/order), min_scale, max_scale) * step`, bounded by the min and
    /// max step sizes. A null error grows the step by the maximum scale, a non finite error
    /// shrinks it by the minimum scale.
    pub fn next_step_s(&self, step_s: f64, error: f64, order: u8) -> f64 {
        let scale = if error.is_finite() {
            (self.safety * (self.tolerance / error).powf(1.0 / f64::from(order)))
                .clamp(self.min_scale, self.max_scale)
        } else {
            self.min_scale
        };
        (scale * step_s).clamp(self.min_step.to_seconds(), self.max_step.to_seconds())
    }
}

impl<E: ErrorCtrl> fmt::Display for PropOpts<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.fixed_step {
            write!(f, "fixed step of {}", self.init_step)
        } else {
            write!(
                f,
                "adaptive step in [{}, {}], tolerance {:e}, {} attempts",
                self.min_step, self.max_step, self.tolerance, self.attempts,
            )
        }
    }
}

impl PropOpts<RmsError> {
    /// Fixed step options: the step never changes and no error is estimated.
    pub fn with_fixed_step(step: Duration) -> Self {
        Self::builder()
            .init_step(step)
            .min_step(step)
            .max_step(step)
            .tolerance(0.0)
            .attempts(0)
            .fixed_step(true)
            .min_scale(1.0)
            .max_scale(1.0)
            .error_ctrl(RmsError)
            .build()
    }

    pub fn with_fixed_step_s(step_s: f64) -> Self {
        Self::with_fixed_step(step_s * Unit::Second)
    }
}

impl Default for PropOpts<RmsError> {
    fn default() -> PropOpts<RmsError> {
        Self::builder().error_ctrl(RmsError).build()
    }
}
