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

use snafu::prelude::*;
use std::fmt;

/// Error estimators of the embedded methods.
pub mod error_ctrl;
pub use self::error_ctrl::*;

// Re-Export
mod instance;
pub use instance::*;
mod propagator;
pub use propagator::*;
mod rk_methods;
pub use rk_methods::*;
mod options;
pub use options::*;

use crate::dynamics::DynamicsError;
use crate::linalg::DVector;

/// Stores the details of the previous integration step of a given propagator. Access as `my_prop.latest_details()`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IntegrationDetails {
    /// step size used, in seconds
    pub step_s: f64,
    /// estimated local error, zero for a fixed step
    pub error: f64,
    /// attempts needed to get within the tolerance
    pub attempts: u8,
}

impl fmt::Display for IntegrationDetails {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "IntegrationDetails {{step: {} s, error: {:.3e}, attempts: {}}}",
            self.step_s, self.error, self.attempts
        )
    }
}

#[derive(Debug, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum PropagationError {
    #[snafu(display("equations of motion failed: {source}"))]
    Dynamics { source: DynamicsError },
    #[snafu(display(
        "step at t = {t} s did not converge: error {error:.3e} after {attempts} attempts with a step of {step_s} s"
    ))]
    NonConvergence {
        t: f64,
        error: f64,
        attempts: u8,
        step_s: f64,
    },
    #[snafu(display("step size must be strictly positive and finite, got {step_s} s"))]
    InvalidStep { step_s: f64 },
    #[snafu(display("propagation produced no state"))]
    EmptySolution,
}

/// Returns the last (t, y) pair of a solution, which may be shorter than requested if a stop
/// condition triggered.
pub fn last_state(solution: &[(f64, DVector<f64>)]) -> Result<&(f64, DVector<f64>), PropagationError> {
    solution.last().context(EmptySolutionSnafu)
}
