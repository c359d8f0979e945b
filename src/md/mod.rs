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

use crate::cosmic::{PropulsionError, SystemError};
use crate::dynamics::DynamicsError;
use crate::propagators::PropagationError;
use snafu::prelude::*;

mod burn_schedule;
pub use burn_schedule::{BurnSchedule, BurnSlot};

mod evaluator;
pub use evaluator::*;

/// Provides the searches over launch conditions and burn schedules.
pub mod opti;

/// Errors raised while evaluating a single trajectory.
///
/// Structural errors (a missing body, a malformed gene, a burn the fuel cannot cover) abort the
/// enclosing search, whereas numerical ones only disqualify the candidate being evaluated, cf.
/// [`EvaluationError::is_recoverable`].
#[derive(Debug, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum EvaluationError {
    #[snafu(display("simulation set error: {source}"))]
    System { source: SystemError },
    #[snafu(display("could not build the dynamics: {source}"))]
    Dynamics { source: DynamicsError },
    #[snafu(display("trajectory propagation failed: {source}"))]
    Propagation { source: PropagationError },
    #[snafu(display("burn refused: {source}"))]
    Propulsion { source: PropulsionError },
    #[snafu(display("gene must have {expected} components, got {got}"))]
    GeneDimension { expected: usize, got: usize },
    #[snafu(display("slot {slot} is out of range for a schedule of {len} slots"))]
    SlotOutOfRange { slot: usize, len: usize },
    #[snafu(display("invalid burn schedule: {reason}"))]
    InvalidSchedule { reason: &'static str },
    #[snafu(display("degenerate geometry: {action}"))]
    DegenerateGeometry { action: &'static str },
}

impl EvaluationError {
    /// Whether this error only disqualifies the candidate: numerical failures of the propagation
    /// are recoverable, everything else is a setup error.
    ///
    /// Fuel exhaustion is a setup error: the schedules of a search stay within their fuel budget.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Propagation { source } => matches!(
                source,
                PropagationError::NonConvergence { .. }
                    | PropagationError::Dynamics {
                        source: DynamicsError::NonFiniteDerivative { .. }
                    }
            ),
            _ => false,
        }
    }
}
