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

mod rk;
pub use self::rk::*;
mod fehlberg;
pub use self::fehlberg::*;

use serde_derive::{Deserialize, Serialize};
use std::fmt;

/// The `RK` trait defines a Runge Kutta integrator from its Butcher table.
#[allow(clippy::upper_case_acronyms)]
pub trait RK
where
    Self: Sized,
{
    /// Order of the propagated solution, used by the adaptive step size as the exponent of the
    /// error ratio.
    const ORDER: u8;

    /// Number of stages, i.e. number of calls to the equations of motion per attempt
    const STAGES: usize;

    /// Strictly lower triangular part of the A matrix of the Butcher table, row by row, so
    /// `A_COEFFS.len()` must be `STAGES * (STAGES - 1) / 2`.
    /// *Warning:* this RK trait supposes that the implementation is consistent, i.e. c_i = \sum_j a_{ij}.
    const A_COEFFS: &'static [f64];

    /// The b_i weights of the propagated solution, optionally followed by the b^*_i weights of the
    /// embedded solution. An embedded method has `2 * STAGES` coefficients, an explicit fixed
    /// method only `STAGES`.
    const B_COEFFS: &'static [f64];
}

/// Selects a propagator at runtime, typically from a configuration file.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IntegratorKind {
    Euler,
    Rk4,
    #[default]
    Rkf45,
}

impl fmt::Display for IntegratorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Euler => write!(f, "Euler"),
            Self::Rk4 => write!(f, "RK4"),
            Self::Rkf45 => write!(f, "RKF45"),
        }
    }
}
