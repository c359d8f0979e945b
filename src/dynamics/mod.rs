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

use crate::linalg::DVector;
use snafu::prelude::*;

/// Softened Newtonian N-body gravity over a flattened body set state.
pub mod nbody;
pub use self::nbody::*;

/// Point mass two body dynamics, used for cheap local models about a single body.
pub mod twobody;
pub use self::twobody::*;

/// A trait for models with equations of motion that can be integrated.
///
/// The state is a flat vector whose layout is defined by the implementor. Any closure of the form
/// `Fn(f64, &DVector<f64>) -> DVector<f64>` is also a `Dynamics`, which is how simple ODEs are
/// handed to the propagators.
pub trait Dynamics: Send + Sync {
    /// Defines the equations of motion.
    ///
    /// - `t`: time in seconds since the start of the integration.
    /// - `state`: the state vector, which changes at each integration stage.
    fn eom(&self, t: f64, state: &DVector<f64>) -> Result<DVector<f64>, DynamicsError>;
}

impl<F> Dynamics for F
where
    F: Fn(f64, &DVector<f64>) -> DVector<f64> + Send + Sync,
{
    fn eom(&self, t: f64, state: &DVector<f64>) -> Result<DVector<f64>, DynamicsError> {
        Ok(self(t, state))
    }
}

/// Dynamical model errors.
#[derive(Debug, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum DynamicsError {
    #[snafu(display("state vector has {got} entries but the dynamics require {expected}"))]
    DynamicsStateDimension { expected: usize, got: usize },
    #[snafu(display("pinned body `{name}` is not part of the simulation set"))]
    PinnedBodyNotFound { name: String },
    #[snafu(display("dynamics produced a non finite derivative at t = {t} s"))]
    NonFiniteDerivative { t: f64 },
}
