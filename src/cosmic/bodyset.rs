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

use super::{
    Body, BodyNotFoundSnafu, DuplicateBodySnafu, EmptySetSnafu, InvalidMassSnafu,
    StateDimensionSnafu, SystemError,
};
use crate::linalg::{DVector, Vector3};
use snafu::{ensure, OptionExt};
use std::fmt;

/// Number of state vector entries per body: position then velocity.
pub const STATE_PER_BODY: usize = 6;

/// The set of bodies taking part in one integration run.
///
/// The ordering of the bodies is the ordering of the flattened state vector: body `i` owns the
/// entries `6*i .. 6*i + 6`, position first. A set is deep-cloned from the canonical table for each
/// evaluation and is never shared between two concurrent evaluations.
#[derive(Clone, Debug, PartialEq)]
pub struct BodySet {
    bodies: Vec<Body>,
}

impl BodySet {
    /// Builds a new set, ensuring that names are unique and masses are positive.
    pub fn new(bodies: Vec<Body>) -> Result<Self, SystemError> {
        let mut me = Self {
            bodies: Vec::with_capacity(bodies.len() + 1),
        };
        for body in bodies {
            me.push(body)?;
        }
        ensure!(!me.bodies.is_empty(), EmptySetSnafu);
        Ok(me)
    }

    /// Adds a body at the end of the set. Must not be called during an integration run.
    pub fn push(&mut self, body: Body) -> Result<usize, SystemError> {
        ensure!(
            !self.bodies.iter().any(|b| b.name == body.name),
            DuplicateBodySnafu {
                name: body.name.clone()
            }
        );
        ensure!(
            body.mass_kg > 0.0 && body.mass_kg.is_finite(),
            InvalidMassSnafu {
                name: body.name.clone(),
                mass_kg: body.mass_kg
            }
        );
        self.bodies.push(body);
        Ok(self.bodies.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn bodies_mut(&mut self) -> &mut [Body] {
        &mut self.bodies
    }

    /// Index of the body with the provided name, which is also its block in the state vector.
    pub fn index_of(&self, name: &str) -> Result<usize, SystemError> {
        self.bodies
            .iter()
            .position(|b| b.name == name)
            .context(BodyNotFoundSnafu { name })
    }

    pub fn get(&self, name: &str) -> Result<&Body, SystemError> {
        let idx = self.index_of(name)?;
        Ok(&self.bodies[idx])
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut Body, SystemError> {
        let idx = self.index_of(name)?;
        Ok(&mut self.bodies[idx])
    }

    pub fn masses(&self) -> Vec<f64> {
        self.bodies.iter().map(|b| b.mass_kg).collect()
    }

    /// Flattens the positions and velocities of all bodies.
    pub fn to_state_vector(&self) -> DVector<f64> {
        let mut state = DVector::zeros(STATE_PER_BODY * self.bodies.len());
        for (i, body) in self.bodies.iter().enumerate() {
            let offset = STATE_PER_BODY * i;
            state
                .fixed_rows_mut::<3>(offset)
                .copy_from(&body.position_km);
            state
                .fixed_rows_mut::<3>(offset + 3)
                .copy_from(&body.velocity_km_s);
        }
        state
    }

    /// Copies the flattened state back into the bodies, in the same order as `to_state_vector`.
    pub fn set_state_vector(&mut self, state: &DVector<f64>) -> Result<(), SystemError> {
        let expected = STATE_PER_BODY * self.bodies.len();
        ensure!(
            state.len() == expected,
            StateDimensionSnafu {
                expected,
                got: state.len()
            }
        );
        for (i, body) in self.bodies.iter_mut().enumerate() {
            body.position_km = position_of(state, i);
            body.velocity_km_s = velocity_of(state, i);
        }
        Ok(())
    }

    /// Distance in km between two bodies of this set
    pub fn distance_between(&self, a: &str, b: &str) -> Result<f64, SystemError> {
        Ok(self.get(a)?.distance_to(self.get(b)?))
    }

    /// Returns the body names in state vector order
    pub fn names(&self) -> Vec<&str> {
        self.bodies.iter().map(|b| b.name.as_str()).collect()
    }
}

/// Position of the body at index `i` in a flattened state vector
pub fn position_of(state: &DVector<f64>, i: usize) -> Vector3<f64> {
    state.fixed_rows::<3>(STATE_PER_BODY * i).into_owned()
}

/// Velocity of the body at index `i` in a flattened state vector
pub fn velocity_of(state: &DVector<f64>, i: usize) -> Vector3<f64> {
    state.fixed_rows::<3>(STATE_PER_BODY * i + 3).into_owned()
}

impl fmt::Display for BodySet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Body set with {} bodies", self.bodies.len())?;
        for body in &self.bodies {
            writeln!(f, "\t{body}")?;
        }
        Ok(())
    }
}
