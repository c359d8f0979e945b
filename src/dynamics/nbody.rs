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
    Dynamics, DynamicsError, DynamicsStateDimensionSnafu, NonFiniteDerivativeSnafu,
    PinnedBodyNotFoundSnafu,
};
use crate::cosmic::{position_of, velocity_of, BodySet, GRAVITATIONAL_CONSTANT, STATE_PER_BODY};
use crate::linalg::{DVector, Vector3};
use serde_derive::{Deserialize, Serialize};
use snafu::{ensure, OptionExt};
use std::fmt;

/// Simulation wide physical constants of the N-body model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhysicsConfig {
    /// in km^3 / (kg s^2)
    pub gravitational_constant: f64,
    /// Softening length in km, added in quadrature to every inter-body distance
    pub softening_km: f64,
    /// Name of a body whose derivative is forced to zero, fixing the origin of the coordinates.
    #[serde(default)]
    pub pinned_body: Option<String>,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravitational_constant: GRAVITATIONAL_CONSTANT,
            softening_km: 1.0,
            pinned_body: None,
        }
    }
}

/// Softened Newtonian gravity between every pair of bodies of a set.
///
/// For body i, the velocity derivative is
/// Σ_{j≠i} G m_j (r_j - r_i) / (|r_j - r_i|² + ε²)^(3/2), where ε is the softening length.
/// The masses are captured when the dynamics are built, so the body count and ordering are
/// fixed for the lifetime of this object.
#[derive(Clone, Debug)]
pub struct NBodyDynamics {
    masses: Vec<f64>,
    gravitational_constant: f64,
    softening2: f64,
    pinned: Option<usize>,
}

impl NBodyDynamics {
    pub fn new(set: &BodySet, physics: &PhysicsConfig) -> Result<Self, DynamicsError> {
        let pinned = match &physics.pinned_body {
            Some(name) => Some(
                set.index_of(name)
                    .ok()
                    .context(PinnedBodyNotFoundSnafu { name: name.clone() })?,
            ),
            None => None,
        };
        Ok(Self {
            masses: set.masses(),
            gravitational_constant: physics.gravitational_constant,
            softening2: physics.softening_km.powi(2),
            pinned,
        })
    }

    /// Number of bodies these dynamics were built for
    pub fn num_bodies(&self) -> usize {
        self.masses.len()
    }

    /// Index of the pinned body, if any
    pub fn pinned(&self) -> Option<usize> {
        self.pinned
    }

    fn check_dimension(&self, state: &DVector<f64>) -> Result<(), DynamicsError> {
        let expected = STATE_PER_BODY * self.masses.len();
        ensure!(
            state.len() == expected,
            DynamicsStateDimensionSnafu {
                expected,
                got: state.len()
            }
        );
        Ok(())
    }

    /// Computes the gravitational acceleration of every body, in km/s^2.
    pub fn accelerations(&self, state: &DVector<f64>) -> Result<Vec<Vector3<f64>>, DynamicsError> {
        self.check_dimension(state)?;
        let n = self.masses.len();
        let mut accels = vec![Vector3::zeros(); n];
        // Each unordered pair is visited once: i is pulled along +r, j along -r
        for i in 0..n {
            let r_i = position_of(state, i);
            for j in (i + 1)..n {
                let r = position_of(state, j) - r_i;
                let d2 = r.norm_squared() + self.softening2;
                let inv_d = d2.sqrt().recip();
                let coef = self.gravitational_constant * inv_d * inv_d * inv_d;
                accels[i] += coef * self.masses[j] * r;
                accels[j] -= coef * self.masses[i] * r;
            }
        }
        if let Some(p) = self.pinned {
            accels[p] = Vector3::zeros();
        }
        Ok(accels)
    }

    /// Recomputes the `acceleration_km_s2` field of every body of the set.
    pub fn update_accelerations(&self, set: &mut BodySet) -> Result<(), DynamicsError> {
        let accels = self.accelerations(&set.to_state_vector())?;
        for (body, accel) in set.bodies_mut().iter_mut().zip(accels) {
            body.acceleration_km_s2 = accel;
        }
        Ok(())
    }

    /// Total mechanical energy (kinetic plus softened potential) in kg km^2/s^2.
    /// Conserved by the exact flow when no body is pinned.
    pub fn energy(&self, state: &DVector<f64>) -> Result<f64, DynamicsError> {
        self.check_dimension(state)?;
        let n = self.masses.len();
        let mut energy = 0.0;
        for i in 0..n {
            energy += 0.5 * self.masses[i] * velocity_of(state, i).norm_squared();
            let r_i = position_of(state, i);
            for j in (i + 1)..n {
                let d = ((position_of(state, j) - r_i).norm_squared() + self.softening2).sqrt();
                energy -= self.gravitational_constant * self.masses[i] * self.masses[j] / d;
            }
        }
        Ok(energy)
    }
}

impl Dynamics for NBodyDynamics {
    fn eom(&self, t: f64, state: &DVector<f64>) -> Result<DVector<f64>, DynamicsError> {
        let accels = self.accelerations(state)?;
        let mut d_x = DVector::zeros(state.len());
        for (i, accel) in accels.iter().enumerate() {
            if Some(i) == self.pinned {
                continue;
            }
            let offset = STATE_PER_BODY * i;
            d_x.fixed_rows_mut::<3>(offset)
                .copy_from(&state.fixed_rows::<3>(offset + 3));
            d_x.fixed_rows_mut::<3>(offset + 3).copy_from(accel);
        }
        ensure!(
            d_x.iter().all(|v| v.is_finite()),
            NonFiniteDerivativeSnafu { t }
        );
        Ok(d_x)
    }
}

impl fmt::Display for NBodyDynamics {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "N-body gravity ({} bodies, G = {:e}, softening = {} km{})",
            self.masses.len(),
            self.gravitational_constant,
            self.softening2.sqrt(),
            match self.pinned {
                Some(p) => format!(", body #{p} pinned"),
                None => String::new(),
            }
        )
    }
}
