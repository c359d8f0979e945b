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

use super::{Dynamics, DynamicsError, DynamicsStateDimensionSnafu, NonFiniteDerivativeSnafu};
use crate::linalg::{DVector, Vector3};
use snafu::ensure;

/// Point mass gravity of a single central body fixed at the origin, acting on a 6 element
/// position and velocity state.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TwoBody {
    /// Gravitational parameter of the central body in km^3/s^2
    pub gm: f64,
}

impl TwoBody {
    pub fn new(gm: f64) -> Self {
        Self { gm }
    }
}

impl Dynamics for TwoBody {
    fn eom(&self, t: f64, state: &DVector<f64>) -> Result<DVector<f64>, DynamicsError> {
        ensure!(
            state.len() == 6,
            DynamicsStateDimensionSnafu {
                expected: 6_usize,
                got: state.len()
            }
        );
        let radius: Vector3<f64> = state.fixed_rows::<3>(0).into_owned();
        let body_acceleration = (-self.gm / radius.norm().powi(3)) * radius;
        ensure!(
            body_acceleration.iter().all(|v| v.is_finite()),
            NonFiniteDerivativeSnafu { t }
        );
        Ok(DVector::from_iterator(
            6,
            state
                .fixed_rows::<3>(3)
                .iter()
                .chain(body_acceleration.iter())
                .cloned(),
        ))
    }
}

/// Osculating elements used to judge an orbit insertion, computed from a position (km) and a
/// velocity (km/s) relative to a central body of gravitational parameter `gm`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Osculating {
    /// Specific orbital energy in km^2/s^2
    pub energy_km2_s2: f64,
    /// Semi major axis in km, only meaningful for bound orbits
    pub sma_km: f64,
    pub ecc: f64,
    /// Current distance to the central body in km
    pub rmag_km: f64,
}

impl Osculating {
    pub fn new(gm: f64, radius_km: &Vector3<f64>, velocity_km_s: &Vector3<f64>) -> Self {
        let rmag_km = radius_km.norm();
        let vmag = velocity_km_s.norm();
        let energy_km2_s2 = 0.5 * vmag.powi(2) - gm / rmag_km;
        let sma_km = -gm / (2.0 * energy_km2_s2);
        let ecc_vec = ((vmag.powi(2) - gm / rmag_km) * radius_km
            - radius_km.dot(velocity_km_s) * velocity_km_s)
            / gm;
        Self {
            energy_km2_s2,
            sma_km,
            ecc: ecc_vec.norm(),
            rmag_km,
        }
    }

    /// Whether the orbit is closed about the central body
    pub fn is_bound(&self) -> bool {
        self.energy_km2_s2 < 0.0
    }
}
