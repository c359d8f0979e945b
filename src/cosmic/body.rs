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

use crate::linalg::Vector3;
use crate::utils::distance;
use std::fmt;

/// A point mass taking part in a simulation.
///
/// Units are kilometers, kilometers per second and kilograms. The acceleration is derived:
/// it is only meaningful right after the dynamics have been evaluated on the set holding this body.
#[derive(Clone, Debug, PartialEq)]
pub struct Body {
    /// Unique within a simulation set
    pub name: String,
    /// in kg
    pub mass_kg: f64,
    /// Mean radius in km, defines the launch surface of a source body. May be zero for a probe.
    pub radius_km: f64,
    /// in km
    pub position_km: Vector3<f64>,
    /// in km/s
    pub velocity_km_s: Vector3<f64>,
    /// in km/s^2, recomputed every step
    pub acceleration_km_s2: Vector3<f64>,
}

impl Body {
    pub fn new(
        name: &str,
        mass_kg: f64,
        radius_km: f64,
        position_km: Vector3<f64>,
        velocity_km_s: Vector3<f64>,
    ) -> Self {
        Self {
            name: name.to_string(),
            mass_kg,
            radius_km,
            position_km,
            velocity_km_s,
            acceleration_km_s2: Vector3::zeros(),
        }
    }

    /// Distance in km between the centers of both bodies
    pub fn distance_to(&self, other: &Self) -> f64 {
        distance(&self.position_km, &other.position_km)
    }

    /// Position of `self` relative to `other`
    pub fn relative_position(&self, other: &Self) -> Vector3<f64> {
        self.position_km - other.position_km
    }

    /// Velocity of `self` relative to `other`
    pub fn relative_velocity(&self, other: &Self) -> Vector3<f64> {
        self.velocity_km_s - other.velocity_km_s
    }

    /// Standard gravitational parameter in km^3/s^2 given the gravitational constant in km^3/(kg s^2)
    pub fn gm(&self, gravitational_constant: f64) -> f64 {
        gravitational_constant * self.mass_kg
    }
}

impl fmt::Display for Body {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} ({:.3e} kg)\tr = [{:.3}, {:.3}, {:.3}] km\tv = [{:.6}, {:.6}, {:.6}] km/s",
            self.name,
            self.mass_kg,
            self.position_km.x,
            self.position_km.y,
            self.position_km.z,
            self.velocity_km_s.x,
            self.velocity_km_s.y,
            self.velocity_km_s.z,
        )
    }
}
