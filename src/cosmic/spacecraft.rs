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

use super::{Body, FuelExhaustedSnafu, PropulsionError, STD_GRAVITY};
use crate::linalg::Vector3;
use crate::utils::is_zero_vector;
use serde_derive::{Deserialize, Serialize};
use snafu::ensure;
use std::fmt;

/// Mass in kg of fuel needed to impart `delta_v_m_s` on a vehicle of initial mass `initial_mass_kg`
/// with an engine of specific impulse `isp_s`, from the Tsiolkovsky rocket equation.
pub fn fuel_for_delta_v(delta_v_m_s: f64, initial_mass_kg: f64, isp_s: f64) -> f64 {
    initial_mass_kg * (1.0 - (-delta_v_m_s.abs() / (isp_s * STD_GRAVITY)).exp())
}

/// The propulsion capability of a vehicle. A body without propulsion is a plain [`Body`].
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Propulsion {
    /// Maximum thrust in Newtons
    pub max_thrust_n: f64,
    /// Specific impulse in seconds
    pub isp_s: f64,
    /// in kg
    pub dry_mass_kg: f64,
    /// in kg
    pub fuel_mass_kg: f64,
}

impl Propulsion {
    pub fn total_mass_kg(&self) -> f64 {
        self.dry_mass_kg + self.fuel_mass_kg
    }

    /// Largest ΔV in m/s this engine may impart over `duration_s` on a vehicle of mass `mass_kg`,
    /// i.e. F dt / m.
    pub fn max_delta_v_m_s(&self, duration_s: f64, mass_kg: f64) -> f64 {
        self.max_thrust_n * duration_s / mass_kg
    }

    /// Total ΔV in m/s available with the current fuel load
    pub fn available_delta_v_m_s(&self) -> f64 {
        self.isp_s * STD_GRAVITY * (self.total_mass_kg() / self.dry_mass_kg).ln()
    }

    /// Debits the fuel needed for a burn of `delta_v_m_s` and returns the fuel used in kg.
    /// Fails without consuming anything if the fuel on board is insufficient.
    pub fn burn(&mut self, delta_v_m_s: f64) -> Result<f64, PropulsionError> {
        let needed_kg = fuel_for_delta_v(delta_v_m_s, self.total_mass_kg(), self.isp_s);
        ensure!(
            needed_kg <= self.fuel_mass_kg,
            FuelExhaustedSnafu {
                needed_kg,
                available_kg: self.fuel_mass_kg
            }
        );
        self.fuel_mass_kg -= needed_kg;
        Ok(needed_kg)
    }
}

impl fmt::Display for Propulsion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{:.1} N @ {:.1} s Isp, dry {:.3} kg + fuel {:.3} kg",
            self.max_thrust_n, self.isp_s, self.dry_mass_kg, self.fuel_mass_kg
        )
    }
}

/// A spacecraft is a body which can also change its own velocity.
#[derive(Clone, Debug, PartialEq)]
pub struct Spacecraft {
    pub body: Body,
    pub propulsion: Propulsion,
}

impl Spacecraft {
    /// Builds a spacecraft whose body mass is the wet mass of its propulsion system.
    pub fn new(
        name: &str,
        position_km: Vector3<f64>,
        velocity_km_s: Vector3<f64>,
        propulsion: Propulsion,
    ) -> Self {
        Self {
            body: Body::new(
                name,
                propulsion.total_mass_kg(),
                0.0,
                position_km,
                velocity_km_s,
            ),
            propulsion,
        }
    }

    /// Applies an impulsive ΔV (in m/s, inertial frame) and returns the fuel used in kg.
    pub fn impulse(&mut self, delta_v_m_s: &Vector3<f64>) -> Result<f64, PropulsionError> {
        if is_zero_vector(delta_v_m_s) {
            return Ok(0.0);
        }
        let fuel_kg = self.propulsion.burn(delta_v_m_s.norm())?;
        self.body.velocity_km_s += delta_v_m_s * 1e-3;
        self.body.mass_kg = self.propulsion.total_mass_kg();
        Ok(fuel_kg)
    }
}

impl fmt::Display for Spacecraft {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}\n\t{}", self.body, self.propulsion)
    }
}
