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

mod body;
pub use self::body::*;

mod bodyset;
pub use self::bodyset::*;

/// The canonical solar system table.
pub mod planets;

mod spacecraft;
pub use self::spacecraft::*;

/// Errors on the structure of a simulation set.
#[derive(Debug, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SystemError {
    #[snafu(display("body `{name}` is defined more than once"))]
    DuplicateBody { name: String },
    #[snafu(display("body `{name}` not found in the simulation set"))]
    BodyNotFound { name: String },
    #[snafu(display("body `{name}` has an invalid mass of {mass_kg} kg"))]
    InvalidMass { name: String, mass_kg: f64 },
    #[snafu(display("state vector has {got} entries but the set requires {expected}"))]
    StateDimension { expected: usize, got: usize },
    #[snafu(display("a simulation set requires at least one body"))]
    EmptySet,
}

/// Errors of the propulsion system.
#[derive(Debug, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum PropulsionError {
    #[snafu(display("burn requires {needed_kg:.3} kg of fuel but only {available_kg:.3} kg remain"))]
    FuelExhausted { needed_kg: f64, available_kg: f64 },
}

/// Astronomical unit, in kilometers, according to the [IAU](https://www.iau.org/public/themes/measuring/).
pub const AU: f64 = 149_597_870.700;

/// From NIST special publication 330, 2008 edition, in meters per second squared
pub const STD_GRAVITY: f64 = 9.80665;

/// Newtonian constant of gravitation (CODATA 2018) in km^3 / (kg s^2)
pub const GRAVITATIONAL_CONSTANT: f64 = 6.674_30e-20;

/// Number of seconds in a Julian year
pub const SECONDS_PER_YEAR: f64 = 365.25 * 86_400.0;
