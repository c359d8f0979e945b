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

/*! # moonshot

Searches for spacecraft trajectories that insert a probe into orbit around a target moon.

Every candidate trajectory is scored by a full N-body propagation of a cloned solar system,
which makes the propagators and the force model the hot path of both searches:
a genetic algorithm over launch conditions, and a hill climber over a schedule of mid-course burns.
*/

/// Provides the fixed step (Euler, RK4) and adaptive step (RKF45) propagators.
pub mod propagators;

/// Provides the equations of motion: softened N-body gravity and point mass two body dynamics.
pub mod dynamics;

/// Provides the bodies, the simulation sets, the canonical solar system table and spacecraft propulsion.
pub mod cosmic;

/// Mission design: trajectory evaluation, burn schedules, and the genetic and hill climbing searches.
pub mod md;

/// Configuration of a mission search, loadable from YAML.
pub mod io;

/// Vector helpers used throughout, including the zero vector sentinel for degenerate directions.
pub mod utils;

#[macro_use]
extern crate log;
extern crate hifitime;
extern crate nalgebra as na;

/// Re-export of hifitime
pub mod time {
    pub use hifitime::*;
}

/// Re-export nalgebra
pub mod linalg {
    pub use na::base::*;
}

/// Re-export some useful things
pub use self::cosmic::{Body, BodySet, Propulsion, Spacecraft};
pub use self::md::{BurnSchedule, TrajectoryEvaluator};
