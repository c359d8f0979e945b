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

use super::RK;

/// `Euler` is the explicit forward Euler method: y_{n+1} = y_n + h f(t_n, y_n).
///
/// First order and without error estimate, it is mostly a baseline for the other methods.
pub struct Euler {}

impl RK for Euler {
    const ORDER: u8 = 1;
    const STAGES: usize = 1;
    const A_COEFFS: &'static [f64] = &[];
    const B_COEFFS: &'static [f64] = &[1.0];
}

/// `RK4` is the classical fixed step fourth order [Runge Kutta](https://en.wikipedia.org/wiki/Runge%E2%80%93Kutta_methods) method.
#[allow(clippy::upper_case_acronyms)]
pub struct RK4 {}

impl RK for RK4 {
    const ORDER: u8 = 4;
    const STAGES: usize = 4;
    const A_COEFFS: &'static [f64] = &[0.5, 0.0, 0.5, 0.0, 0.0, 1.0];
    const B_COEFFS: &'static [f64] = &[1.0 / 6.0, 1.0 / 3.0, 1.0 / 3.0, 1.0 / 6.0];
}
