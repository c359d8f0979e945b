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
use rand::Rng;
use rand_distr::{Distribution, UnitSphere};

/// Below this norm, a vector has no usable direction.
pub const DEGENERATE_NORM: f64 = 1e-12;

/// Returns the unit vector of `v`, or the zero vector if `v` has (nearly) no magnitude.
///
/// The zero vector is the sentinel for a degenerate direction: callers must check it with
/// [`is_zero_vector`] before using the result as a direction.
pub fn unit_vector_or_zero(v: &Vector3<f64>) -> Vector3<f64> {
    let norm = v.norm();
    if norm < DEGENERATE_NORM || !norm.is_finite() {
        Vector3::zeros()
    } else {
        v / norm
    }
}

/// Returns whether this vector is the degenerate direction sentinel (or is otherwise null).
pub fn is_zero_vector(v: &Vector3<f64>) -> bool {
    v.norm() < DEGENERATE_NORM
}

/// Distance between two points.
pub fn distance(a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    (a - b).norm()
}

/// Scales `v` down such that its norm does not exceed `max_norm`, keeping its direction.
/// Vectors already within the limit are returned unchanged.
pub fn clamp_norm(v: &Vector3<f64>, max_norm: f64) -> Vector3<f64> {
    let norm = v.norm();
    if norm > max_norm {
        let dir = unit_vector_or_zero(v);
        dir * max_norm
    } else {
        *v
    }
}

/// Converts a vector to (radius, polar angle θ from +Z, azimuth φ from +X), angles in radians.
pub fn cartesian_to_spherical(v: &Vector3<f64>) -> (f64, f64, f64) {
    let r = v.norm();
    if r < DEGENERATE_NORM {
        return (0.0, 0.0, 0.0);
    }
    let theta = (v.z / r).clamp(-1.0, 1.0).acos();
    let phi = v.y.atan2(v.x);
    (r, theta, phi)
}

/// Converts (radius, polar angle θ from +Z, azimuth φ from +X) to a cartesian vector.
pub fn spherical_to_cartesian(r: f64, theta: f64, phi: f64) -> Vector3<f64> {
    let (st, ct) = theta.sin_cos();
    let (sp, cp) = phi.sin_cos();
    Vector3::new(r * st * cp, r * st * sp, r * ct)
}

/// Draws a direction uniformly distributed on the unit sphere.
pub fn random_unit_vector<R: Rng + ?Sized>(rng: &mut R) -> Vector3<f64> {
    let [x, y, z]: [f64; 3] = UnitSphere.sample(rng);
    Vector3::new(x, y, z)
}

/// Draws a vector with a uniformly random direction and a magnitude uniform in `[0, max_norm]`.
pub fn random_vector_within<R: Rng + ?Sized>(rng: &mut R, max_norm: f64) -> Vector3<f64> {
    random_unit_vector(rng) * rng.gen_range(0.0..=max_norm)
}
