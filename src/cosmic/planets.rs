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

use super::{Body, BodySet, SystemError, AU};
use crate::linalg::Vector3;

/// Name of the primary of the canonical table
pub const SUN: &str = "Sun";
pub const EARTH: &str = "Earth";
pub const MOON: &str = "Moon";

/// (name, mass in kg, mean radius in km, semi major axis in AU, mean longitude in degrees)
const PLANETS: [(&str, f64, f64, f64, f64); 8] = [
    ("Mercury", 3.3011e23, 2_439.7, 0.387_098, 252.25),
    ("Venus", 4.8675e24, 6_051.8, 0.723_332, 181.98),
    (EARTH, 5.972_17e24, 6_371.0, 1.000_001, 100.46),
    ("Mars", 6.4171e23, 3_389.5, 1.523_679, 355.45),
    ("Jupiter", 1.898_19e27, 69_911.0, 5.204_4, 34.40),
    ("Saturn", 5.6834e26, 58_232.0, 9.582_6, 49.94),
    ("Uranus", 8.6813e25, 25_362.0, 19.218_4, 313.23),
    ("Neptune", 1.024_09e26, 24_622.0, 30.11, 304.88),
];

const SUN_MASS_KG: f64 = 1.988_47e30;
const SUN_RADIUS_KM: f64 = 695_700.0;
const MOON_MASS_KG: f64 = 7.342e22;
const MOON_RADIUS_KM: f64 = 1_737.4;
/// Mean Earth Moon distance
pub const MOON_DISTANCE_KM: f64 = 384_400.0;
const MOON_LONGITUDE_DEG: f64 = 218.32;

/// State of a body on a circular orbit of radius `radius_km` in the XY plane about a primary of
/// standard gravitational parameter `gm`, at the provided longitude.
fn circular_state(gm: f64, radius_km: f64, longitude_deg: f64) -> (Vector3<f64>, Vector3<f64>) {
    let (sin_l, cos_l) = longitude_deg.to_radians().sin_cos();
    let speed = (gm / radius_km).sqrt();
    (
        Vector3::new(radius_km * cos_l, radius_km * sin_l, 0.0),
        Vector3::new(-speed * sin_l, speed * cos_l, 0.0),
    )
}

/// The canonical solar system table: the Sun at the origin, the eight planets on circular
/// coplanar orbits at their J2000 mean longitudes, and the Moon on a circular orbit about the Earth.
///
/// This is a mission design approximation, not an ephemeris.
pub fn solar_system(gravitational_constant: f64) -> Result<BodySet, SystemError> {
    let sun_gm = gravitational_constant * SUN_MASS_KG;
    let mut bodies = vec![Body::new(
        SUN,
        SUN_MASS_KG,
        SUN_RADIUS_KM,
        Vector3::zeros(),
        Vector3::zeros(),
    )];

    for (name, mass_kg, radius_km, sma_au, longitude_deg) in PLANETS {
        let (position_km, velocity_km_s) = circular_state(
            sun_gm + gravitational_constant * mass_kg,
            sma_au * AU,
            longitude_deg,
        );
        bodies.push(Body::new(name, mass_kg, radius_km, position_km, velocity_km_s));
        if name == EARTH {
            let (rel_pos, rel_vel) = circular_state(
                gravitational_constant * (mass_kg + MOON_MASS_KG),
                MOON_DISTANCE_KM,
                MOON_LONGITUDE_DEG,
            );
            bodies.push(Body::new(
                MOON,
                MOON_MASS_KG,
                MOON_RADIUS_KM,
                position_km + rel_pos,
                velocity_km_s + rel_vel,
            ));
        }
    }

    BodySet::new(bodies)
}

/// The Earth and the Moon alone, Earth at the origin. Much cheaper to propagate than the full
/// solar system, and sufficient for cislunar transfers over a few days.
pub fn earth_moon(gravitational_constant: f64) -> Result<BodySet, SystemError> {
    let (_, earth_mass, earth_radius, _, _) = PLANETS[2];
    let (moon_pos, moon_vel) = circular_state(
        gravitational_constant * (earth_mass + MOON_MASS_KG),
        MOON_DISTANCE_KM,
        0.0,
    );
    BodySet::new(vec![
        Body::new(
            EARTH,
            earth_mass,
            earth_radius,
            Vector3::zeros(),
            Vector3::zeros(),
        ),
        Body::new(MOON, MOON_MASS_KG, MOON_RADIUS_KM, moon_pos, moon_vel),
    ])
}

#[cfg(test)]
mod ut_planets {
    use super::*;
    use crate::cosmic::GRAVITATIONAL_CONSTANT;
    use approx::assert_relative_eq;

    #[test]
    fn canonical_table() {
        let table = solar_system(GRAVITATIONAL_CONSTANT).unwrap();
        assert_eq!(table.len(), 10);
        assert_eq!(table.index_of(SUN).unwrap(), 0);
        let earth = table.get(EARTH).unwrap();
        let moon = table.get(MOON).unwrap();
        assert_relative_eq!(moon.distance_to(earth), MOON_DISTANCE_KM, max_relative = 1e-9);
        // Earth orbital speed is about 29.8 km/s
        assert_relative_eq!(earth.velocity_km_s.norm(), 29.78, max_relative = 1e-2);
        // Lunar orbital speed relative to the Earth is about 1.02 km/s
        assert_relative_eq!(
            moon.relative_velocity(earth).norm(),
            1.024,
            max_relative = 1e-2
        );
    }
}
