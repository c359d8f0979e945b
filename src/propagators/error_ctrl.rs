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

use crate::linalg::DVector;

// This determines when to take into consideration the magnitude of the state_delta -- prevents dividing by too small of a number.
const REL_ERR_THRESH: f64 = 0.1;

/// The Error Control trait manages how a propagator computes the error in the current step.
pub trait ErrorCtrl: Copy + Send + Sync {
    /// Computes the actual error of the current step.
    ///
    /// The `error_est` is the estimated error computed from the difference in the two stages of
    /// of the RK propagator. The `candidate` variable is the candidate state, and `cur_state` is
    /// the current state. This function must return the error.
    fn estimate(error_est: &DVector<f64>, candidate: &DVector<f64>, cur_state: &DVector<f64>)
        -> f64;
}

/// The root mean square of the difference between the embedded solutions. When in doubt, use this one.
///
/// This is an absolute error: the tolerance is in the units of the state (km and km/s for the
/// N-body dynamics).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RmsError;

impl ErrorCtrl for RmsError {
    fn estimate(error_est: &DVector<f64>, _candidate: &DVector<f64>, _cur_state: &DVector<f64>) -> f64 {
        if error_est.is_empty() {
            return 0.0;
        }
        (error_est.norm_squared() / error_est.len() as f64).sqrt()
    }
}

/// A largest error control which effectively computes the largest error at each component
///
/// This is a standard error computation algorithm, but it's arguably bad if the state's components have different units.
/// It calculates the largest local estimate of the error from the integration (`error_est`)
/// given the difference in the candidate state and the previous state (`state_delta`).
/// This error estimator is from the physical model estimator of GMAT
/// [PhysicalModel.cpp](https://github.com/ChristopherRabotin/GMAT/blob/37201a6290e7f7b941bc98ee973a527a5857104b/src/base/forcemodel/PhysicalModel.cpp#L987)
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LargestError;

impl ErrorCtrl for LargestError {
    fn estimate(error_est: &DVector<f64>, candidate: &DVector<f64>, cur_state: &DVector<f64>) -> f64 {
        let state_delta = candidate - cur_state;
        let mut max_err = 0.0;
        for (i, prop_err_i) in error_est.iter().enumerate() {
            let err = if state_delta[i].abs() > REL_ERR_THRESH {
                (prop_err_i / state_delta[i]).abs()
            } else {
                prop_err_i.abs()
            };
            if err > max_err {
                max_err = err;
            }
        }
        max_err
    }
}
