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

use super::EvaluationError;
use snafu::prelude::*;

/// Cost functions of a burn schedule, lower is better.
pub mod cost;
pub use cost::*;

/// Genetic algorithm over the launch conditions.
pub mod genetic;
pub use genetic::*;

/// Hill climbing over a burn schedule.
pub mod hill_climb;
pub use hill_climb::*;

/// Errors which abort a search run.
#[derive(Debug, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SearchError {
    #[snafu(display("evaluation failed: {source}"))]
    Evaluation { source: EvaluationError },
    #[snafu(display("invalid search setting `{setting}`: {reason}"))]
    InvalidSetting {
        setting: &'static str,
        reason: String,
    },
    #[snafu(display("cannot climb an empty burn schedule"))]
    EmptySchedule,
}
