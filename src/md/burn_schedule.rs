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

use super::{EvaluationError, InvalidScheduleSnafu, PropulsionSnafu, SlotOutOfRangeSnafu};
use crate::cosmic::{Propulsion, PropulsionError};
use crate::linalg::Vector3;
use crate::time::{Duration, Unit};
use crate::utils::clamp_norm;
use snafu::{ensure, ResultExt};
use std::fmt;

/// Share of the ΔV budget a schedule may use, leaving room for round-off in the fuel debits.
const BUDGET_MARGIN: f64 = 1.0 - 1e-9;

/// One fixed duration slot of a burn schedule.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BurnSlot {
    /// Impulsive ΔV applied at the start of the slot, in m/s
    pub delta_v_m_s: Vector3<f64>,
    /// Fuel used by this burn in kg, null for a schedule without propulsion
    pub fuel_kg: f64,
}

/// An ordered sequence of mid-course burns, one per fixed duration slot.
///
/// The magnitude of each ΔV never exceeds `max_thrust × slot_duration / probe_mass`: every setter
/// clamps to that limit while preserving the direction.
///
/// A schedule built with [`BurnSchedule::for_propulsion`] also keeps the sum of its ΔV within what
/// the fuel on board allows, and the fuel of every slot is kept up to date.
#[derive(Clone, Debug, PartialEq)]
pub struct BurnSchedule {
    slots: Vec<BurnSlot>,
    slot_duration: Duration,
    max_delta_v_per_slot_m_s: f64,
    propulsion: Option<Propulsion>,
}

impl BurnSchedule {
    /// A schedule of `num_slots` null burns for an engine of `max_thrust_n` on a probe of `probe_mass_kg`.
    pub fn new(
        num_slots: usize,
        slot_duration: Duration,
        max_thrust_n: f64,
        probe_mass_kg: f64,
    ) -> Result<Self, EvaluationError> {
        ensure!(
            probe_mass_kg > 0.0 && probe_mass_kg.is_finite(),
            InvalidScheduleSnafu {
                reason: "the probe mass must be positive"
            }
        );
        ensure!(
            max_thrust_n >= 0.0 && max_thrust_n.is_finite(),
            InvalidScheduleSnafu {
                reason: "the maximum thrust must not be negative"
            }
        );
        ensure!(
            slot_duration > 0 * Unit::Second,
            InvalidScheduleSnafu {
                reason: "the slot duration must be positive"
            }
        );
        Ok(Self {
            slots: vec![
                BurnSlot {
                    delta_v_m_s: Vector3::zeros(),
                    fuel_kg: 0.0,
                };
                num_slots
            ],
            slot_duration,
            max_delta_v_per_slot_m_s: max_thrust_n * slot_duration.to_seconds() / probe_mass_kg,
            propulsion: None,
        })
    }

    /// A null schedule sized for the provided propulsion system, using its wet mass.
    pub fn for_propulsion(
        num_slots: usize,
        slot_duration: Duration,
        propulsion: &Propulsion,
    ) -> Result<Self, EvaluationError> {
        ensure!(
            propulsion.isp_s > 0.0 && propulsion.dry_mass_kg > 0.0 && propulsion.fuel_mass_kg >= 0.0,
            InvalidScheduleSnafu {
                reason: "the propulsion needs a positive Isp and dry mass"
            }
        );
        let mut me = Self::new(
            num_slots,
            slot_duration,
            propulsion.max_thrust_n,
            propulsion.total_mass_kg(),
        )?;
        me.propulsion = Some(*propulsion);
        Ok(me)
    }

    /// Number of slots
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[BurnSlot] {
        &self.slots
    }

    pub fn slot_duration(&self) -> Duration {
        self.slot_duration
    }

    /// Propulsion system whose fuel bounds this schedule, if any
    pub fn propulsion(&self) -> Option<&Propulsion> {
        self.propulsion.as_ref()
    }

    /// Largest ΔV magnitude of any single slot, in m/s
    pub fn max_delta_v_per_slot_m_s(&self) -> f64 {
        self.max_delta_v_per_slot_m_s
    }

    /// Largest sum of the ΔV magnitudes, in m/s: unbounded without propulsion.
    pub fn delta_v_budget_m_s(&self) -> f64 {
        self.propulsion
            .map_or(f64::INFINITY, |p| p.available_delta_v_m_s() * BUDGET_MARGIN)
    }

    pub fn delta_v_at(&self, slot: usize) -> Option<Vector3<f64>> {
        self.slots.get(slot).map(|s| s.delta_v_m_s)
    }

    /// Sets the ΔV of a slot and returns the value stored. The request is clamped to the per slot
    /// maximum, and to the part of the ΔV budget the other slots leave.
    pub fn set_delta_v_at(
        &mut self,
        slot: usize,
        delta_v_m_s: Vector3<f64>,
    ) -> Result<Vector3<f64>, EvaluationError> {
        let len = self.slots.len();
        ensure!(slot < len, SlotOutOfRangeSnafu { slot, len });
        let others_m_s = self.total_delta_v_m_s() - self.slots[slot].delta_v_m_s.norm();
        let max_m_s = self
            .max_delta_v_per_slot_m_s
            .min((self.delta_v_budget_m_s() - others_m_s).max(0.0));
        let clamped = clamp_norm(&delta_v_m_s, max_m_s);
        self.slots[slot].delta_v_m_s = clamped;
        if let Some(propulsion) = self.propulsion {
            self.update_fuel(&propulsion).context(PropulsionSnafu)?;
        }
        Ok(clamped)
    }

    /// Sum of the ΔV magnitudes of all slots, in m/s
    pub fn total_delta_v_m_s(&self) -> f64 {
        self.slots.iter().map(|s| s.delta_v_m_s.norm()).sum()
    }

    /// Number of slots times the slot duration
    pub fn total_duration(&self) -> Duration {
        self.slot_duration * self.slots.len() as f64
    }

    pub fn total_fuel_kg(&self) -> f64 {
        self.slots.iter().map(|s| s.fuel_kg).sum()
    }

    /// Computes the fuel of each slot by burning them in order with a copy of `propulsion`.
    /// Returns the total fuel, or fails if the fuel on board does not cover the whole schedule.
    pub fn update_fuel(&mut self, propulsion: &Propulsion) -> Result<f64, PropulsionError> {
        let mut engine = *propulsion;
        for slot in &mut self.slots {
            slot.fuel_kg = engine.burn(slot.delta_v_m_s.norm())?;
        }
        Ok(self.total_fuel_kg())
    }
}

impl fmt::Display for BurnSchedule {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "{} slots of {} (max {:.3} m/s each), total ΔV {:.3} m/s, fuel {:.3} kg",
            self.slots.len(),
            self.slot_duration,
            self.max_delta_v_per_slot_m_s,
            self.total_delta_v_m_s(),
            self.total_fuel_kg()
        )?;
        for (i, slot) in self.slots.iter().enumerate() {
            writeln!(
                f,
                "\t#{i}: [{:.3}, {:.3}, {:.3}] m/s ({:.3} kg)",
                slot.delta_v_m_s.x, slot.delta_v_m_s.y, slot.delta_v_m_s.z, slot.fuel_kg
            )?;
        }
        Ok(())
    }
}
