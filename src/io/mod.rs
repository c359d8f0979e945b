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

use crate::cosmic::Propulsion;
use crate::dynamics::PhysicsConfig;
use crate::md::opti::{ClimbConfig, GaConfig};
use crate::md::{BurnSchedule, EvaluationError, EvaluatorConfig};
use crate::propagators::IntegratorKind;
use crate::time::{Duration, Unit};
use serde::de::DeserializeOwned;
use serde::{Deserializer, Serializer};
use serde_derive::{Deserialize, Serialize};
use snafu::prelude::*;
use std::fmt::Debug;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ConfigError {
    #[snafu(display("Failed to read configuration file: {source}"))]
    ReadError { source: std::io::Error },

    #[snafu(display("Failed to parse YAML configuration file: {source}"))]
    ParseError { source: serde_yaml::Error },

    #[snafu(display("Invalid configuration: {msg}"))]
    InvalidConfig { msg: String },
}

impl PartialEq for ConfigError {
    /// No two configuration errors match
    fn eq(&self, _other: &Self) -> bool {
        false
    }
}

pub trait ConfigRepr: Debug + Sized + serde::Serialize + DeserializeOwned {
    /// Builds the configuration representation from the path to a yaml
    fn load<P>(path: P) -> Result<Self, ConfigError>
    where
        P: AsRef<Path>,
    {
        let file = File::open(path).context(ReadSnafu)?;
        let reader = BufReader::new(file);

        serde_yaml::from_reader(reader).context(ParseSnafu)
    }

    /// Builds the configuration representation from a yaml string
    fn loads(data: &str) -> Result<Self, ConfigError> {
        debug!("Loading YAML:\n{data}");
        serde_yaml::from_str(data).context(ParseSnafu)
    }

    /// Serializes to a yaml string
    fn dumps(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self).context(ParseSnafu)
    }
}

pub(crate) fn duration_to_str<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format!("{duration}"))
}

/// A deserializer from Duration string
pub(crate) fn duration_from_str<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = <String as serde::Deserialize>::deserialize(deserializer)?;
    Duration::from_str(&s).map_err(serde::de::Error::custom)
}

/// Serializable form of [`EvaluatorConfig`], without the physics which are shared with the rest
/// of the mission.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorRepr {
    pub source: String,
    pub target: String,
    pub probe_name: String,
    pub probe_mass_kg: f64,
    #[serde(serialize_with = "duration_to_str", deserialize_with = "duration_from_str")]
    pub duration: Duration,
    #[serde(serialize_with = "duration_to_str", deserialize_with = "duration_from_str")]
    pub step: Duration,
    pub integrator: IntegratorKind,
    pub tolerance: f64,
    #[serde(serialize_with = "duration_to_str", deserialize_with = "duration_from_str")]
    pub min_step: Duration,
    #[serde(serialize_with = "duration_to_str", deserialize_with = "duration_from_str")]
    pub max_step: Duration,
}

impl Default for EvaluatorRepr {
    fn default() -> Self {
        let cfg = EvaluatorConfig::default();
        Self {
            source: cfg.source,
            target: cfg.target,
            probe_name: cfg.probe_name,
            probe_mass_kg: cfg.probe_mass_kg,
            duration: cfg.duration,
            step: cfg.step,
            integrator: cfg.integrator,
            tolerance: cfg.tolerance,
            min_step: cfg.min_step,
            max_step: cfg.max_step,
        }
    }
}

impl EvaluatorRepr {
    pub fn to_config(&self, physics: &PhysicsConfig) -> EvaluatorConfig {
        EvaluatorConfig::builder()
            .source(self.source.clone())
            .target(self.target.clone())
            .probe_name(self.probe_name.clone())
            .probe_mass_kg(self.probe_mass_kg)
            .duration(self.duration)
            .step(self.step)
            .integrator(self.integrator)
            .tolerance(self.tolerance)
            .min_step(self.min_step)
            .max_step(self.max_step)
            .physics(physics.clone())
            .build()
    }
}

/// Engine of the probe and discretization of its burn schedule.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropulsionConfig {
    pub max_thrust_n: f64,
    pub isp_s: f64,
    pub dry_mass_kg: f64,
    pub fuel_mass_kg: f64,
    pub burn_slots: usize,
    #[serde(serialize_with = "duration_to_str", deserialize_with = "duration_from_str")]
    pub slot_duration: Duration,
}

impl Default for PropulsionConfig {
    fn default() -> Self {
        Self {
            max_thrust_n: 500.0,
            isp_s: 320.0,
            dry_mass_kg: 800.0,
            fuel_mass_kg: 200.0,
            burn_slots: 10,
            slot_duration: 1.0 * Unit::Hour,
        }
    }
}

impl PropulsionConfig {
    pub fn propulsion(&self) -> Propulsion {
        Propulsion {
            max_thrust_n: self.max_thrust_n,
            isp_s: self.isp_s,
            dry_mass_kg: self.dry_mass_kg,
            fuel_mass_kg: self.fuel_mass_kg,
        }
    }

    /// A schedule of null burns, clamped for the wet mass of the probe and bounded by its fuel
    pub fn burn_schedule(&self) -> Result<BurnSchedule, EvaluationError> {
        BurnSchedule::for_propulsion(self.burn_slots, self.slot_duration, &self.propulsion())
    }
}

/// Every tunable parameter of a mission search.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MissionConfig {
    pub physics: PhysicsConfig,
    pub evaluator: EvaluatorRepr,
    pub ga: GaConfig,
    pub climb: ClimbConfig,
    pub propulsion: PropulsionConfig,
}

impl ConfigRepr for MissionConfig {}

fn invalid(msg: String) -> ConfigError {
    ConfigError::InvalidConfig { msg }
}

impl MissionConfig {
    /// Rejects the settings which cannot describe a search.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let physics = &self.physics;
        ensure!(
            physics.gravitational_constant > 0.0,
            InvalidConfigSnafu {
                msg: format!(
                    "gravitational constant must be positive, got {}",
                    physics.gravitational_constant
                )
            }
        );
        ensure!(
            physics.softening_km >= 0.0,
            InvalidConfigSnafu {
                msg: format!("softening must not be negative, got {} km", physics.softening_km)
            }
        );

        let eval = &self.evaluator;
        ensure!(
            eval.probe_mass_kg > 0.0,
            InvalidConfigSnafu {
                msg: format!("probe mass must be positive, got {} kg", eval.probe_mass_kg)
            }
        );
        for (name, value) in [
            ("duration", eval.duration),
            ("step", eval.step),
            ("min_step", eval.min_step),
            ("max_step", eval.max_step),
        ] {
            ensure!(
                value > 0 * Unit::Second,
                InvalidConfigSnafu {
                    msg: format!("{name} must be positive, got {value}")
                }
            );
        }
        ensure!(
            eval.min_step <= eval.max_step,
            InvalidConfigSnafu {
                msg: format!(
                    "min_step {} exceeds max_step {}",
                    eval.min_step, eval.max_step
                )
            }
        );
        ensure!(
            eval.tolerance > 0.0,
            InvalidConfigSnafu {
                msg: format!("tolerance must be positive, got {}", eval.tolerance)
            }
        );

        self.ga.validate().map_err(|e| invalid(e.to_string()))?;
        self.climb.validate().map_err(|e| invalid(e.to_string()))?;

        let prop = &self.propulsion;
        for (name, value) in [
            ("max_thrust_n", prop.max_thrust_n),
            ("isp_s", prop.isp_s),
            ("dry_mass_kg", prop.dry_mass_kg),
        ] {
            ensure!(
                value > 0.0,
                InvalidConfigSnafu {
                    msg: format!("{name} must be positive, got {value}")
                }
            );
        }
        ensure!(
            prop.fuel_mass_kg >= 0.0,
            InvalidConfigSnafu {
                msg: format!("fuel mass must not be negative, got {} kg", prop.fuel_mass_kg)
            }
        );
        ensure!(
            prop.burn_slots > 0 && prop.slot_duration > 0 * Unit::Second,
            InvalidConfigSnafu {
                msg: "a burn schedule needs at least one slot of positive duration".to_string()
            }
        );
        Ok(())
    }

    /// Validates the whole configuration and builds the evaluator setup.
    pub fn evaluator_config(&self) -> Result<EvaluatorConfig, ConfigError> {
        self.validate()?;
        Ok(self.evaluator.to_config(&self.physics))
    }
}
