//! Derivation of the per-run constants from a scenario.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Series resistance used by `Scenario::Lossy` when none is given.
pub const DEFAULT_SERIES_RESISTANCE: f32 = 0.05;
/// Dispersion coefficient used by `Scenario::Dispersive` when none is given.
pub const DEFAULT_DISPERSION: f32 = 0.5;

/// Selects how the line is loaded and which non-ideal effects are simulated.
///
/// In a config file this is a table with a `kind` key plus the override of
/// that kind, if any. Overrides that do not belong to the kind are rejected.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ScenarioTable", into = "ScenarioTable")]
pub enum Scenario {
    /// Shorted far end. Produces a standing wave.
    #[default]
    ShortCircuit,
    /// Far end loaded with the characteristic impedance. No reflection.
    MatchedLoad,
    /// Shorted far end with distributed series resistance.
    Lossy { resistance: f32 },
    /// Shorted far end with L and C evaluated at the drive frequency.
    Dispersive { alpha: f32 },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ScenarioKind {
    ShortCircuit,
    MatchedLoad,
    Lossy,
    Dispersive,
}

/// The on-disk form of a `Scenario`.
#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ScenarioTable {
    kind: ScenarioKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    resistance: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    alpha: Option<f32>,
}

impl TryFrom<ScenarioTable> for Scenario {
    type Error = String;

    fn try_from(table: ScenarioTable) -> Result<Self, Self::Error> {
        let scenario = match (table.kind, table.resistance, table.alpha) {
            (ScenarioKind::ShortCircuit, None, None) => Scenario::ShortCircuit,
            (ScenarioKind::MatchedLoad, None, None) => Scenario::MatchedLoad,
            (ScenarioKind::Lossy, resistance, None) => Scenario::Lossy {
                resistance: resistance.unwrap_or(DEFAULT_SERIES_RESISTANCE),
            },
            (ScenarioKind::Dispersive, None, alpha) => Scenario::Dispersive {
                alpha: alpha.unwrap_or(DEFAULT_DISPERSION),
            },
            (kind, resistance, alpha) => {
                let key = if resistance.is_some() && kind != ScenarioKind::Lossy {
                    "resistance"
                } else {
                    "alpha"
                };
                return Err(format!("`{}` does not apply to scenario kind {:?}", key, kind));
            }
        };
        Ok(scenario)
    }
}

impl From<Scenario> for ScenarioTable {
    fn from(scenario: Scenario) -> Self {
        let (kind, resistance, alpha) = match scenario {
            Scenario::ShortCircuit => (ScenarioKind::ShortCircuit, None, None),
            Scenario::MatchedLoad => (ScenarioKind::MatchedLoad, None, None),
            Scenario::Lossy { resistance } => (ScenarioKind::Lossy, Some(resistance), None),
            Scenario::Dispersive { alpha } => (ScenarioKind::Dispersive, None, Some(alpha)),
        };
        Self { kind, resistance, alpha }
    }
}

impl Scenario {
    /// Looks up a scenario by its numeric id (1 through 4), using default overrides.
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Scenario::ShortCircuit),
            2 => Some(Scenario::MatchedLoad),
            3 => Some(Scenario::Lossy { resistance: DEFAULT_SERIES_RESISTANCE }),
            4 => Some(Scenario::Dispersive { alpha: DEFAULT_DISPERSION }),
            _ => None,
        }
    }

    pub fn id(&self) -> u8 {
        match self {
            Scenario::ShortCircuit => 1,
            Scenario::MatchedLoad => 2,
            Scenario::Lossy { .. } => 3,
            Scenario::Dispersive { .. } => 4,
        }
    }

    /// The dispersion coefficient carried by the scenario, zero if non-dispersive.
    pub fn dispersion(&self) -> f32 {
        match *self {
            Scenario::Dispersive { alpha } => alpha,
            _ => 0.0,
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scenario::ShortCircuit => write!(f, "short circuit"),
            Scenario::MatchedLoad => write!(f, "matched load"),
            Scenario::Lossy { resistance } => write!(f, "lossy (r = {})", resistance),
            Scenario::Dispersive { alpha } => write!(f, "dispersive (alpha = {})", alpha),
        }
    }
}

/// Line constants before the scenario is applied.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BaseConstants {
    /// Per-unit-length inductance.
    pub inductance: f32,
    /// Per-unit-length capacitance.
    pub capacitance: f32,
    /// Angular frequency of the drive.
    pub angular_frequency: f32,
    /// Fraction of the stability limit used as the time step.
    pub stability_margin: f32,
}

impl Default for BaseConstants {
    fn default() -> Self {
        Self {
            inductance: 1.0,
            capacitance: 0.01,
            angular_frequency: 0.2,
            stability_margin: 0.9,
        }
    }
}

/// The resolved constants of a run. Never changes once a simulation is built.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SimulationParameters {
    /// Per-unit-length inductance at the drive frequency.
    pub inductance: f32,
    /// Per-unit-length capacitance at the drive frequency.
    pub capacitance: f32,
    /// Characteristic impedance `sqrt(L / C)`.
    pub impedance: f32,
    /// Resistance of the load at the far end.
    pub load_resistance: f32,
    /// Distributed series resistance.
    pub series_resistance: f32,
    /// The length of each temporal step in the simulation.
    pub delta_t: f32,
}

impl SimulationParameters {
    /// Ratio of the time step to the stability limit `sqrt(L * C)`.
    pub fn courant_number(&self) -> f32 {
        self.delta_t / f32::sqrt(self.inductance * self.capacitance)
    }

    /// Fails if the time step exceeds the stability limit.
    ///
    /// Nothing in the stepping core calls this; unstable parameters simply diverge.
    pub fn check_stability(&self) -> Result<(), Error> {
        let courant = self.courant_number();
        if courant.is_finite() && courant <= 1.0 {
            Ok(())
        } else {
            Err(Error::Unstable { courant })
        }
    }
}

/// Resolves a scenario into the constants of a run.
///
/// The effective inductance and capacitance are evaluated first, since the matched
/// load and the time step both depend on them.
pub fn resolve(scenario: &Scenario, base: &BaseConstants) -> SimulationParameters {
    let w = base.angular_frequency;
    let scale = 1.0 + scenario.dispersion() * w.powi(2);
    let inductance = base.inductance * scale;
    let capacitance = base.capacitance * scale;
    let impedance = f32::sqrt(inductance / capacitance);

    let (load_resistance, series_resistance) = match *scenario {
        Scenario::ShortCircuit => (0.0, 0.0),
        Scenario::MatchedLoad => (impedance, 0.0),
        Scenario::Lossy { resistance } => (0.0, resistance),
        Scenario::Dispersive { .. } => (0.0, 0.0),
    };

    let delta_t = base.stability_margin * f32::sqrt(inductance * capacitance);

    SimulationParameters {
        inductance,
        capacitance,
        impedance,
        load_resistance,
        series_resistance,
        delta_t,
    }
}
