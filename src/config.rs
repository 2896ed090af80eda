//! Scenario configuration, read from TOML.
//!
//! Every field is optional; missing fields take the values of the reference
//! setup (200 segments, `L0 = 1`, `C0 = 0.01`, `w = 0.2`, shorted end).
//!
//! ```toml
//! npoints = 200
//! angular_frequency = 0.2
//! sub_steps = 5
//!
//! [scenario]
//! kind = "lossy"
//! resistance = 0.05
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::fdtd::components::{HarmonicVSource, LinearLine, ResistiveTerminator};
use crate::fdtd::{FdtdSolver, FdtdSolverDescriptor};
use crate::{
    resolve, BaseConstants, Error, PhaseMode, Scenario, Simulation, SimulationDescriptor,
    SimulationParameters,
};

/// Everything needed to set up a run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Number of segments, `N`.
    pub npoints: usize,
    /// Base per-unit-length inductance, `L0`.
    pub inductance: f32,
    /// Base per-unit-length capacitance, `C0`.
    pub capacitance: f32,
    /// Drive angular frequency, `w`.
    pub angular_frequency: f32,
    /// Drive amplitude.
    pub amplitude: f32,
    /// Fraction of the stability limit used as the time step.
    pub stability_margin: f32,
    /// Solver steps per frame.
    pub sub_steps: usize,
    /// Frames in a full run.
    pub frames: usize,
    /// Pause between frames when pacing a run.
    pub frame_interval_ms: u64,
    pub phase_mode: PhaseMode,
    pub scenario: Scenario,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        let base = BaseConstants::default();
        let source = HarmonicVSource::default();
        Self {
            npoints: 200,
            inductance: base.inductance,
            capacitance: base.capacitance,
            angular_frequency: source.angular_frequency,
            amplitude: source.amplitude,
            stability_margin: base.stability_margin,
            sub_steps: 5,
            frames: 2000,
            frame_interval_ms: 30,
            phase_mode: PhaseMode::FrameLocked,
            scenario: Scenario::ShortCircuit,
        }
    }
}

impl ScenarioConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, Error> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        info!(path = %path.display(), scenario = %config.scenario, "loaded scenario config");
        Ok(config)
    }

    /// Checks the preconditions the stepping core relies on.
    pub fn validate(&self) -> Result<(), Error> {
        fn positive(name: &str, value: f32) -> Result<(), Error> {
            if value > 0.0 && value.is_finite() {
                Ok(())
            } else {
                Err(Error::InvalidConfig(format!("{} must be positive, got {}", name, value)))
            }
        }
        fn non_negative(name: &str, value: f32) -> Result<(), Error> {
            if value >= 0.0 && value.is_finite() {
                Ok(())
            } else {
                Err(Error::InvalidConfig(format!("{} must not be negative, got {}", name, value)))
            }
        }

        if self.npoints < 2 {
            return Err(Error::InvalidConfig(format!(
                "npoints must be at least 2, got {}", self.npoints
            )));
        }
        if self.sub_steps == 0 {
            return Err(Error::InvalidConfig("sub_steps must be at least 1".to_string()));
        }
        positive("inductance", self.inductance)?;
        positive("capacitance", self.capacitance)?;
        positive("stability_margin", self.stability_margin)?;
        if !self.angular_frequency.is_finite() || !self.amplitude.is_finite() {
            return Err(Error::InvalidConfig("drive must be finite".to_string()));
        }
        match self.scenario {
            Scenario::Lossy { resistance } => non_negative("resistance", resistance)?,
            Scenario::Dispersive { alpha } => non_negative("alpha", alpha)?,
            Scenario::ShortCircuit | Scenario::MatchedLoad => {}
        }
        positive("time step", self.resolve().delta_t)
    }

    pub fn base_constants(&self) -> BaseConstants {
        BaseConstants {
            inductance: self.inductance,
            capacitance: self.capacitance,
            angular_frequency: self.angular_frequency,
            stability_margin: self.stability_margin,
        }
    }

    pub fn resolve(&self) -> SimulationParameters {
        resolve(&self.scenario, &self.base_constants())
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    /// Builds a simulation at rest for this configuration.
    pub fn build(&self) -> Result<Simulation<FdtdSolver<LinearLine>>, Error> {
        self.validate()?;
        let sim_params = self.resolve();

        Simulation::new(SimulationDescriptor {
            solver: FdtdSolver::new(FdtdSolverDescriptor {
                tline: LinearLine::new(self.npoints)?,
                source: Box::new(HarmonicVSource {
                    amplitude: self.amplitude,
                    angular_frequency: self.angular_frequency,
                }),
                terminator: Box::new(ResistiveTerminator),
            }),
            sim_params,
            sub_steps: self.sub_steps,
            phase_mode: self.phase_mode,
            init_state: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn empty_document_gives_defaults() {
        let config = ScenarioConfig::from_toml_str("").unwrap();
        assert_eq!(config, ScenarioConfig::default());
        assert_eq!(config.npoints, 200);
        assert_eq!(config.sub_steps, 5);
        assert_eq!(config.scenario, Scenario::ShortCircuit);
        assert_eq!(config.phase_mode, PhaseMode::FrameLocked);
        assert_eq!(config.frame_interval(), Duration::from_millis(30));
    }

    #[test]
    fn parses_scenarios_with_overrides() {
        let config = ScenarioConfig::from_toml_str(
            r#"
            npoints = 50
            phase_mode = "continuous"

            [scenario]
            kind = "lossy"
            resistance = 0.2
            "#,
        ).unwrap();
        assert_eq!(config.npoints, 50);
        assert_eq!(config.phase_mode, PhaseMode::Continuous);
        assert_eq!(config.scenario, Scenario::Lossy { resistance: 0.2 });

        let config = ScenarioConfig::from_toml_str(
            "[scenario]\nkind = \"dispersive\"\n",
        ).unwrap();
        assert_eq!(config.scenario, Scenario::Dispersive { alpha: 0.5 });

        let config = ScenarioConfig::from_toml_str(
            "[scenario]\nkind = \"matched-load\"\n",
        ).unwrap();
        assert_relative_eq!(config.resolve().load_resistance, 10.0, epsilon = 1e-5);
    }

    #[test]
    fn rejects_unknown_fields_and_kinds() {
        assert!(matches!(
            ScenarioConfig::from_toml_str("segments = 3"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            ScenarioConfig::from_toml_str("[scenario]\nkind = \"open-circuit\"\n"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn rejects_overrides_of_another_kind() {
        let cases = [
            "[scenario]\nkind = \"short-circuit\"\nresistance = 0.3\n",
            "[scenario]\nkind = \"matched-load\"\nalpha = 0.5\n",
            "[scenario]\nkind = \"lossy\"\nalpha = 0.5\n",
            "[scenario]\nkind = \"dispersive\"\nresistance = 0.3\n",
            "[scenario]\nkind = \"short-circuit\"\nload = 50.0\n",
        ];
        for case in cases {
            assert!(
                matches!(ScenarioConfig::from_toml_str(case), Err(Error::Config(_))),
                "accepted {:?}",
                case
            );
        }
    }

    #[test]
    fn scenario_survives_a_toml_round_trip() {
        let config = ScenarioConfig {
            scenario: Scenario::Dispersive { alpha: 0.25 },
            ..Default::default()
        };
        let text = toml::to_string(&config).unwrap();

        assert_eq!(ScenarioConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn rejects_invalid_values() {
        let cases = [
            "npoints = 1",
            "sub_steps = 0",
            "inductance = 0.0",
            "capacitance = -0.01",
            "stability_margin = 0.0",
            "[scenario]\nkind = \"lossy\"\nresistance = -1.0\n",
            "[scenario]\nkind = \"dispersive\"\nalpha = -0.5\n",
        ];
        for case in cases {
            assert!(
                matches!(ScenarioConfig::from_toml_str(case), Err(Error::InvalidConfig(_))),
                "accepted {:?}",
                case
            );
        }
    }

    #[test]
    fn build_rejects_invalid_config() {
        let config = ScenarioConfig { npoints: 1, ..Default::default() };
        assert!(matches!(config.build(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scenario.toml");
        std::fs::write(&path, "npoints = 12\n[scenario]\nkind = \"short-circuit\"\n").unwrap();

        let config = ScenarioConfig::load(&path).unwrap();
        assert_eq!(config.npoints, 12);
        assert!(matches!(
            ScenarioConfig::load(dir.path().join("missing.toml")),
            Err(Error::Io(_))
        ));
    }
}
