//! Includes commonly used library components.

pub use crate::{
    Error,
    LineState,
    PhaseMode,
    RunDescriptor,
    SaveSettings,
    SaveType,
    Scenario,
    ScenarioConfig,
    Simulation,
    SimulationDescriptor,
    SimulationParameters,
    Solver,
    StepDescriptor,
};
pub use crate::fdtd::{TransmissionLine, VSource, Terminator};
