//! Explicit leapfrog integration of the Telegrapher's equations on a 1-dimensional
//! transmission line, driven by a harmonic source and closed by a resistive load.
//!
//! To get started, refer to the `demos` directory in the main repository.

mod simulation;

pub mod config;
pub mod fdtd;
pub mod parameters;
pub mod prelude;
pub mod save;

pub use config::ScenarioConfig;
pub use parameters::{resolve, BaseConstants, Scenario, SimulationParameters};
pub use save::{SaveSettings, SaveType};
pub use simulation::{LineState, PhaseMode, RunDescriptor, Simulation, SimulationDescriptor};

/// Represents an error in the simulation.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Init {array_name} array does not have expected length \
        ( {array_name} array length: {input_length}, \
        expected length: {expected_length} )")]
    BadInit {
        array_name: String,
        input_length: usize,
        expected_length: usize,
    },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Time step violates the stability bound ( courant number: {courant} )")]
    Unstable { courant: f32 },
    #[error("Simulation produced non-finite voltages at frame {frame}")]
    Diverged { frame: usize },
    #[error(transparent)]
    Config(#[from] toml::de::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    H5Error(#[from] hdf5::Error),
}

/// Advances a line state by single time increments.
pub trait Solver {
    /// Does one time step, mutating the state in place.
    fn step(&mut self, desc: StepDescriptor);

    fn npoints(&self) -> usize;
}

/// Describes a single time step of a `Solver`.
pub struct StepDescriptor<'a> {
    pub state: &'a mut LineState,
    pub sim_params: &'a SimulationParameters,
    /// The time handed to the voltage source for this step.
    pub time: f32,
}
