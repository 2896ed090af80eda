pub mod components;

mod fdtd_solver;

pub use fdtd_solver::{FdtdSolver, FdtdSolverDescriptor};

use crate::SimulationParameters;

/// Describes the behavior of the main simulated line.
pub trait TransmissionLine: Component {
    /// The number of segments, `N`. The line has `N + 1` nodes and `N` branches.
    fn npoints(&self) -> usize;
}

/// Defines the voltage and current response of a line segment.
pub trait Component {
    /// Next voltage of an interior node from its old voltage and the old
    /// currents of the branches on either side of it.
    fn next_voltage(
        &self,
        next_volt: &mut f32,
        last_volt: f32,
        last_currs: ndarray::ArrayView1<f32>,
        sim_params: &SimulationParameters,
    );

    /// Next current of a branch from the already updated voltages of the
    /// nodes at either end of it.
    fn next_current(
        &self,
        next_curr: &mut f32,
        next_volts: ndarray::ArrayView1<f32>,
        last_curr: f32,
        sim_params: &SimulationParameters,
    );
}

/// Generates a voltage output at the start of a transmission line.
pub trait VSource {
    /// The voltage forced onto the driven node at `time`.
    fn generate(&self, time: f32) -> f32;
}

/// Handles end of line boundary conditions, representing a physical terminator.
pub trait Terminator {
    fn next_voltage(
        &self,
        last_curr: f32,
        sim_params: &SimulationParameters,
    ) -> f32;
}
