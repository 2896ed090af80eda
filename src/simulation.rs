use std::cmp::min;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::save::{SaveSettings, SnapshotFile};
use crate::{Error, SimulationParameters, Solver, StepDescriptor};

/// Upper bound on the number of voltage values buffered before writing to file.
const MAX_BUFFERED_VALUES: usize = 100_000_000;

/// Describes the transmission line state at the current time step.
#[derive(Clone, Debug, PartialEq)]
pub struct LineState {
    /// Elapsed simulated time, advanced by one time step per solver step.
    pub time: f32,
    /// The voltages of each node, from the driven end (0) to the terminated end (N).
    pub voltages: ndarray::Array1<f32>,
    /// The current of each branch, `currents[n]` flowing from node `n` to node `n + 1`.
    pub currents: ndarray::Array1<f32>,
}

impl LineState {
    /// A line of `npoints` segments at rest.
    pub fn new(npoints: usize) -> Self {
        Self {
            time: 0.0,
            voltages: ndarray::Array1::<f32>::zeros(npoints + 1),
            currents: ndarray::Array1::<f32>::zeros(npoints),
        }
    }

    pub fn npoints(&self) -> usize {
        self.currents.len()
    }

    /// The largest voltage magnitude on the line. NaN is treated as infinite.
    pub fn max_abs_voltage(&self) -> f32 {
        self.voltages.iter().fold(0.0f32, |accum, &v| {
            if v.is_nan() { f32::INFINITY } else { accum.max(v.abs()) }
        })
    }

    pub fn is_finite(&self) -> bool {
        self.voltages.iter().chain(self.currents.iter()).all(|v| v.is_finite())
    }
}

/// Which time the voltage source sees during the sub-steps of a frame.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PhaseMode {
    /// Every sub-step of frame `f` drives the line at `f * dt * sub_steps`.
    /// The source is held constant across a frame and only jumps between frames.
    #[default]
    FrameLocked,
    /// Sub-step `s` of frame `f` drives the line at `(f * sub_steps + s) * dt`.
    Continuous,
}

impl PhaseMode {
    /// The time handed to the source on `sub_step` of `frame`.
    pub fn drive_time(&self, frame: usize, sub_step: usize, sub_steps: usize, delta_t: f32) -> f32 {
        match self {
            PhaseMode::FrameLocked => frame as f32 * delta_t * sub_steps as f32,
            PhaseMode::Continuous => (frame * sub_steps + sub_step) as f32 * delta_t,
        }
    }
}

/// Describes a simulation.
pub struct SimulationDescriptor<S: Solver> {
    /// The `Solver` for the simulation.
    pub solver: S,
    /// The parameters for the simulation.
    pub sim_params: SimulationParameters,
    /// Solver steps per frame. Must be at least 1.
    pub sub_steps: usize,
    pub phase_mode: PhaseMode,
    /// The state that the simulation starts in.
    pub init_state: Option<LineState>,
}

/// Describes a simulation run.
pub struct RunDescriptor<P: AsRef<Path>> {
    /// How many frames to advance.
    pub frames: usize,
    /// Whether or not to show a progress bar.
    pub verbose: bool,
    /// Stop with `Error::Diverged` as soon as a frame holds a non-finite value.
    pub halt_on_divergence: bool,
    /// Wall-clock pause between frames, if any.
    pub frame_interval: Option<Duration>,
    /// What, if any, information to save to file.
    pub save_settings: Option<SaveSettings<P>>,
}

/// The main `struct` of the framework.
///
/// Owns the line state for the whole run. State accumulates across frames and
/// is never reset.
pub struct Simulation<S: Solver> {
    solver: S,
    sim_params: SimulationParameters,
    sub_steps: usize,
    phase_mode: PhaseMode,
    state: LineState,
    frame: usize,
}

impl<S: Solver> Simulation<S> {
    /// Creates a new `Simulation` instance.
    #[inline]
    pub fn new(desc: SimulationDescriptor<S>) -> Result<Self, Error> {
        let npoints = desc.solver.npoints();
        if npoints < 2 {
            return Err(Error::InvalidConfig(format!(
                "line needs at least 2 segments, got {}", npoints
            )));
        }
        if desc.sub_steps == 0 {
            return Err(Error::InvalidConfig("sub_steps must be at least 1".to_string()));
        }
        let delta_t = desc.sim_params.delta_t;
        if !(delta_t > 0.0 && delta_t.is_finite()) {
            return Err(Error::InvalidConfig(format!(
                "time step must be positive, got {}", delta_t
            )));
        }
        let SimulationParameters { inductance, capacitance, .. } = desc.sim_params;
        if !(inductance > 0.0 && inductance.is_finite()) {
            return Err(Error::InvalidConfig(format!(
                "inductance must be positive, got {}", inductance
            )));
        }
        if !(capacitance > 0.0 && capacitance.is_finite()) {
            return Err(Error::InvalidConfig(format!(
                "capacitance must be positive, got {}", capacitance
            )));
        }

        // create arrays for initial data
        let state = desc.init_state.unwrap_or_else(|| LineState::new(npoints));
        if state.voltages.len() != (npoints + 1) {
            return Err(Error::BadInit {
                array_name: "Voltage".to_string(),
                input_length: state.voltages.len(),
                expected_length: npoints + 1,
            })
        }
        if state.currents.len() != npoints {
            return Err(Error::BadInit {
                array_name: "Current".to_string(),
                input_length: state.currents.len(),
                expected_length: npoints,
            })
        }

        info!(
            npoints,
            delta_t,
            impedance = desc.sim_params.impedance,
            load_resistance = desc.sim_params.load_resistance,
            courant = desc.sim_params.courant_number(),
            sub_steps = desc.sub_steps,
            phase_mode = ?desc.phase_mode,
            "created simulation"
        );

        Ok(Self {
            state,
            solver: desc.solver,
            sim_params: desc.sim_params,
            sub_steps: desc.sub_steps,
            phase_mode: desc.phase_mode,
            frame: 0,
        })
    }

    /// Advances the next frame of the internal frame counter.
    #[inline]
    pub fn advance(&mut self) -> ndarray::ArrayView1<f32> {
        self.advance_frame(self.frame)
    }

    /// Does `sub_steps` solver steps for `frame` and returns the node voltages.
    ///
    /// The internal frame counter continues from `frame + 1` afterwards.
    pub fn advance_frame(&mut self, frame: usize) -> ndarray::ArrayView1<f32> {
        let delta_t = self.sim_params.delta_t;
        for sub_step in 0..self.sub_steps {
            let time = self.phase_mode.drive_time(frame, sub_step, self.sub_steps, delta_t);
            self.solver.step(StepDescriptor {
                state: &mut self.state,
                sim_params: &self.sim_params,
                time,
            });
        }
        self.frame = frame + 1;

        self.state.voltages.view()
    }

    /// Does a computational run of `desc.frames` frames from the current frame.
    pub fn run<P: AsRef<Path>>(
        &mut self,
        desc: RunDescriptor<P>,
    ) -> Result<(), Error> {
        let nframes = desc.frames;
        if nframes == 0 {
            return Ok(());
        }
        let total_points = 1 + self.solver.npoints();
        let store_size = min(nframes, (MAX_BUFFERED_VALUES / total_points).max(1));

        // optionally create file
        let mut file = match desc.save_settings {
            Some(ref settings) => Some(SnapshotFile::prepare(
                settings,
                nframes,
                self.solver.npoints(),
                &self.sim_params,
                self.sub_steps,
            )?),
            None => None,
        };
        let mut buffer = file
            .as_ref()
            .map(|_| ndarray::Array2::<f32>::zeros((store_size, total_points)));

        info!(start_frame = self.frame, frames = nframes, "starting run");
        let bar = if desc.verbose {
            Some(indicatif::ProgressBar::new(nframes as u64))
        } else {
            None
        };

        let mut buffered = 0;
        for _ in 0..nframes {
            let frame = self.frame;
            self.advance_frame(frame);
            debug!(frame, max_voltage = self.state.max_abs_voltage(), "frame done");

            if desc.halt_on_divergence && !self.state.is_finite() {
                error!(frame, time = self.state.time, "simulation diverged");
                // keep the finite frames and drop the rows reserved for the rest
                if let (Some(file), Some(buffer)) = (file.as_mut(), buffer.as_ref()) {
                    if buffered > 0 {
                        file.write_frames(buffer.slice(ndarray::s![..buffered, ..]))?;
                    }
                    file.truncate()?;
                }
                return Err(Error::Diverged { frame });
            }

            if let (Some(file), Some(buffer)) = (file.as_mut(), buffer.as_mut()) {
                buffer.row_mut(buffered).assign(&self.state.voltages);
                buffered += 1;
                if buffered == store_size {
                    file.write_frames(buffer.slice(ndarray::s![..buffered, ..]))?;
                    buffered = 0;
                }
            }

            if let Some(ref bar) = bar {
                bar.inc(1)
            }
            if let Some(interval) = desc.frame_interval {
                std::thread::sleep(interval);
            }
        }

        if let (Some(file), Some(buffer)) = (file.as_mut(), buffer.as_ref()) {
            if buffered > 0 {
                file.write_frames(buffer.slice(ndarray::s![..buffered, ..]))?;
            }
        }

        if let Some(ref bar) = bar {
            bar.finish();
        }
        info!(
            frame = self.frame,
            time = self.state.time,
            max_voltage = self.state.max_abs_voltage(),
            "run finished"
        );

        Ok(())
    }

    /// The current line state.
    pub fn state(&self) -> &LineState {
        &self.state
    }

    pub fn sim_params(&self) -> &SimulationParameters {
        &self.sim_params
    }

    /// The frame the next call to `advance` will simulate.
    pub fn frame(&self) -> usize {
        self.frame
    }

    pub fn sub_steps(&self) -> usize {
        self.sub_steps
    }

    pub fn phase_mode(&self) -> PhaseMode {
        self.phase_mode
    }

    pub fn solver(&self) -> &S {
        &self.solver
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn frame_locked_time_ignores_sub_step() {
        let mode = PhaseMode::FrameLocked;
        for sub_step in 0..5 {
            assert_relative_eq!(mode.drive_time(3, sub_step, 5, 0.1), 1.5, epsilon = 1e-6);
        }
    }

    #[test]
    fn continuous_time_advances_each_sub_step() {
        let mode = PhaseMode::Continuous;
        assert_relative_eq!(mode.drive_time(0, 0, 5, 0.1), 0.0);
        assert_relative_eq!(mode.drive_time(3, 0, 5, 0.1), 1.5, epsilon = 1e-6);
        assert_relative_eq!(mode.drive_time(3, 4, 5, 0.1), 1.9, epsilon = 1e-6);
    }

    #[test]
    fn line_state_starts_at_rest() {
        let state = LineState::new(6);
        assert_eq!(state.voltages.len(), 7);
        assert_eq!(state.currents.len(), 6);
        assert_eq!(state.npoints(), 6);
        assert_eq!(state.max_abs_voltage(), 0.0);
        assert!(state.is_finite());
    }

    #[test]
    fn max_abs_voltage_flags_nan() {
        let mut state = LineState::new(3);
        state.voltages[1] = -2.0;
        assert_eq!(state.max_abs_voltage(), 2.0);
        state.voltages[2] = f32::NAN;
        assert_eq!(state.max_abs_voltage(), f32::INFINITY);
        assert!(!state.is_finite());
    }
}
