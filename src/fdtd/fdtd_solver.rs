use crate::{LineState, Solver, StepDescriptor};
use crate::fdtd::{TransmissionLine, VSource, Terminator};

/// Describes the composition of an `FdtdSolver`.
pub struct FdtdSolverDescriptor<L: TransmissionLine> {
    pub tline: L,
    pub source: Box<dyn VSource>,
    pub terminator: Box<dyn Terminator>,
}

/// Does single threaded computations on the CPU.
///
/// Each step forces the driven node, updates node voltages from the old
/// branch currents, applies the terminator, then updates the branch currents
/// from the new voltages.
pub struct FdtdSolver<L: TransmissionLine> {
    tline: L,
    source: Box<dyn VSource>,
    terminator: Box<dyn Terminator>,
    next_volts: ndarray::Array1<f32>,
}

impl<L: TransmissionLine> FdtdSolver<L> {
    #[inline]
    pub fn new(desc: FdtdSolverDescriptor<L>) -> Self {
        let npoints = desc.tline.npoints();

        Self {
            tline: desc.tline,
            source: desc.source,
            terminator: desc.terminator,
            next_volts: ndarray::Array1::<f32>::zeros(npoints + 1),
        }
    }

    pub fn tline(&self) -> &L {
        &self.tline
    }
}

impl<L: TransmissionLine> Solver for FdtdSolver<L> {
    #[inline]
    fn step(&mut self, desc: StepDescriptor) {
        let StepDescriptor { state, sim_params, time } = desc;
        let npoints = self.tline.npoints();
        let tline = &self.tline;
        let next_volts = &mut self.next_volts;

        // the source overrides whatever the driven node held
        state.voltages[0] = self.source.generate(time);
        next_volts[0] = state.voltages[0];

        // interior voltages from the old currents
        ndarray::Zip::from(next_volts.slice_mut(ndarray::s![1..npoints]))
            .and(state.voltages.slice(ndarray::s![1..npoints]))
            .and(state.currents.windows(2))
            .for_each(|nv, &lv, lc| {
                tline.next_voltage(nv, lv, lc, sim_params);
            });
        // calculate last voltage
        next_volts[npoints] = self.terminator.next_voltage(
            state.currents[npoints - 1],
            sim_params,
        );

        // every entry of the scratch buffer was written above
        std::mem::swap(&mut state.voltages, next_volts);

        // currents from the new voltages
        let LineState { voltages, currents, .. } = &mut *state;
        ndarray::Zip::from(currents)
            .and(voltages.windows(2))
            .for_each(|curr, nv| {
                let last_curr = *curr;
                tline.next_current(curr, nv, last_curr, sim_params);
            });

        state.time += sim_params.delta_t;
    }

    fn npoints(&self) -> usize {
        self.tline.npoints()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fdtd::components::{HarmonicVSource, LinearLine, ResistiveTerminator};
    use crate::{resolve, BaseConstants, Scenario, SimulationParameters};
    use approx::assert_relative_eq;

    fn solver(npoints: usize) -> FdtdSolver<LinearLine> {
        FdtdSolver::new(FdtdSolverDescriptor {
            tline: LinearLine::new(npoints).unwrap(),
            source: Box::new(HarmonicVSource::default()),
            terminator: Box::new(ResistiveTerminator),
        })
    }

    #[test]
    fn step_order_matches_hand_computation() {
        let base = BaseConstants { inductance: 1.0, capacitance: 1.0, ..Default::default() };
        let sim_params = SimulationParameters {
            load_resistance: 2.0,
            series_resistance: 0.5,
            ..resolve(&Scenario::MatchedLoad, &base)
        };
        let dt = sim_params.delta_t;
        let mut solver = solver(2);
        let mut state = LineState::new(2);
        state.voltages.assign(&ndarray::array![9.0, 1.0, 7.0]);
        state.currents.assign(&ndarray::array![0.5, -0.25]);
        let time = 3.0;

        solver.step(StepDescriptor { state: &mut state, sim_params: &sim_params, time });

        let v0 = HarmonicVSource::default().generate(time);
        let v1 = 1.0 + dt / 1.0 * (0.5 - -0.25);
        let v2 = 2.0 * -0.25;
        let i0 = 0.5 + dt / 1.0 * ((v0 - v1) - 0.5 * 0.5);
        let i1 = -0.25 + dt / 1.0 * ((v1 - v2) - 0.5 * -0.25);

        assert_eq!(state.voltages[0], v0);
        assert_relative_eq!(state.voltages[1], v1);
        assert_relative_eq!(state.voltages[2], v2);
        assert_relative_eq!(state.currents[0], i0, epsilon = 1e-6);
        assert_relative_eq!(state.currents[1], i1, epsilon = 1e-6);
        assert_relative_eq!(state.time, dt);
    }

    #[test]
    fn short_circuit_end_is_always_zero() {
        let sim_params = resolve(&Scenario::ShortCircuit, &BaseConstants::default());
        let mut solver = solver(8);
        let mut state = LineState::new(8);
        state.currents.fill(2.5);

        for n in 0..50 {
            let time = n as f32 * sim_params.delta_t;
            solver.step(StepDescriptor { state: &mut state, sim_params: &sim_params, time });
            assert_eq!(state.voltages[8], 0.0);
            assert_eq!(state.voltages.len(), 9);
            assert_eq!(state.currents.len(), 8);
        }
    }
}
