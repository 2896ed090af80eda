use crate::{Error, SimulationParameters};
use crate::fdtd::{TransmissionLine, Component};

/// A uniform line with unit node spacing.
///
/// Inductance, capacitance and series resistance are read from the
/// `SimulationParameters` of each step, so a line cannot disagree with the
/// resolved scenario.
///
/// Voltages are stepped with forward Euler on the old currents. Currents are
/// stepped with the new voltages, but the resistive term uses the old current,
/// which keeps the update fully explicit at the cost of accuracy for large `r`.
#[derive(Debug, Clone)]
pub struct LinearLine {
    npoints: usize,
}
impl LinearLine {
    /// A line of `npoints` segments. Needs at least 2.
    pub fn new(npoints: usize) -> Result<Self, Error> {
        if npoints < 2 {
            return Err(Error::InvalidConfig(format!(
                "line needs at least 2 segments, got {}", npoints
            )));
        }

        Ok(Self { npoints })
    }
}
impl Component for LinearLine {
    #[inline]
    fn next_voltage(
        &self,
        next_volt: &mut f32,
        last_volt: f32,
        last_currs: ndarray::ArrayView1<f32>,
        sim_params: &SimulationParameters,
    ) {
        *next_volt = last_volt
            + sim_params.delta_t / sim_params.capacitance * (last_currs[0] - last_currs[1]);
    }
    #[inline]
    fn next_current(
        &self,
        next_curr: &mut f32,
        next_volts: ndarray::ArrayView1<f32>,
        last_curr: f32,
        sim_params: &SimulationParameters,
    ) {
        *next_curr = last_curr + sim_params.delta_t / sim_params.inductance
            * ((next_volts[0] - next_volts[1]) - sim_params.series_resistance * last_curr);
    }
}
impl TransmissionLine for LinearLine {
    #[inline]
    fn npoints(&self) -> usize {
        self.npoints
    }
}
