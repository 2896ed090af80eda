use crate::SimulationParameters;
use crate::fdtd::Terminator;

/// A resistor of `load_resistance` from the last node to ground. Sets the node
/// voltage directly from the current of the last branch; there is no
/// capacitance at the last node.
///
/// The resistance comes from the `SimulationParameters` of each step: zero for
/// a short circuit, the characteristic impedance for a matched load.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ResistiveTerminator;
impl Terminator for ResistiveTerminator {
    #[inline]
    fn next_voltage(
        &self,
        last_curr: f32,
        sim_params: &SimulationParameters,
    ) -> f32 {
        sim_params.load_resistance * last_curr
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{resolve, BaseConstants, Scenario};

    #[test]
    fn short_circuit_pins_voltage_to_zero() {
        let sim_params = resolve(&Scenario::ShortCircuit, &BaseConstants::default());

        for curr in [0.0, 1.0, -3.5, 1e6] {
            assert_eq!(ResistiveTerminator.next_voltage(curr, &sim_params), 0.0);
        }
    }

    #[test]
    fn matched_load_uses_impedance() {
        let sim_params = resolve(&Scenario::MatchedLoad, &BaseConstants::default());

        assert_eq!(sim_params.load_resistance, sim_params.impedance);
        assert_eq!(
            ResistiveTerminator.next_voltage(0.5, &sim_params),
            0.5 * sim_params.impedance
        );
    }
}
