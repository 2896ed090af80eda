use crate::fdtd::VSource;

/// A sinusoidal voltage source, `amplitude * sin(angular_frequency * t)`.
///
/// The source forces the driven node outright; there is no source impedance.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct HarmonicVSource {
    pub amplitude: f32,
    pub angular_frequency: f32,
}
impl Default for HarmonicVSource {
    fn default() -> Self {
        Self {
            amplitude: 0.5,
            angular_frequency: 0.2,
        }
    }
}
impl VSource for HarmonicVSource {
    #[inline]
    fn generate(&self, time: f32) -> f32 {
        self.amplitude * f32::sin(self.angular_frequency * time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::PI;

    #[test]
    fn follows_a_sine() {
        let source = HarmonicVSource { amplitude: 0.5, angular_frequency: PI };

        assert_eq!(source.generate(0.0), 0.0);
        assert_relative_eq!(source.generate(0.5), 0.5);
        assert_relative_eq!(source.generate(1.5), -0.5);
    }

    #[test]
    fn time_order_does_not_matter() {
        let source = HarmonicVSource::default();
        let late = source.generate(40.0);
        let early = source.generate(3.0);

        assert_eq!(late, source.generate(40.0));
        assert_eq!(early, source.generate(3.0));
    }

    #[test]
    fn zero_frequency_is_silent() {
        let source = HarmonicVSource { amplitude: 0.5, angular_frequency: 0.0 };
        for t in [0.0, 1.0, 1e6] {
            assert_eq!(source.generate(t), 0.0);
        }
    }
}
