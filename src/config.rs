use std::path::PathBuf;
use std::time::Duration;

use crate::error::{SweepError, SweepResult};

/// Parameters of the pulsed gate sweep.
///
/// The binary always runs with [`SweepParams::default`]; the associated
/// constants are the fixed protocol.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepParams {
    pub address: String,
    pub drain_v: f64,
    pub gate_high: f64,
    pub gate_low: f64,
    /// Seconds each gate level is held.
    pub pulse_width: f64,
    pub total_cycles: usize,
    /// Seconds between samples.
    pub dt: f64,
    pub csv_path: PathBuf,
}

impl SweepParams {
    pub const GPIB_ADDRESS: &'static str = "GPIB0::26::INSTR";
    pub const DRAIN_V: f64 = 1.0;
    pub const GATE_HIGH: f64 = 1.0;
    pub const GATE_LOW: f64 = -1.0;
    pub const PULSE_WIDTH: f64 = 1.0;
    pub const TOTAL_CYCLES: usize = 5;
    pub const DT: f64 = 0.01;
    pub const CSV_PATH: &'static str = "keithley_gpiB.csv";

    /// Reject timings no sweep can run with: `dt` must be finite and
    /// positive, `pulse_width` finite and not negative.
    pub fn validate(&self) -> SweepResult<()> {
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(SweepError::InvalidParams(format!(
                "sample interval must be positive, got {}",
                self.dt
            )));
        }
        if !(self.pulse_width.is_finite() && self.pulse_width >= 0.0) {
            return Err(SweepError::InvalidParams(format!(
                "pulse width must not be negative, got {}",
                self.pulse_width
            )));
        }
        Ok(())
    }

    /// Samples taken per gate level, `pulse_width / dt` truncated. Zero when
    /// the timings fail [`SweepParams::validate`].
    pub fn samples_per_phase(&self) -> usize {
        if self.validate().is_err() {
            return 0;
        }
        (self.pulse_width / self.dt) as usize
    }

    /// Gate levels visited each cycle, in order.
    pub fn gate_levels(&self) -> [f64; 2] {
        [self.gate_high, self.gate_low]
    }

    /// `dt` as a `Duration`; zero when `dt` is negative or not finite.
    pub fn sample_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.dt).unwrap_or_default()
    }

    /// Data rows a complete run produces (header excluded).
    pub fn expected_rows(&self) -> usize {
        self.total_cycles * self.gate_levels().len() * self.samples_per_phase()
    }
}

impl Default for SweepParams {
    fn default() -> Self {
        Self {
            address: Self::GPIB_ADDRESS.to_string(),
            drain_v: Self::DRAIN_V,
            gate_high: Self::GATE_HIGH,
            gate_low: Self::GATE_LOW,
            pulse_width: Self::PULSE_WIDTH,
            total_cycles: Self::TOTAL_CYCLES,
            dt: Self::DT,
            csv_path: PathBuf::from(Self::CSV_PATH),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_protocol() {
        let params = SweepParams::default();
        assert_eq!(params.address, "GPIB0::26::INSTR");
        assert_eq!(params.csv_path, PathBuf::from("keithley_gpiB.csv"));
        assert_eq!(params.gate_levels(), [1.0, -1.0]);
    }

    #[test]
    fn test_default_sample_counts() {
        let params = SweepParams::default();
        assert_eq!(params.samples_per_phase(), 100);
        assert_eq!(params.expected_rows(), 1000);
        assert_eq!(params.sample_interval(), Duration::from_millis(10));
    }

    #[test]
    fn test_samples_per_phase_truncates() {
        let params = SweepParams {
            pulse_width: 0.055,
            dt: 0.01,
            ..SweepParams::default()
        };
        assert_eq!(params.samples_per_phase(), 5);
    }

    #[test]
    fn test_bad_timings_rejected_without_panic() {
        for dt in [0.0, -0.01, f64::NAN, f64::INFINITY] {
            let params = SweepParams {
                dt,
                ..SweepParams::default()
            };
            assert!(matches!(params.validate(), Err(SweepError::InvalidParams(_))));
            assert_eq!(params.samples_per_phase(), 0);
            assert_eq!(params.expected_rows(), 0);
            assert_eq!(params.sample_interval(), Duration::ZERO);
        }

        let params = SweepParams {
            pulse_width: -1.0,
            ..SweepParams::default()
        };
        assert!(params.validate().is_err());
        assert!(SweepParams::default().validate().is_ok());
    }
}
