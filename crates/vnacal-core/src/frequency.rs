//! Frequency sweep shared by every network in a calibration
//!
//! All sweeps are stored in Hz. The display unit only affects
//! `f_scaled` and how the sweep is reported.

use crate::constants::{FREQ_ABS_TOL, FREQ_REL_TOL};
use crate::error::{CalibrationError, Result};

/// Frequency unit enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrequencyUnit {
    #[default]
    Hz,
    KHz,
    MHz,
    GHz,
    THz,
}

impl FrequencyUnit {
    /// Get the multiplier to convert to Hz
    pub fn multiplier(&self) -> f64 {
        match self {
            FrequencyUnit::Hz => 1.0,
            FrequencyUnit::KHz => 1e3,
            FrequencyUnit::MHz => 1e6,
            FrequencyUnit::GHz => 1e9,
            FrequencyUnit::THz => 1e12,
        }
    }

    /// Parse from string (case-insensitive)
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "hz" => Some(FrequencyUnit::Hz),
            "khz" => Some(FrequencyUnit::KHz),
            "mhz" => Some(FrequencyUnit::MHz),
            "ghz" => Some(FrequencyUnit::GHz),
            "thz" => Some(FrequencyUnit::THz),
            _ => None,
        }
    }
}

/// Sweep type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SweepType {
    #[default]
    Linear,
    Log,
}

/// An ordered frequency sweep
#[derive(Debug, Clone)]
pub struct Frequency {
    /// Frequency points in Hz
    f: Vec<f64>,
    /// Display unit
    unit: FrequencyUnit,
    /// Sweep type (linear or log)
    sweep_type: SweepType,
}

impl Frequency {
    /// Create a new Frequency with start/stop/npoints
    ///
    /// # Arguments
    /// * `start` - Start frequency in the specified unit
    /// * `stop` - Stop frequency in the specified unit
    /// * `npoints` - Number of frequency points
    /// * `unit` - Frequency unit
    /// * `sweep_type` - Linear or logarithmic sweep
    ///
    /// # Example
    /// ```
    /// use vnacal_core::frequency::{Frequency, FrequencyUnit, SweepType};
    /// // 1 MHz to 4.4 GHz in 1 MHz steps
    /// let freq = Frequency::new(1.0, 4400.0, 4400, FrequencyUnit::MHz, SweepType::Linear);
    /// assert_eq!(freq.npoints(), 4400);
    /// ```
    pub fn new(
        start: f64,
        stop: f64,
        npoints: usize,
        unit: FrequencyUnit,
        sweep_type: SweepType,
    ) -> Self {
        let mult = unit.multiplier();
        let start_hz = start * mult;
        let stop_hz = stop * mult;

        let f = match (npoints, sweep_type) {
            (0, _) => Vec::new(),
            (1, _) => vec![start_hz],
            (_, SweepType::Linear) => {
                let step = (stop_hz - start_hz) / (npoints - 1) as f64;
                (0..npoints).map(|i| start_hz + i as f64 * step).collect()
            }
            (_, SweepType::Log) => {
                let log_start = start_hz.ln();
                let log_step = (stop_hz.ln() - log_start) / (npoints - 1) as f64;
                (0..npoints)
                    .map(|i| (log_start + i as f64 * log_step).exp())
                    .collect()
            }
        };

        Self {
            f,
            unit,
            sweep_type,
        }
    }

    /// Create from a frequency vector given in `unit`
    pub fn from_f(f: Vec<f64>, unit: FrequencyUnit) -> Self {
        let mult = unit.multiplier();
        Self {
            f: f.into_iter().map(|x| x * mult).collect(),
            unit,
            sweep_type: SweepType::Linear,
        }
    }

    /// Get frequency vector in Hz
    #[inline]
    pub fn f(&self) -> &[f64] {
        &self.f
    }

    /// Get frequency vector in the current unit
    pub fn f_scaled(&self) -> Vec<f64> {
        let mult = self.unit.multiplier();
        self.f.iter().map(|&x| x / mult).collect()
    }

    /// Get the number of frequency points
    #[inline]
    pub fn npoints(&self) -> usize {
        self.f.len()
    }

    /// Get the start frequency in Hz
    #[inline]
    pub fn start(&self) -> f64 {
        *self.f.first().unwrap_or(&0.0)
    }

    /// Get the stop frequency in Hz
    #[inline]
    pub fn stop(&self) -> f64 {
        *self.f.last().unwrap_or(&0.0)
    }

    #[inline]
    pub fn unit(&self) -> FrequencyUnit {
        self.unit
    }

    #[inline]
    pub fn sweep_type(&self) -> SweepType {
        self.sweep_type
    }

    /// Get the frequency span in Hz
    #[inline]
    pub fn span(&self) -> f64 {
        self.stop() - self.start()
    }

    /// Frequency at index `i` in Hz for tagging per-point errors
    ///
    /// Callers index within the sweep; 0.0 is returned otherwise. Public
    /// users read `f()` and get the bounds check of slice indexing.
    #[inline]
    pub(crate) fn at(&self, i: usize) -> f64 {
        self.f.get(i).copied().unwrap_or(0.0)
    }

    /// Check whether two sweeps have the same points
    ///
    /// Points are compared with a relative tolerance, so sweeps built in
    /// different units still match.
    pub fn matches(&self, other: &Frequency) -> bool {
        self.first_mismatch(other).is_none() && self.npoints() == other.npoints()
    }

    /// Fail with `FrequencyMismatch` unless `other` has the same points
    ///
    /// `detail` names the offending input in the error message.
    pub fn ensure_matches(&self, other: &Frequency, detail: &str) -> Result<()> {
        if self.npoints() != other.npoints() {
            return Err(CalibrationError::FrequencyMismatch {
                expected: self.npoints(),
                found: other.npoints(),
                detail: detail.to_string(),
            });
        }
        if let Some(i) = self.first_mismatch(other) {
            return Err(CalibrationError::FrequencyMismatch {
                expected: self.npoints(),
                found: other.npoints(),
                detail: format!(
                    "{} (point {}: {} Hz vs {} Hz)",
                    detail, i, self.f[i], other.f[i]
                ),
            });
        }
        Ok(())
    }

    fn first_mismatch(&self, other: &Frequency) -> Option<usize> {
        self.f
            .iter()
            .zip(other.f.iter())
            .position(|(&a, &b)| (a - b).abs() > FREQ_ABS_TOL.max(FREQ_REL_TOL * a.abs()))
    }
}

impl PartialEq for Frequency {
    fn eq(&self, other: &Self) -> bool {
        self.matches(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_create_linear_sweep() {
        let freq = Frequency::new(1.0, 4400.0, 4400, FrequencyUnit::MHz, SweepType::Linear);

        assert_eq!(freq.npoints(), 4400);
        assert_relative_eq!(freq.start(), 1e6, epsilon = 1e-3);
        assert_relative_eq!(freq.stop(), 4.4e9, epsilon = 1e-3);
        assert_relative_eq!(freq.f()[1] - freq.f()[0], 1e6, epsilon = 1e-3);

        let f_scaled = freq.f_scaled();
        assert_relative_eq!(f_scaled[0], 1.0, epsilon = 1e-10);
        assert_relative_eq!(f_scaled[4399], 4400.0, epsilon = 1e-8);
    }

    #[test]
    fn test_create_log_sweep() {
        let freq = Frequency::new(1.0, 10.0, 10, FrequencyUnit::GHz, SweepType::Log);

        assert_relative_eq!(freq.start(), 1e9, epsilon = 1.0);
        assert_relative_eq!(freq.stop(), 10e9, epsilon = 1.0);

        let ratios: Vec<f64> = freq.f().windows(2).map(|w| w[1] / w[0]).collect();
        for r in &ratios[1..] {
            assert_relative_eq!(*r, ratios[0], epsilon = 1e-10);
        }
    }

    #[test]
    fn test_empty_and_single_point() {
        let empty = Frequency::new(1.0, 2.0, 0, FrequencyUnit::GHz, SweepType::Linear);
        assert_eq!(empty.npoints(), 0);
        assert_eq!(empty.start(), 0.0);

        let single = Frequency::new(1.0, 2.0, 1, FrequencyUnit::GHz, SweepType::Linear);
        assert_eq!(single.f(), &[1e9]);
    }

    #[test]
    fn test_matches_across_units() {
        let a = Frequency::new(1.0, 2.0, 11, FrequencyUnit::GHz, SweepType::Linear);
        let b = Frequency::new(1000.0, 2000.0, 11, FrequencyUnit::MHz, SweepType::Linear);
        assert!(a.matches(&b));
        assert_eq!(a, b);
        assert!(a.ensure_matches(&b, "b").is_ok());
    }

    #[test]
    fn test_mismatch_reports_detail() {
        let a = Frequency::new(1.0, 2.0, 11, FrequencyUnit::GHz, SweepType::Linear);
        let b = Frequency::new(1.0, 2.0, 12, FrequencyUnit::GHz, SweepType::Linear);
        let c = Frequency::new(1.0, 2.1, 11, FrequencyUnit::GHz, SweepType::Linear);

        match a.ensure_matches(&b, "thru") {
            Err(CalibrationError::FrequencyMismatch {
                expected, found, ..
            }) => {
                assert_eq!(expected, 11);
                assert_eq!(found, 12);
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(!a.matches(&c));
        assert!(a.ensure_matches(&c, "open").is_err());
    }

    #[test]
    fn test_at_index() {
        let freq = Frequency::new(1.0, 3.0, 3, FrequencyUnit::GHz, SweepType::Linear);
        assert_eq!(freq.at(1), freq.f()[1]);
        assert_relative_eq!(freq.at(2), 3e9, epsilon = 1e-3);
        assert_eq!(freq.at(3), 0.0);
    }

    #[test]
    fn test_frequency_unit_from_name() {
        assert_eq!(FrequencyUnit::from_name("ghz"), Some(FrequencyUnit::GHz));
        assert_eq!(FrequencyUnit::from_name("MHz"), Some(FrequencyUnit::MHz));
        assert_eq!(FrequencyUnit::from_name("invalid"), None);
        assert_eq!(FrequencyUnit::KHz.multiplier(), 1e3);
    }
}
