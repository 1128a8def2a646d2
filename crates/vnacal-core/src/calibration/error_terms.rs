//! Forward error-box model of a one-path analyzer
//!
//! The forward path of a 12-term model has six error terms per frequency
//! point:
//!
//! - EDF: directivity
//! - ESF: source match
//! - ERF: reflection tracking
//! - ELF: load match
//! - ETF: transmission tracking
//! - EXF: isolation
//!
//! A raw forward measurement of a DUT with S-parameters S is
//!
//! ```text
//! D   = 1 - ESF*S11 - ELF*S22 + ESF*ELF*ΔS
//! S11m = EDF + ERF*(S11 - ELF*ΔS)/D
//! S21m = EXF + ETF*S21/D
//! ```
//!
//! On a one-path analyzer the reverse direction is measured through the
//! same path with the DUT swapped, so reverse terms equal forward terms.

use ndarray::{Array1, Array3};
use num_complex::Complex64;
use std::collections::BTreeMap;

use crate::constants::NEAR_ZERO;
use crate::error::{CalibrationError, Result};
use crate::frequency::Frequency;
use crate::network::Network;

/// 2x2 S-matrix, `s[1][0]` is S21
pub type SMatrix2 = [[Complex64; 2]; 2];

const ONE: Complex64 = Complex64::new(1.0, 0.0);
const ZERO: Complex64 = Complex64::new(0.0, 0.0);

/// Forward error terms at a single frequency point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ErrorTermPoint {
    pub edf: Complex64,
    pub esf: Complex64,
    pub erf: Complex64,
    pub elf: Complex64,
    pub etf: Complex64,
    pub exf: Complex64,
}

impl Default for ErrorTermPoint {
    fn default() -> Self {
        Self::ideal()
    }
}

impl ErrorTermPoint {
    /// A perfect analyzer: unit tracking, no leakage or mismatch
    pub const fn ideal() -> Self {
        Self {
            edf: ZERO,
            esf: ZERO,
            erf: ONE,
            elf: ZERO,
            etf: ONE,
            exf: ZERO,
        }
    }

    /// Raw (S11m, S21m) an analyzer with these terms reports for `s`
    pub fn embed(&self, s: &SMatrix2) -> (Complex64, Complex64) {
        let (s11, s12, s21, s22) = (s[0][0], s[0][1], s[1][0], s[1][1]);
        let ds = s11 * s22 - s12 * s21;
        let d = ONE - self.esf * s11 - self.elf * s22 + self.esf * self.elf * ds;

        let m11 = self.edf + self.erf * (s11 - self.elf * ds) / d;
        let m21 = self.exf + self.etf * s21 / d;
        (m11, m21)
    }

    /// Reflection coefficient at the DUT input plane for a raw S11m
    ///
    /// One-port correction: Γ = (m - EDF) / (ERF + ESF*(m - EDF)).
    pub fn reflection_in(&self, m11: Complex64) -> Option<Complex64> {
        let num = m11 - self.edf;
        let den = self.erf + self.esf * num;
        (den.norm() > NEAR_ZERO).then(|| num / den)
    }

    /// Full 12-term correction from forward (m11, m21) and swapped (m22, m12) data
    ///
    /// Returns None when the correction denominator vanishes.
    pub fn correct(&self, m: &SMatrix2) -> Option<SMatrix2> {
        if self.erf.norm() < NEAR_ZERO || self.etf.norm() < NEAR_ZERO {
            return None;
        }

        let n11 = (m[0][0] - self.edf) / self.erf;
        let n21 = (m[1][0] - self.exf) / self.etf;
        let n12 = (m[0][1] - self.exf) / self.etf;
        let n22 = (m[1][1] - self.edf) / self.erf;

        let (esf, elf) = (self.esf, self.elf);
        let d = (ONE + n11 * esf) * (ONE + n22 * esf) - n21 * n12 * elf * elf;
        if d.norm() < NEAR_ZERO {
            return None;
        }

        let s11 = (n11 * (ONE + n22 * esf) - elf * n21 * n12) / d;
        let s21 = n21 * (ONE + n22 * (esf - elf)) / d;
        let s12 = n12 * (ONE + n11 * (esf - elf)) / d;
        let s22 = (n22 * (ONE + n11 * esf) - elf * n21 * n12) / d;

        Some([[s11, s12], [s21, s22]])
    }

    /// Partial correction from a forward measurement alone
    ///
    /// Assumes the DUT's port 2 is matched, so the result has S12 = S22 = 0.
    pub fn correct_forward(&self, m11: Complex64, m21: Complex64) -> Option<SMatrix2> {
        if self.etf.norm() < NEAR_ZERO {
            return None;
        }
        let s11 = self.reflection_in(m11)?;
        let s21 = (m21 - self.exf) * (ONE - self.esf * s11) / self.etf;
        Some([[s11, ZERO], [s21, ZERO]])
    }

    fn is_finite(&self) -> bool {
        [self.edf, self.esf, self.erf, self.elf, self.etf, self.exf]
            .iter()
            .all(|c| c.is_finite())
    }
}

/// Solved forward error terms over a frequency sweep
///
/// Immutable once built; corrections only read it.
#[derive(Debug, Clone)]
pub struct ErrorTerms {
    frequency: Frequency,
    pub directivity: Array1<Complex64>,
    pub source_match: Array1<Complex64>,
    pub reflection_tracking: Array1<Complex64>,
    pub load_match: Array1<Complex64>,
    pub transmission_tracking: Array1<Complex64>,
    pub isolation: Array1<Complex64>,
}

impl ErrorTerms {
    /// Error terms of a perfect analyzer
    pub fn ideal(frequency: Frequency) -> Self {
        Self::from_fn(frequency, |_| ErrorTermPoint::ideal())
    }

    /// Build error terms by evaluating `f(freq_hz)` at each sweep point
    pub fn from_fn<F>(frequency: Frequency, f: F) -> Self
    where
        F: Fn(f64) -> ErrorTermPoint,
    {
        let points: Vec<ErrorTermPoint> = frequency.f().iter().map(|&fhz| f(fhz)).collect();
        Self::from_points(frequency, &points)
    }

    pub(crate) fn from_points(frequency: Frequency, points: &[ErrorTermPoint]) -> Self {
        let collect = |g: fn(&ErrorTermPoint) -> Complex64| -> Array1<Complex64> {
            points.iter().map(g).collect()
        };
        Self {
            frequency,
            directivity: collect(|p| p.edf),
            source_match: collect(|p| p.esf),
            reflection_tracking: collect(|p| p.erf),
            load_match: collect(|p| p.elf),
            transmission_tracking: collect(|p| p.etf),
            isolation: collect(|p| p.exf),
        }
    }

    #[inline]
    pub fn frequency(&self) -> &Frequency {
        &self.frequency
    }

    #[inline]
    pub fn nfreq(&self) -> usize {
        self.directivity.len()
    }

    /// Error terms at frequency index `k`
    pub fn point(&self, k: usize) -> ErrorTermPoint {
        ErrorTermPoint {
            edf: self.directivity[k],
            esf: self.source_match[k],
            erf: self.reflection_tracking[k],
            elf: self.load_match[k],
            etf: self.transmission_tracking[k],
            exf: self.isolation[k],
        }
    }

    /// True when every term at every point is finite
    pub fn is_finite(&self) -> bool {
        (0..self.nfreq()).all(|k| self.point(k).is_finite())
    }

    /// Terms keyed by their conventional names (EDF, ESF, ERF, ELF, ETF, EXF)
    pub fn coefs(&self) -> BTreeMap<&'static str, Array1<Complex64>> {
        BTreeMap::from([
            ("EDF", self.directivity.clone()),
            ("ESF", self.source_match.clone()),
            ("ERF", self.reflection_tracking.clone()),
            ("ELF", self.load_match.clone()),
            ("ETF", self.transmission_tracking.clone()),
            ("EXF", self.isolation.clone()),
        ])
    }

    /// Raw forward measurement of a 2-port `dut` through this error model
    ///
    /// Only S11 and S21 of the result carry data; S12 and S22 are zero, as
    /// a one-path analyzer cannot measure them.
    pub fn embed(&self, dut: &Network) -> Result<Network> {
        dut.ensure_nports(2, dut.label())?;
        self.frequency.ensure_matches(&dut.frequency, dut.label())?;

        let mut s = Array3::<Complex64>::zeros((self.nfreq(), 2, 2));
        for k in 0..self.nfreq() {
            let sk = [
                [dut.s[[k, 0, 0]], dut.s[[k, 0, 1]]],
                [dut.s[[k, 1, 0]], dut.s[[k, 1, 1]]],
            ];
            let (m11, m21) = self.point(k).embed(&sk);
            if !(m11.is_finite() && m21.is_finite()) {
                return Err(CalibrationError::SingularSystem {
                    index: k,
                    frequency: self.frequency.at(k),
                    condition: f64::INFINITY,
                });
            }
            s[[k, 0, 0]] = m11;
            s[[k, 1, 0]] = m21;
        }

        let mut raw = Network::new(self.frequency.clone(), s, dut.z0.clone());
        raw.name = dut.name.clone();
        Ok(raw)
    }
}
