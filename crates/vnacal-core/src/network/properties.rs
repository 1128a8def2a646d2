//! Network property checks
//!
//! Reciprocity, passivity and losslessness tests used to sanity-check
//! corrected measurements.

use num_complex::Complex64;

use super::core::Network;
use crate::constants::PROPERTY_TOL;

impl Network {
    /// Largest |S_ij - S_ji| over the sweep
    ///
    /// Zero for a perfectly reciprocal network.
    pub fn max_nonreciprocity(&self) -> f64 {
        let nports = self.nports();
        let mut worst = 0.0_f64;

        for f in 0..self.nfreq() {
            for i in 0..nports {
                for j in i + 1..nports {
                    worst = worst.max((self.s[[f, i, j]] - self.s[[f, j, i]]).norm());
                }
            }
        }
        worst
    }

    /// Test if network is reciprocal (S = S^T)
    pub fn is_reciprocal(&self, tol: Option<f64>) -> bool {
        self.max_nonreciprocity() <= tol.unwrap_or(PROPERTY_TOL)
    }

    /// Test if network is passive
    ///
    /// Simplified check: every column of S carries at most unit power.
    pub fn is_passive(&self, tol: Option<f64>) -> bool {
        let tol = tol.unwrap_or(PROPERTY_TOL);
        let nports = self.nports();

        (0..self.nfreq()).all(|f| {
            (0..nports).all(|i| {
                let sum_sq: f64 = (0..nports).map(|k| self.s[[f, k, i]].norm_sqr()).sum();
                sum_sq <= 1.0 + tol
            })
        })
    }

    /// Test if network is lossless (S^H * S = I)
    pub fn is_lossless(&self, tol: Option<f64>) -> bool {
        let tol = tol.unwrap_or(PROPERTY_TOL);
        let nports = self.nports();

        for f in 0..self.nfreq() {
            for i in 0..nports {
                for j in 0..nports {
                    let sum: Complex64 = (0..nports)
                        .map(|k| self.s[[f, k, i]].conj() * self.s[[f, k, j]])
                        .sum();
                    let expected = if i == j { 1.0 } else { 0.0 };
                    if (sum.re - expected).abs() > tol || sum.im.abs() > tol {
                        return false;
                    }
                }
            }
        }
        true
    }
}
