//! Derived network properties
//!
//! Magnitude, dB, phase and VSWR views of the S-parameters.

use ndarray::Array3;

use super::core::Network;
use crate::math::conversions::{complex_2_db, complex_2_degree};
use crate::tline::gamma0_2_swr;

impl Network {
    /// Get S-parameter magnitude in dB
    #[inline]
    pub fn s_db(&self) -> Array3<f64> {
        self.s.mapv(complex_2_db)
    }

    /// Get S-parameter magnitude (linear)
    #[inline]
    pub fn s_mag(&self) -> Array3<f64> {
        self.s.mapv(|c| c.norm())
    }

    /// Get S-parameter phase in degrees
    #[inline]
    pub fn s_deg(&self) -> Array3<f64> {
        self.s.mapv(complex_2_degree)
    }

    /// Get VSWR, (1 + |S|) / (1 - |S|)
    ///
    /// Only the diagonal entries are meaningful. Total reflection gives
    /// infinity.
    pub fn vswr(&self) -> Array3<f64> {
        self.s.mapv(gamma0_2_swr)
    }
}
