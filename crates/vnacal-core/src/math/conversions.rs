//! Unit conversion functions
//!
//! dB and phase views of complex S-parameter values.

use num_complex::Complex64;
use std::f64::consts::PI;

/// Convert complex number to dB (20*log10(|z|))
pub fn complex_2_db(z: Complex64) -> f64 {
    20.0 * z.norm().log10()
}

/// Convert complex number to phase in degrees
pub fn complex_2_degree(z: Complex64) -> f64 {
    z.arg() * 180.0 / PI
}
