//! Transmission line helpers
//!
//! Closed-form relations between load impedance, reflection coefficient,
//! standing wave ratio and the voltage/current along a uniform line. An
//! electrical length `theta` is the complex product `gamma * d` of the
//! propagation constant and the line length.

use num_complex::Complex64;
use std::f64::consts::PI;

use crate::constants::NEAR_ZERO;

/// Reflection coefficient of a load `zl` on a line of impedance `z0`
///
/// Γ0 = (zl - z0) / (zl + z0). An infinite load (open) gives 1.
pub fn zl_2_gamma0(z0: Complex64, zl: Complex64) -> Complex64 {
    if zl.re.is_infinite() || zl.im.is_infinite() {
        return Complex64::new(1.0, 0.0);
    }
    (zl - z0) / (zl + z0)
}

/// Standing wave ratio from a reflection coefficient
///
/// SWR = (1 + |Γ|) / (1 - |Γ|), infinite for total reflection. The
/// quotient is correctly rounded, so |Γ| = 1/3 gives exactly 2.
pub fn gamma0_2_swr(gamma: Complex64) -> f64 {
    let mag = gamma.norm();
    if mag >= 1.0 {
        return f64::INFINITY;
    }

    // exact rounding errors of 1 + |Γ| and 1 - |Γ|
    let num = 1.0 + mag;
    let num_err = mag - (num - 1.0);
    let den = 1.0 - mag;
    let den_err = (1.0 - den) - mag;

    let q = num / den;
    let r = (-q).mul_add(den, num) + num_err - q * den_err;
    q + r / den
}

/// Standing wave ratio of a load `zl` on a line of impedance `z0`
///
/// A resistive load on a real line uses the impedance ratio directly.
pub fn zl_2_swr(z0: Complex64, zl: Complex64) -> f64 {
    if z0.im == 0.0 && zl.im == 0.0 && z0.re > 0.0 && zl.re > 0.0 {
        return (zl.re / z0.re).max(z0.re / zl.re);
    }
    gamma0_2_swr(zl_2_gamma0(z0, zl))
}

/// Propagation constant of a lossless line, γ = jβ = j·2πf / v
pub fn propagation_constant_lossless(f: f64, v_phase: f64) -> Complex64 {
    Complex64::new(0.0, 2.0 * PI * f / v_phase)
}

/// Electrical length θ = γ·d
pub fn electrical_length(gamma: Complex64, d: f64) -> Complex64 {
    gamma * d
}

/// Reflection coefficient seen at the line input, Γin = Γ0·e^(-2θ)
pub fn gamma0_2_gamma_in(gamma0: Complex64, theta: Complex64) -> Complex64 {
    gamma0 * (-2.0 * theta).exp()
}

/// Input impedance of a line of impedance `z0` and electrical length `theta`
/// terminated in `zl`
///
/// Returns an infinite impedance when the transformed load is an open.
pub fn zl_2_zin(z0: Complex64, zl: Complex64, theta: Complex64) -> Complex64 {
    let gamma_in = gamma0_2_gamma_in(zl_2_gamma0(z0, zl), theta);
    let den = Complex64::new(1.0, 0.0) - gamma_in;
    if den.norm() < NEAR_ZERO {
        return Complex64::new(f64::INFINITY, 0.0);
    }
    z0 * (Complex64::new(1.0, 0.0) + gamma_in) / den
}

/// Voltage and current at the far end of a line
///
/// Given voltage `v1` and current `i1` flowing into the line at its input,
/// returns `(v2, i2)` at distance θ, with `i2` flowing toward the load:
///
/// v2 = v1·cosh θ − i1·z0·sinh θ
/// i2 = −(v1/z0)·sinh θ + i1·cosh θ
pub fn voltage_current_propagation(
    v1: Complex64,
    i1: Complex64,
    z0: Complex64,
    theta: Complex64,
) -> (Complex64, Complex64) {
    let (ch, sh) = (theta.cosh(), theta.sinh());
    let v2 = v1 * ch - i1 * z0 * sh;
    let i2 = -v1 / z0 * sh + i1 * ch;
    (v2, i2)
}
