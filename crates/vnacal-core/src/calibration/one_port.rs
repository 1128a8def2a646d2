//! One-port reflect calibration
//!
//! Directivity, source match and reflection tracking are solved from the
//! port-1 reflection of three or more known reflect standards. Each
//! standard contributes one row of
//!
//! ```text
//! [ 1  -Γi  m*Γi ] [ e00 ]   [ m ]
//!                  [ Δe  ] =
//!                  [ e11 ]
//! ```
//!
//! with Δe = e00*e11 - e10*e01. Three standards give an exact solve, more
//! a least squares fit.

use ndarray::{Array1, Array2, Array3};
use num_complex::Complex64;
use tracing::debug;

use super::error_terms::{ErrorTermPoint, ErrorTerms};
use crate::constants::{NEAR_ZERO, SINGULAR_TOL};
use crate::error::{CalibrationError, Result};
use crate::frequency::Frequency;
use crate::math::linalg::lstsq_complex;
use crate::network::Network;

/// Directivity, source match and reflection tracking at one frequency point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReflectTerms {
    pub edf: Complex64,
    pub esf: Complex64,
    pub erf: Complex64,
    pub condition: f64,
}

/// Solve the reflect terms at one frequency point
///
/// `measured[i]` is the raw reflection of the standard whose ideal
/// reflection is `ideal[i]`. Fails with `SingularSystem` (tagged with
/// `index` and `frequency`) when the system's reciprocal condition number
/// is below `singular_tolerance` or the tracking term vanishes.
pub fn solve_reflect_point(
    measured: &[Complex64],
    ideal: &[Complex64],
    singular_tolerance: f64,
    index: usize,
    frequency: f64,
) -> Result<ReflectTerms> {
    let n = measured.len();
    if n < 3 || ideal.len() != n {
        return Err(CalibrationError::insufficient(format!(
            "{} measured and {} ideal reflect standards, need at least 3 pairs",
            n,
            ideal.len()
        )));
    }

    let one = Complex64::new(1.0, 0.0);
    let a = Array2::from_shape_fn((n, 3), |(i, j)| match j {
        0 => one,
        1 => -ideal[i],
        _ => measured[i] * ideal[i],
    });
    let b = Array1::from_vec(measured.to_vec());

    let singular = |condition: f64| CalibrationError::SingularSystem {
        index,
        frequency,
        condition,
    };

    let res = lstsq_complex(&a, &b).map_err(|_| singular(f64::INFINITY))?;
    if res.rcond() < singular_tolerance {
        return Err(singular(res.condition));
    }

    let (e00, de, e11) = (res.solution[0], res.solution[1], res.solution[2]);
    let erf = e00 * e11 - de;
    if erf.norm() < NEAR_ZERO || !(e00.is_finite() && e11.is_finite() && erf.is_finite()) {
        return Err(singular(res.condition));
    }

    Ok(ReflectTerms {
        edf: e00,
        esf: e11,
        erf,
        condition: res.condition,
    })
}

/// Solve reflect terms across a sweep from (measured, ideal) network pairs
///
/// Uses S11 of every network. Networks must already share `frequency`.
pub(crate) fn solve_reflect_sweep(
    reflects: &[(&Network, &Network)],
    frequency: &Frequency,
    singular_tolerance: f64,
) -> Result<Vec<ReflectTerms>> {
    (0..frequency.npoints())
        .map(|k| {
            let measured: Vec<Complex64> = reflects.iter().map(|(m, _)| m.s[[k, 0, 0]]).collect();
            let ideal: Vec<Complex64> = reflects.iter().map(|(_, i)| i.s[[k, 0, 0]]).collect();
            solve_reflect_point(&measured, &ideal, singular_tolerance, k, frequency.at(k))
        })
        .collect()
}

/// 1-Port SOL (Short-Open-Load) calibration
///
/// Each measured network is paired with the ideal at the same position.
/// Only S11 of the inputs is used, so 2-port reflect standards work too.
#[derive(Debug, Clone)]
pub struct OnePortSol {
    measured: Vec<Network>,
    ideals: Vec<Network>,
    singular_tolerance: f64,
}

impl OnePortSol {
    pub fn new(measured: Vec<Network>, ideals: Vec<Network>) -> Result<Self> {
        if measured.len() != ideals.len() {
            return Err(CalibrationError::insufficient(format!(
                "{} measurements for {} ideals",
                measured.len(),
                ideals.len()
            )));
        }
        if measured.len() < 3 {
            return Err(CalibrationError::insufficient(format!(
                "one-port calibration needs at least 3 standards, got {}",
                measured.len()
            )));
        }

        let reference = &measured[0].frequency;
        for ntwk in measured.iter().chain(ideals.iter()) {
            reference.ensure_matches(&ntwk.frequency, ntwk.label())?;
        }

        Ok(Self {
            measured,
            ideals,
            singular_tolerance: SINGULAR_TOL,
        })
    }

    /// Override the singular-system threshold
    pub fn with_tolerance(mut self, singular_tolerance: f64) -> Self {
        self.singular_tolerance = singular_tolerance;
        self
    }

    #[inline]
    pub fn frequency(&self) -> &Frequency {
        &self.measured[0].frequency
    }

    /// Calculate error terms
    ///
    /// Only EDF, ESF and ERF are solved; the transmission terms are those
    /// of a perfect analyzer.
    pub fn run(&self) -> Result<ErrorTerms> {
        let pairs: Vec<(&Network, &Network)> =
            self.measured.iter().zip(self.ideals.iter()).collect();
        let solved = solve_reflect_sweep(&pairs, self.frequency(), self.singular_tolerance)?;

        let worst = solved.iter().map(|t| t.condition).fold(0.0_f64, f64::max);
        debug!(
            nstandards = pairs.len(),
            nfreq = solved.len(),
            worst_condition = worst,
            "one-port calibration solved"
        );

        let points: Vec<ErrorTermPoint> = solved
            .iter()
            .map(|t| ErrorTermPoint {
                edf: t.edf,
                esf: t.esf,
                erf: t.erf,
                ..ErrorTermPoint::ideal()
            })
            .collect();
        Ok(ErrorTerms::from_points(self.frequency().clone(), &points))
    }

    /// Apply calibration to a measured reflection, returning a 1-port network
    pub fn apply(&self, uncalibrated: &Network) -> Result<Network> {
        let terms = self.run()?;
        self.frequency()
            .ensure_matches(&uncalibrated.frequency, uncalibrated.label())?;

        let nfreq = uncalibrated.nfreq();
        let mut s_cal = Array3::<Complex64>::zeros((nfreq, 1, 1));

        for f in 0..nfreq {
            s_cal[[f, 0, 0]] = terms
                .point(f)
                .reflection_in(uncalibrated.s[[f, 0, 0]])
                .ok_or(CalibrationError::SingularSystem {
                    index: f,
                    frequency: self.frequency().at(f),
                    condition: f64::INFINITY,
                })?;
        }

        let mut out = Network::new(
            uncalibrated.frequency.clone(),
            s_cal,
            uncalibrated.z0.slice(ndarray::s![..1]).to_owned(),
        );
        out.name = uncalibrated.name.clone();
        Ok(out)
    }
}
