//! Two-port, one-path (1.5-port) calibration
//!
//! A one-path analyzer only measures S11 and S21. The reverse parameters of
//! a DUT come from measuring it a second time with its ports swapped, so
//! both directions are corrected with the same forward error terms.
//!
//! # Example
//!
//! ```
//! use vnacal_core::calibration::{CalibrationStandard, StandardKind, TwoPortOnePath};
//! use vnacal_core::calibration::{ErrorTermPoint, ErrorTerms};
//! use vnacal_core::config::CalibrationConfig;
//! use vnacal_core::frequency::{Frequency, FrequencyUnit, SweepType};
//! use num_complex::Complex64;
//!
//! let freq = Frequency::new(1.0, 2.0, 11, FrequencyUnit::GHz, SweepType::Linear);
//! let analyzer = ErrorTerms::from_fn(freq.clone(), |_| ErrorTermPoint {
//!     edf: Complex64::new(0.05, 0.01),
//!     etf: Complex64::new(0.9, -0.2),
//!     ..ErrorTermPoint::ideal()
//! });
//!
//! let standards: Vec<CalibrationStandard> = [
//!     StandardKind::Short,
//!     StandardKind::Open,
//!     StandardKind::Match,
//!     StandardKind::Through,
//! ]
//! .into_iter()
//! .map(|kind| {
//!     let raw = analyzer.embed(&kind.ideal(&freq, 50.0)).unwrap();
//!     CalibrationStandard::with_ideal_model(kind, raw)
//! })
//! .collect();
//!
//! let cal = TwoPortOnePath::new(standards, CalibrationConfig::default()).unwrap();
//! assert!((cal.error_terms().directivity[0] - Complex64::new(0.05, 0.01)).norm() < 1e-12);
//! ```

use ndarray::{Array1, Array3};
use num_complex::Complex64;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use super::error_terms::{ErrorTermPoint, ErrorTerms, SMatrix2};
use super::one_port::solve_reflect_sweep;
use super::standard::{pair_by_name, CalibrationStandard, StandardKind};
use crate::config::CalibrationConfig;
use crate::constants::NEAR_ZERO;
use crate::error::{CalibrationError, Result};
use crate::frequency::Frequency;
use crate::network::Network;

/// Solved one-path calibration
///
/// Built once from standards; `apply_cal` only reads it.
#[derive(Debug, Clone)]
pub struct TwoPortOnePath {
    config: CalibrationConfig,
    terms: ErrorTerms,
    residual: f64,
}

impl TwoPortOnePath {
    /// Solve the calibration from paired standards
    pub fn new(standards: Vec<CalibrationStandard>, config: CalibrationConfig) -> Result<Self> {
        let (terms, residual) = solve(&standards, &config)?;
        Ok(Self {
            config,
            terms,
            residual,
        })
    }

    /// Solve the calibration from measured and ideal networks paired by name
    pub fn from_named(
        measured: Vec<Network>,
        ideals: Vec<Network>,
        config: CalibrationConfig,
    ) -> Result<Self> {
        Self::new(pair_by_name(measured, ideals)?, config)
    }

    #[inline]
    pub fn error_terms(&self) -> &ErrorTerms {
        &self.terms
    }

    #[inline]
    pub fn config(&self) -> &CalibrationConfig {
        &self.config
    }

    #[inline]
    pub fn frequency(&self) -> &Frequency {
        self.terms.frequency()
    }

    /// Worst |raw - modelled raw| over the through standards
    #[inline]
    pub fn residual(&self) -> f64 {
        self.residual
    }

    /// Error terms keyed by name (EDF, ESF, ERF, ELF, ETF, EXF)
    pub fn coefs(&self) -> BTreeMap<&'static str, Array1<Complex64>> {
        self.terms.coefs()
    }

    /// Correct a DUT from a forward measurement and a port-swapped measurement
    ///
    /// `forward` is the DUT as connected; `reverse` is the same DUT with its
    /// ports physically swapped. Returns the fully populated corrected
    /// 2-port network.
    pub fn apply_cal(&self, forward: &Network, reverse: &Network) -> Result<Network> {
        let fwd = self.orient(forward)?;
        let rev = self.orient(reverse)?;

        let mut s = Array3::<Complex64>::zeros((fwd.nfreq(), 2, 2));
        for k in 0..fwd.nfreq() {
            let m: SMatrix2 = [
                [fwd.s[[k, 0, 0]], rev.s[[k, 1, 0]]],
                [fwd.s[[k, 1, 0]], rev.s[[k, 0, 0]]],
            ];
            let corrected = self
                .terms
                .point(k)
                .correct(&m)
                .ok_or_else(|| self.singular_at(k))?;
            write_point(&mut s, k, &corrected);
        }

        self.finish(forward, s)
    }

    /// Correct a DUT from a forward measurement only
    ///
    /// Without the swapped measurement the DUT's port 2 is assumed matched,
    /// so the result has S12 = S22 = 0.
    pub fn apply_cal_forward(&self, forward: &Network) -> Result<Network> {
        warn!(
            dut = forward.label(),
            "only one measurement orientation given, error correction is partial"
        );
        let fwd = self.orient(forward)?;

        let mut s = Array3::<Complex64>::zeros((fwd.nfreq(), 2, 2));
        for k in 0..fwd.nfreq() {
            let corrected = self
                .terms
                .point(k)
                .correct_forward(fwd.s[[k, 0, 0]], fwd.s[[k, 1, 0]])
                .ok_or_else(|| self.singular_at(k))?;
            write_point(&mut s, k, &corrected);
        }

        self.finish(forward, s)
    }

    /// Check a raw network and bring it into the source-port-1 frame
    fn orient(&self, raw: &Network) -> Result<Network> {
        raw.ensure_nports(2, raw.label())?;
        self.frequency().ensure_matches(&raw.frequency, raw.label())?;
        to_port1_frame(raw, self.config.source_port)
    }

    fn finish(&self, template: &Network, s: Array3<Complex64>) -> Result<Network> {
        let mut out = Network::new(template.frequency.clone(), s, template.z0.clone());
        out.name = template.name.clone();
        if self.config.source_port == 2 {
            // corrected in the flipped frame, z0 was never flipped
            out.s = out.flipped()?.s;
        }
        Ok(out)
    }

    fn singular_at(&self, k: usize) -> CalibrationError {
        CalibrationError::SingularSystem {
            index: k,
            frequency: self.frequency().at(k),
            condition: f64::INFINITY,
        }
    }
}

fn write_point(s: &mut Array3<Complex64>, k: usize, m: &SMatrix2) {
    for i in 0..2 {
        for j in 0..2 {
            s[[k, i, j]] = m[i][j];
        }
    }
}

/// Measurements driven from port 2 are flipped so the forward algebra applies
fn to_port1_frame(ntwk: &Network, source_port: usize) -> Result<Network> {
    match source_port {
        1 => Ok(ntwk.clone()),
        2 => ntwk.flipped(),
        port => Err(CalibrationError::InvalidPort { port, nports: 2 }),
    }
}

/// Solve the one-path error terms from standards
///
/// Returns the error terms and the worst through residual. Pure: the
/// standards are only read.
pub fn solve(
    standards: &[CalibrationStandard],
    config: &CalibrationConfig,
) -> Result<(ErrorTerms, f64)> {
    let first = standards
        .first()
        .ok_or_else(|| CalibrationError::insufficient("no calibration standards"))?;
    let frequency = first.measured.frequency.clone();
    if frequency.npoints() == 0 {
        return Err(CalibrationError::insufficient("empty frequency sweep"));
    }

    // Validate everything before touching the numbers
    let mut measured = Vec::with_capacity(standards.len());
    let mut ideals = Vec::with_capacity(standards.len());
    for standard in standards {
        let name = standard.name();
        standard.measured.ensure_nports(2, &format!("measured {}", name))?;
        standard.ideal.ensure_nports(2, &format!("ideal {}", name))?;
        frequency.ensure_matches(&standard.measured.frequency, &format!("measured {}", name))?;
        frequency.ensure_matches(&standard.ideal.frequency, &format!("ideal {}", name))?;
        measured.push(to_port1_frame(&standard.measured, config.source_port)?);
        ideals.push(to_port1_frame(&standard.ideal, config.source_port)?);
    }

    let kinds: Vec<StandardKind> = standards.iter().map(|s| s.kind).collect();
    let reflects: Vec<(&Network, &Network)> = (0..standards.len())
        .filter(|&i| kinds[i].is_reflect())
        .map(|i| (&measured[i], &ideals[i]))
        .collect();
    let thrus: Vec<(&Network, &Network)> = (0..standards.len())
        .filter(|&i| !kinds[i].is_reflect())
        .map(|i| (&measured[i], &ideals[i]))
        .collect();
    let matches: Vec<&Network> = (0..standards.len())
        .filter(|&i| kinds[i] == StandardKind::Match)
        .map(|i| &measured[i])
        .collect();

    if reflects.len() < 3 {
        return Err(CalibrationError::insufficient(format!(
            "need at least 3 reflect standards, got {}",
            reflects.len()
        )));
    }
    if config.n_thrus == 0 || thrus.len() != config.n_thrus {
        return Err(CalibrationError::insufficient(format!(
            "expected {} through standard(s), got {}",
            config.n_thrus,
            thrus.len()
        )));
    }
    if config.isolation && matches.is_empty() {
        return Err(CalibrationError::insufficient(
            "isolation correction requires a match standard",
        ));
    }

    let reflect_terms = solve_reflect_sweep(&reflects, &frequency, config.singular_tolerance)?;

    let mut points = Vec::with_capacity(frequency.npoints());
    let mut residual = 0.0_f64;
    let singular = |k: usize| CalibrationError::SingularSystem {
        index: k,
        frequency: frequency.at(k),
        condition: f64::INFINITY,
    };

    for (k, rt) in reflect_terms.iter().enumerate() {
        let mut point = ErrorTermPoint {
            edf: rt.edf,
            esf: rt.esf,
            erf: rt.erf,
            ..ErrorTermPoint::ideal()
        };

        if config.isolation {
            let sum: Complex64 = matches.iter().map(|m| m.s[[k, 1, 0]]).sum();
            point.exf = sum / matches.len() as f64;
        }

        let mut elf_sum = Complex64::new(0.0, 0.0);
        let mut etf_sum = Complex64::new(0.0, 0.0);
        for (m, ideal) in &thrus {
            let (elf, etf) = solve_thru_point(&point, m, ideal, k).ok_or_else(|| singular(k))?;
            elf_sum += elf;
            etf_sum += etf;
        }
        point.elf = elf_sum / thrus.len() as f64;
        point.etf = etf_sum / thrus.len() as f64;
        if point.etf.norm() < NEAR_ZERO {
            return Err(singular(k));
        }

        for (m, ideal) in &thrus {
            let (m11, m21) = point.embed(&matrix_at(ideal, k));
            let r = (m11 - m.s[[k, 0, 0]]).norm().max((m21 - m.s[[k, 1, 0]]).norm());
            residual = residual.max(r);
        }

        points.push(point);
    }

    let worst_condition = reflect_terms.iter().map(|t| t.condition).fold(0.0_f64, f64::max);
    debug!(
        nreflects = reflects.len(),
        nthrus = thrus.len(),
        nfreq = frequency.npoints(),
        source_port = config.source_port,
        worst_condition,
        residual,
        "one-path calibration solved"
    );
    if residual > config.through_tolerance {
        warn!(
            residual,
            tolerance = config.through_tolerance,
            "corrected through deviates from its ideal response"
        );
    }

    Ok((ErrorTerms::from_points(frequency, &points), residual))
}

fn matrix_at(ntwk: &Network, k: usize) -> SMatrix2 {
    [
        [ntwk.s[[k, 0, 0]], ntwk.s[[k, 0, 1]]],
        [ntwk.s[[k, 1, 0]], ntwk.s[[k, 1, 1]]],
    ]
}

/// Load match and transmission tracking from one through at point `k`
fn solve_thru_point(
    terms: &ErrorTermPoint,
    measured: &Network,
    ideal: &Network,
    k: usize,
) -> Option<(Complex64, Complex64)> {
    let s = matrix_at(ideal, k);
    let (s11, s12, s21, s22) = (s[0][0], s[0][1], s[1][0], s[1][1]);
    let (m11, m21) = (measured.s[[k, 0, 0]], measured.s[[k, 1, 0]]);

    let gamma_in = terms.reflection_in(m11)?;
    let den = s12 * s21 + s22 * (gamma_in - s11);
    if den.norm() < NEAR_ZERO || s21.norm() < NEAR_ZERO {
        return None;
    }
    let elf = (gamma_in - s11) / den;

    let ds = s11 * s22 - s12 * s21;
    let d = Complex64::new(1.0, 0.0) - terms.esf * s11 - elf * s22 + terms.esf * elf * ds;
    let etf = (m21 - terms.exf) * d / s21;

    // an unconnected through leaves no transmission to track
    let usable = elf.is_finite() && etf.is_finite() && etf.norm() >= NEAR_ZERO;
    usable.then_some((elf, etf))
}
