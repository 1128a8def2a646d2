//! Calibration standards
//!
//! A standard pairs the raw measurement of a known device with its ideal
//! (expected) response. Reflect standards are 2-port networks with no
//! transmission; the through connects the two analyzer ports.

use ndarray::{Array1, Array3};
use num_complex::Complex64;
use std::f64::consts::PI;
use std::fmt;

use crate::error::{CalibrationError, Result};
use crate::frequency::Frequency;
use crate::network::Network;

/// Kind of calibration standard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StandardKind {
    Short,
    Open,
    Match,
    Through,
}

impl StandardKind {
    /// Infer the kind from a standard name
    ///
    /// The name is split on non-alphanumeric characters and the first
    /// recognised token wins, so `"p1_short.s2p"` is a short and
    /// `"Load"` is a match.
    pub fn from_name(name: &str) -> Option<Self> {
        name.split(|c: char| !c.is_ascii_alphanumeric())
            .find_map(|token| match token.to_lowercase().as_str() {
                "short" => Some(StandardKind::Short),
                "open" => Some(StandardKind::Open),
                "match" | "load" => Some(StandardKind::Match),
                "thru" | "through" => Some(StandardKind::Through),
                _ => None,
            })
    }

    /// True for every standard without transmission
    #[inline]
    pub fn is_reflect(&self) -> bool {
        !matches!(self, StandardKind::Through)
    }

    /// Ideal reflection coefficient of a reflect standard
    pub fn ideal_reflection(&self) -> Option<Complex64> {
        match self {
            StandardKind::Short => Some(Complex64::new(-1.0, 0.0)),
            StandardKind::Open => Some(Complex64::new(1.0, 0.0)),
            StandardKind::Match => Some(Complex64::new(0.0, 0.0)),
            StandardKind::Through => None,
        }
    }

    /// Ideal 2-port model of this standard over `frequency`
    pub fn ideal(&self, frequency: &Frequency, z0: f64) -> Network {
        let model = match self.ideal_reflection() {
            Some(gamma) => two_port_reflect(frequency, z0, gamma),
            None => ideal_thru(frequency, z0),
        };
        model.with_name(self.to_string())
    }
}

impl fmt::Display for StandardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StandardKind::Short => "short",
            StandardKind::Open => "open",
            StandardKind::Match => "match",
            StandardKind::Through => "thru",
        };
        write!(f, "{}", s)
    }
}

/// Raw measurement of a standard together with its ideal response
#[derive(Debug, Clone)]
pub struct CalibrationStandard {
    pub kind: StandardKind,
    pub ideal: Network,
    pub measured: Network,
}

impl CalibrationStandard {
    pub fn new(kind: StandardKind, ideal: Network, measured: Network) -> Self {
        Self {
            kind,
            ideal,
            measured,
        }
    }

    /// Pair a measurement with the closed-form ideal model of `kind`
    ///
    /// The model uses the measurement's sweep and its port-1 reference
    /// impedance.
    pub fn with_ideal_model(kind: StandardKind, measured: Network) -> Self {
        let z0 = measured.z0.first().map(|z| z.re).unwrap_or(50.0);
        let ideal = kind.ideal(&measured.frequency, z0);
        Self::new(kind, ideal, measured)
    }

    /// Name of the measurement, or the kind when unnamed
    pub fn name(&self) -> String {
        self.measured
            .name
            .clone()
            .unwrap_or_else(|| self.kind.to_string())
    }
}

/// Pair measured networks with ideal networks by name
///
/// Names are compared case-insensitively. Every measurement must have a
/// name, a matching ideal, and a name from which the standard kind can be
/// inferred. Ideals without a measurement are ignored.
pub fn pair_by_name(measured: Vec<Network>, ideals: Vec<Network>) -> Result<Vec<CalibrationStandard>> {
    let mut ideals: Vec<Option<Network>> = ideals.into_iter().map(Some).collect();
    let mut standards = Vec::with_capacity(measured.len());

    for m in measured {
        let name = m
            .name
            .clone()
            .ok_or_else(|| CalibrationError::insufficient("measured standard has no name"))?;
        let kind = StandardKind::from_name(&name).ok_or_else(|| {
            CalibrationError::insufficient(format!("cannot infer standard kind from '{}'", name))
        })?;

        let slot = ideals
            .iter_mut()
            .find(|slot| {
                slot.as_ref()
                    .and_then(|ideal| ideal.name.as_deref())
                    .is_some_and(|n| n.eq_ignore_ascii_case(&name))
            })
            .ok_or_else(|| {
                CalibrationError::insufficient(format!("no ideal standard named '{}'", name))
            })?;

        // take() so a second measurement with the same name cannot reuse it
        if let Some(ideal) = slot.take() {
            standards.push(CalibrationStandard::new(kind, ideal, m));
        }
    }

    Ok(standards)
}

/// 2-port reflect standard: the same termination on both ports, no transmission
pub fn two_port_reflect(frequency: &Frequency, z0: f64, gamma: Complex64) -> Network {
    let nfreq = frequency.npoints();
    let s = Array3::from_shape_fn((nfreq, 2, 2), |(_, i, j)| {
        if i == j {
            gamma
        } else {
            Complex64::new(0.0, 0.0)
        }
    });
    Network::new(frequency.clone(), s, Array1::from_elem(2, Complex64::new(z0, 0.0)))
}

/// Ideal flush through: S21 = S12 = 1, S11 = S22 = 0
pub fn ideal_thru(frequency: &Frequency, z0: f64) -> Network {
    delay_thru(frequency, z0, 0.0)
}

/// Matched, lossless through with a fixed delay in seconds
///
/// S21 = S12 = exp(-j 2π f τ).
pub fn delay_thru(frequency: &Frequency, z0: f64, delay: f64) -> Network {
    Network::from_fn(frequency.clone(), 2, z0, |_, f, i, j| {
        if i == j {
            Complex64::new(0.0, 0.0)
        } else {
            Complex64::from_polar(1.0, -2.0 * PI * f * delay)
        }
    })
}
