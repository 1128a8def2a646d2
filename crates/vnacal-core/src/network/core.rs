//! Core Network struct and constructors
//!
//! Contains the fundamental Network data structure and factory methods.

use ndarray::{Array1, Array3};
use num_complex::Complex64;

use crate::error::{CalibrationError, Result};
use crate::frequency::Frequency;

/// An N-port electrical network
#[derive(Debug, Clone)]
pub struct Network {
    /// Frequency data
    pub frequency: Frequency,
    /// S-parameter data [nfreq, nports, nports]
    pub s: Array3<Complex64>,
    /// Reference impedance (per port)
    pub z0: Array1<Complex64>,
    /// Network name, used to pair measured and ideal standards
    pub name: Option<String>,
}

impl Network {
    /// Create a new Network from S-parameters
    ///
    /// Shapes are not checked; use [`Network::try_new`] for data coming
    /// from outside the crate.
    pub fn new(frequency: Frequency, s: Array3<Complex64>, z0: Array1<Complex64>) -> Self {
        Self {
            frequency,
            s,
            z0,
            name: None,
        }
    }

    /// Create a new Network, validating the array shapes
    ///
    /// The S array must be `[nfreq, nports, nports]` with `nfreq` equal to
    /// the sweep length, and `z0` must hold one impedance per port.
    pub fn try_new(
        frequency: Frequency,
        s: Array3<Complex64>,
        z0: Array1<Complex64>,
    ) -> Result<Self> {
        let (nfreq, rows, cols) = s.dim();
        if rows != cols {
            return Err(CalibrationError::InvalidShape {
                reason: format!("S matrix is {}x{}, expected square", rows, cols),
            });
        }
        if nfreq != frequency.npoints() {
            return Err(CalibrationError::FrequencyMismatch {
                expected: frequency.npoints(),
                found: nfreq,
                detail: "S-parameter array".to_string(),
            });
        }
        if z0.len() != rows {
            return Err(CalibrationError::InvalidShape {
                reason: format!("{} reference impedances for {} ports", z0.len(), rows),
            });
        }
        Ok(Self::new(frequency, s, z0))
    }

    /// Build a network by evaluating `f(freq_index, freq_hz, i, j)` for every entry
    ///
    /// All ports share the real reference impedance `z0`.
    pub fn from_fn<F>(frequency: Frequency, nports: usize, z0: f64, f: F) -> Self
    where
        F: Fn(usize, f64, usize, usize) -> Complex64,
    {
        let nfreq = frequency.npoints();
        let s = Array3::from_shape_fn((nfreq, nports, nports), |(k, i, j)| {
            f(k, frequency.at(k), i, j)
        });
        let z0 = Array1::from_elem(nports, Complex64::new(z0, 0.0));
        Self::new(frequency, s, z0)
    }

    /// Set the network name (builder style)
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Get the number of ports
    #[inline]
    pub fn nports(&self) -> usize {
        self.s.shape()[1]
    }

    /// Get the number of frequency points
    #[inline]
    pub fn nfreq(&self) -> usize {
        self.s.shape()[0]
    }

    /// Get frequency vector in Hz
    #[inline]
    pub fn f(&self) -> &[f64] {
        self.frequency.f()
    }

    /// Trace of a single S-parameter `S[i][j]` across the sweep (0-based ports)
    pub fn s_param(&self, i: usize, j: usize) -> Result<Array1<Complex64>> {
        let nports = self.nports();
        for port in [i, j] {
            if port >= nports {
                return Err(CalibrationError::InvalidPort { port, nports });
            }
        }
        Ok(self.s.slice(ndarray::s![.., i, j]).to_owned())
    }

    /// Fail unless this network has exactly `nports` ports
    pub(crate) fn ensure_nports(&self, nports: usize, what: &str) -> Result<()> {
        if self.nports() != nports {
            return Err(CalibrationError::insufficient(format!(
                "{} has {} ports, expected {}",
                what,
                self.nports(),
                nports
            )));
        }
        Ok(())
    }

    /// Display name for log and error messages
    pub(crate) fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("<unnamed>")
    }
}
