//! Multiport assembly from calibrated port pairs
//!
//! An N-port DUT is measured one port pair at a time with a two-port
//! one-path analyzer. Each corrected pair (i, j) fills
//!
//! - S11 -> s[i, i]
//! - S21 -> s[j, i]
//! - S12 -> s[i, j]
//! - S22 -> s[j, j]
//!
//! of the assembled network.

use ndarray::{Array1, Array2, Array3};
use num_complex::Complex64;
use std::collections::HashMap;
use tracing::info;

use super::one_path::TwoPortOnePath;
use crate::config::{AssemblyConfig, DiagonalPolicy};
use crate::error::{CalibrationError, Result};
use crate::frequency::Frequency;
use crate::network::Network;

/// Accumulates calibrated 2-port results into an N-port network
#[derive(Debug, Clone)]
pub struct MultiportAssembler {
    frequency: Frequency,
    policy: DiagonalPolicy,
    s: Array3<Complex64>,
    z0: Array1<Complex64>,
    written: Array2<bool>,
    diagonal_count: Vec<usize>,
}

impl MultiportAssembler {
    pub fn new(nports: usize, frequency: Frequency, config: &AssemblyConfig) -> Self {
        let nfreq = frequency.npoints();
        Self {
            frequency,
            policy: config.diagonal,
            s: Array3::zeros((nfreq, nports, nports)),
            z0: Array1::from_elem(nports, Complex64::new(50.0, 0.0)),
            written: Array2::from_elem((nports, nports), false),
            diagonal_count: vec![0; nports],
        }
    }

    #[inline]
    pub fn nports(&self) -> usize {
        self.diagonal_count.len()
    }

    /// Insert the calibrated 2-port for ports `i` (its port 1) and `j` (its port 2)
    pub fn insert(&mut self, i: usize, j: usize, pair: &Network) -> Result<()> {
        let nports = self.nports();
        for port in [i, j] {
            if port >= nports {
                return Err(CalibrationError::InvalidPort { port, nports });
            }
        }
        if i == j {
            return Err(CalibrationError::insufficient(format!(
                "pair ({}, {}) does not connect two ports",
                i, j
            )));
        }
        pair.ensure_nports(2, &format!("pair ({}, {})", i, j))?;
        self.frequency
            .ensure_matches(&pair.frequency, &format!("pair ({}, {})", i, j))?;

        for (row, col) in [(j, i), (i, j)] {
            if self.written[[row, col]] {
                return Err(CalibrationError::insufficient(format!(
                    "duplicate result for s[{}, {}] from pair ({}, {})",
                    row, col, i, j
                )));
            }
        }

        for k in 0..self.frequency.npoints() {
            self.s[[k, j, i]] = pair.s[[k, 1, 0]];
            self.s[[k, i, j]] = pair.s[[k, 0, 1]];
        }
        self.written[[j, i]] = true;
        self.written[[i, j]] = true;

        self.write_diagonal(i, pair, 0);
        self.write_diagonal(j, pair, 1);
        self.z0[i] = pair.z0[0];
        self.z0[j] = pair.z0[1];
        Ok(())
    }

    fn write_diagonal(&mut self, port: usize, pair: &Network, p: usize) {
        let n = self.diagonal_count[port];
        for k in 0..self.frequency.npoints() {
            let value = pair.s[[k, p, p]];
            let prev = self.s[[k, port, port]];
            self.s[[k, port, port]] = match self.policy {
                DiagonalPolicy::LastWrite => value,
                // running mean
                DiagonalPolicy::Average => (prev * n as f64 + value) / (n + 1) as f64,
            };
        }
        self.diagonal_count[port] = n + 1;
    }

    /// Complete the assembly
    ///
    /// Fails if any off-diagonal entry was never written.
    pub fn finish(self) -> Result<Network> {
        let nports = self.nports();
        let missing: Vec<String> = (0..nports)
            .flat_map(|r| (0..nports).map(move |c| (r, c)))
            .filter(|&(r, c)| r != c && !self.written[[r, c]])
            .map(|(r, c)| format!("s[{}, {}]", r, c))
            .collect();
        if !missing.is_empty() {
            return Err(CalibrationError::insufficient(format!(
                "missing multiport entries: {}",
                missing.join(", ")
            )));
        }

        Ok(Network::new(self.frequency, self.s, self.z0))
    }
}

/// Calibrate and assemble an N-port DUT from ordered raw measurements
///
/// `raw[&(s, r)]` is the one-path measurement with the stimulus on DUT
/// port `s` and the receiver on DUT port `r`. Every unordered pair needs
/// both orientations. Keys with `s == r` are rejected.
pub fn calibrate_multiport(
    cal: &TwoPortOnePath,
    nports: usize,
    raw: &HashMap<(usize, usize), Network>,
    config: &AssemblyConfig,
) -> Result<Network> {
    if nports < 2 {
        return Err(CalibrationError::insufficient(format!(
            "multiport assembly needs at least 2 ports, got {}",
            nports
        )));
    }
    if let Some(&(s, r)) = raw.keys().find(|&&(s, r)| s >= nports || r >= nports) {
        return Err(CalibrationError::InvalidPort {
            port: s.max(r),
            nports,
        });
    }
    if let Some(&(port, _)) = raw.keys().find(|&&(s, r)| s == r) {
        return Err(CalibrationError::insufficient(format!(
            "measurement from port {} to itself does not connect two ports",
            port
        )));
    }

    let lookup = |s: usize, r: usize| {
        raw.get(&(s, r)).ok_or_else(|| {
            CalibrationError::insufficient(format!(
                "no raw measurement from port {} to port {}",
                s, r
            ))
        })
    };

    let mut assembler = MultiportAssembler::new(nports, cal.frequency().clone(), config);
    for i in 0..nports {
        for j in (i + 1)..nports {
            let corrected = cal.apply_cal(lookup(i, j)?, lookup(j, i)?)?;
            assembler.insert(i, j, &corrected)?;
        }
    }

    let ntwk = assembler.finish()?;
    info!(
        nports,
        npairs = nports * (nports - 1) / 2,
        nfreq = ntwk.nfreq(),
        "multiport assembly complete"
    );
    Ok(ntwk)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frequency::{FrequencyUnit, SweepType};

    fn c(re: f64, im: f64) -> Complex64 {
        Complex64::new(re, im)
    }

    fn freq() -> Frequency {
        Frequency::new(1.0, 2.0, 2, FrequencyUnit::GHz, SweepType::Linear)
    }

    fn pair(s11: Complex64, s21: Complex64, s12: Complex64, s22: Complex64) -> Network {
        Network::from_fn(freq(), 2, 50.0, |_, _, i, j| match (i, j) {
            (0, 0) => s11,
            (1, 0) => s21,
            (0, 1) => s12,
            _ => s22,
        })
    }

    #[test]
    fn test_pair_mapping() {
        let mut asm = MultiportAssembler::new(3, freq(), &AssemblyConfig::default());
        asm.insert(0, 2, &pair(c(0.1, 0.0), c(0.2, 0.0), c(0.3, 0.0), c(0.4, 0.0)))
            .unwrap();

        assert_eq!(asm.s[[0, 0, 0]], c(0.1, 0.0));
        assert_eq!(asm.s[[0, 2, 0]], c(0.2, 0.0));
        assert_eq!(asm.s[[0, 0, 2]], c(0.3, 0.0));
        assert_eq!(asm.s[[0, 2, 2]], c(0.4, 0.0));
        // untouched
        assert_eq!(asm.s[[0, 1, 0]], c(0.0, 0.0));
        assert_eq!(asm.s[[0, 1, 1]], c(0.0, 0.0));
    }

    #[test]
    fn test_diagonal_policies() {
        let a = pair(c(0.2, 0.0), c(0.5, 0.0), c(0.5, 0.0), c(0.0, 0.0));
        let b = pair(c(0.4, 0.0), c(0.5, 0.0), c(0.5, 0.0), c(0.0, 0.0));

        let mut last = MultiportAssembler::new(3, freq(), &AssemblyConfig::default());
        last.insert(0, 1, &a).unwrap();
        last.insert(0, 2, &b).unwrap();
        assert_eq!(last.s[[1, 0, 0]], c(0.4, 0.0));

        let config = AssemblyConfig {
            diagonal: DiagonalPolicy::Average,
        };
        let mut avg = MultiportAssembler::new(3, freq(), &config);
        avg.insert(0, 1, &a).unwrap();
        avg.insert(0, 2, &b).unwrap();
        assert!((avg.s[[1, 0, 0]] - c(0.3, 0.0)).norm() < 1e-15);
    }

    #[test]
    fn test_duplicate_off_diagonal() {
        let p = pair(c(0.0, 0.0), c(0.5, 0.0), c(0.5, 0.0), c(0.0, 0.0));
        let mut asm = MultiportAssembler::new(2, freq(), &AssemblyConfig::default());
        asm.insert(0, 1, &p).unwrap();

        let err = asm.insert(1, 0, &p).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_missing_entries() {
        let p = pair(c(0.0, 0.0), c(0.5, 0.0), c(0.5, 0.0), c(0.0, 0.0));
        let mut asm = MultiportAssembler::new(3, freq(), &AssemblyConfig::default());
        asm.insert(0, 1, &p).unwrap();
        asm.insert(1, 2, &p).unwrap();

        match asm.finish() {
            Err(CalibrationError::InsufficientData { reason }) => {
                assert!(reason.contains("s[0, 2]"));
                assert!(reason.contains("s[2, 0]"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_ports() {
        let p = pair(c(0.0, 0.0), c(0.5, 0.0), c(0.5, 0.0), c(0.0, 0.0));
        let mut asm = MultiportAssembler::new(2, freq(), &AssemblyConfig::default());
        assert_eq!(
            asm.insert(0, 2, &p),
            Err(CalibrationError::InvalidPort { port: 2, nports: 2 })
        );
        assert!(asm.insert(1, 1, &p).is_err());
    }

    #[test]
    fn test_frequency_mismatch() {
        let other = Frequency::new(1.0, 3.0, 2, FrequencyUnit::GHz, SweepType::Linear);
        let p = Network::from_fn(other, 2, 50.0, |_, _, _, _| c(0.0, 0.0));
        let mut asm = MultiportAssembler::new(2, freq(), &AssemblyConfig::default());
        assert!(matches!(
            asm.insert(0, 1, &p),
            Err(CalibrationError::FrequencyMismatch { .. })
        ));
    }
}
