//! Port operations
//!
//! Flipping and sub-network extraction used by one-path calibration and
//! multiport measurement.

use ndarray::{Array1, Array3};
use num_complex::Complex64;

use super::core::Network;
use crate::error::{CalibrationError, Result};

impl Network {
    /// Flip the ports of a 2-port network (swap port 1 and port 2)
    ///
    /// Models physically reversing a device between the analyzer ports.
    pub fn flipped(&self) -> Result<Network> {
        self.ensure_nports(2, self.label())?;

        let nfreq = self.nfreq();
        let mut s_flipped = Array3::<Complex64>::zeros((nfreq, 2, 2));

        for f in 0..nfreq {
            // new[i,j] = old[1-i, 1-j]
            s_flipped[[f, 0, 0]] = self.s[[f, 1, 1]];
            s_flipped[[f, 0, 1]] = self.s[[f, 1, 0]];
            s_flipped[[f, 1, 0]] = self.s[[f, 0, 1]];
            s_flipped[[f, 1, 1]] = self.s[[f, 0, 0]];
        }

        let z0_flipped = Array1::from_vec(vec![self.z0[1], self.z0[0]]);

        let mut out = Network::new(self.frequency.clone(), s_flipped, z0_flipped);
        out.name = self.name.clone();
        Ok(out)
    }

    /// Extract a subnetwork with the specified ports (0-based)
    ///
    /// Port order in `ports` becomes the port order of the result, so
    /// `subnetwork(&[2, 0])` puts original port 2 first.
    pub fn subnetwork(&self, ports: &[usize]) -> Result<Network> {
        let nports = self.nports();
        if ports.is_empty() {
            return Err(CalibrationError::insufficient("empty port list for subnetwork"));
        }
        if let Some(&port) = ports.iter().find(|&&p| p >= nports) {
            return Err(CalibrationError::InvalidPort { port, nports });
        }

        let new_nports = ports.len();
        let s_new = Array3::from_shape_fn((self.nfreq(), new_nports, new_nports), |(f, i, j)| {
            self.s[[f, ports[i], ports[j]]]
        });
        let z0_new = Array1::from_iter(ports.iter().map(|&p| self.z0[p]));

        Ok(Network::new(self.frequency.clone(), s_new, z0_new))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frequency::{Frequency, FrequencyUnit, SweepType};

    fn two_port() -> Network {
        let freq = Frequency::new(1.0, 1.0, 1, FrequencyUnit::GHz, SweepType::Linear);

        let mut s = Array3::<Complex64>::zeros((1, 2, 2));
        s[[0, 0, 0]] = Complex64::new(0.1, 0.0); // S11
        s[[0, 1, 1]] = Complex64::new(0.2, 0.0); // S22
        s[[0, 0, 1]] = Complex64::new(0.4, 0.0); // S12
        s[[0, 1, 0]] = Complex64::new(0.5, 0.0); // S21

        let z0 = Array1::from_vec(vec![Complex64::new(50.0, 0.0), Complex64::new(75.0, 0.0)]);
        Network::new(freq, s, z0)
    }

    #[test]
    fn test_flip() {
        let flipped = two_port().flipped().unwrap();

        assert!((flipped.s[[0, 0, 0]].re - 0.2).abs() < 1e-10);
        assert!((flipped.s[[0, 1, 1]].re - 0.1).abs() < 1e-10);
        assert!((flipped.s[[0, 0, 1]].re - 0.5).abs() < 1e-10);
        assert!((flipped.s[[0, 1, 0]].re - 0.4).abs() < 1e-10);
        assert!((flipped.z0[0].re - 75.0).abs() < 1e-10);
        assert!((flipped.z0[1].re - 50.0).abs() < 1e-10);
    }

    #[test]
    fn test_flip_twice_is_identity() {
        let ntwk = two_port();
        let back = ntwk.flipped().unwrap().flipped().unwrap();
        assert_eq!(back.s, ntwk.s);
    }

    #[test]
    fn test_flip_rejects_non_two_port() {
        let freq = Frequency::new(1.0, 1.0, 1, FrequencyUnit::GHz, SweepType::Linear);
        let one = Network::new(
            freq,
            Array3::zeros((1, 1, 1)),
            Array1::from_elem(1, Complex64::new(50.0, 0.0)),
        );
        assert!(matches!(
            one.flipped(),
            Err(CalibrationError::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_subnetwork_reorders_ports() {
        let freq = Frequency::new(1.0, 1.0, 1, FrequencyUnit::GHz, SweepType::Linear);
        let ntwk = Network::from_fn(freq, 3, 50.0, |_, _, i, j| {
            Complex64::new((10 * (i + 1) + j + 1) as f64, 0.0)
        });

        let sub = ntwk.subnetwork(&[2, 0]).unwrap();
        assert_eq!(sub.nports(), 2);
        assert_eq!(sub.s[[0, 0, 0]].re, 33.0);
        assert_eq!(sub.s[[0, 1, 0]].re, 13.0);
        assert_eq!(sub.s[[0, 0, 1]].re, 31.0);
        assert_eq!(sub.s[[0, 1, 1]].re, 11.0);

        assert!(matches!(
            ntwk.subnetwork(&[0, 3]),
            Err(CalibrationError::InvalidPort { port: 3, nports: 3 })
        ));
        assert!(ntwk.subnetwork(&[]).is_err());
    }
}
