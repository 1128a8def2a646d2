//! Instrument boundary
//!
//! Calibration never talks to hardware. Raw networks come from an
//! [`Analyzer`], which a driver implements for a real one-path VNA and
//! [`SimulatedAnalyzer`] implements over a known error model.

use std::collections::HashMap;
use tracing::debug;

use crate::calibration::ErrorTerms;
use crate::error::{CalibrationError, Result};
use crate::frequency::{Frequency, FrequencyUnit, SweepType};
use crate::network::Network;

/// Common interface for one-path vector network analyzers
pub trait Analyzer: Send {
    /// Analyzer name/description
    fn name(&self) -> &str;

    /// Set a linear sweep from `start` to `stop` Hz with `count` points
    fn configure_sweep(&mut self, start: f64, stop: f64, count: usize) -> Result<()>;

    /// Current sweep
    fn frequency(&self) -> &Frequency;

    /// Measure with the stimulus on DUT port `source` and the receiver on
    /// DUT port `receiver` (0-based)
    ///
    /// The result is a raw 2-port; only S11 and S21 carry data.
    fn acquire_network(&mut self, source: usize, receiver: usize) -> Result<Network>;
}

/// Software analyzer with a fixed error model
///
/// Connect any N-port DUT and every `acquire_network` call returns the
/// raw forward measurement of the selected port pair.
#[derive(Debug, Clone)]
pub struct SimulatedAnalyzer {
    name: String,
    terms: ErrorTerms,
    dut: Option<Network>,
}

impl SimulatedAnalyzer {
    pub fn new(terms: ErrorTerms) -> Self {
        Self {
            name: "simulated one-path VNA".to_string(),
            terms,
            dut: None,
        }
    }

    /// Connect a DUT, replacing the previous one
    pub fn connect(&mut self, dut: Network) -> Result<()> {
        self.terms.frequency().ensure_matches(&dut.frequency, dut.label())?;
        debug!(dut = dut.label(), nports = dut.nports(), "DUT connected");
        self.dut = Some(dut);
        Ok(())
    }

    /// Error model the analyzer measures through
    #[inline]
    pub fn error_terms(&self) -> &ErrorTerms {
        &self.terms
    }
}

impl Analyzer for SimulatedAnalyzer {
    fn name(&self) -> &str {
        &self.name
    }

    /// The simulated hardware has a fixed sweep; this only checks the
    /// request against it.
    fn configure_sweep(&mut self, start: f64, stop: f64, count: usize) -> Result<()> {
        let requested = Frequency::new(start, stop, count, FrequencyUnit::Hz, SweepType::Linear);
        self.terms.frequency().ensure_matches(&requested, "requested sweep")
    }

    fn frequency(&self) -> &Frequency {
        self.terms.frequency()
    }

    fn acquire_network(&mut self, source: usize, receiver: usize) -> Result<Network> {
        let dut = self
            .dut
            .as_ref()
            .ok_or_else(|| CalibrationError::insufficient("no DUT connected"))?;

        if source == receiver {
            return Err(CalibrationError::insufficient(format!(
                "source and receiver are both port {}",
                source
            )));
        }
        let path = dut.subnetwork(&[source, receiver])?;

        let raw = self.terms.embed(&path)?;
        Ok(raw.with_name(format!("raw_{}{}", source, receiver)))
    }
}

/// Acquire every ordered port pair of an N-port DUT
pub fn acquire_all_pairs<A: Analyzer + ?Sized>(
    analyzer: &mut A,
    nports: usize,
) -> Result<HashMap<(usize, usize), Network>> {
    let mut raw = HashMap::with_capacity(nports * nports.saturating_sub(1));
    for source in 0..nports {
        for receiver in (0..nports).filter(|&r| r != source) {
            raw.insert(
                (source, receiver),
                analyzer.acquire_network(source, receiver)?,
            );
        }
    }
    debug!(
        analyzer = analyzer.name(),
        nmeasurements = raw.len(),
        "acquired all port pairs"
    );
    Ok(raw)
}
