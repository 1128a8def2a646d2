//! Error types for calibration and de-embedding

use thiserror::Error;

/// Calibration errors
///
/// None of these are recoverable locally. A failed solve or correction
/// produces no partial result.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalibrationError {
    /// Missing or mismatched standards, measurements or pair results
    #[error("Insufficient data: {reason}")]
    InsufficientData { reason: String },

    /// Degenerate linear system (e.g. two identical reflect standards)
    #[error(
        "Singular system at frequency index {index} ({frequency} Hz), condition number {condition:e}"
    )]
    SingularSystem {
        index: usize,
        frequency: f64,
        condition: f64,
    },

    /// Sweep grids differ between inputs
    #[error("Frequency mismatch for {detail}: expected {expected} points, found {found}")]
    FrequencyMismatch {
        expected: usize,
        found: usize,
        detail: String,
    },

    /// Port index outside the network
    #[error("Invalid port {port} for a {nports}-port network")]
    InvalidPort { port: usize, nports: usize },

    /// S-parameter array does not match the declared sweep or port count
    #[error("Invalid shape: {reason}")]
    InvalidShape { reason: String },
}

impl CalibrationError {
    pub(crate) fn insufficient(reason: impl Into<String>) -> Self {
        CalibrationError::InsufficientData {
            reason: reason.into(),
        }
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, CalibrationError>;
