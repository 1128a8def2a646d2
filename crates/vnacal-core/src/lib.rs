//! vnacal-core: One-path VNA calibration
//!
//! Error correction for a one-path (1.5-port) two-port vector network
//! analyzer, and assembly of corrected port pairs into N-port networks.
//!
//! ## Modules
//!
//! - `frequency` - Frequency sweep representation
//! - `network` - N-port S-parameter network
//! - `calibration` - Standards, error terms, one-path solve and multiport assembly
//! - `math` - Conversions and complex least squares
//! - `tline` - Closed-form transmission line helpers
//! - `instrument` - Analyzer boundary and simulated analyzer
//! - `config` - TOML configuration

pub mod calibration;
pub mod config;
pub mod constants;
pub mod error;
pub mod frequency;
pub mod instrument;
pub mod math;
pub mod network;
pub mod tline;

pub use calibration::{CalibrationStandard, ErrorTerms, StandardKind, TwoPortOnePath};
pub use config::{AssemblyConfig, CalibrationConfig, Config, DiagonalPolicy};
pub use error::{CalibrationError, Result};
pub use frequency::Frequency;
pub use network::Network;
