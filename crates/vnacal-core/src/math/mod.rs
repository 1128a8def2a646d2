//! Mathematical functions module
//!
//! Unit conversions for reporting and the dense solves behind calibration.

pub mod conversions;
pub mod linalg;

pub use conversions::*;
