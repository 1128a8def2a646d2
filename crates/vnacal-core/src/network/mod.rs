//! Network module - N-port electrical network representation
//!
//! Provides the core Network struct together with the port operations and
//! property checks used by calibration.

mod core;
mod derived;
mod operators;
mod properties;

pub use core::Network;
