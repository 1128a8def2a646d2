//! Calibration module - one-path two-port calibration and multiport assembly
//!
//! Standards and their raw measurements produce an [`ErrorTerms`] model,
//! which then corrects DUT measurements pair by pair.

mod error_terms;
mod multiport;
mod one_path;
mod one_port;
mod standard;

pub use error_terms::{ErrorTermPoint, ErrorTerms, SMatrix2};
pub use multiport::{calibrate_multiport, MultiportAssembler};
pub use one_path::{solve, TwoPortOnePath};
pub use one_port::{solve_reflect_point, OnePortSol, ReflectTerms};
pub use standard::{
    delay_thru, ideal_thru, pair_by_name, two_port_reflect, CalibrationStandard, StandardKind,
};
