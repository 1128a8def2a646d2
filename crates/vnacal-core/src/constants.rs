//! Numerical constants for calibration
//!
//! Provides standardized tolerance values used throughout the library.

/// Tolerance for detecting near-zero values in division and singularity checks.
pub const NEAR_ZERO: f64 = 1e-15;

/// Default tolerance for property checks (reciprocity, passivity, etc).
/// This is the tolerance used when None is passed to property check functions.
pub const PROPERTY_TOL: f64 = 1e-12;

/// Tolerance for SVD solve in least squares problems.
pub const SVD_TOLERANCE: f64 = 1e-14;

/// Default reciprocal condition number below which a calibration
/// system is treated as singular.
pub const SINGULAR_TOL: f64 = 1e-10;

/// Default bound on the corrected-through residual before the solve
/// logs a warning.
pub const THROUGH_RESIDUAL_TOL: f64 = 1e-6;

/// Relative tolerance when comparing two frequency sweeps.
pub const FREQ_REL_TOL: f64 = 1e-9;

/// Absolute floor (Hz) when comparing two frequency sweeps.
pub const FREQ_ABS_TOL: f64 = 1e-6;
