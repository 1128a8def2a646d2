//! Linear algebra operations
//!
//! Calibration solves are small dense complex systems, one per frequency
//! point. nalgebra is the backend; all ndarray<->nalgebra conversions are
//! contained here.

use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2};
use num_complex::Complex64;

use crate::constants::{NEAR_ZERO, SVD_TOLERANCE};

/// Result of a complex least squares solve
#[derive(Debug, Clone)]
pub struct LstsqResult {
    pub solution: Array1<Complex64>,
    pub singular_values: Vec<f64>,
    /// Ratio of largest to smallest singular value (infinite when rank deficient)
    pub condition: f64,
}

impl LstsqResult {
    /// Reciprocal condition number, 0.0 for a rank deficient system
    pub fn rcond(&self) -> f64 {
        if self.condition.is_finite() {
            1.0 / self.condition
        } else {
            0.0
        }
    }
}

#[inline]
fn to_na_complex(a: &Array2<Complex64>) -> DMatrix<Complex64> {
    let (m, n) = a.dim();
    DMatrix::from_fn(m, n, |i, j| a[[i, j]])
}

fn condition_from(sv: &[f64]) -> f64 {
    match (sv.first(), sv.last()) {
        (Some(&max), Some(&min)) if min > NEAR_ZERO * max.max(1.0) => max / min,
        _ => f64::INFINITY,
    }
}

/// Solve the complex least squares problem Ax = b using SVD
///
/// Square systems are solved exactly; overdetermined ones in the least
/// squares sense. Returns an error for empty input, a dimension mismatch,
/// or an underdetermined system.
pub fn lstsq_complex(
    a: &Array2<Complex64>,
    b: &Array1<Complex64>,
) -> Result<LstsqResult, &'static str> {
    let (m, n) = a.dim();
    if m == 0 || n == 0 {
        return Err("Empty matrix");
    }
    if b.len() != m {
        return Err("Dimension mismatch");
    }
    if m < n {
        return Err("Underdetermined system");
    }

    let a_na = to_na_complex(a);
    let b_na = DVector::from_fn(m, |i, _| b[i]);

    let svd = a_na.svd(true, true);
    let mut singular_values: Vec<f64> = svd.singular_values.iter().cloned().collect();
    singular_values.sort_by(|x, y| y.total_cmp(x));
    let condition = condition_from(&singular_values);

    let x = svd
        .solve(&b_na, SVD_TOLERANCE)
        .map_err(|_| "SVD solve failed")?;

    Ok(LstsqResult {
        solution: Array1::from_iter(x.iter().cloned()),
        singular_values,
        condition,
    })
}
