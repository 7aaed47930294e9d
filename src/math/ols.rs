//! Linear least squares and rank helpers.
//!
//! Each Levenberg–Marquardt iteration solves a small damped linear problem of
//! the form:
//!
//! ```text
//! minimize ||J δ + r||² + λ ||D δ||²
//! ```
//!
//! which is the ordinary least squares problem on the stacked system
//! `[J; √λ D] δ = [-r; 0]`. Solving the stacked system by SVD avoids forming
//! `JᵀJ` explicitly and stays well behaved when columns are nearly collinear
//! (e.g. power-law fits early on).
//!
//! Parameter dimension is tiny (2–4 columns), so SVD cost is negligible.

use nalgebra::{DMatrix, DVector};

/// Relative singular-value threshold below which a direction counts as null.
pub const RANK_RTOL: f64 = 1e-10;

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-12, 1e-10, 1e-8] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Numerical rank of `x`: singular values above `RANK_RTOL · σ_max`.
///
/// A matrix containing non-finite entries has rank 0.
pub fn numerical_rank(x: &DMatrix<f64>) -> usize {
    if x.iter().any(|v| !v.is_finite()) {
        return 0;
    }
    let sv = x.singular_values();
    let max = sv.iter().copied().fold(0.0_f64, f64::max);
    if max <= 0.0 {
        return 0;
    }
    sv.iter().filter(|&&s| s > RANK_RTOL * max).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn rank_detects_duplicate_columns() {
        let x = DMatrix::from_row_slice(3, 3, &[1.0, 2.0, 1.0, 1.0, 3.0, 1.0, 1.0, 4.0, 1.0]);
        assert_eq!(numerical_rank(&x), 2);
    }

    #[test]
    fn rank_of_non_finite_matrix_is_zero() {
        let x = DMatrix::from_row_slice(2, 1, &[1.0, f64::NAN]);
        assert_eq!(numerical_rank(&x), 0);
    }
}
