//! Least squares for autoregressions.
//!
//! An AR(p) with intercept on a series `w` is the regression
//!
//! ```text
//! w_t = c + φ_1 w_{t-1} + ... + φ_p w_{t-p}      for t = p .. n-1
//! ```
//!
//! `lag_design` builds that system and `solve_least_squares` solves it with
//! SVD, which handles tall matrices directly (nalgebra's `QR::solve` expects a
//! square system).

use nalgebra::{DMatrix, DVector};

/// Design matrix `[1, w_{t-1}, .., w_{t-p}]` and target `w_t`, one row per `t >= p`.
///
/// Callers guarantee `w.len() > p`.
pub fn lag_design(w: &[f64], p: usize) -> (DMatrix<f64>, DVector<f64>) {
    let rows = w.len() - p;
    let x = DMatrix::from_fn(rows, p + 1, |r, c| if c == 0 { 1.0 } else { w[r + p - c] });
    let y = DVector::from_fn(rows, |r, _| w[r + p]);
    (x, y)
}

/// Solve `min |y - Xβ|²`.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Lagged columns of a near-constant series are almost collinear; loosen the
    // singular-value cutoff step by step before giving up.
    [1e-10, 1e-8, 1e-6]
        .into_iter()
        .filter_map(|tol| svd.solve(y, tol).ok())
        .find(|beta| beta.iter().all(|v| v.is_finite()))
}

/// Sum of squared residuals of `β` on `(X, y)`.
pub fn residual_sse(x: &DMatrix<f64>, y: &DVector<f64>, beta: &DVector<f64>) -> f64 {
    (y - x * beta).norm_squared()
}
