//! Covariance to correlation reduction.
//!
//! Correlations are reported per unordered target pair `(a, b)`, `a < b`,
//! 1-based, enumerated as lexicographic 2-combinations of `1..=D`:
//! `(1,2), (1,3), .., (1,D), (2,3), ..`. [`covariance_to_correlation`] returns
//! the strictly-lower-triangular correlations in exactly that order, so value
//! `p` always belongs to `rho_pairs(D)[p]`.

use ndarray::{Array1, Array2, ArrayView2};

use crate::error::{LssError, Result};

/// Number of distinct target pairs, `D * (D - 1) / 2`.
#[inline]
pub fn n_rho(n_targets: usize) -> usize {
    n_targets * n_targets.saturating_sub(1) / 2
}

/// 1-based target pairs in lexicographic combination order.
pub fn rho_pairs(n_targets: usize) -> Vec<(usize, usize)> {
    (1..=n_targets)
        .flat_map(|a| (a + 1..=n_targets).map(move |b| (a, b)))
        .collect()
}

/// Column label of a target pair: `rho_{a}{b}`.
#[inline]
pub fn rho_label((a, b): (usize, usize)) -> String {
    format!("rho_{a}{b}")
}

/// Normalize a covariance matrix into a correlation matrix.
///
/// `corr = D⁻¹ Σ D⁻¹` with `D = diag(sqrt(diag(Σ)))`, computed elementwise.
/// The diagonal is exactly 1.
///
/// # Errors
///
/// - [`LssError::NotSquare`] if `cov` is not square.
/// - [`LssError::NonPositiveVariance`] if a diagonal entry is not a finite
///   positive number.
pub fn correlation_matrix(cov: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
    let (rows, cols) = cov.dim();
    if rows != cols {
        return Err(LssError::NotSquare { rows, cols });
    }

    let mut inv_std = Array1::<f64>::zeros(rows);
    for (target, (&var, inv)) in cov.diag().iter().zip(inv_std.iter_mut()).enumerate() {
        if !(var.is_finite() && var > 0.0) {
            return Err(LssError::NonPositiveVariance { target, value: var });
        }
        *inv = 1.0 / var.sqrt();
    }

    let mut corr = Array2::from_shape_fn((rows, cols), |(i, j)| cov[[i, j]] * inv_std[i] * inv_std[j]);
    corr.diag_mut().fill(1.0);
    Ok(corr)
}

/// Pairwise correlations of a covariance matrix, `D * (D - 1) / 2` values
/// ordered like [`rho_pairs`].
///
/// # Errors
///
/// Same as [`correlation_matrix`].
pub fn covariance_to_correlation(cov: ArrayView2<'_, f64>) -> Result<Array1<f64>> {
    let corr = correlation_matrix(cov)?;
    let n = corr.nrows();
    let mut out = Vec::with_capacity(n_rho(n));
    for a in 0..n {
        for b in a + 1..n {
            out.push(corr[[b, a]]);
        }
    }
    Ok(Array1::from_vec(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{Array2, array};

    #[test]
    fn pairs_for_three_targets() {
        assert_eq!(rho_pairs(3), vec![(1, 2), (1, 3), (2, 3)]);
        let labels: Vec<_> = rho_pairs(3).into_iter().map(rho_label).collect();
        assert_eq!(labels, vec!["rho_12", "rho_13", "rho_23"]);
    }

    #[test]
    fn pair_count() {
        for d in 1..8 {
            assert_eq!(rho_pairs(d).len(), n_rho(d));
        }
        assert!(rho_pairs(1).is_empty());
        assert_eq!(n_rho(0), 0);
    }

    #[test]
    fn two_by_two() {
        let cov = array![[2.0, 1.0], [1.0, 2.0]];
        let rho = covariance_to_correlation(cov.view()).unwrap();
        assert_eq!(rho.len(), 1);
        assert_abs_diff_eq!(rho[0], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn diagonal_covariance_has_zero_correlation() {
        let cov = Array2::from_diag(&array![4.0, 9.0, 16.0]);
        let rho = covariance_to_correlation(cov.view()).unwrap();
        assert_eq!(rho, array![0.0, 0.0, 0.0]);
    }

    #[test]
    fn correlation_matrix_has_unit_diagonal() {
        let cov = array![[4.0, 1.2, -0.4], [1.2, 9.0, 2.0], [-0.4, 2.0, 1.0]];
        let corr = correlation_matrix(cov.view()).unwrap();
        for i in 0..3 {
            assert_eq!(corr[[i, i]], 1.0);
        }
        assert_abs_diff_eq!(corr[[0, 1]], 1.2 / 6.0, epsilon = 1e-12);
        assert_abs_diff_eq!(corr[[2, 1]], 2.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn extraction_follows_pair_order_for_four_targets() {
        // corr[i][j] = (10 * (i + 1) + (j + 1)) / 100 on the off-diagonal.
        let n = 4;
        let cov = Array2::from_shape_fn((n, n), |(i, j)| {
            if i == j {
                1.0
            } else {
                let (lo, hi) = (i.min(j) + 1, i.max(j) + 1);
                (10 * lo + hi) as f64 / 100.0
            }
        });
        let rho = covariance_to_correlation(cov.view()).unwrap();
        let expected: Vec<f64> = rho_pairs(n)
            .into_iter()
            .map(|(a, b)| (10 * a + b) as f64 / 100.0)
            .collect();
        assert_eq!(rho.to_vec(), expected);
    }

    #[test]
    fn single_target_has_no_pairs() {
        let rho = covariance_to_correlation(array![[3.0]].view()).unwrap();
        assert!(rho.is_empty());
    }

    #[test]
    fn zero_variance_rejected() {
        let cov = array![[1.0, 0.0], [0.0, 0.0]];
        assert_eq!(
            covariance_to_correlation(cov.view()),
            Err(LssError::NonPositiveVariance { target: 1, value: 0.0 })
        );
    }

    #[test]
    fn negative_variance_rejected() {
        let cov = array![[-1.0, 0.0], [0.0, 1.0]];
        assert!(matches!(
            correlation_matrix(cov.view()),
            Err(LssError::NonPositiveVariance { target: 0, .. })
        ));
    }

    #[test]
    fn non_square_rejected() {
        let cov = Array2::<f64>::ones((2, 3));
        assert_eq!(
            correlation_matrix(cov.view()),
            Err(LssError::NotSquare { rows: 2, cols: 3 })
        );
    }
}
