//! Tabular report of fitted distributional parameters.

use ndarray::{Array1, Array2, ArrayView1};
use serde::Serialize;

use super::correlation::{covariance_to_correlation, n_rho, rho_label, rho_pairs};
use crate::error::{LssError, Result};
use crate::utils::Parallelism;

/// Read-only view of a fitted batch of multivariate distributions.
///
/// Accessors take an observation index in `0..n_obs()` and may panic when it
/// is out of range.
pub trait FittedDistribution: Sync {
    fn n_obs(&self) -> usize;

    fn n_targets(&self) -> usize;

    /// Mean vector of observation `obs`, length `D`.
    fn mean(&self, obs: usize) -> Array1<f64>;

    /// Marginal standard deviations of observation `obs`, length `D`.
    fn stddev(&self, obs: usize) -> Array1<f64>;

    /// Covariance matrix of observation `obs`, `(D, D)`.
    fn covariance(&self, obs: usize) -> Array2<f64>;
}

/// Predicted distributional parameters, one row per observation.
///
/// Columns: `location_1..D`, `scale_1..D`, then `rho_ab` for every target pair
/// in lexicographic order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistParams {
    columns: Vec<String>,
    values: Array2<f64>,
}

impl DistParams {
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.values.nrows()
    }

    #[inline]
    pub fn n_cols(&self) -> usize {
        self.values.ncols()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Values, `(n_rows, n_cols)`.
    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Column by name.
    pub fn column(&self, name: &str) -> Option<ArrayView1<'_, f64>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(self.values.column(idx))
    }

    pub fn row(&self, i: usize) -> ArrayView1<'_, f64> {
        self.values.row(i)
    }

    pub fn into_parts(self) -> (Vec<String>, Array2<f64>) {
        (self.columns, self.values)
    }
}

/// Column labels for `n_targets` targets.
pub fn dist_param_columns(n_targets: usize) -> Vec<String> {
    let mut columns = Vec::with_capacity(2 * n_targets + n_rho(n_targets));
    columns.extend((1..=n_targets).map(|i| format!("location_{i}")));
    columns.extend((1..=n_targets).map(|i| format!("scale_{i}")));
    columns.extend(rho_pairs(n_targets).into_iter().map(rho_label));
    columns
}

/// Build the parameter report of a fitted distribution batch.
///
/// # Errors
///
/// - [`LssError::TargetCountMismatch`] if `n_targets` differs from the
///   distribution's target count.
/// - [`LssError::NonPositiveVariance`] if an observation's covariance has a
///   non-positive variance.
pub fn dist_params<F: FittedDistribution>(
    n_targets: usize,
    fitted: &F,
    parallelism: Parallelism,
) -> Result<DistParams> {
    if fitted.n_targets() != n_targets {
        return Err(LssError::TargetCountMismatch {
            expected: n_targets,
            got: fitted.n_targets(),
        });
    }

    let columns = dist_param_columns(n_targets);
    let n_obs = fitted.n_obs();
    let n_cols = columns.len();

    let rows = parallelism.maybe_par_map(0..n_obs, |obs| -> Result<Vec<f64>> {
        let mut row = Vec::with_capacity(n_cols);
        row.extend(fitted.mean(obs).iter());
        row.extend(fitted.stddev(obs).iter());
        row.extend(covariance_to_correlation(fitted.covariance(obs).view())?.iter());
        Ok(row)
    });

    let mut values = Array2::<f64>::zeros((n_obs, n_cols));
    for (mut dst, row) in values.rows_mut().into_iter().zip(rows) {
        let row = row?;
        if row.len() != n_cols {
            return Err(LssError::ShapeMismatch {
                what: "report row",
                expected: vec![n_cols],
                got: vec![row.len()],
            });
        }
        dst.assign(&ArrayView1::from(row.as_slice()));
    }

    Ok(DistParams { columns, values })
}
