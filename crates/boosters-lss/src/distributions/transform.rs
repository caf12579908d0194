//! Raw model outputs to low-rank MVN arguments.
//!
//! Raw parameters arrive parameter-major: an `(n_dist_param, n_obs)` array
//! where row `i` holds the raw values of schema entry `i` for every
//! observation. [`param_transform`] applies each entry's transform and scatters
//! the result into the three distribution arguments:
//!
//! - `loc`: `(n_obs, D)`
//! - `cov_factor`: `(n_obs, D, rank)`
//! - `cov_diag`: `(n_obs, D)`, strictly positive
//!
//! so that `covariance = cov_factor @ cov_factor^T + diag(cov_diag)`.

use ndarray::{Array2, Array3, ArrayView2, s};

use super::schema::{ParamKind, ParameterSchema};
use crate::error::{LssError, Result};

/// Structured arguments of a low-rank multivariate Normal.
#[derive(Debug, Clone, PartialEq)]
pub struct DistributionArgs {
    /// Mean vectors, `(n_obs, D)`.
    pub loc: Array2<f64>,
    /// Covariance factors, `(n_obs, D, rank)`.
    pub cov_factor: Array3<f64>,
    /// Diagonal covariance terms, `(n_obs, D)`.
    pub cov_diag: Array2<f64>,
}

impl DistributionArgs {
    #[inline]
    pub fn n_obs(&self) -> usize {
        self.loc.nrows()
    }

    #[inline]
    pub fn n_targets(&self) -> usize {
        self.loc.ncols()
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.cov_factor.dim().2
    }
}

/// Transform a raw parameter batch into distribution arguments.
///
/// `raw` must have one row per schema entry; the number of observations is
/// `raw.ncols()`.
///
/// # Errors
///
/// - [`LssError::ParamCountMismatch`] if `raw.nrows() != schema.len()`.
/// - [`LssError::NonFiniteParameter`] if a response function overflows
///   (e.g. `exp` of a raw value above ~709).
pub fn param_transform(raw: ArrayView2<'_, f64>, schema: &ParameterSchema) -> Result<DistributionArgs> {
    let (n_params, n_obs) = raw.dim();
    if n_params != schema.len() {
        return Err(LssError::ParamCountMismatch {
            expected: schema.len(),
            got: n_params,
        });
    }

    let n_targets = schema.n_targets();
    let rank = schema.rank();
    log::debug!("param_transform: {n_obs} observations, D={n_targets}, rank={rank}");

    let mut loc = Array2::<f64>::zeros((n_obs, n_targets));
    let mut cov_factor = Array3::<f64>::zeros((n_obs, n_targets, rank));
    let mut cov_diag = Array2::<f64>::zeros((n_obs, n_targets));

    for spec in schema {
        let values = spec.transform.apply_column(raw.row(spec.index));
        if let Some((obs, &value)) = values.indexed_iter().find(|&(_, v)| !v.is_finite()) {
            return Err(LssError::NonFiniteParameter {
                name: spec.name.clone(),
                obs,
                value,
            });
        }
        match spec.kind {
            ParamKind::Location { target } => loc.column_mut(target).assign(&values),
            ParamKind::CovFactor { target, factor } => {
                cov_factor.slice_mut(s![.., target, factor]).assign(&values)
            }
            ParamKind::CovDiag { target } => cov_diag.column_mut(target).assign(&values),
        }
    }

    Ok(DistributionArgs { loc, cov_factor, cov_diag })
}

/// [`param_transform`] with an explicit observation count.
///
/// # Errors
///
/// [`LssError::ObservationCountMismatch`] if `raw.ncols() != n_obs`, plus the
/// errors of [`param_transform`].
pub fn param_transform_checked(
    raw: ArrayView2<'_, f64>,
    schema: &ParameterSchema,
    n_obs: usize,
) -> Result<DistributionArgs> {
    if raw.ncols() != n_obs {
        return Err(LssError::ObservationCountMismatch {
            expected: n_obs,
            got: raw.ncols(),
        });
    }
    param_transform(raw, schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distributions::ResponseFn;
    use approx::assert_abs_diff_eq;
    use ndarray::{Array, array};

    #[test]
    fn two_targets_rank_one_exp() {
        let schema = ParameterSchema::build(2, 1, ResponseFn::Exp).unwrap();
        // location_1, location_2, cov_factor_1, cov_factor_2, cov_diag_1, cov_diag_2
        let raw = array![[0.0], [0.0], [1.0], [1.0], [0.0], [0.0]];

        let args = param_transform(raw.view(), &schema).unwrap();

        assert_eq!(args.loc, array![[0.0, 0.0]]);
        assert_eq!(args.cov_factor, array![[[1.0], [1.0]]]);
        assert_abs_diff_eq!(args.cov_diag[[0, 0]], 1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(args.cov_diag[[0, 1]], 1.0, epsilon = 1e-5);
    }

    #[test]
    fn factor_reshape_is_target_major() {
        let schema = ParameterSchema::build(2, 3, ResponseFn::Exp).unwrap();
        let n_obs = 2;
        let mut raw = Array2::<f64>::zeros((schema.len(), n_obs));
        // Factor entry k gets value 10 * (k + 1) + obs.
        for (k, idx) in schema.cov_factor_range().enumerate() {
            for obs in 0..n_obs {
                raw[[idx, obs]] = 10.0 * (k + 1) as f64 + obs as f64;
            }
        }

        let args = param_transform(raw.view(), &schema).unwrap();

        assert_eq!(args.cov_factor.dim(), (2, 2, 3));
        assert_eq!(args.cov_factor.slice(s![0, .., ..]), array![[10.0, 20.0, 30.0], [40.0, 50.0, 60.0]]);
        assert_eq!(args.cov_factor.slice(s![1, .., ..]), array![[11.0, 21.0, 31.0], [41.0, 51.0, 61.0]]);
    }

    #[test]
    fn output_shapes() {
        let schema = ParameterSchema::build(4, 2, ResponseFn::Softplus).unwrap();
        let raw = Array::linspace(-3.0, 3.0, schema.len() * 7)
            .into_shape_with_order((schema.len(), 7))
            .unwrap();

        let args = param_transform(raw.view(), &schema).unwrap();

        assert_eq!(args.loc.dim(), (7, 4));
        assert_eq!(args.cov_factor.dim(), (7, 4, 2));
        assert_eq!(args.cov_diag.dim(), (7, 4));
        assert_eq!((args.n_obs(), args.n_targets(), args.rank()), (7, 4, 2));
        assert!(args.cov_diag.iter().all(|&d| d > 0.0));
    }

    #[test]
    fn locations_pass_through_unchanged() {
        let schema = ParameterSchema::build(2, 1, ResponseFn::Exp).unwrap();
        let raw = array![[-1.5, 2.0], [3.0, -4.0], [0.0, 0.0], [0.0, 0.0], [0.0, 0.0], [0.0, 0.0]];

        let args = param_transform(raw.view(), &schema).unwrap();

        assert_eq!(args.loc, array![[-1.5, 3.0], [2.0, -4.0]]);
    }

    #[test]
    fn wrong_parameter_count_fails() {
        let schema = ParameterSchema::build(2, 1, ResponseFn::Exp).unwrap();
        let raw = Array2::<f64>::zeros((5, 3));
        assert_eq!(
            param_transform(raw.view(), &schema),
            Err(LssError::ParamCountMismatch { expected: 6, got: 5 })
        );
    }

    #[test]
    fn wrong_observation_count_fails() {
        let schema = ParameterSchema::build(2, 1, ResponseFn::Exp).unwrap();
        let raw = Array2::<f64>::zeros((6, 3));
        assert_eq!(
            param_transform_checked(raw.view(), &schema, 4),
            Err(LssError::ObservationCountMismatch { expected: 4, got: 3 })
        );
        assert!(param_transform_checked(raw.view(), &schema, 3).is_ok());
    }

    #[test]
    fn exp_overflow_is_reported() {
        let schema = ParameterSchema::build(2, 1, ResponseFn::Exp).unwrap();
        let raw = array![[0.0], [0.0], [1.0], [1.0], [800.0], [0.0]];

        assert_eq!(
            param_transform(raw.view(), &schema),
            Err(LssError::NonFiniteParameter {
                name: "cov_diag_1".into(),
                obs: 0,
                value: f64::INFINITY,
            })
        );
    }

    #[test]
    fn softplus_does_not_overflow() {
        let schema = ParameterSchema::build(2, 1, ResponseFn::Softplus).unwrap();
        let raw = array![[0.0], [0.0], [1.0], [1.0], [800.0], [0.0]];

        let args = param_transform(raw.view(), &schema).unwrap();
        assert_abs_diff_eq!(args.cov_diag[[0, 0]], 800.0, epsilon = 1e-3);
    }

    #[test]
    fn empty_batch() {
        let schema = ParameterSchema::build(3, 1, ResponseFn::Exp).unwrap();
        let raw = Array2::<f64>::zeros((schema.len(), 0));
        let args = param_transform(raw.view(), &schema).unwrap();
        assert_eq!(args.loc.dim(), (0, 3));
        assert_eq!(args.cov_factor.dim(), (0, 3, 1));
    }
}
