//! Batched multivariate Normal with low-rank plus diagonal covariance.
//!
//! For every observation `i` the covariance is
//!
//! ```text
//! Σ_i = W_i W_iᵀ + diag(d_i)        W_i: (D, rank), d_i > 0
//! ```
//!
//! Log-density is evaluated through the `rank x rank` capacitance matrix
//! `K = I + Wᵀ D⁻¹ W` (Woodbury identity and matrix determinant lemma), so no
//! `D x D` matrix is ever factorized. Sampling uses the reparameterization
//! `x = μ + W ε_W + sqrt(d) ⊙ ε_D` with independent standard normals.

use std::f64::consts::PI;

use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2, Array3, ArrayView1, ArrayView2, Axis, s};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, StandardNormal};

use super::transform::DistributionArgs;
use crate::error::{ConfigError, LssError, Result};
use crate::report::FittedDistribution;
use crate::utils::Parallelism;

/// Low-rank multivariate Normal over a batch of observations.
#[derive(Debug, Clone)]
pub struct LowRankMultivariateNormal {
    loc: Array2<f64>,
    cov_factor: Array3<f64>,
    cov_diag: Array2<f64>,
    parallelism: Parallelism,
}

impl LowRankMultivariateNormal {
    /// Create the distribution from transformed arguments.
    ///
    /// # Errors
    ///
    /// - [`LssError::ShapeMismatch`] if `cov_factor` is not `(n_obs, D, rank)`
    ///   or `cov_diag` is not `(n_obs, D)` for `loc` of shape `(n_obs, D)`.
    /// - [`LssError::NonPositiveDiagonal`] if any `cov_diag` entry is not a
    ///   finite positive number.
    /// - [`LssError::NonFinite`] if a `loc` or `cov_factor` entry is NaN or
    ///   infinite.
    /// - [`ConfigError::InvalidRank`] (wrapped) if `cov_factor` has rank 0.
    pub fn new(args: DistributionArgs) -> Result<Self> {
        let DistributionArgs { loc, cov_factor, cov_diag } = args;
        let (n_obs, n_targets) = loc.dim();
        let (f_obs, f_targets, rank) = cov_factor.dim();

        if rank == 0 {
            return Err(ConfigError::InvalidRank(rank).into());
        }
        if (f_obs, f_targets) != (n_obs, n_targets) {
            return Err(LssError::ShapeMismatch {
                what: "cov_factor",
                expected: vec![n_obs, n_targets, rank],
                got: cov_factor.shape().to_vec(),
            });
        }
        if cov_diag.dim() != (n_obs, n_targets) {
            return Err(LssError::ShapeMismatch {
                what: "cov_diag",
                expected: vec![n_obs, n_targets],
                got: cov_diag.shape().to_vec(),
            });
        }
        if let Some(((obs, target), &value)) = cov_diag
            .indexed_iter()
            .find(|&(_, &v)| !(v.is_finite() && v > 0.0))
        {
            return Err(LssError::NonPositiveDiagonal { obs, target, value });
        }
        if let Some(((obs, target), &value)) = loc.indexed_iter().find(|&(_, v)| !v.is_finite()) {
            return Err(LssError::NonFinite { what: "loc", obs, target, value });
        }
        if let Some(((obs, target, _), &value)) = cov_factor.indexed_iter().find(|&(_, v)| !v.is_finite()) {
            return Err(LssError::NonFinite { what: "cov_factor", obs, target, value });
        }

        Ok(Self {
            loc,
            cov_factor,
            cov_diag,
            parallelism: Parallelism::Sequential,
        })
    }

    /// Use the given parallelism for per-observation work.
    pub fn with_parallelism(mut self, parallelism: Parallelism) -> Self {
        self.parallelism = parallelism;
        self
    }

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

    pub fn loc(&self) -> ArrayView2<'_, f64> {
        self.loc.view()
    }

    pub fn cov_factor(&self) -> &Array3<f64> {
        &self.cov_factor
    }

    pub fn cov_diag(&self) -> ArrayView2<'_, f64> {
        self.cov_diag.view()
    }

    // =========================================================================
    // Moments
    // =========================================================================

    /// Mean vectors, `(n_obs, D)`. Same as [`loc`](Self::loc).
    pub fn mean(&self) -> ArrayView2<'_, f64> {
        self.loc.view()
    }

    /// Marginal variances, `(n_obs, D)`: `sum_r W[t, r]² + d[t]`.
    pub fn variance(&self) -> Array2<f64> {
        self.cov_factor.mapv(|w| w * w).sum_axis(Axis(2)) + &self.cov_diag
    }

    /// Marginal standard deviations, `(n_obs, D)`.
    pub fn stddev(&self) -> Array2<f64> {
        self.variance().mapv(f64::sqrt)
    }

    /// Full covariance matrix of one observation, `(D, D)`.
    ///
    /// # Panics
    ///
    /// Panics if `obs >= n_obs`.
    pub fn covariance_matrix(&self, obs: usize) -> Array2<f64> {
        let w = self.cov_factor.index_axis(Axis(0), obs);
        let mut cov = w.dot(&w.t());
        cov.diag_mut()
            .iter_mut()
            .zip(self.cov_diag.row(obs))
            .for_each(|(c, &d)| *c += d);
        cov
    }

    /// Covariance matrices of all observations, `(n_obs, D, D)`.
    pub fn covariance_matrices(&self) -> Array3<f64> {
        let d = self.n_targets();
        let mut out = Array3::<f64>::zeros((self.n_obs(), d, d));
        for (obs, mut slot) in out.outer_iter_mut().enumerate() {
            slot.assign(&self.covariance_matrix(obs));
        }
        out
    }

    // =========================================================================
    // Likelihood
    // =========================================================================

    /// Log-density of each observation's target vector.
    ///
    /// `targets` has shape `(n_obs, D)`; the result has length `n_obs`.
    ///
    /// # Errors
    ///
    /// - [`LssError::ShapeMismatch`] if `targets` is not `(n_obs, D)`.
    /// - [`LssError::NonFinite`] if a target entry is NaN or infinite.
    /// - [`LssError::SingularCapacitance`] if the capacitance matrix of an
    ///   observation cannot be Cholesky-factorized (non-finite factors).
    pub fn log_prob(&self, targets: ArrayView2<'_, f64>) -> Result<Array1<f64>> {
        if targets.dim() != self.loc.dim() {
            return Err(LssError::ShapeMismatch {
                what: "targets",
                expected: self.loc.shape().to_vec(),
                got: targets.shape().to_vec(),
            });
        }
        if let Some(((obs, target), &value)) = targets.indexed_iter().find(|&(_, v)| !v.is_finite()) {
            return Err(LssError::NonFinite { what: "targets", obs, target, value });
        }

        let per_obs = self
            .parallelism
            .maybe_par_map(0..self.n_obs(), |obs| self.log_prob_obs(obs, targets.row(obs)));
        let values = per_obs.into_iter().collect::<Result<Vec<f64>>>()?;
        Ok(Array1::from_vec(values))
    }

    /// Negative log-likelihood summed over observations.
    pub fn nll(&self, targets: ArrayView2<'_, f64>) -> Result<f64> {
        Ok(-self.log_prob(targets)?.sum())
    }

    fn log_prob_obs(&self, obs: usize, x: ArrayView1<'_, f64>) -> Result<f64> {
        let n_targets = self.n_targets();
        let rank = self.rank();
        let w = self.cov_factor.index_axis(Axis(0), obs);
        let d = self.cov_diag.row(obs);
        let resid = &x - &self.loc.row(obs);

        // K = I + Wᵀ D⁻¹ W and z = Wᵀ D⁻¹ r
        let mut capacitance = DMatrix::<f64>::identity(rank, rank);
        let mut z = DVector::<f64>::zeros(rank);
        for t in 0..n_targets {
            let inv_d = 1.0 / d[t];
            for a in 0..rank {
                let w_ta = w[[t, a]] * inv_d;
                z[a] += w_ta * resid[t];
                for b in 0..rank {
                    capacitance[(a, b)] += w_ta * w[[t, b]];
                }
            }
        }

        let chol = capacitance
            .cholesky()
            .ok_or(LssError::SingularCapacitance { obs })?;
        let log_det_capacitance: f64 = 2.0 * chol.l_dirty().diagonal().iter().map(|v| v.ln()).sum::<f64>();
        let log_det_diag: f64 = d.iter().map(|v| v.ln()).sum();

        let diag_quad: f64 = resid.iter().zip(d.iter()).map(|(r, dv)| r * r / dv).sum();
        let correction = z.dot(&chol.solve(&z));
        let mahalanobis = diag_quad - correction;

        Ok(-0.5 * (n_targets as f64 * (2.0 * PI).ln() + log_det_capacitance + log_det_diag + mahalanobis))
    }

    // =========================================================================
    // Sampling
    // =========================================================================

    /// Draw `n_samples` samples per observation, `(n_samples, n_obs, D)`.
    ///
    /// Deterministic for a given `seed`.
    pub fn sample(&self, n_samples: usize, seed: u64) -> Array3<f64> {
        let (n_obs, n_targets, rank) = self.cov_factor.dim();
        let mut rng = StdRng::seed_from_u64(seed);
        let mut out = Array3::<f64>::zeros((n_samples, n_obs, n_targets));
        let mut eps_w = Array1::<f64>::zeros(rank);

        for mut draw in out.outer_iter_mut() {
            for obs in 0..n_obs {
                eps_w.mapv_inplace(|_| StandardNormal.sample(&mut rng));
                let w = self.cov_factor.index_axis(Axis(0), obs);
                let shared = w.dot(&eps_w);
                let mut row = draw.slice_mut(s![obs, ..]);
                for t in 0..n_targets {
                    let eps_d: f64 = StandardNormal.sample(&mut rng);
                    row[t] = self.loc[[obs, t]] + shared[t] + self.cov_diag[[obs, t]].sqrt() * eps_d;
                }
            }
        }
        out
    }
}

impl FittedDistribution for LowRankMultivariateNormal {
    fn n_obs(&self) -> usize {
        self.loc.nrows()
    }

    fn n_targets(&self) -> usize {
        self.loc.ncols()
    }

    fn mean(&self, obs: usize) -> Array1<f64> {
        self.loc.row(obs).to_owned()
    }

    fn stddev(&self, obs: usize) -> Array1<f64> {
        let w = self.cov_factor.index_axis(Axis(0), obs);
        (w.mapv(|v| v * v).sum_axis(Axis(1)) + &self.cov_diag.row(obs)).mapv(f64::sqrt)
    }

    fn covariance(&self, obs: usize) -> Array2<f64> {
        self.covariance_matrix(obs)
    }
}
