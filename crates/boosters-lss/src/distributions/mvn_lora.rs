//! Multivariate Normal with low-rank covariance for distributional boosting.
//!
//! [`MvnLoRa`] is the entry point a boosting framework talks to. It owns the
//! parameter schema, turns raw model outputs into a
//! [`LowRankMultivariateNormal`], and reports fitted parameters as a table.
//!
//! The model predicts `D + D * rank + D` raw values per observation:
//!
//! - `loc`: mean of the distribution,
//! - `cov_factor`: factor part of the covariance,
//! - `cov_diag`: diagonal part of the covariance (through the response function),
//!
//! with `covariance = cov_factor @ cov_factor^T + diag(cov_diag)`.
//!
//! # Example
//!
//! ```
//! use boosters_lss::DistributionFn;
//! use boosters_lss::distributions::{MvnLoRa, MvnLoRaConfig};
//! use ndarray::array;
//!
//! let config = MvnLoRaConfig::builder().n_targets(2).rank(1).build().unwrap();
//! let dist = MvnLoRa::new(config).unwrap();
//! assert_eq!(dist.n_dist_param(), 6);
//!
//! // One observation, one raw value per distributional parameter.
//! let raw = array![[0.0], [0.0], [1.0], [1.0], [0.0], [0.0]];
//! let params = dist.dist_params(raw.view()).unwrap();
//! assert!((params.column("rho_12").unwrap()[0] - 0.5).abs() < 1e-5);
//! ```

use ndarray::{Array3, ArrayView2};

use super::config::MvnLoRaConfig;
use super::lowrank::LowRankMultivariateNormal;
use super::response::ResponseFn;
use super::schema::ParameterSchema;
use super::transform::{DistributionArgs, param_transform};
use super::DistributionFn;
use crate::error::{ConfigError, Result};
use crate::report::{DistParams, dist_params};
use crate::utils::{Parallelism, run_with_threads};

/// Names of the arguments the distribution is constructed from.
pub const DISTRIBUTION_ARG_NAMES: [&str; 3] = ["loc", "cov_factor", "cov_diag"];

/// Low-rank multivariate Normal distribution family.
#[derive(Debug, Clone)]
pub struct MvnLoRa {
    config: MvnLoRaConfig,
    schema: ParameterSchema,
}

impl MvnLoRa {
    /// Create the distribution family.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] if the configuration is invalid.
    pub fn new(config: MvnLoRaConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        let schema = ParameterSchema::build(config.n_targets, config.rank, config.response_fn)?;
        Ok(Self { config, schema })
    }

    pub fn config(&self) -> &MvnLoRaConfig {
        &self.config
    }

    pub fn schema(&self) -> &ParameterSchema {
        &self.schema
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.config.rank
    }

    #[inline]
    pub fn response_fn(&self) -> ResponseFn {
        self.config.response_fn
    }

    fn parallelism(&self) -> Parallelism {
        Parallelism::from_threads(self.config.n_threads)
    }

    // =========================================================================
    // Raw parameters -> distribution
    // =========================================================================

    /// Transform raw parameters `(n_dist_param, n_obs)` into distribution arguments.
    pub fn transform(&self, raw: ArrayView2<'_, f64>) -> Result<DistributionArgs> {
        param_transform(raw, &self.schema)
    }

    /// Build the distribution for a raw parameter batch.
    pub fn distribution(&self, raw: ArrayView2<'_, f64>) -> Result<LowRankMultivariateNormal> {
        let args = self.transform(raw)?;
        Ok(LowRankMultivariateNormal::new(args)?.with_parallelism(self.parallelism()))
    }

    // =========================================================================
    // Loss and prediction
    // =========================================================================

    /// Negative log-likelihood of `targets` `(n_obs, D)`, summed over observations.
    pub fn nll(&self, raw: ArrayView2<'_, f64>, targets: ArrayView2<'_, f64>) -> Result<f64> {
        let dist = self.distribution(raw)?;
        run_with_threads(self.config.n_threads, |parallelism| {
            dist.with_parallelism(parallelism).nll(targets)
        })
    }

    /// Predicted distributional parameters: locations, scales and correlations.
    pub fn dist_params(&self, raw: ArrayView2<'_, f64>) -> Result<DistParams> {
        let dist = self.distribution(raw)?;
        let n_targets = self.n_targets();
        run_with_threads(self.config.n_threads, |parallelism| {
            dist_params(n_targets, &dist, parallelism)
        })
    }

    /// Draw `n_samples` samples per observation, `(n_samples, n_obs, D)`.
    pub fn sample(&self, raw: ArrayView2<'_, f64>, n_samples: usize, seed: u64) -> Result<Array3<f64>> {
        Ok(self.distribution(raw)?.sample(n_samples, seed))
    }
}

impl DistributionFn for MvnLoRa {
    fn name(&self) -> &'static str {
        "MVN_LoRa"
    }

    fn n_targets(&self) -> usize {
        self.config.n_targets
    }

    fn n_dist_param(&self) -> usize {
        self.schema.len()
    }

    fn param_names(&self) -> Vec<&str> {
        self.schema.names()
    }

    fn distribution_arg_names(&self) -> &'static [&'static str] {
        &DISTRIBUTION_ARG_NAMES
    }

    fn is_univariate(&self) -> bool {
        false
    }

    fn is_discrete(&self) -> bool {
        false
    }
}
