//! boosters-lss: distributional (LSS) extensions for gradient boosting.
//!
//! Provides a multivariate Normal distribution family whose covariance has
//! low-rank form, `Σ = W Wᵀ + diag(d)`, for models that predict a full
//! distribution per observation instead of a point estimate.
//!
//! # Key Types
//!
//! - [`MvnLoRa`] / [`MvnLoRaConfig`] - Distribution family and its configuration
//! - [`ParameterSchema`] - Ordered distributional parameters
//! - [`LowRankMultivariateNormal`] - Batched distribution (log-prob, moments, sampling)
//! - [`DistParams`] - Tabular report of fitted parameters
//!
//! # Example
//!
//! ```
//! use boosters_lss::{MvnLoRa, MvnLoRaConfig};
//! use ndarray::Array2;
//!
//! let dist = MvnLoRa::new(MvnLoRaConfig::builder().n_targets(3).rank(1).build().unwrap()).unwrap();
//! let raw = Array2::<f64>::zeros((dist.schema().len(), 10));
//! let params = dist.dist_params(raw.view()).unwrap();
//! assert_eq!(params.n_cols(), 3 + 3 + 3);
//! ```

// Re-export approx traits for users who want to compare predictions
pub use approx;

pub mod distributions;
pub mod error;
pub mod report;
pub mod utils;

// =============================================================================
// Convenience Re-exports
// =============================================================================

pub use distributions::{
    DistributionArgs, DistributionFn, LowRankMultivariateNormal, MvnLoRa, MvnLoRaConfig,
    ParameterSchema, ResponseFn,
};
pub use error::{ConfigError, LssError, Result};
pub use report::{DistParams, FittedDistribution};
pub use utils::{Parallelism, run_with_threads};
