//! Reporting of fitted distributional parameters.
//!
//! [`dist_params`] turns any [`FittedDistribution`] into a [`DistParams`] table
//! with location, scale and pairwise correlation columns.

mod correlation;
mod table;

pub use correlation::{
    correlation_matrix, covariance_to_correlation, n_rho, rho_label, rho_pairs,
};
pub use table::{DistParams, FittedDistribution, dist_param_columns, dist_params};
