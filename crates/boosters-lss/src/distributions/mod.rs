//! Distribution families for distributional (LSS) boosting.
//!
//! A distribution family tells the boosting framework how many raw values to
//! predict per observation and how to turn them into a distribution:
//!
//! - [`ParameterSchema`]: ordered distributional parameters and their transforms
//! - [`param_transform`]: raw `(n_dist_param, n_obs)` batch to [`DistributionArgs`]
//! - [`LowRankMultivariateNormal`]: the resulting batched distribution
//! - [`MvnLoRa`]: the family itself, configured through [`MvnLoRaConfig`]

mod config;
mod lowrank;
mod mvn_lora;
mod response;
mod schema;
mod transform;

pub use config::MvnLoRaConfig;
pub use lowrank::LowRankMultivariateNormal;
pub use mvn_lora::{DISTRIBUTION_ARG_NAMES, MvnLoRa};
pub use response::{ParamTransform, RESPONSE_EPS, ResponseFn};
pub use schema::{ParamKind, ParamSpec, ParameterSchema};
pub use transform::{DistributionArgs, param_transform, param_transform_checked};

/// Shape contract a distribution family exposes to the boosting framework.
pub trait DistributionFn: Send + Sync {
    /// Name of the distribution (for logging).
    fn name(&self) -> &'static str;

    /// Number of targets `D`.
    fn n_targets(&self) -> usize;

    /// Number of raw values predicted per observation.
    fn n_dist_param(&self) -> usize;

    /// Distributional parameter names, in raw-batch order.
    fn param_names(&self) -> Vec<&str>;

    /// Names of the arguments the distribution is constructed from.
    fn distribution_arg_names(&self) -> &'static [&'static str];

    fn is_univariate(&self) -> bool;

    fn is_discrete(&self) -> bool;
}
