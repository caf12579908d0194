//! Configuration of the low-rank multivariate Normal with builder pattern.
//!
//! [`MvnLoRaConfig`] uses the `bon` crate for builder generation; the custom
//! `build()` validates the configuration so errors surface at construction.
//!
//! # Example
//!
//! ```
//! use boosters_lss::distributions::{MvnLoRaConfig, ResponseFn};
//!
//! let config = MvnLoRaConfig::builder()
//!     .n_targets(3)
//!     .rank(2)
//!     .response_fn(ResponseFn::Softplus)
//!     .build()
//!     .unwrap();
//! assert_eq!(config.n_targets, 3);
//! ```

use bon::Builder;
use serde::{Deserialize, Serialize};

use super::response::ResponseFn;
use crate::error::ConfigError;

/// Configuration of [`MvnLoRa`](super::MvnLoRa).
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(
    derive(Clone, Debug),
    finish_fn(vis = "", name = __build_internal)
)]
pub struct MvnLoRaConfig {
    /// Number of targets `D`. Must be >= 1.
    pub n_targets: usize,

    /// Rank of the covariance factor. Must be >= 1.
    pub rank: usize,

    /// Response function for the covariance diagonal. Default: `Exp`.
    #[builder(default)]
    #[serde(default)]
    pub response_fn: ResponseFn,

    /// Number of threads for per-observation work. Default: 0 (auto).
    ///
    /// `1` runs sequentially, `n > 1` uses a dedicated pool of `n` threads.
    #[builder(default)]
    #[serde(default)]
    pub n_threads: usize,
}

impl<S: mvn_lo_ra_config_builder::IsComplete> MvnLoRaConfigBuilder<S> {
    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] if `n_targets == 0` or `rank == 0`.
    pub fn build(self) -> Result<MvnLoRaConfig, ConfigError> {
        let config = self.__build_internal();
        config.validate()?;
        Ok(config)
    }
}

impl MvnLoRaConfig {
    /// Configuration from a response function name (`"exp"` or `"softplus"`).
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownResponseFn`] for any other name, plus the errors
    /// of [`validate`](Self::validate).
    pub fn from_response_name(n_targets: usize, rank: usize, response_fn: &str) -> Result<Self, ConfigError> {
        Self::builder()
            .n_targets(n_targets)
            .rank(rank)
            .response_fn(response_fn.parse()?)
            .build()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.n_targets == 0 {
            return Err(ConfigError::InvalidTargets(self.n_targets));
        }
        if self.rank == 0 {
            return Err(ConfigError::InvalidRank(self.rank));
        }
        Ok(())
    }

    /// Number of distributional parameters, `D + D * rank + D`.
    #[inline]
    pub fn n_dist_param(&self) -> usize {
        self.n_targets * (self.rank + 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = MvnLoRaConfig::builder().n_targets(2).rank(1).build().unwrap();
        assert_eq!(config.response_fn, ResponseFn::Exp);
        assert_eq!(config.n_threads, 0);
        assert_eq!(config.n_dist_param(), 6);
    }

    #[test]
    fn zero_targets_rejected() {
        let result = MvnLoRaConfig::builder().n_targets(0).rank(1).build();
        assert_eq!(result, Err(ConfigError::InvalidTargets(0)));
    }

    #[test]
    fn zero_rank_rejected() {
        let result = MvnLoRaConfig::builder().n_targets(3).rank(0).build();
        assert_eq!(result, Err(ConfigError::InvalidRank(0)));
    }

    #[test]
    fn from_response_name() {
        let config = MvnLoRaConfig::from_response_name(3, 2, "softplus").unwrap();
        assert_eq!(config.response_fn, ResponseFn::Softplus);
        assert_eq!(config.n_dist_param(), 12);

        let err = MvnLoRaConfig::from_response_name(3, 2, "sigmoid").unwrap_err();
        assert_eq!(err, ConfigError::UnknownResponseFn("sigmoid".into()));
    }

    #[test]
    fn deserialize_with_defaults() {
        let config: MvnLoRaConfig = serde_json::from_str(r#"{"n_targets": 4, "rank": 2}"#).unwrap();
        assert_eq!(config.response_fn, ResponseFn::Exp);
        assert!(config.validate().is_ok());

        let config: MvnLoRaConfig =
            serde_json::from_str(r#"{"n_targets": 2, "rank": 1, "response_fn": "softplus"}"#).unwrap();
        assert_eq!(config.response_fn, ResponseFn::Softplus);
    }

    #[test]
    fn deserialize_rejects_unknown_response() {
        let result = serde_json::from_str::<MvnLoRaConfig>(r#"{"n_targets": 2, "rank": 1, "response_fn": "relu"}"#);
        assert!(result.is_err());
    }
}
