//! Parameter schema of the low-rank multivariate Normal.
//!
//! The schema is the ordered list of distributional parameters a model has to
//! predict, `D + D * rank + D` entries in three segments:
//!
//! | segment      | count      | names                          | transform  |
//! |--------------|------------|--------------------------------|------------|
//! | location     | `D`        | `location_1 .. location_D`     | identity   |
//! | cov factor   | `D * rank` | `cov_factor_1 .. cov_factor_DR`| identity   |
//! | cov diagonal | `D`        | `cov_diag_1 .. cov_diag_D`     | response   |
//!
//! Factor entries use a target-major flat index: entry `k` of the factor
//! segment is element `(k / rank, k % rank)` of the `D x rank` factor matrix.
//!
//! Every [`ParamSpec`] stores its own position, so code that partitions a raw
//! parameter batch goes through [`ParamSpec::index`] rather than iteration order.

use std::ops::Range;

use super::response::{ParamTransform, ResponseFn};
use crate::error::ConfigError;

/// Structural role of a distributional parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// Mean of target `target`.
    Location { target: usize },
    /// Element `(target, factor)` of the covariance factor.
    CovFactor { target: usize, factor: usize },
    /// Diagonal covariance term of target `target`.
    CovDiag { target: usize },
}

/// One entry of a [`ParameterSchema`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    /// Position in the raw parameter batch.
    pub index: usize,
    pub name: String,
    pub kind: ParamKind,
    pub transform: ParamTransform,
}

/// Ordered parameter schema. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterSchema {
    n_targets: usize,
    rank: usize,
    response_fn: ResponseFn,
    specs: Vec<ParamSpec>,
}

impl ParameterSchema {
    /// Build the schema for `n_targets` targets and a rank-`rank` covariance factor.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidTargets`] or [`ConfigError::InvalidRank`] when
    /// either count is zero.
    pub fn build(
        n_targets: usize,
        rank: usize,
        response_fn: ResponseFn,
    ) -> Result<Self, ConfigError> {
        if n_targets == 0 {
            return Err(ConfigError::InvalidTargets(n_targets));
        }
        if rank == 0 {
            return Err(ConfigError::InvalidRank(rank));
        }

        let n_params = n_targets + n_targets * rank + n_targets;
        let mut specs = Vec::with_capacity(n_params);

        let mut push = |name: String, kind: ParamKind, transform: ParamTransform| {
            let index = specs.len();
            specs.push(ParamSpec { index, name, kind, transform });
        };

        for target in 0..n_targets {
            push(
                format!("location_{}", target + 1),
                ParamKind::Location { target },
                ParamTransform::Identity,
            );
        }

        for k in 0..n_targets * rank {
            push(
                format!("cov_factor_{}", k + 1),
                ParamKind::CovFactor { target: k / rank, factor: k % rank },
                ParamTransform::Identity,
            );
        }

        for target in 0..n_targets {
            push(
                format!("cov_diag_{}", target + 1),
                ParamKind::CovDiag { target },
                ParamTransform::Response(response_fn),
            );
        }

        log::debug!("built low-rank MVN schema: D={n_targets}, rank={rank}, {n_params} parameters");

        Ok(Self { n_targets, rank, response_fn, specs })
    }

    /// Number of distributional parameters (`D + D * rank + D`).
    #[inline]
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// Always `false`: a valid schema has at least three entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    #[inline]
    pub fn n_targets(&self) -> usize {
        self.n_targets
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Response function applied to the covariance diagonal.
    #[inline]
    pub fn response_fn(&self) -> ResponseFn {
        self.response_fn
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&ParamSpec> {
        self.specs.get(index)
    }

    /// Entry by parameter name.
    pub fn find(&self, name: &str) -> Option<&ParamSpec> {
        self.specs.iter().find(|s| s.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ParamSpec> {
        self.specs.iter()
    }

    /// Parameter names in schema order.
    pub fn names(&self) -> Vec<&str> {
        self.specs.iter().map(|s| s.name.as_str()).collect()
    }

    /// Positions of the location segment.
    #[inline]
    pub fn location_range(&self) -> Range<usize> {
        0..self.n_targets
    }

    /// Positions of the covariance-factor segment.
    #[inline]
    pub fn cov_factor_range(&self) -> Range<usize> {
        self.n_targets..self.n_targets + self.n_targets * self.rank
    }

    /// Positions of the covariance-diagonal segment.
    #[inline]
    pub fn cov_diag_range(&self) -> Range<usize> {
        let start = self.n_targets + self.n_targets * self.rank;
        start..start + self.n_targets
    }
}

impl<'a> IntoIterator for &'a ParameterSchema {
    type Item = &'a ParamSpec;
    type IntoIter = std::slice::Iter<'a, ParamSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.specs.iter()
    }
}
