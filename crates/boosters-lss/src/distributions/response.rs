//! Response functions for distributional parameters.
//!
//! A [`ResponseFn`] maps an unconstrained raw model output onto the strictly
//! positive support of a scale-like parameter. The set is closed: the only way
//! to name one from configuration is [`ResponseFn::from_str`], which rejects
//! unknown names up front.
//!
//! [`ParamTransform`] is what a schema entry carries: either the identity
//! (locations, covariance factors) or a response function (covariance diagonal).

use std::fmt;
use std::str::FromStr;

use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Offset added after the positivity mapping.
///
/// `exp` and `softplus` underflow to exactly zero for very negative inputs;
/// the offset keeps the output strictly positive.
pub const RESPONSE_EPS: f64 = 1e-6;

/// Above this input softplus is returned as `x` (avoids `exp` overflow).
const SOFTPLUS_THRESHOLD: f64 = 20.0;

/// Positivity-ensuring response function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFn {
    /// `exp(x) + eps`
    #[default]
    Exp,
    /// `ln(1 + exp(x)) + eps`
    Softplus,
}

impl ResponseFn {
    /// Apply the response function to a single value.
    #[inline]
    pub fn apply(self, x: f64) -> f64 {
        match self {
            ResponseFn::Exp => x.exp() + RESPONSE_EPS,
            ResponseFn::Softplus => softplus(x) + RESPONSE_EPS,
        }
    }

    /// Configuration name (`"exp"` or `"softplus"`).
    pub fn name(self) -> &'static str {
        match self {
            ResponseFn::Exp => "exp",
            ResponseFn::Softplus => "softplus",
        }
    }
}

impl FromStr for ResponseFn {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exp" => Ok(ResponseFn::Exp),
            "softplus" => Ok(ResponseFn::Softplus),
            other => Err(ConfigError::UnknownResponseFn(other.to_string())),
        }
    }
}

impl fmt::Display for ResponseFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Numerically stable softplus.
#[inline]
fn softplus(x: f64) -> f64 {
    if x > SOFTPLUS_THRESHOLD { x } else { x.exp().ln_1p() }
}

// =============================================================================
// ParamTransform
// =============================================================================

/// Transform bound to one distributional parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamTransform {
    /// Value used as-is.
    Identity,
    /// Value mapped through a positivity-ensuring response function.
    Response(ResponseFn),
}

impl ParamTransform {
    /// Apply the transform to a single value.
    #[inline]
    pub fn apply(self, x: f64) -> f64 {
        match self {
            ParamTransform::Identity => x,
            ParamTransform::Response(f) => f.apply(x),
        }
    }

    /// Apply the transform to one raw parameter column.
    ///
    /// Non-finite entries are first replaced by the mean of the column's
    /// finite entries (0 if there are none).
    pub fn apply_column(self, column: ArrayView1<'_, f64>) -> Array1<f64> {
        let fill = finite_mean(column);
        let n_bad = column.iter().filter(|x| !x.is_finite()).count();
        if n_bad > 0 {
            log::warn!("replacing {n_bad} non-finite raw values with column mean {fill}");
        }

        column.mapv(|x| self.apply(if x.is_finite() { x } else { fill }))
    }

    /// Returns `true` for [`ParamTransform::Identity`].
    pub fn is_identity(self) -> bool {
        matches!(self, ParamTransform::Identity)
    }
}

/// Mean of the finite entries, 0 if there are none.
fn finite_mean(column: ArrayView1<'_, f64>) -> f64 {
    let (sum, count) = column
        .iter()
        .filter(|x| x.is_finite())
        .fold((0.0, 0usize), |(s, c), &x| (s + x, c + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}
