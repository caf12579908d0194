//! Error types.
//!
//! Configuration problems are reported as [`ConfigError`] at construction time.
//! Everything that can go wrong afterwards (shape contracts, numerical
//! preconditions) is an [`LssError`].

// =============================================================================
// Configuration Errors
// =============================================================================

/// Invalid distribution configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Number of targets must be >= 1.
    #[error("n_targets must be >= 1, got {0}")]
    InvalidTargets(usize),

    /// Rank of the covariance factor must be >= 1.
    #[error("rank must be >= 1, got {0}")]
    InvalidRank(usize),

    /// Response function name is not one of `exp`, `softplus`.
    #[error("invalid response function '{0}', choose from 'exp' or 'softplus'")]
    UnknownResponseFn(String),
}

// =============================================================================
// Runtime Errors
// =============================================================================

/// Shape or numerical-precondition violation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LssError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Number of raw parameter rows does not match the schema.
    #[error("expected {expected} raw parameters, got {got}")]
    ParamCountMismatch { expected: usize, got: usize },

    /// Number of observations does not match the declared count.
    #[error("expected {expected} observations, got {got}")]
    ObservationCountMismatch { expected: usize, got: usize },

    /// An array has the wrong shape.
    #[error("{what} has shape {got:?}, expected {expected:?}")]
    ShapeMismatch {
        what: &'static str,
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    /// Covariance matrix is not square.
    #[error("covariance matrix must be square, got {rows}x{cols}")]
    NotSquare { rows: usize, cols: usize },

    /// Variance on the covariance diagonal is zero, negative or not finite.
    #[error("variance of target {target} must be positive, got {value}")]
    NonPositiveVariance { target: usize, value: f64 },

    /// Diagonal term of the low-rank covariance is zero, negative or not finite.
    #[error("cov_diag[{obs}, {target}] must be positive, got {value}")]
    NonPositiveDiagonal { obs: usize, target: usize, value: f64 },

    /// A distribution argument or target entry is NaN or infinite.
    #[error("{what}[{obs}, {target}] must be finite, got {value}")]
    NonFinite {
        what: &'static str,
        obs: usize,
        target: usize,
        value: f64,
    },

    /// A transformed distributional parameter overflowed.
    #[error("parameter {name} of observation {obs} is not finite after transform, got {value}")]
    NonFiniteParameter { name: String, obs: usize, value: f64 },

    /// Reporter target count disagrees with the fitted distribution.
    #[error("expected {expected} targets, got {got}")]
    TargetCountMismatch { expected: usize, got: usize },

    /// Capacitance matrix `I + W^T D^-1 W` failed to factorize.
    #[error("capacitance matrix of observation {obs} is not positive definite")]
    SingularCapacitance { obs: usize },
}

/// Crate result alias.
pub type Result<T> = std::result::Result<T, LssError>;
