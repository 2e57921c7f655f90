//! Failure kinds for an XIRR solve
//!
//! Every variant is terminal for the call that produced it; no partial rate
//! is ever returned alongside an error.

use thiserror::Error;

/// Reasons an XIRR computation can fail
#[derive(Error, Debug, Clone, PartialEq)]
pub enum XirrError {
    /// Fewer than two non-zero cash flows remained after normalization
    #[error("at least two non-zero cash flows are required, got {count}")]
    InsufficientData { count: usize },

    /// All cash flows share the same sign, so no rate of return exists
    #[error("cash flows must contain at least one outflow and one inflow")]
    NoSignChange,

    /// The bracket scan found no sign change of NPV inside the search interval
    #[error("no rate between {lower} and {upper} sets the net present value to zero")]
    NoRootInRange { lower: f64, upper: f64 },

    /// The iteration budget ran out before NPV reached tolerance
    #[error("did not converge within {iterations} iterations (last estimate {last_rate})")]
    MaxIterationsExceeded { iterations: u32, last_rate: f64 },

    /// A candidate rate would make (1 + r) non-positive
    #[error("rate {rate} is outside the domain r > -1")]
    InvalidRateDomain { rate: f64 },

    /// Solver settings are inconsistent
    #[error("invalid solver configuration: {0}")]
    InvalidConfig(String),
}

impl XirrError {
    /// Stable identifier for the failure kind, suitable for API responses
    pub fn kind(&self) -> &'static str {
        match self {
            XirrError::InsufficientData { .. } => "insufficient_data",
            XirrError::NoSignChange => "no_sign_change",
            XirrError::NoRootInRange { .. } => "no_root_in_range",
            XirrError::MaxIterationsExceeded { .. } => "max_iterations_exceeded",
            XirrError::InvalidRateDomain { .. } => "invalid_rate_domain",
            XirrError::InvalidConfig(_) => "invalid_config",
        }
    }
}

/// Result alias for solver operations
pub type Result<T> = std::result::Result<T, XirrError>;
