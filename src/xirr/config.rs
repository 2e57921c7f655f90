//! Solver configuration

use super::{Result, XirrError};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// Default initial guess (10% annual)
pub const DEFAULT_GUESS: f64 = 0.1;

/// Lower end of the search interval (-99.99% annual)
pub const DEFAULT_LOWER_BOUND: f64 = -0.9999;

/// Upper end of the search interval (+1000% annual)
pub const DEFAULT_UPPER_BOUND: f64 = 10.0;

/// The absolute tolerance never exceeds this multiple of the relative one
pub const ABS_TOLERANCE_CAP: f64 = 1e3;

/// Tunables for the XIRR root search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Starting rate for Newton-Raphson
    pub guess: f64,

    pub lower_bound: f64,
    pub upper_bound: f64,

    /// Absolute NPV tolerance in currency units
    pub abs_tolerance: f64,

    /// NPV tolerance relative to the largest absolute cash flow
    pub rel_tolerance: f64,

    /// Combined Newton + bisection step budget
    pub max_iterations: u32,

    /// Largest rate change a single Newton step may make
    pub max_newton_step: f64,

    /// Derivative magnitude below which Newton is not attempted
    pub min_derivative: f64,

    /// Number of grid rates evaluated when looking for a bracket
    pub scan_points: usize,

    /// Solve two-flow sets directly instead of iterating
    pub closed_form_two_flows: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            guess: DEFAULT_GUESS,
            lower_bound: DEFAULT_LOWER_BOUND,
            upper_bound: DEFAULT_UPPER_BOUND,
            abs_tolerance: 1e-7,
            rel_tolerance: 1e-9,
            max_iterations: 100,
            max_newton_step: 1.0,
            min_derivative: 1e-12,
            scan_points: 200,
            closed_form_two_flows: true,
        }
    }
}

impl SolverConfig {
    /// Defaults overlaid with `XIRR_*` environment variables
    ///
    /// Recognised: XIRR_GUESS, XIRR_LOWER_BOUND, XIRR_UPPER_BOUND,
    /// XIRR_ABS_TOLERANCE, XIRR_REL_TOLERANCE, XIRR_MAX_ITERATIONS,
    /// XIRR_SCAN_POINTS
    pub fn from_env() -> Self {
        let mut config = Self::default();
        override_from_env("XIRR_GUESS", &mut config.guess);
        override_from_env("XIRR_LOWER_BOUND", &mut config.lower_bound);
        override_from_env("XIRR_UPPER_BOUND", &mut config.upper_bound);
        override_from_env("XIRR_ABS_TOLERANCE", &mut config.abs_tolerance);
        override_from_env("XIRR_REL_TOLERANCE", &mut config.rel_tolerance);
        override_from_env("XIRR_MAX_ITERATIONS", &mut config.max_iterations);
        override_from_env("XIRR_SCAN_POINTS", &mut config.scan_points);
        config
    }

    pub fn with_guess(mut self, guess: f64) -> Self {
        self.guess = guess;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Check the settings describe a usable search
    pub fn validate(&self) -> Result<()> {
        let finite = [
            self.guess,
            self.lower_bound,
            self.upper_bound,
            self.abs_tolerance,
            self.rel_tolerance,
            self.max_newton_step,
            self.min_derivative,
        ];
        if finite.iter().any(|v| !v.is_finite()) {
            return Err(XirrError::InvalidConfig("all numeric settings must be finite".into()));
        }
        if self.lower_bound <= -1.0 {
            return Err(XirrError::InvalidConfig(format!(
                "lower bound {} must be greater than -1",
                self.lower_bound
            )));
        }
        if self.lower_bound >= self.upper_bound {
            return Err(XirrError::InvalidConfig(format!(
                "lower bound {} must be below upper bound {}",
                self.lower_bound, self.upper_bound
            )));
        }
        if self.abs_tolerance <= 0.0 && self.rel_tolerance <= 0.0 {
            return Err(XirrError::InvalidConfig("a positive tolerance is required".into()));
        }
        if self.max_iterations == 0 {
            return Err(XirrError::InvalidConfig("max_iterations must be at least 1".into()));
        }
        if self.max_newton_step <= 0.0 {
            return Err(XirrError::InvalidConfig("max_newton_step must be positive".into()));
        }
        if self.scan_points < 2 {
            return Err(XirrError::InvalidConfig("scan_points must be at least 2".into()));
        }
        Ok(())
    }

    /// NPV tolerance for a set whose largest absolute amount is `scale`
    ///
    /// The absolute floor is capped relative to `scale`, so tiny amounts
    /// are not swamped by a currency-unit tolerance.
    pub fn tolerance_for(&self, scale: f64) -> f64 {
        let relative = self.rel_tolerance * scale;
        self.abs_tolerance.min(ABS_TOLERANCE_CAP * relative).max(relative)
    }
}

fn override_from_env<T: FromStr>(key: &str, target: &mut T) {
    if let Ok(raw) = env::var(key) {
        match raw.trim().parse() {
            Ok(value) => *target = value,
            Err(_) => log::warn!("ignoring unparsable {}={:?}", key, raw),
        }
    }
}
