//! Annualized money-weighted return (XIRR) for irregularly dated cash flows

mod config;
mod error;
mod npv;
mod solver;

pub use config::{SolverConfig, DEFAULT_GUESS, DEFAULT_LOWER_BOUND, DEFAULT_UPPER_BOUND};
pub use error::{Result, XirrError};
pub use npv::{xnpv, DAYS_PER_YEAR};
pub use solver::{xirr, SolverResult, XirrSolver};
