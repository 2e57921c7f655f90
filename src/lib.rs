//! Portfolio XIRR - annualized money-weighted returns for brokerage cash flows
//!
//! This library provides:
//! - Cash-flow validation and normalization (dropping zero amounts, date ordering)
//! - Net present value on an actual/365 day count anchored at the earliest flow
//! - A bracketed Newton-Raphson / bisection XIRR solver with typed failures
//! - CSV and JSON loaders for dated cash flows

pub mod cashflow;
pub mod xirr;

// Re-export commonly used types
pub use cashflow::{CashFlow, CashflowSet, CashflowSummary};
pub use xirr::{xirr, SolverConfig, SolverResult, XirrError, XirrSolver};
