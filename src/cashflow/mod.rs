//! Cash-flow data structures, validation and loading

mod data;
mod set;
pub mod loader;

pub use data::{parse_date, CashFlow, CashflowParseError};
pub use set::{CashflowSet, CashflowSummary};
pub use loader::{load_cashflows, load_cashflows_from_reader, load_cashflows_json};
