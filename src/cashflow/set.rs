//! Validated, date-ordered cash-flow sequence

use super::CashFlow;
use crate::xirr::{Result, XirrError};
use chrono::NaiveDate;
use serde::Serialize;

/// Normalized cash flows ready for discounting
///
/// Invariants: at least two entries, no zero amounts, at least one outflow
/// and one inflow, sorted by date with input order kept for same-date ties.
#[derive(Debug, Clone, PartialEq)]
pub struct CashflowSet {
    flows: Vec<CashFlow>,
}

impl CashflowSet {
    /// Drop zero amounts, validate, and sort by date
    pub fn new<I>(flows: I) -> Result<Self>
    where
        I: IntoIterator<Item = CashFlow>,
    {
        let mut flows: Vec<CashFlow> = flows.into_iter().filter(|cf| cf.amount() != 0.0).collect();

        if flows.len() < 2 {
            return Err(XirrError::InsufficientData { count: flows.len() });
        }

        let has_positive = flows.iter().any(|cf| cf.amount() > 0.0);
        let has_negative = flows.iter().any(|cf| cf.amount() < 0.0);
        if !has_positive || !has_negative {
            return Err(XirrError::NoSignChange);
        }

        // Stable, so same-date flows keep their input order
        flows.sort_by_key(|cf| cf.date());

        Ok(Self { flows })
    }

    /// Earliest date in the set; all discounting is anchored here
    pub fn anchor(&self) -> NaiveDate {
        self.flows[0].date()
    }

    pub fn last_date(&self) -> NaiveDate {
        self.flows[self.flows.len() - 1].date()
    }

    pub fn flows(&self) -> &[CashFlow] {
        &self.flows
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }

    /// Calendar days from the anchor date to `date`
    pub fn days_from_anchor(&self, date: NaiveDate) -> i64 {
        (date - self.anchor()).num_days()
    }

    /// Largest absolute amount, used to scale the convergence tolerance
    pub fn max_abs_amount(&self) -> f64 {
        self.flows.iter().map(|cf| cf.amount().abs()).fold(0.0, f64::max)
    }

    pub fn summary(&self) -> CashflowSummary {
        CashflowSummary::from_set(self)
    }
}

/// Headline figures for a set of cash flows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CashflowSummary {
    pub flow_count: usize,
    pub total_invested: f64,
    pub total_returned: f64,
    pub net_gain: f64,
    /// Net gain over total invested, not annualized
    pub absolute_return: f64,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub holding_period_days: i64,
}

impl CashflowSummary {
    pub fn from_set(set: &CashflowSet) -> Self {
        let total_invested: f64 = set
            .flows()
            .iter()
            .filter(|cf| cf.amount() < 0.0)
            .map(|cf| -cf.amount())
            .sum();
        let total_returned: f64 = set
            .flows()
            .iter()
            .filter(|cf| cf.amount() > 0.0)
            .map(|cf| cf.amount())
            .sum();
        let net_gain = total_returned - total_invested;

        Self {
            flow_count: set.len(),
            total_invested,
            total_returned,
            net_gain,
            // Non-zero: the set always holds at least one outflow
            absolute_return: net_gain / total_invested,
            first_date: set.anchor(),
            last_date: set.last_date(),
            holding_period_days: set.days_from_anchor(set.last_date()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cf(y: i32, m: u32, d: u32, amount: f64) -> CashFlow {
        CashFlow::new(NaiveDate::from_ymd_opt(y, m, d).unwrap(), amount).unwrap()
    }

    #[test]
    fn test_sorts_by_date_and_anchors_on_earliest() {
        let set = CashflowSet::new(vec![
            cf(2025, 9, 10, 145_000.0),
            cf(2024, 1, 10, -100_000.0),
            cf(2024, 6, 10, -25_000.0),
        ])
        .unwrap();

        let dates: Vec<_> = set.flows().iter().map(|f| f.date()).collect();
        assert!(dates.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(set.anchor(), NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());
        assert_eq!(set.days_from_anchor(set.last_date()), 609);
    }

    #[test]
    fn test_same_date_ties_keep_input_order() {
        let set = CashflowSet::new(vec![
            cf(2024, 3, 1, 10.0),
            cf(2024, 1, 1, -50.0),
            cf(2024, 3, 1, 20.0),
            cf(2024, 3, 1, 30.0),
        ])
        .unwrap();

        let amounts: Vec<_> = set.flows().iter().map(|f| f.amount()).collect();
        assert_eq!(amounts, vec![-50.0, 10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_zero_amounts_dropped_before_validation() {
        let err = CashflowSet::new(vec![cf(2024, 1, 1, -100.0), cf(2024, 6, 1, 0.0)]).unwrap_err();
        assert_eq!(err, XirrError::InsufficientData { count: 1 });

        let set = CashflowSet::new(vec![
            cf(2024, 1, 1, -100.0),
            cf(2024, 2, 1, 0.0),
            cf(2024, 6, 1, 105.0),
        ])
        .unwrap();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_empty_and_single_entry_rejected() {
        assert_eq!(
            CashflowSet::new(Vec::new()).unwrap_err(),
            XirrError::InsufficientData { count: 0 }
        );
        assert_eq!(
            CashflowSet::new(vec![cf(2024, 1, 1, -100.0)]).unwrap_err(),
            XirrError::InsufficientData { count: 1 }
        );
    }

    #[test]
    fn test_same_sign_rejected() {
        let positive = vec![cf(2024, 1, 1, 5000.0), cf(2024, 6, 1, 3000.0)];
        assert_eq!(CashflowSet::new(positive).unwrap_err(), XirrError::NoSignChange);

        let negative = vec![cf(2024, 1, 1, -5000.0), cf(2024, 6, 1, -3000.0)];
        assert_eq!(CashflowSet::new(negative).unwrap_err(), XirrError::NoSignChange);
    }

    #[test]
    fn test_summary() {
        let set = CashflowSet::new(vec![
            cf(2024, 1, 10, -100_000.0),
            cf(2024, 6, 10, -25_000.0),
            cf(2025, 1, 10, 145_000.0),
        ])
        .unwrap();
        let summary = set.summary();

        assert_eq!(summary.flow_count, 3);
        assert_eq!(summary.total_invested, 125_000.0);
        assert_eq!(summary.total_returned, 145_000.0);
        assert_eq!(summary.net_gain, 20_000.0);
        assert!((summary.absolute_return - 0.16).abs() < 1e-12);
        assert_eq!(summary.holding_period_days, 366);
    }

    #[test]
    fn test_max_abs_amount() {
        let set = CashflowSet::new(vec![cf(2024, 1, 1, -250.0), cf(2024, 2, 1, 100.0)]).unwrap();
        assert_eq!(set.max_abs_amount(), 250.0);
    }
}
