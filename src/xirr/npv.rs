//! Net present value of dated cash flows, actual/365 day count
//!
//! Every flow is discounted to the earliest date in its set:
//!
//! ```text
//! NPV(r)  = Σ a_i / (1 + r)^(d_i / 365)
//! NPV'(r) = Σ -(d_i / 365) · a_i / (1 + r)^(d_i / 365 + 1)
//! ```
//!
//! The 365-day year is used for every term; no leap-year adjustment.

use super::{Result, XirrError};
use crate::cashflow::{CashFlow, CashflowSet};

/// Days per year in the discounting convention
pub const DAYS_PER_YEAR: f64 = 365.0;

/// NPV and its derivative for one normalized cash-flow set
#[derive(Debug, Clone)]
pub(crate) struct PresentValueFunction {
    /// (year fraction from anchor, amount)
    terms: Vec<(f64, f64)>,
}

impl PresentValueFunction {
    pub fn new(set: &CashflowSet) -> Self {
        let terms = set
            .flows()
            .iter()
            .map(|cf| (set.days_from_anchor(cf.date()) as f64 / DAYS_PER_YEAR, cf.amount()))
            .collect();
        Self { terms }
    }

    /// NPV at an annual rate
    pub fn npv(&self, rate: f64) -> Result<f64> {
        let one_plus_r = check_domain(rate)?;
        Ok(self
            .terms
            .iter()
            .map(|&(years, amount)| amount * one_plus_r.powf(-years))
            .sum())
    }

    /// NPV and dNPV/dr at an annual rate
    pub fn npv_and_derivative(&self, rate: f64) -> Result<(f64, f64)> {
        let one_plus_r = check_domain(rate)?;
        let mut npv = 0.0;
        let mut dnpv = 0.0;

        for &(years, amount) in &self.terms {
            let discounted = amount * one_plus_r.powf(-years);
            npv += discounted;
            dnpv -= years * discounted / one_plus_r;
        }

        Ok((npv, dnpv))
    }
}

fn check_domain(rate: f64) -> Result<f64> {
    // Also catches NaN
    if !(rate > -1.0) || !rate.is_finite() {
        return Err(XirrError::InvalidRateDomain { rate });
    }
    Ok(1.0 + rate)
}

/// NPV of arbitrary dated flows at `rate`, anchored on their earliest date
///
/// Useful for checking a solved rate: `xnpv(rate, flows)` should be ~0.
pub fn xnpv(rate: f64, flows: &[CashFlow]) -> Result<f64> {
    let one_plus_r = check_domain(rate)?;
    let Some(anchor) = flows.iter().map(|cf| cf.date()).min() else {
        return Ok(0.0);
    };

    Ok(flows
        .iter()
        .map(|cf| {
            let years = (cf.date() - anchor).num_days() as f64 / DAYS_PER_YEAR;
            cf.amount() * one_plus_r.powf(-years)
        })
        .sum())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn cf(y: i32, m: u32, d: u32, amount: f64) -> CashFlow {
        CashFlow::new(NaiveDate::from_ymd_opt(y, m, d).unwrap(), amount).unwrap()
    }

    fn sample_set() -> CashflowSet {
        CashflowSet::new(vec![
            cf(2024, 1, 10, -100_000.0),
            cf(2024, 6, 10, -25_000.0),
            cf(2025, 9, 10, 145_000.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_zero_rate_is_plain_sum() {
        let pvf = PresentValueFunction::new(&sample_set());
        assert_relative_eq!(pvf.npv(0.0).unwrap(), 20_000.0, epsilon = 1e-9);
    }

    #[test]
    fn test_one_year_discount() {
        // 2023 has 365 days, so the inflow is exactly one year out
        let set = CashflowSet::new(vec![cf(2023, 1, 1, -100.0), cf(2024, 1, 1, 110.0)]).unwrap();
        let pvf = PresentValueFunction::new(&set);
        assert_relative_eq!(pvf.npv(0.10).unwrap(), 0.0, epsilon = 1e-10);
    }

    #[test]
    fn test_leap_year_uses_365_day_convention() {
        // 366 days in 2024: exponent is 366/365, not 1
        let set = CashflowSet::new(vec![cf(2024, 1, 1, -100.0), cf(2025, 1, 1, 110.0)]).unwrap();
        let pvf = PresentValueFunction::new(&set);
        let expected = -100.0 + 110.0 / 1.1_f64.powf(366.0 / 365.0);
        assert_relative_eq!(pvf.npv(0.10).unwrap(), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_derivative_matches_finite_difference() {
        let pvf = PresentValueFunction::new(&sample_set());
        let h = 1e-6;
        for &rate in &[-0.5, 0.0, 0.08, 0.5, 3.0] {
            let (npv, dnpv) = pvf.npv_and_derivative(rate).unwrap();
            let numeric = (pvf.npv(rate + h).unwrap() - pvf.npv(rate - h).unwrap()) / (2.0 * h);
            assert_relative_eq!(npv, pvf.npv(rate).unwrap(), epsilon = 1e-9);
            assert_relative_eq!(dnpv, numeric, max_relative = 1e-5);
        }
    }

    #[test]
    fn test_rate_domain_guard() {
        let pvf = PresentValueFunction::new(&sample_set());
        assert_eq!(pvf.npv(-1.0).unwrap_err(), XirrError::InvalidRateDomain { rate: -1.0 });
        assert!(pvf.npv_and_derivative(-1.5).is_err());
        assert!(pvf.npv(f64::NAN).is_err());
        assert!(pvf.npv(-0.9999).is_ok());
    }

    #[test]
    fn test_xnpv_unsorted_input() {
        let flows = vec![
            cf(2025, 9, 10, 145_000.0),
            cf(2024, 1, 10, -100_000.0),
            cf(2024, 6, 10, -25_000.0),
        ];
        let pvf = PresentValueFunction::new(&sample_set());
        assert_relative_eq!(
            xnpv(0.07, &flows).unwrap(),
            pvf.npv(0.07).unwrap(),
            epsilon = 1e-9
        );
        assert_eq!(xnpv(0.07, &[]).unwrap(), 0.0);
    }
}
