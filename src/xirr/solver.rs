//! XIRR root search: bracket scan, then safeguarded Newton-Raphson
//!
//! The search interval is first scanned from low to high rates for the
//! first sign change of NPV. Inside that bracket Newton-Raphson runs with
//! damped steps; any step that would leave the bracket, a vanishing
//! derivative, or a non-finite evaluation turns that iteration into a
//! bisection step. The bracket shrinks after every evaluation, so the
//! sign change is never lost.
//!
//! When NPV has several roots in the interval the lowest one the scan can
//! separate is returned.

use super::npv::{PresentValueFunction, DAYS_PER_YEAR};
use super::{Result, SolverConfig, XirrError};
use crate::cashflow::{CashFlow, CashflowSet};
use log::{debug, trace, warn};
use rayon::prelude::*;
use serde::Serialize;

/// A converged rate and how it was reached
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SolverResult {
    /// Annual rate as a fraction (0.125 = 12.5%)
    pub rate: f64,
    /// Newton + bisection steps taken
    pub iterations: u32,
    pub newton_steps: u32,
    pub bisection_steps: u32,
    /// NPV left at `rate`
    pub npv: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Newton,
    Bisection,
}

/// Rates on either side of a sign change of NPV
#[derive(Debug, Clone, Copy)]
struct Bracket {
    lo: f64,
    npv_lo: f64,
    hi: f64,
}

enum Scan {
    /// A grid rate already satisfies the tolerance
    Root { rate: f64, npv: f64 },
    Bracket(Bracket),
}

/// Stateless XIRR solver; safe to share across threads
#[derive(Debug, Clone, Default)]
pub struct XirrSolver {
    config: SolverConfig,
}

impl XirrSolver {
    pub fn new(config: SolverConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Validate raw flows and solve for the annual rate
    pub fn solve(&self, flows: &[CashFlow]) -> Result<SolverResult> {
        let set = CashflowSet::new(flows.iter().copied())?;
        self.solve_set(&set)
    }

    /// Solve an already normalized set
    pub fn solve_set(&self, set: &CashflowSet) -> Result<SolverResult> {
        let pvf = PresentValueFunction::new(set);
        let tolerance = self.config.tolerance_for(set.max_abs_amount());
        debug!(
            "solving xirr for {} flows anchored at {} (tolerance {:e})",
            set.len(),
            set.anchor(),
            tolerance
        );

        if self.config.closed_form_two_flows && set.len() == 2 {
            if let Some(result) = self.closed_form(set, &pvf, tolerance)? {
                debug!("two-flow closed form gave rate {}", result.rate);
                return Ok(result);
            }
        }

        let bracket = match self.find_bracket(&pvf, tolerance)? {
            Scan::Root { rate, npv } => {
                debug!("grid rate {} already within tolerance", rate);
                return Ok(SolverResult {
                    rate,
                    iterations: 0,
                    newton_steps: 0,
                    bisection_steps: 0,
                    npv,
                });
            }
            Scan::Bracket(bracket) => bracket,
        };
        debug!("root bracketed in [{}, {}]", bracket.lo, bracket.hi);

        self.refine(&pvf, bracket, tolerance)
    }

    /// Solve independent cash-flow lists in parallel, results in input order
    pub fn solve_many<F>(&self, batches: &[F]) -> Vec<Result<SolverResult>>
    where
        F: AsRef<[CashFlow]> + Sync,
    {
        batches.par_iter().map(|flows| self.solve(flows.as_ref())).collect()
    }

    /// `r = (-a1 / a0)^(365 / days) - 1` for one flow out and one back
    ///
    /// Returns `None` when the closed form does not apply (same-day flows,
    /// rate outside the bounds), leaving the general search to decide.
    fn closed_form(
        &self,
        set: &CashflowSet,
        pvf: &PresentValueFunction,
        tolerance: f64,
    ) -> Result<Option<SolverResult>> {
        let (first, last) = (set.flows()[0], set.flows()[1]);
        let days = set.days_from_anchor(last.date());
        if days <= 0 {
            return Ok(None);
        }

        let growth = -last.amount() / first.amount();
        let rate = growth.powf(DAYS_PER_YEAR / days as f64) - 1.0;
        if !rate.is_finite() || rate < self.config.lower_bound || rate > self.config.upper_bound {
            return Ok(None);
        }

        let npv = pvf.npv(rate)?;
        if npv.abs() > tolerance {
            return Ok(None);
        }

        Ok(Some(SolverResult {
            rate,
            iterations: 0,
            newton_steps: 0,
            bisection_steps: 0,
            npv,
        }))
    }

    /// Grid rates evenly spaced in ln(1 + r), lowest first
    fn scan_grid(&self) -> Vec<f64> {
        let n = self.config.scan_points;
        let ln_lo = (1.0 + self.config.lower_bound).ln();
        let ln_hi = (1.0 + self.config.upper_bound).ln();

        (0..n)
            .map(|i| {
                if i == 0 {
                    self.config.lower_bound
                } else if i == n - 1 {
                    self.config.upper_bound
                } else {
                    let t = i as f64 / (n - 1) as f64;
                    (ln_lo + (ln_hi - ln_lo) * t).exp() - 1.0
                }
            })
            .collect()
    }

    /// First sign change of NPV scanning the grid from low to high
    fn find_bracket(&self, pvf: &PresentValueFunction, tolerance: f64) -> Result<Scan> {
        let no_root = XirrError::NoRootInRange {
            lower: self.config.lower_bound,
            upper: self.config.upper_bound,
        };

        // Flat NPV (flows cancel out on the same day): every rate "solves" it
        let at_lower = pvf.npv(self.config.lower_bound)?;
        let at_upper = pvf.npv(self.config.upper_bound)?;
        if at_lower.abs() <= tolerance && at_upper.abs() <= tolerance {
            warn!("npv is flat within tolerance across the whole interval");
            return Err(no_root);
        }

        let mut prev: Option<(f64, f64)> = None;

        for rate in self.scan_grid() {
            let npv = pvf.npv(rate)?;
            if !npv.is_finite() {
                // Overflow near -1 for long horizons; restart the pairing
                prev = None;
                continue;
            }
            if npv.abs() <= tolerance {
                return Ok(Scan::Root { rate, npv });
            }
            if let Some((prev_rate, prev_npv)) = prev {
                if prev_npv.signum() != npv.signum() {
                    return Ok(Scan::Bracket(Bracket {
                        lo: prev_rate,
                        npv_lo: prev_npv,
                        hi: rate,
                    }));
                }
            }
            prev = Some((rate, npv));
        }

        warn!(
            "no sign change of npv between {} and {}",
            self.config.lower_bound, self.config.upper_bound
        );
        Err(no_root)
    }

    /// Newton-Raphson inside the bracket, bisecting when Newton misbehaves
    fn refine(
        &self,
        pvf: &PresentValueFunction,
        bracket: Bracket,
        tolerance: f64,
    ) -> Result<SolverResult> {
        let Bracket { mut lo, mut npv_lo, mut hi } = bracket;
        let mut rate = if self.config.guess > lo && self.config.guess < hi {
            self.config.guess
        } else {
            0.5 * (lo + hi)
        };
        let mut newton_steps = 0;
        let mut bisection_steps = 0;

        loop {
            let (npv, dnpv) = pvf.npv_and_derivative(rate)?;
            let iterations = newton_steps + bisection_steps;

            if npv.is_finite() && npv.abs() <= tolerance {
                debug!("converged to {} after {} iterations", rate, iterations);
                return Ok(SolverResult {
                    rate,
                    iterations,
                    newton_steps,
                    bisection_steps,
                    npv,
                });
            }

            if iterations >= self.config.max_iterations {
                warn!(
                    "xirr did not converge in {} iterations (rate {}, npv {})",
                    iterations, rate, npv
                );
                return Err(XirrError::MaxIterationsExceeded {
                    iterations,
                    last_rate: rate,
                });
            }

            if npv.is_finite() {
                if npv.signum() == npv_lo.signum() {
                    lo = rate;
                    npv_lo = npv;
                } else {
                    hi = rate;
                }
            }

            let (next, step) = match self.newton_candidate(rate, npv, dnpv) {
                Some(next) if next > lo && next < hi => (next, Step::Newton),
                _ => (0.5 * (lo + hi), Step::Bisection),
            };
            trace!("{:?} step: {} -> {} (npv {})", step, rate, next, npv);

            match step {
                Step::Newton => newton_steps += 1,
                Step::Bisection => bisection_steps += 1,
            }
            rate = next;
        }
    }

    /// Damped Newton update, or `None` when the derivative is unusable
    fn newton_candidate(&self, rate: f64, npv: f64, dnpv: f64) -> Option<f64> {
        if !npv.is_finite() || !dnpv.is_finite() || dnpv.abs() < self.config.min_derivative {
            return None;
        }
        let limit = self.config.max_newton_step;
        let step = (npv / dnpv).clamp(-limit, limit);
        Some(rate - step)
    }
}

/// Solve with default settings
pub fn xirr(flows: &[CashFlow]) -> Result<SolverResult> {
    XirrSolver::default().solve(flows)
}
