//! XIRR command-line tool
//!
//! Computes the annualized money-weighted return for one or more cash-flow
//! CSV files (`date,amount[,description]`). Files are solved in parallel.
//! Solver defaults can be overridden with XIRR_* environment variables.

use anyhow::Context;
use clap::Parser;
use portfolio_xirr::cashflow::load_cashflows;
use portfolio_xirr::{CashflowSet, CashflowSummary, SolverConfig, SolverResult, XirrError, XirrSolver};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "xirr", version, about = "Annualized return (XIRR) for dated cash flows")]
struct Cli {
    /// Cash-flow CSV files with a date,amount header
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Output results in JSON format
    #[arg(long)]
    json: bool,

    /// Initial rate guess (fraction, e.g. 0.1 for 10%)
    #[arg(long)]
    guess: Option<f64>,

    /// Combined Newton/bisection step budget
    #[arg(long)]
    max_iterations: Option<u32>,
}

/// Outcome for one input file
#[derive(Debug, Serialize)]
struct FileReport {
    file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    xirr: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    xirr_pct: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    iterations: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<CashflowSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<&'static str>,
}

impl FileReport {
    fn new(path: &Path, outcome: anyhow::Result<(SolverResult, CashflowSummary)>) -> Self {
        let file = path.display().to_string();
        match outcome {
            Ok((result, summary)) => Self {
                file,
                xirr: Some(result.rate),
                xirr_pct: Some(result.rate * 100.0),
                iterations: Some(result.iterations),
                summary: Some(summary),
                error: None,
                kind: None,
            },
            Err(err) => Self {
                file,
                xirr: None,
                xirr_pct: None,
                iterations: None,
                summary: None,
                kind: Some(err.downcast_ref::<XirrError>().map_or("invalid_input", XirrError::kind)),
                error: Some(format!("{:#}", err)),
            },
        }
    }

    fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

fn solve_file(solver: &XirrSolver, path: &Path) -> anyhow::Result<(SolverResult, CashflowSummary)> {
    let flows = load_cashflows(path).with_context(|| format!("failed to read {}", path.display()))?;
    let set = CashflowSet::new(flows)?;
    let result = solver.solve_set(&set)?;
    Ok((result, set.summary()))
}

fn print_report(report: &FileReport) {
    println!("{}", report.file);
    match (&report.xirr_pct, &report.summary) {
        (Some(pct), Some(summary)) => {
            println!("  XIRR:           {:>14.4}%", pct);
            println!("  Iterations:     {:>14}", report.iterations.unwrap_or(0));
            println!("  Flows:          {:>14}", summary.flow_count);
            println!("  Total Invested: {:>14.2}", summary.total_invested);
            println!("  Total Returned: {:>14.2}", summary.total_returned);
            println!("  Net Gain:       {:>14.2}", summary.net_gain);
            println!("  Absolute:       {:>14.4}%", summary.absolute_return * 100.0);
            println!(
                "  Period:         {} to {} ({} days)",
                summary.first_date, summary.last_date, summary.holding_period_days
            );
        }
        _ => {
            println!("  Cannot compute a return for these cash flows");
            if let Some(error) = &report.error {
                println!("  Error: {}", error);
            }
        }
    }
}

fn main() -> anyhow::Result<ExitCode> {
    env_logger::init();

    let cli = Cli::parse();

    let mut config = SolverConfig::from_env();
    if let Some(guess) = cli.guess {
        config = config.with_guess(guess);
    }
    if let Some(max_iterations) = cli.max_iterations {
        config = config.with_max_iterations(max_iterations);
    }
    let solver = XirrSolver::new(config).context("invalid solver settings")?;

    let reports: Vec<FileReport> = cli
        .files
        .par_iter()
        .map(|path| FileReport::new(path, solve_file(&solver, path)))
        .collect();

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            print_report(report);
        }
    }

    if reports.iter().all(FileReport::is_ok) {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
