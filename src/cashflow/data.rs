//! Single dated cash flow and date parsing

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Problems with raw cash-flow input, before any solving happens
#[derive(Error, Debug)]
pub enum CashflowParseError {
    #[error("unrecognised date '{0}' (expected YYYY-MM-DD or an ISO-8601 timestamp)")]
    InvalidDate(String),

    #[error("amount must be a finite number, got {0}")]
    NonFiniteAmount(f64),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A dated transaction: negative = money out, positive = money in
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCashFlow")]
pub struct CashFlow {
    date: NaiveDate,
    amount: f64,
}

impl CashFlow {
    pub fn new(date: NaiveDate, amount: f64) -> Result<Self, CashflowParseError> {
        if !amount.is_finite() {
            return Err(CashflowParseError::NonFiniteAmount(amount));
        }
        Ok(Self { date, amount })
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }
}

/// Wire shape accepted from JSON: `{"date": "...", "amount": -1000.0}`
#[derive(Debug, Deserialize)]
struct RawCashFlow {
    #[serde(deserialize_with = "deserialize_date")]
    date: NaiveDate,
    amount: f64,
}

impl TryFrom<RawCashFlow> for CashFlow {
    type Error = CashflowParseError;

    fn try_from(raw: RawCashFlow) -> Result<Self, Self::Error> {
        CashFlow::new(raw.date, raw.amount)
    }
}

/// Parse a calendar date, truncating any time-of-day component
///
/// Accepts `2024-01-10`, RFC 3339 timestamps such as
/// `2024-01-10T00:00:00.000Z` and naive `2024-01-10T09:30:00`.
pub fn parse_date(input: &str) -> Result<NaiveDate, CashflowParseError> {
    let s = input.trim();

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.date_naive());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.date());
        }
    }

    Err(CashflowParseError::InvalidDate(input.to_string()))
}

pub(crate) fn deserialize_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_date(&s).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_plain_date() {
        assert_eq!(parse_date("2024-01-10").unwrap(), ymd(2024, 1, 10));
        assert_eq!(parse_date(" 2024-01-10 ").unwrap(), ymd(2024, 1, 10));
    }

    #[test]
    fn test_parse_timestamps_truncate_to_date() {
        assert_eq!(parse_date("2024-06-10T00:00:00.000Z").unwrap(), ymd(2024, 6, 10));
        assert_eq!(parse_date("2024-06-10T23:59:59+05:30").unwrap(), ymd(2024, 6, 10));
        assert_eq!(parse_date("2024-06-10T09:30:00").unwrap(), ymd(2024, 6, 10));
        assert_eq!(parse_date("2024-06-10 09:30:00.250").unwrap(), ymd(2024, 6, 10));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(parse_date("10/01/2024"), Err(CashflowParseError::InvalidDate(_))));
        assert!(parse_date("").is_err());
    }

    #[test]
    fn test_non_finite_amount_rejected() {
        assert!(CashFlow::new(ymd(2024, 1, 1), f64::NAN).is_err());
        assert!(CashFlow::new(ymd(2024, 1, 1), f64::INFINITY).is_err());
        assert!(CashFlow::new(ymd(2024, 1, 1), -100.0).is_ok());
    }

    #[test]
    fn test_deserialize_from_json() {
        let cf: CashFlow =
            serde_json::from_str(r#"{"date": "2025-01-10T00:00:00.000Z", "amount": 145000}"#)
                .unwrap();
        assert_eq!(cf.date(), ymd(2025, 1, 10));
        assert_eq!(cf.amount(), 145000.0);

        let bad = serde_json::from_str::<CashFlow>(r#"{"date": "soon", "amount": 1}"#);
        assert!(bad.is_err());
    }
}
