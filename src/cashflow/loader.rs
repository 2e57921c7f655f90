//! Load cash flows from CSV or JSON

use super::data::deserialize_date;
use super::{CashFlow, CashflowParseError};
use chrono::NaiveDate;
use csv::{ReaderBuilder, Trim};
use std::io::Read;
use std::path::Path;

/// Raw CSV row: `date,amount[,description]`
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    #[serde(deserialize_with = "deserialize_date")]
    date: NaiveDate,
    amount: f64,
    #[serde(rename = "description", default)]
    _description: Option<String>,
}

/// Load cash flows from a CSV file with a `date,amount` header
pub fn load_cashflows<P: AsRef<Path>>(path: P) -> Result<Vec<CashFlow>, CashflowParseError> {
    let file = std::fs::File::open(path)?;
    load_cashflows_from_reader(file)
}

/// Load cash flows from any CSV reader (e.g., string buffer, request body)
pub fn load_cashflows_from_reader<R: Read>(reader: R) -> Result<Vec<CashFlow>, CashflowParseError> {
    let mut csv_reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);
    let mut flows = Vec::new();

    for result in csv_reader.deserialize() {
        let row: CsvRow = result?;
        flows.push(CashFlow::new(row.date, row.amount)?);
    }

    log::debug!("loaded {} cash flows from csv", flows.len());
    Ok(flows)
}

/// Load cash flows from a JSON array of `{"date", "amount"}` records
pub fn load_cashflows_json<R: Read>(reader: R) -> Result<Vec<CashFlow>, CashflowParseError> {
    Ok(serde_json::from_reader(reader)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_csv_with_descriptions() {
        let data = "date,amount,description\n\
                    2024-01-10,-100000,Initial Investment\n\
                    2024-06-10, -25000 ,Additional Investment\n\
                    2025-01-10,145000,Current Value\n";
        let flows = load_cashflows_from_reader(data.as_bytes()).unwrap();

        assert_eq!(flows.len(), 3);
        assert_eq!(flows[1].amount(), -25000.0);
        assert_eq!(flows[2].date(), NaiveDate::from_ymd_opt(2025, 1, 10).unwrap());
    }

    #[test]
    fn test_load_csv_without_description_column() {
        let data = "date,amount\n2024-01-01,-100\n2025-01-01T00:00:00Z,110\n";
        let flows = load_cashflows_from_reader(data.as_bytes()).unwrap();
        assert_eq!(flows.len(), 2);
        assert_eq!(flows[1].date(), NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
    }

    #[test]
    fn test_load_csv_bad_date_fails() {
        let data = "date,amount\nyesterday,-100\n";
        assert!(load_cashflows_from_reader(data.as_bytes()).is_err());
    }

    #[test]
    fn test_load_json_array() {
        let data = r#"[
            {"date": "2024-01-01", "amount": -100000},
            {"date": "2025-01-01T00:00:00.000Z", "amount": 110000}
        ]"#;
        let flows = load_cashflows_json(data.as_bytes()).unwrap();
        assert_eq!(flows.len(), 2);
        assert_eq!(flows[0].amount(), -100000.0);
    }

    #[test]
    fn test_missing_file() {
        let result = load_cashflows("does/not/exist.csv");
        assert!(matches!(result, Err(CashflowParseError::Io(_))));
    }
}
