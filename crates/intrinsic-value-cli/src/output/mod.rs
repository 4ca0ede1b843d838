pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use std::path::Path;

use rust_decimal::Decimal;
use serde::Serialize;

use intrinsic_value_core::{IntrinsicError, ValuationResult};

use crate::OutputFormat;

/// Decimal places shown for prices.
const PRICE_DP: u32 = 6;
/// Decimal places shown for upside.
const UPSIDE_DP: u32 = 4;

/// One line of the end-of-batch summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub ticker: String,
    pub fiscal_year: i32,
    /// `ok`, or the error kind that stopped this ticker
    pub status: String,
    pub method: Option<String>,
    pub intrinsic_price: Option<Decimal>,
    pub market_price: Option<Decimal>,
    pub upside: Option<Decimal>,
    pub report: Option<String>,
    pub error: Option<String>,
}

impl SummaryRow {
    pub fn valued(result: &ValuationResult, report: Option<&Path>) -> Self {
        SummaryRow {
            ticker: result.ticker.clone(),
            fiscal_year: result.fiscal_year,
            status: "ok".into(),
            method: Some(result.method.clone()),
            intrinsic_price: Some(result.intrinsic_price.round_dp(PRICE_DP)),
            market_price: result.market_price.map(|p| p.round_dp(PRICE_DP)),
            upside: result.upside().map(|u| u.round_dp(UPSIDE_DP)),
            report: report.map(|p| p.display().to_string()),
            error: None,
        }
    }

    pub fn failed(ticker: &str, fiscal_year: i32, err: &IntrinsicError) -> Self {
        SummaryRow {
            ticker: ticker.to_string(),
            fiscal_year,
            status: err.kind().to_string(),
            method: None,
            intrinsic_price: None,
            market_price: None,
            upside: None,
            report: None,
            error: Some(err.to_string()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Everything printed on stdout after the batch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    pub fiscal_year: i32,
    pub valued: usize,
    pub failed: usize,
    pub results: Vec<SummaryRow>,
}

impl BatchSummary {
    pub fn new(fiscal_year: i32) -> Self {
        BatchSummary {
            fiscal_year,
            ..BatchSummary::default()
        }
    }

    pub fn push(&mut self, row: SummaryRow) {
        if row.is_ok() {
            self.valued += 1;
        } else {
            self.failed += 1;
        }
        self.results.push(row);
    }

    pub fn all_valued(&self) -> bool {
        self.failed == 0
    }
}

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, summary: &BatchSummary) {
    match format {
        OutputFormat::Json => json::print_json(summary),
        OutputFormat::Table => table::print_table(summary),
        OutputFormat::Csv => csv_out::print_csv(summary),
        OutputFormat::Minimal => minimal::print_minimal(summary),
    }
}

pub(crate) fn format_decimal(value: Option<Decimal>) -> String {
    value.map(|v| v.normalize().to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn ok_row(ticker: &str) -> SummaryRow {
        SummaryRow {
            ticker: ticker.into(),
            fiscal_year: 2018,
            status: "ok".into(),
            method: Some("Jimmy DCF".into()),
            intrinsic_price: Some(dec!(224.378196)),
            market_price: Some(dec!(180)),
            upside: Some(dec!(0.2465)),
            report: None,
            error: None,
        }
    }

    #[test]
    fn test_summary_counts() {
        let mut summary = BatchSummary::new(2018);
        summary.push(ok_row("ACME"));
        let err = IntrinsicError::InvalidInput {
            field: "horizon".into(),
            reason: "must be positive".into(),
        };
        summary.push(SummaryRow::failed("FOO", 2018, &err));

        assert_eq!(summary.valued, 1);
        assert_eq!(summary.failed, 1);
        assert!(!summary.all_valued());
        assert_eq!(summary.results[1].status, "invalid_input");
    }

    #[test]
    fn test_format_decimal_trims_trailing_zeros() {
        assert_eq!(format_decimal(Some(dec!(180.000000))), "180");
        assert_eq!(format_decimal(None), "");
    }
}
