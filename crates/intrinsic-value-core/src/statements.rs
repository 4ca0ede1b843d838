//! Historical annual statement data for a single company.
//!
//! A [`StatementSeries`] is the only input the forecasting strategies read.
//! Construction validates that fiscal years are strictly increasing and
//! contiguous; a gap is a data problem and is never interpolated.

use serde::{Deserialize, Serialize};

use crate::error::IntrinsicError;
use crate::types::{Money, Shares};
use crate::IntrinsicResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One company-year of fiscal year-end figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiscalYearMetrics {
    pub fiscal_year: i32,
    /// Total revenue
    pub revenue: Money,
    /// Net cash from operating activities
    pub operating_cash_flow: Money,
    /// Purchases of property, plant and equipment. Either sign is accepted;
    /// the magnitude is treated as an outflow.
    pub capital_expenditure: Money,
    /// Reported free cash flow. When absent it is derived from OCF and capex.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub free_cash_flow: Option<Money>,
    /// Weighted average diluted shares outstanding
    pub shares_outstanding: Shares,
}

impl FiscalYearMetrics {
    /// Reported free cash flow, or `operating_cash_flow - |capital_expenditure|`.
    ///
    /// The derived value saturates; [`StatementSeries::new`] rejects years where it would.
    pub fn free_cash_flow(&self) -> Money {
        self.free_cash_flow
            .unwrap_or_else(|| self.operating_cash_flow.saturating_sub(self.capital_expenditure.abs()))
    }

    fn derived_free_cash_flow_fits(&self) -> bool {
        self.free_cash_flow.is_some()
            || self
                .operating_cash_flow
                .checked_sub(self.capital_expenditure.abs())
                .is_some()
    }
}

/// Ordered, gap-free annual history for one ticker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatementSeries {
    ticker: String,
    years: Vec<FiscalYearMetrics>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

impl StatementSeries {
    /// Build a series, rejecting empty input, out-of-order years and gaps.
    pub fn new(ticker: impl Into<String>, years: Vec<FiscalYearMetrics>) -> IntrinsicResult<Self> {
        let ticker = ticker.into();
        if years.is_empty() {
            return Err(IntrinsicError::InvalidSeries(format!(
                "{ticker}: no fiscal years supplied"
            )));
        }

        for pair in years.windows(2) {
            let (prev, curr) = (pair[0].fiscal_year, pair[1].fiscal_year);
            if curr <= prev {
                return Err(IntrinsicError::InvalidSeries(format!(
                    "{ticker}: fiscal years must be strictly increasing ({prev} followed by {curr})"
                )));
            }
            if curr != prev + 1 {
                return Err(IntrinsicError::InvalidSeries(format!(
                    "{ticker}: fiscal years must be contiguous (gap between {prev} and {curr})"
                )));
            }
        }

        if let Some(year) = years.iter().find(|y| !y.derived_free_cash_flow_fits()) {
            return Err(IntrinsicError::InvalidSeries(format!(
                "{ticker}: free cash flow for {} is out of range",
                year.fiscal_year
            )));
        }

        Ok(StatementSeries { ticker, years })
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn years(&self) -> &[FiscalYearMetrics] {
        &self.years
    }

    pub fn len(&self) -> usize {
        self.years.len()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    /// Most recent fiscal year. A constructed series is never empty.
    pub fn latest(&self) -> &FiscalYearMetrics {
        &self.years[self.years.len() - 1]
    }

    pub fn first_year(&self) -> i32 {
        self.years[0].fiscal_year
    }

    pub fn last_year(&self) -> i32 {
        self.latest().fiscal_year
    }

    /// The most recent `n` years (all of them if fewer exist).
    pub fn trailing(&self, n: usize) -> &[FiscalYearMetrics] {
        let start = self.years.len().saturating_sub(n);
        &self.years[start..]
    }

    pub fn free_cash_flows(&self) -> Vec<Money> {
        self.years.iter().map(FiscalYearMetrics::free_cash_flow).collect()
    }

    pub fn revenues(&self) -> Vec<Money> {
        self.years.iter().map(|y| y.revenue).collect()
    }

    /// Sub-series ending at `fiscal_year`.
    pub fn through(&self, fiscal_year: i32) -> IntrinsicResult<Self> {
        let kept: Vec<FiscalYearMetrics> = self
            .years
            .iter()
            .filter(|y| y.fiscal_year <= fiscal_year)
            .cloned()
            .collect();
        match kept.last() {
            Some(last) if last.fiscal_year == fiscal_year => {
                StatementSeries::new(self.ticker.clone(), kept)
            }
            _ => Err(IntrinsicError::InvalidSeries(format!(
                "{}: no statements for fiscal year {fiscal_year} (available {}-{})",
                self.ticker,
                self.first_year(),
                self.last_year()
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
