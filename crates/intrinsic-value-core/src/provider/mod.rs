//! Financial data retrieval capability.
//!
//! The valuation core only talks to [`DataProvider`]. Implementations:
//!
//! | Provider | Backing store |
//! |----------|---------------|
//! | [`FileDataProvider`] | directory of `<TICKER>.json` documents |
//! | [`InMemoryDataProvider`] | documents held in memory |
//! | [`CachedProvider`] | memoizing wrapper around any provider |

pub mod cache;
#[cfg(feature = "file-provider")]
pub mod file;
pub mod memory;

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::statements::{FiscalYearMetrics, StatementSeries};
use crate::types::Money;

pub use cache::CachedProvider;
#[cfg(feature = "file-provider")]
pub use file::FileDataProvider;
pub use memory::InMemoryDataProvider;

/// Closes older than this many days before the requested date are not used.
pub const PRICE_LOOKBACK_DAYS: i64 = 5;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("unknown ticker '{0}'")]
    UnknownTicker(String),

    #[error("no fiscal year-end statements for '{ticker}' through {through}")]
    NoStatements { ticker: String, through: i32 },

    #[error("no closing price for '{ticker}' within {} days before {as_of}", PRICE_LOOKBACK_DAYS)]
    NoPrice { ticker: String, as_of: NaiveDate },

    #[error("malformed data for '{ticker}': {reason}")]
    MalformedData { ticker: String, reason: String },

    #[error("failed to read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Source of historical statements and prices.
///
/// Calls may block on I/O; the core treats them as synchronous.
pub trait DataProvider: Send + Sync {
    /// Annual statements ending at `through_fiscal_year`.
    fn get_statement_series(
        &self,
        ticker: &str,
        through_fiscal_year: i32,
    ) -> Result<StatementSeries, ProviderError>;

    /// Closing price on `as_of`, or the most recent close shortly before it.
    fn get_price(&self, ticker: &str, as_of: NaiveDate) -> Result<Money, ProviderError>;
}

impl<P: DataProvider + ?Sized> DataProvider for Box<P> {
    fn get_statement_series(
        &self,
        ticker: &str,
        through_fiscal_year: i32,
    ) -> Result<StatementSeries, ProviderError> {
        (**self).get_statement_series(ticker, through_fiscal_year)
    }

    fn get_price(&self, ticker: &str, as_of: NaiveDate) -> Result<Money, ProviderError> {
        (**self).get_price(ticker, as_of)
    }
}

/// Stored statements and closing prices for one ticker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickerDocument {
    pub ticker: String,
    #[serde(default)]
    pub statements: Vec<FiscalYearMetrics>,
    #[serde(default)]
    pub prices: BTreeMap<NaiveDate, Money>,
}

impl TickerDocument {
    pub fn new(ticker: &str) -> Self {
        TickerDocument {
            ticker: normalize_ticker(ticker),
            ..TickerDocument::default()
        }
    }

    pub fn statement_series(&self, through: i32) -> Result<StatementSeries, ProviderError> {
        let mut years: Vec<FiscalYearMetrics> = self
            .statements
            .iter()
            .filter(|s| s.fiscal_year <= through)
            .cloned()
            .collect();
        years.sort_by_key(|s| s.fiscal_year);

        if years.last().map(|s| s.fiscal_year) != Some(through) {
            return Err(ProviderError::NoStatements {
                ticker: self.ticker.clone(),
                through,
            });
        }

        StatementSeries::new(self.ticker.clone(), years).map_err(|e| ProviderError::MalformedData {
            ticker: self.ticker.clone(),
            reason: e.to_string(),
        })
    }

    pub fn price(&self, as_of: NaiveDate) -> Result<Money, ProviderError> {
        latest_close(&self.prices, as_of).ok_or_else(|| ProviderError::NoPrice {
            ticker: self.ticker.clone(),
            as_of,
        })
    }
}

/// Most recent close in `[as_of - PRICE_LOOKBACK_DAYS, as_of]`.
pub fn latest_close(prices: &BTreeMap<NaiveDate, Money>, as_of: NaiveDate) -> Option<Money> {
    let earliest = as_of - Duration::days(PRICE_LOOKBACK_DAYS);
    prices
        .range(earliest..=as_of)
        .next_back()
        .map(|(_, close)| *close)
}

pub fn normalize_ticker(ticker: &str) -> String {
    ticker.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn metrics(fiscal_year: i32) -> FiscalYearMetrics {
        FiscalYearMetrics {
            fiscal_year,
            revenue: dec!(100),
            operating_cash_flow: dec!(20),
            capital_expenditure: dec!(-5),
            free_cash_flow: None,
            shares_outstanding: dec!(10),
        }
    }

    #[test]
    fn test_latest_close_uses_lookback_window() {
        let mut prices = BTreeMap::new();
        prices.insert(date(2018, 12, 27), dec!(40));
        prices.insert(date(2018, 12, 28), dec!(41));
        // Dec 31 itself has no close; Friday Dec 28 is within 5 days.
        assert_eq!(latest_close(&prices, date(2018, 12, 31)), Some(dec!(41)));
        assert_eq!(latest_close(&prices, date(2018, 12, 27)), Some(dec!(40)));
        assert_eq!(latest_close(&prices, date(2019, 1, 10)), None);
        assert_eq!(latest_close(&prices, date(2018, 12, 1)), None);
    }

    #[test]
    fn test_document_series_sorted_and_truncated() {
        let mut doc = TickerDocument::new("acme");
        doc.statements = vec![metrics(2017), metrics(2015), metrics(2016), metrics(2018)];
        let series = doc.statement_series(2017).unwrap();
        assert_eq!(series.ticker(), "ACME");
        assert_eq!(series.first_year(), 2015);
        assert_eq!(series.last_year(), 2017);
    }

    #[test]
    fn test_document_series_missing_requested_year() {
        let mut doc = TickerDocument::new("ACME");
        doc.statements = vec![metrics(2015), metrics(2016)];
        assert!(matches!(
            doc.statement_series(2018).unwrap_err(),
            ProviderError::NoStatements { through: 2018, .. }
        ));
    }

    #[test]
    fn test_document_series_gap_is_malformed() {
        let mut doc = TickerDocument::new("ACME");
        doc.statements = vec![metrics(2014), metrics(2016), metrics(2017)];
        assert!(matches!(
            doc.statement_series(2017).unwrap_err(),
            ProviderError::MalformedData { .. }
        ));
    }

    #[test]
    fn test_document_price_error_names_date() {
        let doc = TickerDocument::new("ACME");
        let err = doc.price(date(2018, 12, 31)).unwrap_err();
        assert!(err.to_string().contains("2018-12-31"));
    }
}
