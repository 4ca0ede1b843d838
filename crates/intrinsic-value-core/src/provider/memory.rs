use std::collections::HashMap;

use chrono::NaiveDate;

use super::{normalize_ticker, DataProvider, ProviderError, TickerDocument};
use crate::statements::{FiscalYearMetrics, StatementSeries};
use crate::types::Money;

/// Provider over documents built in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDataProvider {
    documents: HashMap<String, TickerDocument>,
}

impl InMemoryDataProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, document: TickerDocument) -> Self {
        self.insert(document);
        self
    }

    pub fn with_statements(mut self, ticker: &str, statements: Vec<FiscalYearMetrics>) -> Self {
        self.entry(ticker).statements.extend(statements);
        self
    }

    pub fn with_price(mut self, ticker: &str, date: NaiveDate, close: Money) -> Self {
        self.entry(ticker).prices.insert(date, close);
        self
    }

    pub fn insert(&mut self, mut document: TickerDocument) {
        document.ticker = normalize_ticker(&document.ticker);
        self.documents.insert(document.ticker.clone(), document);
    }

    fn entry(&mut self, ticker: &str) -> &mut TickerDocument {
        let key = normalize_ticker(ticker);
        self.documents
            .entry(key)
            .or_insert_with(|| TickerDocument::new(ticker))
    }

    fn document(&self, ticker: &str) -> Result<&TickerDocument, ProviderError> {
        let key = normalize_ticker(ticker);
        self.documents
            .get(&key)
            .ok_or(ProviderError::UnknownTicker(key))
    }
}

impl DataProvider for InMemoryDataProvider {
    fn get_statement_series(
        &self,
        ticker: &str,
        through_fiscal_year: i32,
    ) -> Result<StatementSeries, ProviderError> {
        self.document(ticker)?.statement_series(through_fiscal_year)
    }

    fn get_price(&self, ticker: &str, as_of: NaiveDate) -> Result<Money, ProviderError> {
        self.document(ticker)?.price(as_of)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn metrics(fiscal_year: i32) -> FiscalYearMetrics {
        FiscalYearMetrics {
            fiscal_year,
            revenue: dec!(100),
            operating_cash_flow: dec!(20),
            capital_expenditure: dec!(5),
            free_cash_flow: None,
            shares_outstanding: dec!(10),
        }
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let date = NaiveDate::from_ymd_opt(2018, 12, 31).unwrap();
        let provider = InMemoryDataProvider::new()
            .with_statements("acme", vec![metrics(2017), metrics(2018)])
            .with_price("Acme", date, dec!(12.5));

        let series = provider.get_statement_series("ACME", 2018).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.latest().free_cash_flow(), dec!(15));
        assert_eq!(provider.get_price(" acme ", date).unwrap(), dec!(12.5));
    }

    #[test]
    fn test_unknown_ticker() {
        let provider = InMemoryDataProvider::new();
        let err = provider.get_statement_series("nope", 2018).unwrap_err();
        assert!(matches!(err, ProviderError::UnknownTicker(ref t) if t == "NOPE"));
    }
}
