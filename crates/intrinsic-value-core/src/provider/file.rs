use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::debug;

use super::{normalize_ticker, DataProvider, ProviderError, TickerDocument};
use crate::statements::StatementSeries;
use crate::types::Money;

/// Reads `<data_dir>/<TICKER>.json` documents on every call.
///
/// Wrap in [`super::CachedProvider`] to avoid re-reading during a run.
#[derive(Debug, Clone)]
pub struct FileDataProvider {
    data_dir: PathBuf,
}

impl FileDataProvider {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        FileDataProvider {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn document_path(&self, ticker: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", normalize_ticker(ticker)))
    }

    pub fn load_document(&self, ticker: &str) -> Result<TickerDocument, ProviderError> {
        let ticker = normalize_ticker(ticker);
        let path = self.document_path(&ticker);
        debug!(ticker = %ticker, path = %path.display(), "reading ticker document");

        let contents = fs::read_to_string(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ProviderError::UnknownTicker(ticker.clone()),
            _ => ProviderError::Io {
                path: path.clone(),
                source: e,
            },
        })?;

        let mut document: TickerDocument =
            serde_json::from_str(&contents).map_err(|e| ProviderError::MalformedData {
                ticker: ticker.clone(),
                reason: format!("{}: {e}", path.display()),
            })?;

        if document.ticker.trim().is_empty() {
            document.ticker = ticker;
        } else if normalize_ticker(&document.ticker) != ticker {
            return Err(ProviderError::MalformedData {
                reason: format!(
                    "{} declares ticker '{}'",
                    path.display(),
                    document.ticker
                ),
                ticker,
            });
        } else {
            document.ticker = ticker;
        }
        Ok(document)
    }
}

impl DataProvider for FileDataProvider {
    fn get_statement_series(
        &self,
        ticker: &str,
        through_fiscal_year: i32,
    ) -> Result<StatementSeries, ProviderError> {
        self.load_document(ticker)?
            .statement_series(through_fiscal_year)
    }

    fn get_price(&self, ticker: &str, as_of: NaiveDate) -> Result<Money, ProviderError> {
        self.load_document(ticker)?.price(as_of)
    }
}
