use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::NaiveDate;
use tracing::debug;

use super::{normalize_ticker, DataProvider, ProviderError};
use crate::statements::StatementSeries;
use crate::types::Money;

/// Lookup counters, mostly for logging at the end of a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

#[derive(Debug, Default)]
struct CacheState {
    series: HashMap<(String, i32), StatementSeries>,
    prices: HashMap<(String, NaiveDate), Money>,
    stats: CacheStats,
}

/// Memoizes successful lookups of the wrapped provider. Failures are not
/// cached so a transient error can be retried.
#[derive(Debug)]
pub struct CachedProvider<P> {
    inner: P,
    state: Mutex<CacheState>,
}

impl<P: DataProvider> CachedProvider<P> {
    pub fn new(inner: P) -> Self {
        CachedProvider {
            inner,
            state: Mutex::new(CacheState::default()),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    pub fn stats(&self) -> CacheStats {
        self.lock().stats
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<P: DataProvider> DataProvider for CachedProvider<P> {
    fn get_statement_series(
        &self,
        ticker: &str,
        through_fiscal_year: i32,
    ) -> Result<StatementSeries, ProviderError> {
        let key = (normalize_ticker(ticker), through_fiscal_year);
        {
            let mut state = self.lock();
            if let Some(series) = state.series.get(&key).cloned() {
                state.stats.hits += 1;
                return Ok(series);
            }
            state.stats.misses += 1;
        }

        debug!(ticker = %key.0, through = through_fiscal_year, "statement cache miss");
        let series = self.inner.get_statement_series(ticker, through_fiscal_year)?;
        self.lock().series.insert(key, series.clone());
        Ok(series)
    }

    fn get_price(&self, ticker: &str, as_of: NaiveDate) -> Result<Money, ProviderError> {
        let key = (normalize_ticker(ticker), as_of);
        {
            let mut state = self.lock();
            if let Some(price) = state.prices.get(&key).copied() {
                state.stats.hits += 1;
                return Ok(price);
            }
            state.stats.misses += 1;
        }

        debug!(ticker = %key.0, %as_of, "price cache miss");
        let price = self.inner.get_price(ticker, as_of)?;
        self.lock().prices.insert(key, price);
        Ok(price)
    }
}
