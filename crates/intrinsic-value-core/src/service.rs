//! Orchestration: statements -> forecast -> DCF -> result with market price.

use std::iter::FusedIterator;

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::config::ValuationConfig;
use crate::error::IntrinsicError;
use crate::forecast::ForecastModel;
use crate::provider::{normalize_ticker, DataProvider, ProviderError};
use crate::valuation::sensitivity::{sensitivity_grid, SensitivityGrid};
use crate::valuation::{calculate_dcf, ValuationParameters, ValuationResult};
use crate::IntrinsicResult;

/// December 31 of `fiscal_year`, the default market price date.
pub fn fiscal_year_end(fiscal_year: i32) -> IntrinsicResult<NaiveDate> {
    NaiveDate::from_ymd_opt(fiscal_year, 12, 31).ok_or_else(|| IntrinsicError::InvalidInput {
        field: "fiscal_year".into(),
        reason: format!("{fiscal_year} is not a representable year"),
    })
}

fn data_unavailable(ticker: &str, fiscal_year: i32, err: ProviderError) -> IntrinsicError {
    IntrinsicError::DataUnavailable {
        ticker: ticker.to_string(),
        fiscal_year,
        reason: err.to_string(),
    }
}

/// Value one ticker with an explicit model, parameters and price date.
///
/// Provider failures become `DataUnavailable`; forecasting and discounting
/// errors propagate unchanged.
pub fn valuate<P>(
    ticker: &str,
    fiscal_year: i32,
    params: &ValuationParameters,
    model: &dyn ForecastModel,
    provider: &P,
    price_as_of: NaiveDate,
) -> IntrinsicResult<ValuationResult>
where
    P: DataProvider + ?Sized,
{
    let ticker = normalize_ticker(ticker);
    params.validate_rates()?;

    let series = provider
        .get_statement_series(&ticker, fiscal_year)
        .map_err(|e| data_unavailable(&ticker, fiscal_year, e))?;
    if series.last_year() != fiscal_year {
        return Err(IntrinsicError::DataUnavailable {
            ticker,
            fiscal_year,
            reason: format!(
                "statements end at {} instead of {fiscal_year}",
                series.last_year()
            ),
        });
    }
    debug!(
        ticker = %ticker,
        first_year = series.first_year(),
        last_year = series.last_year(),
        "loaded statement series"
    );

    let forecast = model.forecast(&series, params.horizon)?;
    debug!(ticker = %ticker, method = model.name(), growth = %forecast.growth_rate, "forecast ready");

    let shares = params
        .shares_outstanding
        .unwrap_or(series.latest().shares_outstanding);
    let breakdown = calculate_dcf(&forecast, &params.with_shares_outstanding(shares))?;
    for warning in &breakdown.warnings {
        warn!(ticker = %ticker, "{warning}");
    }

    let market_price = provider
        .get_price(&ticker, price_as_of)
        .map_err(|e| data_unavailable(&ticker, fiscal_year, e))?;

    Ok(ValuationResult::new(
        forecast,
        breakdown,
        Some((price_as_of, market_price)),
    ))
}

/// Holds the provider and run configuration for a batch of valuations.
#[derive(Debug)]
pub struct ValuationService<P> {
    provider: P,
    config: ValuationConfig,
}

impl<P: DataProvider> ValuationService<P> {
    /// Fails with a batch-fatal error if the configuration is unusable.
    pub fn new(provider: P, config: ValuationConfig) -> IntrinsicResult<Self> {
        config.validate()?;
        Ok(ValuationService { provider, config })
    }

    pub fn config(&self) -> &ValuationConfig {
        &self.config
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn valuate(&self, ticker: &str, fiscal_year: i32) -> IntrinsicResult<ValuationResult> {
        let model = self.config.forecast.build_model()?;
        let as_of = match self.config.price_as_of {
            Some(date) => date,
            None => fiscal_year_end(fiscal_year)?,
        };
        valuate(
            ticker,
            fiscal_year,
            &self.config.parameters(),
            model.as_ref(),
            &self.provider,
            as_of,
        )
    }

    /// Price grid around the configured rates, reusing the result's forecast.
    pub fn sensitivity(&self, result: &ValuationResult) -> IntrinsicResult<SensitivityGrid> {
        let params = self
            .config
            .parameters()
            .with_shares_outstanding(result.breakdown.shares_outstanding);
        sensitivity_grid(&result.forecast, &params, &self.config.sensitivity)
    }

    /// Lazily value each ticker in turn.
    pub fn valuate_batch<I>(&self, fiscal_year: i32, tickers: I) -> BatchValuation<'_, P, I::IntoIter>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        BatchValuation {
            service: self,
            fiscal_year,
            tickers: tickers.into_iter(),
            halted: false,
        }
    }
}

/// Result of one attempt within a batch.
#[derive(Debug)]
pub struct TickerOutcome {
    pub ticker: String,
    pub fiscal_year: i32,
    pub result: IntrinsicResult<ValuationResult>,
}

impl TickerOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Iterator over per-ticker outcomes. Failures are isolated per ticker,
/// except batch-fatal errors, after which the iterator ends.
pub struct BatchValuation<'a, P, I> {
    service: &'a ValuationService<P>,
    fiscal_year: i32,
    tickers: I,
    halted: bool,
}

impl<P, I> Iterator for BatchValuation<'_, P, I>
where
    P: DataProvider,
    I: Iterator,
    I::Item: AsRef<str>,
{
    type Item = TickerOutcome;

    fn next(&mut self) -> Option<Self::Item> {
        if self.halted {
            return None;
        }
        let ticker = normalize_ticker(self.tickers.next()?.as_ref());
        let result = self.service.valuate(&ticker, self.fiscal_year);
        if let Err(e) = &result {
            if e.is_batch_fatal() {
                self.halted = true;
            }
        }
        Some(TickerOutcome {
            ticker,
            fiscal_year: self.fiscal_year,
            result,
        })
    }
}

impl<P, I> FusedIterator for BatchValuation<'_, P, I>
where
    P: DataProvider,
    I: Iterator,
    I::Item: AsRef<str>,
{
}
