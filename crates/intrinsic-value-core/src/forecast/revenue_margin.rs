//! Revenue-driven forecast: project the top line, then apply the average
//! historical free cash flow margin.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{
    check_preconditions, compound_path, representative_growth, validate_history_years, Forecast,
    ForecastModel, ForecastYear, GrowthBand,
};
use crate::error::IntrinsicError;
use crate::statements::StatementSeries;
use crate::types::Rate;
use crate::IntrinsicResult;

pub const METHOD_NAME: &str = "Revenue Margin DCF";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueMarginModel {
    history_years: usize,
    growth_band: GrowthBand,
}

impl Default for RevenueMarginModel {
    fn default() -> Self {
        RevenueMarginModel {
            history_years: super::jimmy::DEFAULT_HISTORY_YEARS,
            growth_band: GrowthBand::default(),
        }
    }
}

impl RevenueMarginModel {
    pub fn new(history_years: usize, growth_band: GrowthBand) -> IntrinsicResult<Self> {
        validate_history_years(history_years)?;
        growth_band.validate()?;
        Ok(RevenueMarginModel {
            history_years,
            growth_band,
        })
    }

    fn average_margin(&self, series: &StatementSeries) -> IntrinsicResult<Rate> {
        let window = series.trailing(self.history_years);
        let mut total = Decimal::ZERO;
        for year in window {
            if year.revenue.is_zero() {
                return Err(IntrinsicError::degenerate(format!(
                    "free cash flow margin {}: revenue is zero",
                    year.fiscal_year
                )));
            }
            total = year
                .free_cash_flow()
                .checked_div(year.revenue)
                .and_then(|margin| total.checked_add(margin))
                .ok_or_else(|| {
                    IntrinsicError::degenerate(format!(
                        "free cash flow margin {}: out of range for revenue {}",
                        year.fiscal_year, year.revenue
                    ))
                })?;
        }
        total
            .checked_div(Decimal::from(window.len()))
            .ok_or_else(|| IntrinsicError::degenerate("free cash flow margin average overflowed"))
    }
}

impl ForecastModel for RevenueMarginModel {
    fn name(&self) -> &'static str {
        METHOD_NAME
    }

    fn required_history(&self) -> usize {
        self.history_years
    }

    fn forecast(&self, series: &StatementSeries, horizon: u32) -> IntrinsicResult<Forecast> {
        check_preconditions(self, series, horizon)?;

        let window: Vec<_> = series
            .trailing(self.history_years)
            .iter()
            .map(|y| (y.fiscal_year, y.revenue))
            .collect();
        let growth = representative_growth(&window, &self.growth_band, "revenue")?;
        let margin = self.average_margin(series)?;

        let base_year = series.last_year();
        let years = compound_path(series.latest().revenue, growth, horizon)?
            .into_iter()
            .enumerate()
            .map(|(i, revenue)| {
                let fiscal_year = base_year + i as i32 + 1;
                let free_cash_flow = revenue.checked_mul(margin).ok_or_else(|| {
                    IntrinsicError::degenerate(format!(
                        "forecast year {fiscal_year}: revenue {revenue} at margin {margin} overflowed"
                    ))
                })?;
                Ok(ForecastYear {
                    fiscal_year,
                    free_cash_flow,
                    revenue: Some(revenue),
                })
            })
            .collect::<IntrinsicResult<Vec<_>>>()?;

        Forecast::new(series.ticker(), base_year, METHOD_NAME, growth, years)
    }
}
