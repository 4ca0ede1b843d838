//! "Jimmy" free cash flow extrapolation.
//!
//! 1. Take the trailing `history_years` free cash flows.
//! 2. Compute each year-over-year growth rate, rejecting zero bases and sign flips.
//! 3. Clip every rate into the [`GrowthBand`] and average them.
//! 4. Compound the last historical free cash flow forward at that average.

use serde::{Deserialize, Serialize};

use super::{
    check_preconditions, compound_path, representative_growth, validate_history_years, Forecast,
    ForecastModel, ForecastYear, GrowthBand,
};
use crate::statements::StatementSeries;
use crate::IntrinsicResult;

pub const METHOD_NAME: &str = "Jimmy DCF";

/// Years of history the method was designed around.
pub const DEFAULT_HISTORY_YEARS: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JimmyModel {
    history_years: usize,
    growth_band: GrowthBand,
}

impl Default for JimmyModel {
    fn default() -> Self {
        JimmyModel {
            history_years: DEFAULT_HISTORY_YEARS,
            growth_band: GrowthBand::default(),
        }
    }
}

impl JimmyModel {
    pub fn new(history_years: usize, growth_band: GrowthBand) -> IntrinsicResult<Self> {
        validate_history_years(history_years)?;
        growth_band.validate()?;
        Ok(JimmyModel {
            history_years,
            growth_band,
        })
    }

    pub fn growth_band(&self) -> GrowthBand {
        self.growth_band
    }
}

impl ForecastModel for JimmyModel {
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
            .map(|y| (y.fiscal_year, y.free_cash_flow()))
            .collect();
        let growth = representative_growth(&window, &self.growth_band, "free cash flow")?;

        let base_year = series.last_year();
        let last_fcf = series.latest().free_cash_flow();
        let years = compound_path(last_fcf, growth, horizon)?
            .into_iter()
            .enumerate()
            .map(|(i, free_cash_flow)| ForecastYear {
                fiscal_year: base_year + i as i32 + 1,
                free_cash_flow,
                revenue: None,
            })
            .collect();

        Forecast::new(series.ticker(), base_year, METHOD_NAME, growth, years)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IntrinsicError;
    use crate::statements::FiscalYearMetrics;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn series_from_fcf(first_year: i32, fcf: &[Decimal]) -> StatementSeries {
        let years = fcf
            .iter()
            .enumerate()
            .map(|(i, v)| FiscalYearMetrics {
                fiscal_year: first_year + i as i32,
                revenue: dec!(1000),
                operating_cash_flow: *v,
                capital_expenditure: Decimal::ZERO,
                free_cash_flow: Some(*v),
                shares_outstanding: dec!(10),
            })
            .collect();
        StatementSeries::new("ACME", years).unwrap()
    }

    #[test]
    fn test_jimmy_constant_ten_percent_growth() {
        let series = series_from_fcf(2015, &[dec!(100), dec!(110), dec!(121), dec!(133.1)]);
        let forecast = JimmyModel::default().forecast(&series, 4).unwrap();

        assert_eq!(forecast.base_year, 2018);
        assert_eq!(forecast.growth_rate, dec!(0.1));
        assert_eq!(
            forecast.cash_flows(),
            vec![dec!(146.41), dec!(161.051), dec!(177.1561), dec!(194.87171)]
        );
        let years: Vec<i32> = forecast.years.iter().map(|y| y.fiscal_year).collect();
        assert_eq!(years, vec![2019, 2020, 2021, 2022]);
    }

    #[test]
    fn test_jimmy_uses_only_trailing_window() {
        // Early collapse is outside the 4-year window and must not matter.
        let series = series_from_fcf(
            2012,
            &[dec!(500), dec!(10), dec!(100), dec!(110), dec!(121), dec!(133.1)],
        );
        let forecast = JimmyModel::default().forecast(&series, 2).unwrap();
        assert_eq!(forecast.growth_rate, dec!(0.1));
    }

    #[test]
    fn test_jimmy_insufficient_history() {
        let series = series_from_fcf(2016, &[dec!(100), dec!(110), dec!(121)]);
        let err = JimmyModel::default().forecast(&series, 4).unwrap_err();
        match err {
            IntrinsicError::InsufficientHistory {
                required,
                available,
                ..
            } => {
                assert_eq!(required, 4);
                assert_eq!(available, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_jimmy_zero_horizon_rejected() {
        let series = series_from_fcf(2015, &[dec!(100), dec!(110), dec!(121), dec!(133.1)]);
        assert!(JimmyModel::default().forecast(&series, 0).is_err());
    }

    #[test]
    fn test_jimmy_zero_base_in_window() {
        let series = series_from_fcf(2015, &[dec!(100), dec!(0), dec!(121), dec!(133.1)]);
        let err = JimmyModel::default().forecast(&series, 4).unwrap_err();
        assert!(matches!(err, IntrinsicError::DegenerateBaseValue { .. }));
    }

    #[test]
    fn test_jimmy_sign_flip_in_window() {
        let series = series_from_fcf(2015, &[dec!(100), dec!(-40), dec!(121), dec!(133.1)]);
        let err = JimmyModel::default().forecast(&series, 4).unwrap_err();
        assert!(matches!(err, IntrinsicError::DegenerateBaseValue { .. }));
    }

    #[test]
    fn test_jimmy_tiny_prior_cash_flow_is_degenerate() {
        let series = series_from_fcf(
            2015,
            &[
                dec!(0.0000000000000000001),
                dec!(10000000000),
                dec!(10000000001),
                dec!(10000000002),
            ],
        );
        let err = JimmyModel::default().forecast(&series, 4).unwrap_err();
        assert!(matches!(err, IntrinsicError::DegenerateBaseValue { .. }));
    }

    #[test]
    fn test_jimmy_latest_zero_gives_determinate_zero_forecast() {
        let series = series_from_fcf(2015, &[dec!(100), dec!(90), dec!(80), dec!(0)]);
        let forecast = JimmyModel::default().forecast(&series, 3).unwrap();
        assert!(forecast.cash_flows().iter().all(|cf| cf.is_zero()));
    }

    #[test]
    fn test_jimmy_negative_history_forecast_stays_negative() {
        let series = series_from_fcf(2015, &[dec!(-100), dec!(-95), dec!(-90), dec!(-85)]);
        let forecast = JimmyModel::default().forecast(&series, 3).unwrap();
        assert!(forecast.cash_flows().iter().all(|cf| *cf < Decimal::ZERO));
    }

    #[test]
    fn test_jimmy_band_caps_runaway_growth() {
        let series = series_from_fcf(2015, &[dec!(10), dec!(40), dec!(160), dec!(640)]);
        let model = JimmyModel::new(4, GrowthBand::new(dec!(-0.10), dec!(0.25)).unwrap()).unwrap();
        let forecast = model.forecast(&series, 1).unwrap();
        assert_eq!(forecast.growth_rate, dec!(0.25));
        assert_eq!(forecast.cash_flows(), vec![dec!(800)]);
    }

    #[test]
    fn test_jimmy_is_deterministic() {
        let series = series_from_fcf(2015, &[dec!(87.3), dec!(91.9), dec!(104.2), dec!(99.8)]);
        let model = JimmyModel::default();
        let a = model.forecast(&series, 5).unwrap();
        let b = model.forecast(&series, 5).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_jimmy_rejects_single_year_history_setting() {
        assert!(JimmyModel::new(1, GrowthBand::default()).is_err());
    }
}
