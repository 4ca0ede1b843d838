pub mod dcf;
pub mod sensitivity;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::IntrinsicError;
use crate::forecast::Forecast;
use crate::types::{Money, Rate, Shares};
use crate::IntrinsicResult;

pub use dcf::{calculate_dcf, intrinsic_price, DcfOutput, DiscountedCashFlow};

/// Per-run discounting inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationParameters {
    /// Annual discount rate (e.g. 0.0975)
    pub discount_rate: Rate,
    /// Perpetual growth beyond the horizon (e.g. 0.0175)
    pub terminal_growth_rate: Rate,
    /// Number of explicitly forecast years
    pub horizon: u32,
    /// Share count override; `None` means the latest reported count is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shares_outstanding: Option<Shares>,
}

impl ValuationParameters {
    /// Copy with the share count filled in.
    pub fn with_shares_outstanding(&self, shares: Shares) -> Self {
        ValuationParameters {
            shares_outstanding: Some(shares),
            ..self.clone()
        }
    }

    /// Gordon growth only converges when r > g.
    pub fn validate_rates(&self) -> IntrinsicResult<()> {
        if self.discount_rate <= self.terminal_growth_rate {
            return Err(IntrinsicError::InvalidRateConfiguration {
                discount_rate: self.discount_rate,
                terminal_growth_rate: self.terminal_growth_rate,
            });
        }
        if self.discount_rate <= dec!(-1) {
            return Err(IntrinsicError::InvalidInput {
                field: "discount_rate".into(),
                reason: "Discount rate must be greater than -100%".into(),
            });
        }
        Ok(())
    }
}

/// Outcome of valuing one ticker for one fiscal year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationResult {
    pub ticker: String,
    pub fiscal_year: i32,
    /// Forecasting strategy name
    pub method: String,
    pub forecast: Forecast,
    pub breakdown: DcfOutput,
    pub intrinsic_price: Money,
    /// Observed price used for comparison, if one was supplied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_price: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_date: Option<NaiveDate>,
}

impl ValuationResult {
    pub fn new(
        forecast: Forecast,
        breakdown: DcfOutput,
        market_price: Option<(NaiveDate, Money)>,
    ) -> Self {
        ValuationResult {
            ticker: forecast.ticker.clone(),
            fiscal_year: forecast.base_year,
            method: forecast.method.clone(),
            intrinsic_price: breakdown.intrinsic_price,
            market_price: market_price.map(|(_, p)| p),
            price_date: market_price.map(|(d, _)| d),
            forecast,
            breakdown,
        }
    }

    /// Intrinsic / market - 1. `None` without a usable market price.
    pub fn upside(&self) -> Option<Rate> {
        self.market_price
            .filter(|p| !p.is_zero())
            .and_then(|p| self.intrinsic_price.checked_div(p))
            .and_then(|ratio| ratio.checked_sub(Decimal::ONE))
    }

    pub fn warnings(&self) -> &[String] {
        &self.breakdown.warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::ForecastYear;

    fn sample_result(market: Option<Money>) -> ValuationResult {
        let forecast = Forecast::new(
            "ACME",
            2018,
            "Jimmy DCF",
            dec!(0.05),
            vec![ForecastYear {
                fiscal_year: 2019,
                free_cash_flow: dec!(105),
                revenue: None,
            }],
        )
        .unwrap();
        let params = ValuationParameters {
            discount_rate: dec!(0.10),
            terminal_growth_rate: dec!(0.02),
            horizon: 1,
            shares_outstanding: Some(dec!(10)),
        };
        let breakdown = calculate_dcf(&forecast, &params).unwrap();
        let date = NaiveDate::from_ymd_opt(2018, 12, 31).unwrap();
        ValuationResult::new(forecast, breakdown, market.map(|p| (date, p)))
    }

    #[test]
    fn test_result_carries_identity_from_forecast() {
        let r = sample_result(None);
        assert_eq!(r.ticker, "ACME");
        assert_eq!(r.fiscal_year, 2018);
        assert_eq!(r.method, "Jimmy DCF");
        assert_eq!(r.intrinsic_price, r.breakdown.intrinsic_price);
        assert!(r.price_date.is_none());
    }

    #[test]
    fn test_upside_against_market_price() {
        let r = sample_result(Some(dec!(100)));
        let expected = r.intrinsic_price / dec!(100) - Decimal::ONE;
        assert_eq!(r.upside(), Some(expected));
        assert!(sample_result(None).upside().is_none());
        assert!(sample_result(Some(Decimal::ZERO)).upside().is_none());
    }

    #[test]
    fn test_upside_unrepresentable_for_tiny_market_price() {
        let r = sample_result(Some(dec!(0.0000000000000000000000000001)));
        assert!(r.upside().is_none());
    }

    #[test]
    fn test_validate_rates() {
        let mut p = ValuationParameters {
            discount_rate: dec!(0.0975),
            terminal_growth_rate: dec!(0.0175),
            horizon: 5,
            shares_outstanding: None,
        };
        assert!(p.validate_rates().is_ok());
        p.terminal_growth_rate = dec!(0.0975);
        assert!(matches!(
            p.validate_rates().unwrap_err(),
            IntrinsicError::InvalidRateConfiguration { .. }
        ));
    }

    #[test]
    fn test_with_shares_outstanding_leaves_original_untouched() {
        let p = ValuationParameters {
            discount_rate: dec!(0.09),
            terminal_growth_rate: dec!(0.02),
            horizon: 5,
            shares_outstanding: None,
        };
        let resolved = p.with_shares_outstanding(dec!(1000));
        assert_eq!(resolved.shares_outstanding, Some(dec!(1000)));
        assert!(p.shares_outstanding.is_none());
    }
}
