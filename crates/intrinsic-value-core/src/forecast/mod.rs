//! Cash flow forecasting strategies.
//!
//! Every strategy implements [`ForecastModel`]; the DCF calculator only ever
//! sees the resulting [`Forecast`]. Strategies are picked at runtime from
//! [`ForecastSettings`] rather than wired in at compile time.

pub mod jimmy;
pub mod revenue_margin;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::IntrinsicError;
use crate::statements::StatementSeries;
use crate::types::{Money, Rate};
use crate::IntrinsicResult;

pub use jimmy::JimmyModel;
pub use revenue_margin::RevenueMarginModel;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A single projected fiscal year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastYear {
    pub fiscal_year: i32,
    pub free_cash_flow: Money,
    /// Projected revenue, for strategies that forecast the top line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revenue: Option<Money>,
}

/// Forward free cash flow projection computed from a historical base year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub ticker: String,
    pub base_year: i32,
    /// Name of the strategy that produced the forecast
    pub method: String,
    /// Representative growth rate the strategy compounded forward
    pub growth_rate: Rate,
    pub years: Vec<ForecastYear>,
}

impl Forecast {
    /// Validates that years start right after `base_year` and have no gaps.
    pub fn new(
        ticker: impl Into<String>,
        base_year: i32,
        method: impl Into<String>,
        growth_rate: Rate,
        years: Vec<ForecastYear>,
    ) -> IntrinsicResult<Self> {
        if years.is_empty() {
            return Err(IntrinsicError::InvalidInput {
                field: "forecast".into(),
                reason: "Forecast must contain at least one year".into(),
            });
        }
        for (i, y) in years.iter().enumerate() {
            let expected = base_year + i as i32 + 1;
            if y.fiscal_year != expected {
                return Err(IntrinsicError::InvalidInput {
                    field: "forecast".into(),
                    reason: format!(
                        "Forecast year {} out of sequence (expected {expected})",
                        y.fiscal_year
                    ),
                });
            }
        }
        Ok(Forecast {
            ticker: ticker.into(),
            base_year,
            method: method.into(),
            growth_rate,
            years,
        })
    }

    pub fn len(&self) -> usize {
        self.years.len()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    pub fn cash_flows(&self) -> Vec<Money> {
        self.years.iter().map(|y| y.free_cash_flow).collect()
    }

    /// Final projected year; terminal value is built on this.
    pub fn terminal_year(&self) -> Option<&ForecastYear> {
        self.years.last()
    }
}

/// Forecasting capability. Implementations must be pure.
pub trait ForecastModel: Send + Sync {
    /// Label used in logs and reports.
    fn name(&self) -> &'static str;

    /// Minimum number of historical fiscal years needed.
    fn required_history(&self) -> usize;

    fn forecast(&self, series: &StatementSeries, horizon: u32) -> IntrinsicResult<Forecast>;
}

/// Inclusive bounds applied to each single-year growth rate before averaging.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrowthBand {
    pub floor: Rate,
    pub cap: Rate,
}

impl Default for GrowthBand {
    fn default() -> Self {
        GrowthBand {
            floor: dec!(-0.10),
            cap: dec!(0.20),
        }
    }
}

impl GrowthBand {
    pub fn new(floor: Rate, cap: Rate) -> IntrinsicResult<Self> {
        let band = GrowthBand { floor, cap };
        band.validate()?;
        Ok(band)
    }

    pub fn validate(&self) -> IntrinsicResult<()> {
        if self.floor > self.cap {
            return Err(IntrinsicError::InvalidInput {
                field: "growth_band".into(),
                reason: format!("Floor ({}) must not exceed cap ({})", self.floor, self.cap),
            });
        }
        if self.floor <= dec!(-1) {
            return Err(IntrinsicError::InvalidInput {
                field: "growth_floor".into(),
                reason: "Floor must be greater than -100%".into(),
            });
        }
        Ok(())
    }

    pub fn clamp(&self, rate: Rate) -> Rate {
        rate.max(self.floor).min(self.cap)
    }
}

/// Selectable forecasting strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastMethod {
    /// Free cash flow growth extrapolation
    #[default]
    Jimmy,
    /// Revenue growth times average free cash flow margin
    RevenueMargin,
}

/// Strategy choice and its tunable parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ForecastSettings {
    pub method: ForecastMethod,
    /// Trailing fiscal years used to derive growth
    pub history_years: usize,
    pub growth_floor: Rate,
    pub growth_cap: Rate,
}

impl Default for ForecastSettings {
    fn default() -> Self {
        let band = GrowthBand::default();
        ForecastSettings {
            method: ForecastMethod::Jimmy,
            history_years: jimmy::DEFAULT_HISTORY_YEARS,
            growth_floor: band.floor,
            growth_cap: band.cap,
        }
    }
}

impl ForecastSettings {
    pub fn growth_band(&self) -> IntrinsicResult<GrowthBand> {
        GrowthBand::new(self.growth_floor, self.growth_cap)
    }

    pub fn build_model(&self) -> IntrinsicResult<Box<dyn ForecastModel>> {
        let band = self.growth_band()?;
        let model: Box<dyn ForecastModel> = match self.method {
            ForecastMethod::Jimmy => Box::new(JimmyModel::new(self.history_years, band)?),
            ForecastMethod::RevenueMargin => {
                Box::new(RevenueMarginModel::new(self.history_years, band)?)
            }
        };
        Ok(model)
    }
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

pub(crate) fn check_preconditions(
    model: &dyn ForecastModel,
    series: &StatementSeries,
    horizon: u32,
) -> IntrinsicResult<()> {
    if horizon == 0 {
        return Err(IntrinsicError::InvalidInput {
            field: "horizon".into(),
            reason: "Forecast horizon must be at least one year".into(),
        });
    }
    let required = model.required_history();
    if series.len() < required {
        return Err(IntrinsicError::InsufficientHistory {
            ticker: series.ticker().to_string(),
            required,
            available: series.len(),
        });
    }
    Ok(())
}

pub(crate) fn validate_history_years(history_years: usize) -> IntrinsicResult<()> {
    if history_years < 2 {
        return Err(IntrinsicError::InvalidInput {
            field: "history_years".into(),
            reason: "At least two historical years are needed to measure growth".into(),
        });
    }
    Ok(())
}

/// Year-over-year growth `(curr - prev) / |prev|`.
///
/// A zero base, or a move across zero, has no meaningful growth rate.
pub(crate) fn year_over_year_growth(prev: Money, curr: Money, context: &str) -> IntrinsicResult<Rate> {
    if prev.is_zero() {
        return Err(IntrinsicError::degenerate(format!(
            "{context}: prior value is zero"
        )));
    }
    if !curr.is_zero() && prev.is_sign_negative() != curr.is_sign_negative() {
        return Err(IntrinsicError::degenerate(format!(
            "{context}: value changed sign ({prev} to {curr})"
        )));
    }
    curr.checked_sub(prev)
        .and_then(|change| change.checked_div(prev.abs()))
        .ok_or_else(|| {
            IntrinsicError::degenerate(format!("{context}: growth from {prev} to {curr} is out of range"))
        })
}

/// Clip each trailing YoY rate into `band`, then take the simple mean.
pub(crate) fn representative_growth(
    values: &[(i32, Money)],
    band: &GrowthBand,
    metric: &str,
) -> IntrinsicResult<Rate> {
    if values.len() < 2 {
        return Err(IntrinsicError::InvalidInput {
            field: metric.into(),
            reason: "Need at least two values to compute growth".into(),
        });
    }
    let mut total = Decimal::ZERO;
    for pair in values.windows(2) {
        let (_, prev) = pair[0];
        let (year, curr) = pair[1];
        let raw = year_over_year_growth(prev, curr, &format!("{metric} growth {year}"))?;
        total = total
            .checked_add(band.clamp(raw))
            .ok_or_else(|| IntrinsicError::degenerate(format!("{metric} growth total overflowed")))?;
    }
    total
        .checked_div(Decimal::from(values.len() - 1))
        .ok_or_else(|| IntrinsicError::degenerate(format!("{metric} growth average overflowed")))
}

/// `base * (1 + rate)^t` for t = 1..=horizon.
pub(crate) fn compound_path(base: Money, rate: Rate, horizon: u32) -> IntrinsicResult<Vec<Money>> {
    let overflow = |t: u32| {
        IntrinsicError::degenerate(format!("forecast year {t}: {base} compounded at {rate} overflowed"))
    };
    let one_plus = Decimal::ONE.checked_add(rate).ok_or_else(|| overflow(1))?;
    let mut value = base;
    (1..=horizon)
        .map(|t| {
            value = value.checked_mul(one_plus).ok_or_else(|| overflow(t))?;
            Ok(value)
        })
        .collect()
}
