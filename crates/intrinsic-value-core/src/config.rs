//! Per-run valuation configuration.
//!
//! Values resolve in three layers: built-in defaults, an optional YAML file,
//! then per-invocation overrides (CLI flags).

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::IntrinsicError;
use crate::forecast::{ForecastMethod, ForecastSettings};
use crate::types::{Rate, Shares};
use crate::valuation::sensitivity::SensitivitySettings;
use crate::valuation::ValuationParameters;
use crate::IntrinsicResult;

pub const DEFAULT_DISCOUNT_RATE: Rate = dec!(0.0975);
pub const DEFAULT_TERMINAL_GROWTH_RATE: Rate = dec!(0.0175);
pub const DEFAULT_FORECAST_HORIZON: u32 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValuationConfig {
    pub discount_rate: Rate,
    pub terminal_growth_rate: Rate,
    pub forecast_horizon: u32,
    pub forecast: ForecastSettings,
    /// Overrides the latest reported share count
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shares_outstanding: Option<Shares>,
    /// Market price date; defaults to the fiscal year end
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_as_of: Option<NaiveDate>,
    pub sensitivity: SensitivitySettings,
}

impl Default for ValuationConfig {
    fn default() -> Self {
        ValuationConfig {
            discount_rate: DEFAULT_DISCOUNT_RATE,
            terminal_growth_rate: DEFAULT_TERMINAL_GROWTH_RATE,
            forecast_horizon: DEFAULT_FORECAST_HORIZON,
            forecast: ForecastSettings::default(),
            shares_outstanding: None,
            price_as_of: None,
            sensitivity: SensitivitySettings::default(),
        }
    }
}

/// Per-invocation overrides; `None` keeps the underlying value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub discount_rate: Option<Rate>,
    pub terminal_growth_rate: Option<Rate>,
    pub forecast_horizon: Option<u32>,
    pub method: Option<ForecastMethod>,
    pub shares_outstanding: Option<Shares>,
    pub price_as_of: Option<NaiveDate>,
}

impl ValuationConfig {
    pub fn from_yaml_str(yaml: &str) -> IntrinsicResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> IntrinsicResult<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            IntrinsicError::Config(format!("Failed to read '{}': {e}", path.display()))
        })?;
        Self::from_yaml_str(&contents).map_err(|e| {
            IntrinsicError::Config(format!("Failed to parse '{}': {e}", path.display()))
        })
    }

    pub fn apply(mut self, overrides: &ConfigOverrides) -> Self {
        if let Some(r) = overrides.discount_rate {
            self.discount_rate = r;
        }
        if let Some(g) = overrides.terminal_growth_rate {
            self.terminal_growth_rate = g;
        }
        if let Some(h) = overrides.forecast_horizon {
            self.forecast_horizon = h;
        }
        if let Some(m) = overrides.method {
            self.forecast.method = m;
        }
        if overrides.shares_outstanding.is_some() {
            self.shares_outstanding = overrides.shares_outstanding;
        }
        if overrides.price_as_of.is_some() {
            self.price_as_of = overrides.price_as_of;
        }
        self
    }

    pub fn parameters(&self) -> ValuationParameters {
        ValuationParameters {
            discount_rate: self.discount_rate,
            terminal_growth_rate: self.terminal_growth_rate,
            horizon: self.forecast_horizon,
            shares_outstanding: self.shares_outstanding,
        }
    }

    /// Checks that apply to every ticker alike; failing here is batch-fatal.
    pub fn validate(&self) -> IntrinsicResult<()> {
        self.parameters().validate_rates()?;
        if self.forecast_horizon == 0 {
            return Err(IntrinsicError::Config(
                "forecast_horizon must be at least 1".into(),
            ));
        }
        if let Some(shares) = self.shares_outstanding {
            if shares <= rust_decimal::Decimal::ZERO {
                return Err(IntrinsicError::Config(format!(
                    "shares_outstanding must be positive, got {shares}"
                )));
            }
        }
        self.forecast
            .build_model()
            .map_err(|e| IntrinsicError::Config(format!("forecast settings: {e}")))?;
        self.sensitivity
            .validate()
            .map_err(|e| IntrinsicError::Config(format!("sensitivity settings: {e}")))?;
        Ok(())
    }
}
