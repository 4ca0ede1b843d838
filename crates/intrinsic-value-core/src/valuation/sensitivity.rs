//! Two-way sensitivity of the intrinsic price to discount rate and terminal growth.
//!
//! The forecast is held fixed; only the discounting inputs are swept. Cells
//! where the Gordon model does not converge (growth >= discount rate) are left
//! empty instead of being filled with a placeholder number.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::IntrinsicError;
use crate::forecast::Forecast;
use crate::types::{Money, Rate, SensitivityVariable};
use crate::IntrinsicResult;

use super::{calculate_dcf, ValuationParameters};

/// Largest `steps` accepted; a grid holds `(2 * steps + 1)^2` cells.
pub const MAX_SENSITIVITY_STEPS: u32 = 20;

/// Most points a single rate sweep may produce.
pub const MAX_SWEEP_POINTS: usize = 2 * MAX_SENSITIVITY_STEPS as usize + 2;

/// Sweep increments around the configured base rates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SensitivitySettings {
    pub discount_rate_step: Rate,
    pub terminal_growth_step: Rate,
    /// Increments on each side of the base case
    pub steps: u32,
}

impl Default for SensitivitySettings {
    fn default() -> Self {
        SensitivitySettings {
            discount_rate_step: dec!(0.005),
            terminal_growth_step: dec!(0.0025),
            steps: 2,
        }
    }
}

impl SensitivitySettings {
    pub fn validate(&self) -> IntrinsicResult<()> {
        if self.steps > MAX_SENSITIVITY_STEPS {
            return Err(IntrinsicError::InvalidInput {
                field: "sensitivity.steps".into(),
                reason: format!("At most {MAX_SENSITIVITY_STEPS} steps per side, got {}", self.steps),
            });
        }
        for (field, step) in [
            ("sensitivity.discount_rate_step", self.discount_rate_step),
            ("sensitivity.terminal_growth_step", self.terminal_growth_step),
        ] {
            if step <= Decimal::ZERO {
                return Err(IntrinsicError::InvalidInput {
                    field: field.into(),
                    reason: format!("Step must be positive, got {step}"),
                });
            }
        }
        Ok(())
    }

    fn sweep(&self, name: &str, base: Rate, step: Rate) -> IntrinsicResult<SensitivityVariable> {
        SensitivityVariable::centered(name, base, step, self.steps).ok_or_else(|| {
            IntrinsicError::InvalidInput {
                field: format!("sensitivity.{name}"),
                reason: format!("Sweep of {} steps of {step} around {base} is out of range", self.steps),
            }
        })
    }
}

/// Intrinsic price for every (discount rate, terminal growth) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityGrid {
    pub discount_rates: Vec<Rate>,
    pub terminal_growth_rates: Vec<Rate>,
    /// matrix[i][j] = price at discount_rates[i], terminal_growth_rates[j]
    pub matrix: Vec<Vec<Option<Money>>>,
    /// Position of the configured rates in the matrix (row, col)
    pub base_case_position: (usize, usize),
}

impl SensitivityGrid {
    pub fn base_case_value(&self) -> Option<Money> {
        let (row, col) = self.base_case_position;
        self.matrix.get(row).and_then(|r| r.get(col)).copied().flatten()
    }
}

/// Rates `min, min + step, ...` up to `max`; `max` closes the sweep when the step overshoots it.
pub fn rate_sweep(var: &SensitivityVariable) -> IntrinsicResult<Vec<Rate>> {
    let invalid = |reason: String| IntrinsicError::InvalidInput {
        field: format!("sweep:{}", var.name),
        reason,
    };
    if var.step <= Decimal::ZERO {
        return Err(invalid(format!("Step must be positive, got {}", var.step)));
    }
    if var.min > var.max {
        return Err(invalid(format!("Lower bound {} exceeds upper bound {}", var.min, var.max)));
    }

    let mut rates = vec![var.min];
    let mut rate = var.min;
    loop {
        rate = match rate.checked_add(var.step) {
            Some(next) if next <= var.max => next,
            _ => break,
        };
        rates.push(rate);
        if rates.len() > MAX_SWEEP_POINTS {
            return Err(invalid(format!("More than {MAX_SWEEP_POINTS} points")));
        }
    }
    if rate < var.max {
        rates.push(var.max);
    }
    Ok(rates)
}

/// Index of the swept rate nearest `base`.
fn base_index(rates: &[Rate], base: Rate) -> usize {
    rates
        .iter()
        .position(|r| *r == base)
        .or_else(|| {
            rates
                .iter()
                .enumerate()
                .filter_map(|(i, r)| r.checked_sub(base).map(|d| (i, d.abs())))
                .min_by_key(|(_, d)| *d)
                .map(|(i, _)| i)
        })
        .unwrap_or(0)
}

/// Evaluate the price grid centred on `params`.
pub fn sensitivity_grid(
    forecast: &Forecast,
    params: &ValuationParameters,
    settings: &SensitivitySettings,
) -> IntrinsicResult<SensitivityGrid> {
    settings.validate()?;
    let discount = settings.sweep("discount_rate", params.discount_rate, settings.discount_rate_step)?;
    let growth = settings.sweep(
        "terminal_growth_rate",
        params.terminal_growth_rate,
        settings.terminal_growth_step,
    )?;
    evaluate_grid(forecast, params, &discount, &growth)
}

/// Evaluate the price grid over explicit sweeps.
pub fn evaluate_grid(
    forecast: &Forecast,
    params: &ValuationParameters,
    discount: &SensitivityVariable,
    growth: &SensitivityVariable,
) -> IntrinsicResult<SensitivityGrid> {
    let discount_rates = rate_sweep(discount)?;
    let terminal_growth_rates = rate_sweep(growth)?;

    let mut matrix = Vec::with_capacity(discount_rates.len());
    for r in &discount_rates {
        let mut row = Vec::with_capacity(terminal_growth_rates.len());
        for g in &terminal_growth_rates {
            let cell_params = ValuationParameters {
                discount_rate: *r,
                terminal_growth_rate: *g,
                ..params.clone()
            };
            match calculate_dcf(forecast, &cell_params) {
                Ok(out) => row.push(Some(out.intrinsic_price)),
                Err(IntrinsicError::InvalidRateConfiguration { .. }) => row.push(None),
                Err(e) => return Err(e),
            }
        }
        matrix.push(row);
    }

    let base_case_position = (
        base_index(&discount_rates, params.discount_rate),
        base_index(&terminal_growth_rates, params.terminal_growth_rate),
    );

    Ok(SensitivityGrid {
        discount_rates,
        terminal_growth_rates,
        matrix,
        base_case_position,
    })
}
