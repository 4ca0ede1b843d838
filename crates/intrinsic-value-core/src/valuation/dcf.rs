use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::IntrinsicError;
use crate::forecast::Forecast;
use crate::time_value::{discount_factor, gordon_growth_value, present_value};
use crate::types::{Money, Rate, Shares};
use crate::IntrinsicResult;

use super::ValuationParameters;

/// Terminal value share of EV above which a warning is attached.
const TERMINAL_CONCENTRATION_WARNING: Decimal = dec!(0.75);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One explicitly forecast year after discounting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscountedCashFlow {
    pub fiscal_year: i32,
    /// Position within the forecast (1-based)
    pub period: u32,
    pub cash_flow: Money,
    pub discount_factor: Rate,
    pub present_value: Money,
}

/// Full derivation of an intrinsic price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DcfOutput {
    pub discounted_cash_flows: Vec<DiscountedCashFlow>,
    /// Sum of present values of the explicit forecast years
    pub sum_of_present_values: Money,
    /// Gordon growth terminal value at the end of the horizon
    pub terminal_value: Money,
    /// Terminal value discounted to today
    pub pv_of_terminal: Money,
    /// Sum of present values plus discounted terminal value
    pub enterprise_value: Money,
    pub shares_outstanding: Shares,
    pub intrinsic_price: Money,
    /// Discounted terminal value as a fraction of enterprise value
    pub terminal_value_pct: Rate,
    pub discount_rate: Rate,
    pub terminal_growth_rate: Rate,
    pub warnings: Vec<String>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Discount a forecast and its Gordon terminal value into a per-share price.
pub fn calculate_dcf(forecast: &Forecast, params: &ValuationParameters) -> IntrinsicResult<DcfOutput> {
    let mut warnings: Vec<String> = Vec::new();

    let shares = validate_dcf_input(forecast, params)?;
    let r = params.discount_rate;
    let g = params.terminal_growth_rate;

    // --- Explicit forecast years ---
    let discounted_cash_flows = discount_forecast(forecast, r)?;
    let sum_of_present_values = discounted_cash_flows
        .iter()
        .try_fold(Decimal::ZERO, |acc, d| acc.checked_add(d.present_value))
        .ok_or_else(|| IntrinsicError::degenerate("sum of present values overflowed"))?;

    // --- Terminal value ---
    let terminal = forecast.terminal_year().ok_or_else(|| IntrinsicError::InvalidInput {
        field: "forecast".into(),
        reason: "Forecast has no years".into(),
    })?;
    if terminal.free_cash_flow.is_zero() {
        return Err(IntrinsicError::degenerate(format!(
            "terminal value: final forecast cash flow ({}) is zero",
            terminal.fiscal_year
        )));
    }
    let terminal_value = gordon_growth_value(terminal.free_cash_flow, r, g)?;

    // --- Discount TV to present ---
    let pv_of_terminal = terminal_value
        .checked_mul(discount_factor(r, params.horizon)?)
        .ok_or_else(|| IntrinsicError::degenerate("present value of terminal value overflowed"))?;

    let enterprise_value = sum_of_present_values
        .checked_add(pv_of_terminal)
        .ok_or_else(|| IntrinsicError::degenerate("enterprise value overflowed"))?;
    let intrinsic_price = enterprise_value
        .checked_div(shares)
        .ok_or_else(|| IntrinsicError::InvalidInput {
            field: "shares_outstanding".into(),
            reason: format!("Share count {shares} is too small to price enterprise value {enterprise_value}"),
        })?;

    let terminal_value_pct = if enterprise_value.is_zero() {
        Decimal::ZERO
    } else {
        pv_of_terminal
            .checked_div(enterprise_value)
            .ok_or_else(|| IntrinsicError::degenerate("terminal value share of enterprise value overflowed"))?
    };
    if terminal_value_pct > TERMINAL_CONCENTRATION_WARNING {
        let pct = terminal_value_pct
            .checked_mul(dec!(100))
            .map(|p| format!("{:.1}%", p))
            .unwrap_or_else(|| format!("{}x", terminal_value_pct));
        warnings.push(format!(
            "Terminal value represents {} of enterprise value; the price is dominated by the perpetuity assumption",
            pct
        ));
    }
    if intrinsic_price < Decimal::ZERO {
        warnings.push("Intrinsic price is negative: forecast cash flows are negative".into());
    }

    Ok(DcfOutput {
        discounted_cash_flows,
        sum_of_present_values,
        terminal_value,
        pv_of_terminal,
        enterprise_value,
        shares_outstanding: shares,
        intrinsic_price,
        terminal_value_pct,
        discount_rate: r,
        terminal_growth_rate: g,
        warnings,
    })
}

/// Scalar shortcut over [`calculate_dcf`].
pub fn intrinsic_price(forecast: &Forecast, params: &ValuationParameters) -> IntrinsicResult<Money> {
    Ok(calculate_dcf(forecast, params)?.intrinsic_price)
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Returns the resolved share count on success.
fn validate_dcf_input(forecast: &Forecast, params: &ValuationParameters) -> IntrinsicResult<Shares> {
    params.validate_rates()?;

    if forecast.len() != params.horizon as usize {
        return Err(IntrinsicError::InvalidInput {
            field: "horizon".into(),
            reason: format!(
                "Forecast has {} years but the horizon is {}",
                forecast.len(),
                params.horizon
            ),
        });
    }

    match params.shares_outstanding {
        Some(shares) if shares > Decimal::ZERO => Ok(shares),
        Some(shares) => Err(IntrinsicError::InvalidInput {
            field: "shares_outstanding".into(),
            reason: format!("Shares outstanding must be positive, got {shares}"),
        }),
        None => Err(IntrinsicError::InvalidInput {
            field: "shares_outstanding".into(),
            reason: "Share count must be resolved before discounting".into(),
        }),
    }
}

fn discount_forecast(forecast: &Forecast, r: Rate) -> IntrinsicResult<Vec<DiscountedCashFlow>> {
    forecast
        .years
        .iter()
        .enumerate()
        .map(|(i, year)| {
            let period = i as u32 + 1;
            let factor = discount_factor(r, period)?;
            Ok(DiscountedCashFlow {
                fiscal_year: year.fiscal_year,
                period,
                cash_flow: year.free_cash_flow,
                discount_factor: factor,
                present_value: present_value(year.free_cash_flow, r, period)?,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
