use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::IntrinsicError;
use crate::types::{Money, Rate};
use crate::IntrinsicResult;

/// (1 + rate)^periods by repeated multiplication, so integer periods stay exact.
pub fn compound_factor(rate: Rate, periods: u32) -> IntrinsicResult<Decimal> {
    if rate <= dec!(-1) {
        return Err(IntrinsicError::InvalidInput {
            field: "rate".into(),
            reason: "Rate must be greater than -100%".into(),
        });
    }

    let one_plus_r = Decimal::ONE
        .checked_add(rate)
        .ok_or_else(|| IntrinsicError::InvalidInput {
            field: "rate".into(),
            reason: format!("Rate {rate} is out of range"),
        })?;
    let mut factor = Decimal::ONE;
    for _ in 0..periods {
        factor = factor
            .checked_mul(one_plus_r)
            .ok_or_else(|| IntrinsicError::InvalidInput {
                field: "rate".into(),
                reason: format!("Compounding overflowed after {periods} periods"),
            })?;
    }
    Ok(factor)
}

/// 1 / (1 + rate)^periods
pub fn discount_factor(rate: Rate, periods: u32) -> IntrinsicResult<Decimal> {
    let compound = compound_factor(rate, periods)?;
    Decimal::ONE
        .checked_div(compound)
        .ok_or_else(|| IntrinsicError::degenerate(format!("discount factor at period {periods}")))
}

/// Present value of a single amount received `periods` years from now.
pub fn present_value(amount: Money, rate: Rate, periods: u32) -> IntrinsicResult<Money> {
    let compound = compound_factor(rate, periods)?;
    amount
        .checked_div(compound)
        .ok_or_else(|| IntrinsicError::degenerate(format!("present value at period {periods}")))
}

/// Gordon growth perpetuity: cash_flow * (1 + g) / (r - g).
///
/// Callers must validate `discount_rate > growth_rate` first; a non-positive
/// spread is still rejected here rather than divided through.
pub fn gordon_growth_value(cash_flow: Money, discount_rate: Rate, growth_rate: Rate) -> IntrinsicResult<Money> {
    let spread = discount_rate
        .checked_sub(growth_rate)
        .ok_or_else(|| IntrinsicError::degenerate("terminal value: rate spread out of range"))?;
    if spread <= Decimal::ZERO {
        return Err(IntrinsicError::InvalidRateConfiguration {
            discount_rate,
            terminal_growth_rate: growth_rate,
        });
    }
    Decimal::ONE
        .checked_add(growth_rate)
        .and_then(|one_plus_g| cash_flow.checked_mul(one_plus_g))
        .and_then(|grown| grown.checked_div(spread))
        .ok_or_else(|| {
            IntrinsicError::degenerate(format!(
                "terminal value overflowed for spread {spread} between discount and growth rates"
            ))
        })
}
