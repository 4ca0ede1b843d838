use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%). Never as percentages.
pub type Rate = Decimal;

/// Share counts (may be fractional after split adjustments)
pub type Shares = Decimal;

/// Sweep definition for one axis of a sensitivity grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityVariable {
    pub name: String,
    pub min: Decimal,
    pub max: Decimal,
    pub step: Decimal,
}

impl SensitivityVariable {
    /// Symmetric sweep of `steps` increments either side of `base`.
    pub fn centered(name: &str, base: Decimal, step: Decimal, steps: u32) -> Option<Self> {
        let span = step.checked_mul(Decimal::from(steps))?;
        Some(SensitivityVariable {
            name: name.to_string(),
            min: base.checked_sub(span)?,
            max: base.checked_add(span)?,
            step,
        })
    }
}
