pub mod config;
pub mod error;
pub mod forecast;
pub mod provider;
pub mod service;
pub mod statements;
pub mod time_value;
pub mod types;
pub mod valuation;

pub use config::{ConfigOverrides, ValuationConfig};
pub use error::{ErrorKind, IntrinsicError};
pub use forecast::{Forecast, ForecastMethod, ForecastModel, JimmyModel, RevenueMarginModel};
pub use provider::{DataProvider, ProviderError};
pub use service::{valuate, BatchValuation, TickerOutcome, ValuationService};
pub use statements::{FiscalYearMetrics, StatementSeries};
pub use types::*;
pub use valuation::{ValuationParameters, ValuationResult};

/// Standard result type for all intrinsic-value operations
pub type IntrinsicResult<T> = Result<T, IntrinsicError>;
