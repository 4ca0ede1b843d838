use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IntrinsicError {
    #[error("Insufficient history for {ticker}: {required} fiscal years required, {available} available")]
    InsufficientHistory {
        ticker: String,
        required: usize,
        available: usize,
    },

    #[error("Degenerate base value in {context}")]
    DegenerateBaseValue { context: String },

    #[error("Invalid rate configuration: discount rate ({discount_rate}) must exceed terminal growth rate ({terminal_growth_rate})")]
    InvalidRateConfiguration {
        discount_rate: Decimal,
        terminal_growth_rate: Decimal,
    },

    #[error("Data unavailable for {ticker} ({fiscal_year}): {reason}")]
    DataUnavailable {
        ticker: String,
        fiscal_year: i32,
        reason: String,
    },

    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Invalid statement series: {0}")]
    InvalidSeries(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Coarse classification used when reporting failures per ticker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InsufficientHistory,
    DegenerateBaseValue,
    InvalidRateConfiguration,
    DataUnavailable,
    InvalidInput,
    InvalidConfiguration,
    Serialization,
}

impl ErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InsufficientHistory => "insufficient_history",
            Self::DegenerateBaseValue => "degenerate_base_value",
            Self::InvalidRateConfiguration => "invalid_rate_configuration",
            Self::DataUnavailable => "data_unavailable",
            Self::InvalidInput => "invalid_input",
            Self::InvalidConfiguration => "invalid_configuration",
            Self::Serialization => "serialization",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl IntrinsicError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            IntrinsicError::InsufficientHistory { .. } => ErrorKind::InsufficientHistory,
            IntrinsicError::DegenerateBaseValue { .. } => ErrorKind::DegenerateBaseValue,
            IntrinsicError::InvalidRateConfiguration { .. } => ErrorKind::InvalidRateConfiguration,
            IntrinsicError::DataUnavailable { .. } => ErrorKind::DataUnavailable,
            IntrinsicError::InvalidInput { .. } | IntrinsicError::InvalidSeries(_) => {
                ErrorKind::InvalidInput
            }
            IntrinsicError::Config(_) => ErrorKind::InvalidConfiguration,
            IntrinsicError::SerializationError(_) => ErrorKind::Serialization,
        }
    }

    /// Errors that affect every ticker identically and must stop a batch.
    pub fn is_batch_fatal(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::InvalidRateConfiguration | ErrorKind::InvalidConfiguration
        )
    }

    pub(crate) fn degenerate(context: impl Into<String>) -> Self {
        IntrinsicError::DegenerateBaseValue {
            context: context.into(),
        }
    }
}

impl From<serde_json::Error> for IntrinsicError {
    fn from(e: serde_json::Error) -> Self {
        IntrinsicError::SerializationError(e.to_string())
    }
}

impl From<serde_yaml::Error> for IntrinsicError {
    fn from(e: serde_yaml::Error) -> Self {
        IntrinsicError::Config(e.to_string())
    }
}
