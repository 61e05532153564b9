//! Currency and FX error types.

use chrono::NaiveDate;
use thiserror::Error;

/// Errors raised by currency registration and translation.
#[derive(Debug, Error)]
pub enum FxError {
    /// No official rate resolvable for the pair on or before the date.
    #[error("No exchange rate available for {from} to {to} on {date}")]
    NoRateAvailable {
        /// Source currency code.
        from: String,
        /// Target currency code.
        to: String,
        /// Date for which the rate was requested.
        date: NaiveDate,
    },

    /// Exchange rate must be positive.
    #[error("Exchange rate must be positive")]
    InvalidRate,

    /// Source and target currencies must differ.
    #[error("Source and target currencies must be different")]
    SameCurrency,

    /// Currency is not registered with the tenant.
    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),

    /// Currency is registered but retired.
    #[error("Currency {0} is inactive")]
    InactiveCurrency(String),
}

impl FxError {
    /// Returns a stable error code for callers that map errors onward.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NoRateAvailable { .. } => "NO_FX_RATE",
            Self::InvalidRate => "INVALID_FX_RATE",
            Self::SameCurrency => "SAME_CURRENCY",
            Self::UnknownCurrency(_) => "UNKNOWN_CURRENCY",
            Self::InactiveCurrency(_) => "INACTIVE_CURRENCY",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_rate_message_names_pair_and_date() {
        let err = FxError::NoRateAvailable {
            from: "EUR".to_string(),
            to: "USD".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
        };
        assert_eq!(
            err.to_string(),
            "No exchange rate available for EUR to USD on 2024-03-10"
        );
        assert_eq!(err.error_code(), "NO_FX_RATE");
    }
}
