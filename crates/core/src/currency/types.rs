//! Currency and exchange rate types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A registered currency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Currency {
    /// ISO 4217 code (e.g. "USD").
    pub code: String,
    /// Display name.
    pub name: String,
    /// Decimal places amounts in this currency are kept to.
    pub scale: u32,
    /// Whether new postings may use this currency.
    pub active: bool,
}

impl Currency {
    /// Creates an active currency.
    #[must_use]
    pub fn new(code: &str, name: &str, scale: u32) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
            scale,
            active: true,
        }
    }
}

/// Classification of an exchange rate quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateType {
    /// Current market rate.
    Spot,
    /// Rate fixed at a past transaction date.
    Historical,
    /// Agreed rate for a future settlement.
    Forward,
}

impl RateType {
    /// Priority when several official rates share an effective date
    /// (lower wins).
    #[must_use]
    pub(crate) const fn priority(self) -> u8 {
        match self {
            Self::Spot => 0,
            Self::Historical => 1,
            Self::Forward => 2,
        }
    }
}

/// Exchange rate between two currencies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeRate {
    /// Source currency code.
    pub from: String,
    /// Target currency code.
    pub to: String,
    /// Date this rate takes effect.
    pub effective_date: NaiveDate,
    /// Rate (1 `from` = `rate` `to`).
    pub rate: Decimal,
    /// Quote classification.
    pub rate_type: RateType,
    /// Whether this quote is the official one used for translation.
    pub is_official: bool,
}

impl ExchangeRate {
    /// Creates an official spot rate.
    #[must_use]
    pub fn spot(from: &str, to: &str, effective_date: NaiveDate, rate: Decimal) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            effective_date,
            rate,
            rate_type: RateType::Spot,
            is_official: true,
        }
    }
}
