//! Multi-currency handling and exchange rates.
//!
//! Rates are append-only per (from, to, date, type) key; translation
//! never invents a rate and rounds every hop with banker's rounding.

pub mod conversion;
pub mod error;
pub mod service;
pub mod types;

pub use conversion::{convert_amount, round_to_scale};
pub use error::FxError;
pub use service::CurrencyRegistry;
pub use types::{Currency, ExchangeRate, RateType};
