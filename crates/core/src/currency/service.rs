//! Currency registry: registered currencies, the rate table, and
//! translation.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::conversion::{convert_amount, round_to_scale};
use super::error::FxError;
use super::types::{Currency, ExchangeRate};

/// Per-tenant currency registry and rate table.
///
/// Exactly one base currency exists at any time; it is fixed at
/// construction. Rates are append-only per (from, to, effective_date,
/// type) key: upserting the same key replaces the quote, everything
/// else accumulates history.
#[derive(Debug)]
pub struct CurrencyRegistry {
    base: String,
    currencies: HashMap<String, Currency>,
    rates: HashMap<(String, String), Vec<ExchangeRate>>,
}

impl CurrencyRegistry {
    /// Creates a registry with the given base currency.
    #[must_use]
    pub fn new(base: Currency) -> Self {
        let base_code = base.code.clone();
        let mut currencies = HashMap::new();
        currencies.insert(base_code.clone(), base);
        Self {
            base: base_code,
            currencies,
            rates: HashMap::new(),
        }
    }

    /// The tenant's base (reporting) currency code.
    #[must_use]
    pub fn base_code(&self) -> &str {
        &self.base
    }

    /// Decimal places of the base currency.
    #[must_use]
    pub fn base_scale(&self) -> u32 {
        self.currencies
            .get(&self.base)
            .map_or(2, |currency| currency.scale)
    }

    /// Registers (or re-registers) a currency.
    pub fn register(&mut self, currency: Currency) {
        self.currencies.insert(currency.code.clone(), currency);
    }

    /// Activates or retires a currency.
    pub fn set_active(&mut self, code: &str, active: bool) -> Result<(), FxError> {
        let currency = self
            .currencies
            .get_mut(code)
            .ok_or_else(|| FxError::UnknownCurrency(code.to_string()))?;
        currency.active = active;
        Ok(())
    }

    /// Fetches a registered currency.
    pub fn get(&self, code: &str) -> Result<&Currency, FxError> {
        self.currencies
            .get(code)
            .ok_or_else(|| FxError::UnknownCurrency(code.to_string()))
    }

    /// Fetches a currency and checks it accepts new postings.
    pub fn get_active(&self, code: &str) -> Result<&Currency, FxError> {
        let currency = self.get(code)?;
        if !currency.active {
            return Err(FxError::InactiveCurrency(code.to_string()));
        }
        Ok(currency)
    }

    /// Decimal places of a registered currency.
    pub fn scale(&self, code: &str) -> Result<u32, FxError> {
        Ok(self.get(code)?.scale)
    }

    /// Upserts an exchange rate.
    ///
    /// The (from, to, effective_date, type) key is replaced when it
    /// already exists; the table otherwise only grows.
    pub fn upsert_rate(&mut self, rate: ExchangeRate) -> Result<(), FxError> {
        if rate.rate <= Decimal::ZERO {
            return Err(FxError::InvalidRate);
        }
        if rate.from == rate.to {
            return Err(FxError::SameCurrency);
        }
        self.get(&rate.from)?;
        self.get(&rate.to)?;

        let key = (rate.from.clone(), rate.to.clone());
        let quotes = self.rates.entry(key).or_default();
        if let Some(existing) = quotes.iter_mut().find(|q| {
            q.effective_date == rate.effective_date && q.rate_type == rate.rate_type
        }) {
            *existing = rate;
        } else {
            quotes.push(rate);
        }
        Ok(())
    }

    /// Looks up the official rate effective on or before `as_of`.
    ///
    /// Ties on effective date are broken by rate type (spot first).
    #[must_use]
    pub fn lookup(&self, from: &str, to: &str, as_of: NaiveDate) -> Option<Decimal> {
        let quotes = self.rates.get(&(from.to_string(), to.to_string()))?;
        quotes
            .iter()
            .filter(|q| q.is_official && q.effective_date <= as_of)
            .max_by_key(|q| (q.effective_date, std::cmp::Reverse(q.rate_type.priority())))
            .map(|q| q.rate)
    }

    /// Resolves the rate from a currency into the base currency.
    ///
    /// The base itself resolves to 1.
    pub fn rate_to_base(&self, from: &str, as_of: NaiveDate) -> Result<Decimal, FxError> {
        if from == self.base {
            return Ok(Decimal::ONE);
        }
        self.get(from)?;
        self.lookup(from, &self.base, as_of)
            .ok_or_else(|| FxError::NoRateAvailable {
                from: from.to_string(),
                to: self.base.clone(),
                date: as_of,
            })
    }

    /// Translates an amount between two currencies as of a date.
    ///
    /// Uses the direct rate when one exists; otherwise triangulates
    /// through the base currency. Every multiplication rounds to the
    /// destination scale of that hop with banker's rounding. Fails with
    /// [`FxError::NoRateAvailable`] rather than inventing a rate.
    pub fn translate(
        &self,
        amount: Decimal,
        from: &str,
        to: &str,
        as_of: NaiveDate,
    ) -> Result<Decimal, FxError> {
        let to_scale = self.scale(to)?;
        self.get(from)?;

        if from == to {
            return Ok(round_to_scale(amount, to_scale));
        }
        if let Some(rate) = self.lookup(from, to, as_of) {
            return Ok(convert_amount(amount, rate, to_scale));
        }

        // Triangulation through the base, only when no direct rate and
        // neither end already is the base.
        if from != self.base && to != self.base {
            let to_base = self.lookup(from, &self.base, as_of);
            let from_base = self.lookup(&self.base, to, as_of);
            if let (Some(first), Some(second)) = (to_base, from_base) {
                let in_base = convert_amount(amount, first, self.base_scale());
                return Ok(convert_amount(in_base, second, to_scale));
            }
        }

        Err(FxError::NoRateAvailable {
            from: from.to_string(),
            to: to.to_string(),
            date: as_of,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::types::RateType;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn registry() -> CurrencyRegistry {
        let mut reg = CurrencyRegistry::new(Currency::new("USD", "US Dollar", 2));
        reg.register(Currency::new("EUR", "Euro", 2));
        reg.register(Currency::new("JPY", "Japanese Yen", 0));
        reg
    }

    #[test]
    fn lookup_picks_most_recent_on_or_before() {
        let mut reg = registry();
        reg.upsert_rate(ExchangeRate::spot("EUR", "USD", date(2024, 3, 1), dec!(1.08)))
            .unwrap();
        reg.upsert_rate(ExchangeRate::spot("EUR", "USD", date(2024, 3, 10), dec!(1.10)))
            .unwrap();
        reg.upsert_rate(ExchangeRate::spot("EUR", "USD", date(2024, 3, 20), dec!(1.12)))
            .unwrap();

        assert_eq!(reg.lookup("EUR", "USD", date(2024, 3, 15)), Some(dec!(1.10)));
        assert_eq!(reg.lookup("EUR", "USD", date(2024, 3, 10)), Some(dec!(1.10)));
        assert_eq!(reg.lookup("EUR", "USD", date(2024, 2, 28)), None);
    }

    #[test]
    fn unofficial_quotes_are_ignored() {
        let mut reg = registry();
        let mut quote = ExchangeRate::spot("EUR", "USD", date(2024, 3, 1), dec!(9.99));
        quote.is_official = false;
        reg.upsert_rate(quote).unwrap();

        assert_eq!(reg.lookup("EUR", "USD", date(2024, 3, 15)), None);
    }

    #[test]
    fn same_date_tie_prefers_spot() {
        let mut reg = registry();
        let mut historical = ExchangeRate::spot("EUR", "USD", date(2024, 3, 1), dec!(1.05));
        historical.rate_type = RateType::Historical;
        reg.upsert_rate(historical).unwrap();
        reg.upsert_rate(ExchangeRate::spot("EUR", "USD", date(2024, 3, 1), dec!(1.08)))
            .unwrap();

        assert_eq!(reg.lookup("EUR", "USD", date(2024, 3, 1)), Some(dec!(1.08)));
    }

    #[test]
    fn upsert_replaces_same_key() {
        let mut reg = registry();
        reg.upsert_rate(ExchangeRate::spot("EUR", "USD", date(2024, 3, 1), dec!(1.08)))
            .unwrap();
        reg.upsert_rate(ExchangeRate::spot("EUR", "USD", date(2024, 3, 1), dec!(1.09)))
            .unwrap();

        assert_eq!(reg.lookup("EUR", "USD", date(2024, 3, 1)), Some(dec!(1.09)));
    }

    #[test]
    fn invalid_rates_rejected() {
        let mut reg = registry();
        assert!(matches!(
            reg.upsert_rate(ExchangeRate::spot("EUR", "USD", date(2024, 3, 1), dec!(0))),
            Err(FxError::InvalidRate)
        ));
        assert!(matches!(
            reg.upsert_rate(ExchangeRate::spot("EUR", "EUR", date(2024, 3, 1), dec!(1))),
            Err(FxError::SameCurrency)
        ));
        assert!(matches!(
            reg.upsert_rate(ExchangeRate::spot("GBP", "USD", date(2024, 3, 1), dec!(1.27))),
            Err(FxError::UnknownCurrency(_))
        ));
    }

    #[test]
    fn translate_direct_rate() {
        let mut reg = registry();
        reg.upsert_rate(ExchangeRate::spot("EUR", "USD", date(2024, 3, 10), dec!(1.10)))
            .unwrap();

        let usd = reg.translate(dec!(100), "EUR", "USD", date(2024, 3, 10)).unwrap();
        assert_eq!(usd, dec!(110.00));
    }

    #[test]
    fn translate_same_currency_rounds_to_scale() {
        let reg = registry();
        assert_eq!(
            reg.translate(dec!(10.005), "USD", "USD", date(2024, 1, 1)).unwrap(),
            dec!(10.00)
        );
    }

    #[test]
    fn translate_triangulates_through_base() {
        let mut reg = registry();
        // No direct EUR->JPY rate; EUR->USD and USD->JPY exist.
        reg.upsert_rate(ExchangeRate::spot("EUR", "USD", date(2024, 3, 10), dec!(1.10)))
            .unwrap();
        reg.upsert_rate(ExchangeRate::spot("USD", "JPY", date(2024, 3, 10), dec!(150)))
            .unwrap();

        // 100 EUR -> 110.00 USD -> 16500 JPY (scale 0)
        let jpy = reg.translate(dec!(100), "EUR", "JPY", date(2024, 3, 10)).unwrap();
        assert_eq!(jpy, dec!(16500));
    }

    #[test]
    fn translate_prefers_direct_over_triangulation() {
        let mut reg = registry();
        reg.upsert_rate(ExchangeRate::spot("EUR", "JPY", date(2024, 3, 10), dec!(163)))
            .unwrap();
        reg.upsert_rate(ExchangeRate::spot("EUR", "USD", date(2024, 3, 10), dec!(1.10)))
            .unwrap();
        reg.upsert_rate(ExchangeRate::spot("USD", "JPY", date(2024, 3, 10), dec!(150)))
            .unwrap();

        let jpy = reg.translate(dec!(100), "EUR", "JPY", date(2024, 3, 10)).unwrap();
        assert_eq!(jpy, dec!(16300));
    }

    #[test]
    fn translate_fails_without_any_path() {
        let reg = registry();
        let err = reg.translate(dec!(100), "EUR", "JPY", date(2024, 3, 10)).unwrap_err();
        assert!(matches!(err, FxError::NoRateAvailable { .. }));
    }

    #[test]
    fn rate_to_base_is_identity_for_base() {
        let reg = registry();
        assert_eq!(reg.rate_to_base("USD", date(2024, 1, 1)).unwrap(), Decimal::ONE);
    }
}
