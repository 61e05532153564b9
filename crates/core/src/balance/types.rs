//! Balance bucket types.

use ledgerkit_shared::AccountId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::coa::NormalBalance;

/// Balance bucket for one (account, period) pair.
///
/// `closing = opening + signed movements` in the account's normal
/// balance direction; the store recomputes it on every mutation so the
/// stored figure is always consistent with the movements.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PeriodBalance {
    /// Opening balance in the account currency.
    pub opening_native: Decimal,
    /// Period debit total in the account currency.
    pub debits_native: Decimal,
    /// Period credit total in the account currency.
    pub credits_native: Decimal,
    /// Closing balance in the account currency.
    pub closing_native: Decimal,
    /// Opening balance in base currency.
    pub opening_base: Decimal,
    /// Period debit total in base currency.
    pub debits_base: Decimal,
    /// Period credit total in base currency.
    pub credits_base: Decimal,
    /// Closing balance in base currency.
    pub closing_base: Decimal,
}

impl PeriodBalance {
    /// Recomputes both closing figures from opening plus movements.
    pub(crate) fn recompute_closing(&mut self, normal: NormalBalance) {
        self.closing_native =
            self.opening_native + normal.signed_change(self.debits_native, self.credits_native);
        self.closing_base =
            self.opening_base + normal.signed_change(self.debits_base, self.credits_base);
    }
}

/// A bucket whose stored closing disagrees with a recomputation from
/// its opening and movements. Produced by the period audit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceMismatch {
    /// The account whose bucket is inconsistent.
    pub account: AccountId,
    /// The closing figure the store holds, in base currency.
    pub stored: Decimal,
    /// The closing recomputed from opening plus movements.
    pub recomputed: Decimal,
}

/// Result of a point-in-time balance query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceAsOf {
    /// Balance in the account currency, signed in the normal balance
    /// direction.
    pub native: Decimal,
    /// Balance in base currency, same sign convention.
    pub base: Decimal,
}
