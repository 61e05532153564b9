//! The (account, period) balance bucket store.

use std::collections::HashMap;

use ledgerkit_shared::{AccountId, PeriodId};
use rust_decimal::Decimal;

use super::types::PeriodBalance;
use crate::coa::NormalBalance;
use crate::journal::JournalLine;

/// Per-tenant balance buckets, one per (account, period).
///
/// The store is movement-driven: posting applies lines, period close
/// rolls closings forward into the next period's openings. It never
/// validates; callers gate what reaches it.
#[derive(Debug, Default)]
pub struct BalanceStore {
    buckets: HashMap<(AccountId, PeriodId), PeriodBalance>,
}

impl BalanceStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one posted line to its (account, period) bucket.
    ///
    /// Native movements use the line amounts as written; base movements
    /// use the signed `base_amount`, split back into its side.
    pub fn apply_line(&mut self, period: PeriodId, normal: NormalBalance, line: &JournalLine) {
        let bucket = self
            .buckets
            .entry((line.account_id, period))
            .or_default();
        bucket.debits_native += line.debit;
        bucket.credits_native += line.credit;
        if line.base_amount >= Decimal::ZERO {
            bucket.debits_base += line.base_amount;
        } else {
            bucket.credits_base += -line.base_amount;
        }
        bucket.recompute_closing(normal);
    }

    /// Reads a bucket, if any movement or opening has touched it.
    #[must_use]
    pub fn get(&self, account: AccountId, period: PeriodId) -> Option<&PeriodBalance> {
        self.buckets.get(&(account, period))
    }

    /// Closing balance of a bucket, zero when untouched.
    #[must_use]
    pub fn closing_base(&self, account: AccountId, period: PeriodId) -> Decimal {
        self.get(account, period)
            .map_or(Decimal::ZERO, |b| b.closing_base)
    }

    /// Sets a bucket's opening balances and recomputes its closing.
    pub fn set_opening(
        &mut self,
        account: AccountId,
        period: PeriodId,
        normal: NormalBalance,
        opening_native: Decimal,
        opening_base: Decimal,
    ) {
        let bucket = self.buckets.entry((account, period)).or_default();
        bucket.opening_native = opening_native;
        bucket.opening_base = opening_base;
        bucket.recompute_closing(normal);
    }

    /// Accounts with a bucket in the given period.
    #[must_use]
    pub fn accounts_in_period(&self, period: PeriodId) -> Vec<AccountId> {
        let mut accounts: Vec<AccountId> = self
            .buckets
            .keys()
            .filter(|(_, p)| *p == period)
            .map(|(a, _)| *a)
            .collect();
        accounts.sort();
        accounts
    }

    /// Carries every closing in `from` into the opening of `to`.
    ///
    /// `normal_of` resolves each account's normal balance side.
    pub fn roll_forward(
        &mut self,
        from: PeriodId,
        to: PeriodId,
        normal_of: impl Fn(AccountId) -> NormalBalance,
    ) {
        for account in self.accounts_in_period(from) {
            let (closing_native, closing_base) = {
                let bucket = &self.buckets[&(account, from)];
                (bucket.closing_native, bucket.closing_base)
            };
            self.set_opening(account, to, normal_of(account), closing_native, closing_base);
        }
    }

    /// Verifies a bucket's stored closing against a recomputation from
    /// its opening and movements. Returns the pair (stored, recomputed)
    /// in base currency when they disagree.
    #[must_use]
    pub fn reconcile(
        &self,
        account: AccountId,
        period: PeriodId,
        normal: NormalBalance,
    ) -> Option<(Decimal, Decimal)> {
        let bucket = self.get(account, period)?;
        let recomputed =
            bucket.opening_base + normal.signed_change(bucket.debits_base, bucket.credits_base);
        (bucket.closing_base != recomputed).then_some((bucket.closing_base, recomputed))
    }
}
