//! Balance queries and report assembly over tenant state.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use ledgerkit_shared::{AccountId, PeriodId, TenantId};
use rust_decimal::Decimal;

use super::error::LedgerError;
use super::tenant::TenantLedger;
use super::GeneralLedger;
use crate::balance::{BalanceAsOf, BalanceMismatch, PeriodBalance};
use crate::coa::NormalBalance;
use crate::journal::EntryFilter;
use crate::period::{PeriodError, PeriodState};
use crate::reports::{
    self, AccountFigures, DimensionRollup, PeriodComparison, TrialBalanceReport,
};

impl GeneralLedger {
    /// Point-in-time balance of an account, signed in its normal
    /// balance direction.
    ///
    /// The opening of the period containing `date` plus the committed
    /// movements from the period start through `date`. Dates in a
    /// future or unknown period have no opening to anchor to and are
    /// rejected.
    pub fn get_balance_as_of(
        &self,
        tenant: TenantId,
        account: AccountId,
        date: NaiveDate,
    ) -> Result<BalanceAsOf, LedgerError> {
        self.with_tenant(tenant, |ledger| balance_as_of_in(ledger, account, date))
    }

    /// The full balance bucket for one (account, period) pair. An
    /// untouched bucket reads all zeros.
    pub fn get_period_balance(
        &self,
        tenant: TenantId,
        account: AccountId,
        period: PeriodId,
    ) -> Result<PeriodBalance, LedgerError> {
        self.with_tenant(tenant, |ledger| {
            ledger.calendar.get(period)?;
            Ok(ledger
                .balances
                .get(account, period)
                .cloned()
                .unwrap_or_default())
        })
    }

    /// Audits every balance bucket in a period: recomputes each
    /// closing from its opening and movements and reports the accounts
    /// where the stored figure disagrees. An empty result means the
    /// store is internally consistent; meant to be run over closed
    /// periods before locking.
    pub fn verify_period_balances(
        &self,
        tenant: TenantId,
        period: PeriodId,
    ) -> Result<Vec<BalanceMismatch>, LedgerError> {
        self.with_tenant(tenant, |ledger| {
            ledger.calendar.get(period)?;
            let mut mismatches = Vec::new();
            for account in ledger.balances.accounts_in_period(period) {
                let normal = ledger.normal_of(account);
                if let Some((stored, recomputed)) =
                    ledger.balances.reconcile(account, period, normal)
                {
                    mismatches.push(BalanceMismatch {
                        account,
                        stored,
                        recomputed,
                    });
                }
            }
            Ok(mismatches)
        })
    }

    /// Trial balance in base currency as of a date.
    ///
    /// One row per active postable account with any movement or
    /// opening, debits and credits measured from the start of the
    /// period containing `date`.
    pub fn trial_balance(
        &self,
        tenant: TenantId,
        as_of: NaiveDate,
    ) -> Result<TrialBalanceReport, LedgerError> {
        self.with_tenant(tenant, |ledger| {
            let period = postable_period(ledger, as_of)?;
            let period_id = period.id;
            let period_start = period.start_date;

            let mut figures = Vec::new();
            for account in ledger.accounts.list_active() {
                if !account.is_postable {
                    continue;
                }
                let opening = ledger
                    .balances
                    .get(account.id, period_id)
                    .map_or(Decimal::ZERO, |b| b.opening_base);
                let opening_dmc = match account.normal_balance {
                    NormalBalance::Debit => opening,
                    NormalBalance::Credit => -opening,
                };
                let (_, _, debits, credits) = ledger.line_sums(account.id, period_start, as_of);
                if opening_dmc.is_zero() && debits.is_zero() && credits.is_zero() {
                    continue;
                }
                figures.push(AccountFigures {
                    account_id: account.id,
                    code: account.code.clone(),
                    name: account.name.clone(),
                    account_type: account.account_type,
                    debits,
                    credits,
                    net: opening_dmc + debits - credits,
                });
            }
            Ok(reports::trial_balance(as_of, figures))
        })
    }

    /// Rolls committed lines matching a filter up by one dimension key.
    pub fn dimension_rollup(
        &self,
        tenant: TenantId,
        key: &str,
        filter: &EntryFilter,
    ) -> Result<DimensionRollup, LedgerError> {
        self.with_tenant(tenant, |ledger| {
            let lines = ledger.committed_lines(|entry| filter.matches(entry));
            Ok(reports::dimension_rollup(key, lines))
        })
    }

    /// Compares every account's balance at two dates.
    pub fn period_comparison(
        &self,
        tenant: TenantId,
        current_as_of: NaiveDate,
        prior_as_of: NaiveDate,
    ) -> Result<PeriodComparison, LedgerError> {
        self.with_tenant(tenant, |ledger| {
            let current = balances_by_account(ledger, current_as_of)?;
            let prior = balances_by_account(ledger, prior_as_of)?;
            Ok(reports::period_comparison(
                current_as_of,
                prior_as_of,
                &current,
                &prior,
            ))
        })
    }
}

/// The period containing `date`, rejected while it is still future.
fn balance_as_of_in(
    ledger: &TenantLedger,
    account: AccountId,
    date: NaiveDate,
) -> Result<BalanceAsOf, LedgerError> {
    let period = postable_period(ledger, date)?;
    let period_id = period.id;
    let period_start = period.start_date;

    let (opening_native, opening_base) = ledger
        .balances
        .get(account, period_id)
        .map_or((Decimal::ZERO, Decimal::ZERO), |b| {
            (b.opening_native, b.opening_base)
        });
    let (debit_native, credit_native, debit_base, credit_base) =
        ledger.line_sums(account, period_start, date);

    let (native, base) = match ledger.normal_of(account) {
        NormalBalance::Debit => (
            opening_native + debit_native - credit_native,
            opening_base + debit_base - credit_base,
        ),
        NormalBalance::Credit => (
            opening_native + credit_native - debit_native,
            opening_base + credit_base - debit_base,
        ),
    };
    Ok(BalanceAsOf { native, base })
}

fn postable_period(
    ledger: &TenantLedger,
    date: NaiveDate,
) -> Result<crate::period::AccountingPeriod, LedgerError> {
    let period = ledger
        .calendar
        .find_by_date(date)
        .map_err(|_| PeriodError::InvalidBalancePeriod(date))?;
    if period.state == PeriodState::Future {
        return Err(PeriodError::InvalidBalancePeriod(date).into());
    }
    Ok(period.clone())
}

/// Normal-side-signed base balances per account, for the comparison
/// report. Zero balances are left out; the builder reads them as zero.
fn balances_by_account(
    ledger: &TenantLedger,
    as_of: NaiveDate,
) -> Result<BTreeMap<AccountId, (String, Decimal)>, LedgerError> {
    let mut balances = BTreeMap::new();
    for account in ledger.accounts.list_active() {
        if !account.is_postable {
            continue;
        }
        let balance = balance_as_of_in(ledger, account.id, as_of)?;
        if balance.base.is_zero() {
            continue;
        }
        balances.insert(account.id, (account.code.clone(), balance.base));
    }
    Ok(balances)
}
