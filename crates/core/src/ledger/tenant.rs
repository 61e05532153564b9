//! Per-tenant ledger state and shared helpers.

use std::collections::HashMap;

use chrono::NaiveDate;
use ledgerkit_shared::{
    AccountId, AllocationRuleId, JournalEntryId, PeriodId, RecurringTemplateId,
};
use rust_decimal::Decimal;

use crate::allocation::AllocationRule;
use crate::balance::BalanceStore;
use crate::coa::{AccountUsage, ChartOfAccounts, CoaError, NormalBalance};
use crate::currency::{convert_amount, round_to_scale, Currency, CurrencyRegistry};
use crate::journal::{
    check_balance, validate_lines, EntryType, JournalEntry, JournalError, JournalLine, LineInput,
};
use crate::period::{AccountingPeriod, FiscalCalendar, PeriodState};
use crate::recurring::RecurringTemplate;

/// Tenant-level policy and configuration.
#[derive(Debug, Clone)]
pub struct TenantConfig {
    /// The tenant's reporting currency.
    pub base_currency: Currency,
    /// Equity account receiving rolled-up P&L at period close.
    pub retained_earnings_account: Option<AccountId>,
    /// Clearing account for intercompany pairs.
    pub intercompany_account: Option<AccountId>,
    /// Whether entries must be approved before posting.
    pub require_approval: bool,
    /// Whether close fails while unposted entries sit in the period.
    pub reject_close_with_drafts: bool,
}

impl TenantConfig {
    /// Creates a config with the given base currency and permissive
    /// policies.
    #[must_use]
    pub fn new(base_currency: Currency) -> Self {
        Self {
            base_currency,
            retained_earnings_account: None,
            intercompany_account: None,
            require_approval: false,
            reject_close_with_drafts: false,
        }
    }

    /// Requires approval before posting.
    #[must_use]
    pub fn requiring_approval(mut self) -> Self {
        self.require_approval = true;
        self
    }

    /// Rejects close while drafts remain in the period.
    #[must_use]
    pub fn rejecting_close_with_drafts(mut self) -> Self {
        self.reject_close_with_drafts = true;
        self
    }
}

/// All state belonging to one tenant. Guarded by the tenant's lock in
/// [`super::GeneralLedger`]; nothing here synchronizes on its own.
pub(crate) struct TenantLedger {
    pub(crate) config: TenantConfig,
    pub(crate) accounts: ChartOfAccounts,
    pub(crate) currencies: CurrencyRegistry,
    pub(crate) calendar: FiscalCalendar,
    pub(crate) entries: HashMap<JournalEntryId, JournalEntry>,
    pub(crate) entry_order: Vec<JournalEntryId>,
    pub(crate) next_entry_number: HashMap<i32, u32>,
    pub(crate) balances: BalanceStore,
    pub(crate) templates: HashMap<RecurringTemplateId, RecurringTemplate>,
    pub(crate) recurring_runs: HashMap<(RecurringTemplateId, NaiveDate), JournalEntryId>,
    pub(crate) rules: HashMap<AllocationRuleId, AllocationRule>,
    pub(crate) closing_entries: HashMap<PeriodId, Vec<JournalEntryId>>,
}

impl TenantLedger {
    pub(crate) fn new(config: TenantConfig) -> Self {
        let currencies = CurrencyRegistry::new(config.base_currency.clone());
        Self {
            config,
            accounts: ChartOfAccounts::new(),
            currencies,
            calendar: FiscalCalendar::new(),
            entries: HashMap::new(),
            entry_order: Vec::new(),
            next_entry_number: HashMap::new(),
            balances: BalanceStore::new(),
            templates: HashMap::new(),
            recurring_runs: HashMap::new(),
            rules: HashMap::new(),
            closing_entries: HashMap::new(),
        }
    }

    pub(crate) fn base_scale(&self) -> u32 {
        self.currencies.base_scale()
    }

    pub(crate) fn entry(&self, id: JournalEntryId) -> Result<&JournalEntry, JournalError> {
        self.entries.get(&id).ok_or(JournalError::EntryNotFound(id))
    }

    pub(crate) fn entry_mut(
        &mut self,
        id: JournalEntryId,
    ) -> Result<&mut JournalEntry, JournalError> {
        self.entries
            .get_mut(&id)
            .ok_or(JournalError::EntryNotFound(id))
    }

    pub(crate) fn normal_of(&self, account: AccountId) -> NormalBalance {
        self.accounts
            .get(account)
            .map_or(NormalBalance::Debit, |a| a.normal_balance)
    }

    /// Usage facts feeding the account catalog's lifecycle rules.
    pub(crate) fn account_usage(&self, account: AccountId) -> AccountUsage {
        let mut has_lines = false;
        let mut has_posted_lines = false;
        for entry in self.entries.values() {
            if entry.lines.iter().any(|line| line.account_id == account) {
                has_lines = true;
                if entry.state.is_committed() {
                    has_posted_lines = true;
                    break;
                }
            }
        }

        let open_period_balance = self
            .calendar
            .list()
            .iter()
            .filter(|p| p.state == PeriodState::Open)
            .map(|p| self.balances.closing_base(account, p.id))
            .sum();

        AccountUsage {
            has_lines,
            has_posted_lines,
            open_period_balance,
        }
    }

    /// Resolves line inputs into stored lines with FX applied, and
    /// checks the balance invariant in base currency.
    ///
    /// Returns the lines plus base-currency debit and credit totals.
    pub(crate) fn resolve_lines(
        &self,
        lines: &[LineInput],
        entry_currency: &str,
        posting_date: NaiveDate,
    ) -> Result<(Vec<JournalLine>, Decimal, Decimal), JournalError> {
        validate_lines(lines)?;
        let base_scale = self.base_scale();

        let mut resolved = Vec::with_capacity(lines.len());
        let mut total_debit = Decimal::ZERO;
        let mut total_credit = Decimal::ZERO;

        for (index, input) in lines.iter().enumerate() {
            let account = self.accounts.get(input.account_id)?;
            if !account.is_active() {
                return Err(CoaError::AccountInactive(account.code.clone()).into());
            }
            if !account.is_postable {
                return Err(CoaError::NonPostableAccount(account.code.clone()).into());
            }

            let currency = input.currency.as_deref().unwrap_or(entry_currency);
            let scale = self.currencies.get_active(currency)?.scale;
            let amount = round_to_scale(input.amount, scale);
            let rate = self.currencies.rate_to_base(currency, posting_date)?;

            let (debit, credit) = match input.entry_type {
                EntryType::Debit => (amount, Decimal::ZERO),
                EntryType::Credit => (Decimal::ZERO, amount),
            };
            let base_amount = convert_amount(debit - credit, rate, base_scale);
            if base_amount >= Decimal::ZERO {
                total_debit += base_amount;
            } else {
                total_credit += -base_amount;
            }

            resolved.push(JournalLine {
                sequence: u32::try_from(index).unwrap_or(u32::MAX).saturating_add(1),
                account_id: input.account_id,
                debit,
                credit,
                currency: currency.to_string(),
                fx_rate: rate,
                base_amount,
                description: input.description.clone(),
                dimensions: input.dimensions.clone(),
            });
        }

        check_balance(total_debit, total_credit, base_scale)?;
        Ok((resolved, total_debit, total_credit))
    }

    /// Re-resolves a stored entry's FX at post time.
    ///
    /// Accounts are re-checked and rates re-read for the posting date,
    /// so a draft submitted weeks ago still posts with the right
    /// translation.
    pub(crate) fn revalidate_for_post(
        &self,
        entry: &JournalEntry,
    ) -> Result<(Vec<JournalLine>, Decimal, Decimal), JournalError> {
        let base_scale = self.base_scale();
        let mut lines = entry.lines.clone();
        let mut total_debit = Decimal::ZERO;
        let mut total_credit = Decimal::ZERO;

        for line in &mut lines {
            let account = self.accounts.get(line.account_id)?;
            if !account.is_active() {
                return Err(CoaError::AccountInactive(account.code.clone()).into());
            }
            if !account.is_postable {
                return Err(CoaError::NonPostableAccount(account.code.clone()).into());
            }

            let rate = self
                .currencies
                .rate_to_base(&line.currency, entry.posting_date)?;
            line.fx_rate = rate;
            line.base_amount = convert_amount(line.signed_native(), rate, base_scale);
            if line.base_amount >= Decimal::ZERO {
                total_debit += line.base_amount;
            } else {
                total_credit += -line.base_amount;
            }
        }

        check_balance(total_debit, total_credit, base_scale)?;
        Ok((lines, total_debit, total_credit))
    }

    /// Applies a posted entry's lines to the balance store.
    pub(crate) fn apply_to_balances(&mut self, entry_id: JournalEntryId) -> Result<(), JournalError> {
        let entry = self.entry(entry_id)?;
        let period_id = self.calendar.find_by_date(entry.posting_date)?.id;
        let lines = entry.lines.clone();
        for line in &lines {
            let normal = self.normal_of(line.account_id);
            self.balances.apply_line(period_id, normal, line);
        }
        Ok(())
    }

    /// Sums committed line movements for an account over a date range,
    /// inclusive. Returns (debit native, credit native, debit base,
    /// credit base).
    pub(crate) fn line_sums(
        &self,
        account: AccountId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> (Decimal, Decimal, Decimal, Decimal) {
        let mut sums = (Decimal::ZERO, Decimal::ZERO, Decimal::ZERO, Decimal::ZERO);
        for entry in self.entries.values() {
            if !entry.state.is_committed()
                || entry.posting_date < from
                || entry.posting_date > to
            {
                continue;
            }
            for line in entry.lines.iter().filter(|l| l.account_id == account) {
                sums.0 += line.debit;
                sums.1 += line.credit;
                if line.base_amount >= Decimal::ZERO {
                    sums.2 += line.base_amount;
                } else {
                    sums.3 += -line.base_amount;
                }
            }
        }
        sums
    }

    /// Counts unposted entries whose posting date falls in a period.
    pub(crate) fn drafts_in_period(&self, period: &AccountingPeriod) -> usize {
        self.entries
            .values()
            .filter(|e| {
                matches!(
                    e.state,
                    crate::journal::JournalState::Draft
                        | crate::journal::JournalState::PendingApproval
                        | crate::journal::JournalState::Approved
                ) && period.contains(e.posting_date)
            })
            .count()
    }

    /// Committed lines whose entry matches a filter, for reporting.
    pub(crate) fn committed_lines(
        &self,
        matches: impl Fn(&JournalEntry) -> bool,
    ) -> Vec<&JournalLine> {
        let mut lines = Vec::new();
        for id in &self.entry_order {
            let Some(entry) = self.entries.get(id) else {
                continue;
            };
            if entry.state.is_committed() && matches(entry) {
                lines.extend(entry.lines.iter());
            }
        }
        lines
    }
}
