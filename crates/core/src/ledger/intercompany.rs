//! Intercompany transactions: atomic paired journals across tenants.
//!
//! Both tenant locks are taken in id order before anything mutates, so
//! two concurrent transactions between the same pair cannot deadlock
//! and both sides always move together.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::NaiveDate;
use ledgerkit_shared::{AccountId, IntercompanyTxId, TenantId};
use rust_decimal::Decimal;
use tracing::{info, warn};

use super::error::LedgerError;
use super::posting::{post_in, submit_draft_in, validate_post_in};
use super::tenant::TenantLedger;
use super::{lock_tenant, GeneralLedger};
use crate::coa::NormalBalance;
use crate::intercompany::{IcState, IntercompanyError, IntercompanyTransaction, ReconciliationReport};
use crate::journal::{DraftEntry, JournalSource, JournalState, LineInput};

impl GeneralLedger {
    /// Creates an intercompany transaction: one draft entry in each
    /// tenant, atomically.
    ///
    /// The source tenant books `debit source_account / credit
    /// clearing`; the target books `debit clearing / credit
    /// target_account`. Both drafts are validated before either is
    /// stored, so a rejection on one side leaves neither tenant
    /// touched.
    #[allow(clippy::too_many_arguments)]
    pub fn create_intercompany(
        &self,
        source_tenant: TenantId,
        target_tenant: TenantId,
        source_account: AccountId,
        target_account: AccountId,
        amount: Decimal,
        currency: &str,
        posting_date: NaiveDate,
        description: &str,
    ) -> Result<IntercompanyTransaction, LedgerError> {
        if source_tenant == target_tenant {
            return Err(IntercompanyError::SameTenant.into());
        }
        let now = self.clock().now();
        let source_handle = self.tenant_handle(source_tenant)?;
        let target_handle = self.tenant_handle(target_tenant)?;
        let (mut src_guard, mut tgt_guard) =
            lock_pair(source_tenant, &source_handle, target_tenant, &target_handle);
        let (src, tgt) = (&mut *src_guard, &mut *tgt_guard);

        let src_clearing = src
            .config
            .intercompany_account
            .ok_or(IntercompanyError::NoClearingAccount(source_tenant))?;
        let tgt_clearing = tgt
            .config
            .intercompany_account
            .ok_or(IntercompanyError::NoClearingAccount(target_tenant))?;

        let src_draft = DraftEntry::manual(
            posting_date,
            description,
            vec![
                LineInput::debit(source_account, amount),
                LineInput::credit(src_clearing, amount),
            ],
        )
        .with_source(JournalSource::Intercompany)
        .in_currency(currency);
        let tgt_draft = DraftEntry::manual(
            posting_date,
            description,
            vec![
                LineInput::debit(tgt_clearing, amount),
                LineInput::credit(target_account, amount),
            ],
        )
        .with_source(JournalSource::Intercompany)
        .in_currency(currency);

        // Validate both sides before storing either.
        src.calendar.find_by_date(posting_date)?;
        src.resolve_lines(&src_draft.lines, currency, posting_date)?;
        tgt.calendar.find_by_date(posting_date)?;
        tgt.resolve_lines(&tgt_draft.lines, currency, posting_date)?;

        let src_entry = submit_draft_in(src, now, src_draft)?;
        let tgt_entry = submit_draft_in(tgt, now, tgt_draft)?;

        let tx = IntercompanyTransaction {
            id: IntercompanyTxId::new(),
            source_tenant,
            target_tenant,
            amount,
            currency: currency.to_string(),
            source_account,
            target_account,
            posting_date,
            description: description.to_string(),
            source_entry: Some(src_entry.id),
            target_entry: Some(tgt_entry.id),
            state: IcState::Draft,
            last_error: None,
        };
        self.transactions().insert(tx.id, tx.clone());
        info!(tx = %tx.id, source = %source_tenant, target = %target_tenant, "intercompany drafted");
        Ok(tx)
    }

    /// Approves both sides of a transaction together.
    pub fn approve_intercompany(&self, tx: IntercompanyTxId) -> Result<(), LedgerError> {
        let record = self.get_intercompany(tx)?;
        if !matches!(record.state, IcState::Draft | IcState::Pending) {
            return Err(IntercompanyError::InvalidState {
                required: "draft or pending",
                actual: record.state,
            }
            .into());
        }

        let source_handle = self.tenant_handle(record.source_tenant)?;
        let target_handle = self.tenant_handle(record.target_tenant)?;
        let (mut src_guard, mut tgt_guard) = lock_pair(
            record.source_tenant,
            &source_handle,
            record.target_tenant,
            &target_handle,
        );
        let (src, tgt) = (&mut *src_guard, &mut *tgt_guard);

        for (ledger, entry_id) in [(src, record.source_entry), (tgt, record.target_entry)] {
            if let Some(entry_id) = entry_id {
                let entry = ledger.entry_mut(entry_id)?;
                if matches!(
                    entry.state,
                    JournalState::Draft | JournalState::PendingApproval
                ) {
                    entry.state = JournalState::Approved;
                }
            }
        }

        self.update_intercompany(tx, |record| {
            record.state = IcState::Approved;
        })?;
        Ok(())
    }

    /// Posts both sides under one logical operation.
    ///
    /// Each side is fully validated before either posts; if one side
    /// fails, neither posts, the transaction stays `approved`, and the
    /// failure is recorded on it.
    pub fn post_intercompany(&self, tx: IntercompanyTxId) -> Result<(), LedgerError> {
        let record = self.get_intercompany(tx)?;
        if record.state != IcState::Approved {
            return Err(IntercompanyError::InvalidState {
                required: "approved",
                actual: record.state,
            }
            .into());
        }
        let (Some(src_entry), Some(tgt_entry)) = (record.source_entry, record.target_entry) else {
            return Err(IntercompanyError::InvalidState {
                required: "approved with both entries drafted",
                actual: record.state,
            }
            .into());
        };

        let now = self.clock().now();
        let source_handle = self.tenant_handle(record.source_tenant)?;
        let target_handle = self.tenant_handle(record.target_tenant)?;
        let (mut src_guard, mut tgt_guard) = lock_pair(
            record.source_tenant,
            &source_handle,
            record.target_tenant,
            &target_handle,
        );
        let (src, tgt) = (&mut *src_guard, &mut *tgt_guard);

        // Dry-run both sides; only then mutate.
        let failure = match validate_post_in(src, src_entry, false) {
            Err(err) => Some((record.source_tenant, err)),
            Ok(()) => match validate_post_in(tgt, tgt_entry, false) {
                Err(err) => Some((record.target_tenant, err)),
                Ok(()) => None,
            },
        };
        if let Some((tenant, err)) = failure {
            let message = err.to_string();
            warn!(tx = %tx, tenant = %tenant, error = %message, "intercompany post rejected");
            self.update_intercompany(tx, |record| {
                record.last_error = Some(message.clone());
            })?;
            return Err(IntercompanyError::SideFailed { tenant, message }.into());
        }

        post_in(src, now, src_entry, false)?;
        post_in(tgt, now, tgt_entry, false)?;

        self.update_intercompany(tx, |record| {
            record.state = IcState::Posted;
            record.last_error = None;
        })?;
        info!(tx = %tx, "intercompany posted");
        Ok(())
    }

    /// Compares the two sides' clearing account balances for the
    /// period of the transaction; marks the transaction reconciled
    /// when they cancel out.
    pub fn reconcile_intercompany(
        &self,
        tx: IntercompanyTxId,
    ) -> Result<ReconciliationReport, LedgerError> {
        let record = self.get_intercompany(tx)?;
        if !matches!(record.state, IcState::Posted | IcState::Reconciled) {
            return Err(IntercompanyError::InvalidState {
                required: "posted",
                actual: record.state,
            }
            .into());
        }

        let source_balance = self.clearing_balance(record.source_tenant, record.posting_date)?;
        let target_balance = self.clearing_balance(record.target_tenant, record.posting_date)?;
        let report = ReconciliationReport {
            source_balance,
            target_balance,
            difference: source_balance + target_balance,
        };

        if report.is_balanced() {
            self.update_intercompany(tx, |record| {
                record.state = IcState::Reconciled;
            })?;
        }
        Ok(report)
    }

    /// Cancels an unposted transaction, voiding both drafts.
    pub fn cancel_intercompany(&self, tx: IntercompanyTxId) -> Result<(), LedgerError> {
        let record = self.get_intercompany(tx)?;
        if !matches!(
            record.state,
            IcState::Draft | IcState::Pending | IcState::Approved
        ) {
            return Err(IntercompanyError::InvalidState {
                required: "draft, pending, or approved",
                actual: record.state,
            }
            .into());
        }

        for (tenant, entry) in [
            (record.source_tenant, record.source_entry),
            (record.target_tenant, record.target_entry),
        ] {
            if let Some(entry) = entry {
                self.void(tenant, entry, "Intercompany transaction cancelled")?;
            }
        }
        self.update_intercompany(tx, |record| {
            record.state = IcState::Cancelled;
        })?;
        Ok(())
    }

    /// Fetches an intercompany transaction.
    pub fn get_intercompany(
        &self,
        tx: IntercompanyTxId,
    ) -> Result<IntercompanyTransaction, LedgerError> {
        self.transactions()
            .get(&tx)
            .cloned()
            .ok_or_else(|| IntercompanyError::TransactionNotFound(tx).into())
    }

    fn update_intercompany(
        &self,
        tx: IntercompanyTxId,
        apply: impl FnOnce(&mut IntercompanyTransaction),
    ) -> Result<(), LedgerError> {
        let mut transactions = self.transactions();
        let record = transactions
            .get_mut(&tx)
            .ok_or(IntercompanyError::TransactionNotFound(tx))?;
        apply(record);
        Ok(())
    }

    /// Clearing account balance as debit minus credit for the period
    /// containing `date`.
    fn clearing_balance(&self, tenant: TenantId, date: NaiveDate) -> Result<Decimal, LedgerError> {
        self.with_tenant(tenant, |ledger| {
            let clearing = ledger
                .config
                .intercompany_account
                .ok_or(IntercompanyError::NoClearingAccount(tenant))?;
            let period = ledger.calendar.find_by_date(date)?.id;
            let Some(bucket) = ledger.balances.get(clearing, period) else {
                return Ok(Decimal::ZERO);
            };
            let opening = match ledger.normal_of(clearing) {
                NormalBalance::Debit => bucket.opening_base,
                NormalBalance::Credit => -bucket.opening_base,
            };
            Ok(opening + bucket.debits_base - bucket.credits_base)
        })
    }
}

/// Locks two tenants in id order and hands the guards back as
/// (source, target) regardless of which mutex was taken first.
fn lock_pair<'a>(
    tenant_a: TenantId,
    handle_a: &'a Arc<Mutex<TenantLedger>>,
    tenant_b: TenantId,
    handle_b: &'a Arc<Mutex<TenantLedger>>,
) -> (MutexGuard<'a, TenantLedger>, MutexGuard<'a, TenantLedger>) {
    if tenant_a <= tenant_b {
        let first = lock_tenant(handle_a);
        let second = lock_tenant(handle_b);
        (first, second)
    } else {
        let second = lock_tenant(handle_b);
        let first = lock_tenant(handle_a);
        (first, second)
    }
}
