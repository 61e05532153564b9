//! The period close and reopen workflow.

use chrono::{DateTime, Utc};
use ledgerkit_shared::{JournalEntryId, PeriodId, TenantId};
use rust_decimal::Decimal;
use tracing::info;

use super::error::LedgerError;
use super::posting::{post_in, reverse_in, submit_draft_in};
use super::tenant::TenantLedger;
use super::GeneralLedger;
use crate::coa::NormalBalance;
use crate::journal::{DraftEntry, JournalSource, LineInput};
use crate::period::{PeriodError, PeriodState};

impl GeneralLedger {
    /// Closes a period.
    ///
    /// The period enters `closing` (rejecting new posts), the draft
    /// policy and opening continuity are checked, P&L balances roll up
    /// into retained earnings via a system closing entry, closings
    /// roll forward into the next period's openings, and the period
    /// lands in `closed`. Any failure restores the period to `open`
    /// with nothing mutated.
    ///
    /// Returns the closing entry's id, when one was needed.
    pub fn close_period(
        &self,
        tenant: TenantId,
        period: PeriodId,
    ) -> Result<Option<JournalEntryId>, LedgerError> {
        let now = self.clock().now();
        self.with_tenant(tenant, |ledger| {
            ledger.calendar.begin_close(period)?;
            match run_close(ledger, now, period) {
                Ok(closing_entry) => {
                    ledger.calendar.complete_close(period)?;
                    info!(tenant = %tenant, period = %period, "period closed");
                    Ok(closing_entry)
                }
                Err(err) => {
                    // Validation failed mid-close; give the period back.
                    let _ = ledger.calendar.abort_close(period);
                    Err(err)
                }
            }
        })
    }

    /// Reopens a closed period.
    ///
    /// Requires the caller's authorization flag. System closing
    /// entries are undone by posting reversals, never by deletion.
    pub fn reopen_period(
        &self,
        tenant: TenantId,
        period: PeriodId,
        authorized: bool,
    ) -> Result<(), LedgerError> {
        if !authorized {
            return Err(PeriodError::NotAuthorized.into());
        }
        let now = self.clock().now();
        self.with_tenant(tenant, |ledger| {
            ledger.calendar.reopen(period)?;
            let end_date = ledger.calendar.get(period)?.end_date;
            let closing_entries = ledger.closing_entries.remove(&period).unwrap_or_default();
            for entry in closing_entries {
                reverse_in(ledger, now, entry, end_date, "Period reopened")?;
            }
            info!(tenant = %tenant, period = %period, "period reopened");
            Ok(())
        })
    }

    /// Permanently seals a closed period.
    pub fn lock_period(&self, tenant: TenantId, period: PeriodId) -> Result<(), LedgerError> {
        self.with_tenant(tenant, |ledger| {
            ledger.calendar.lock(period)?;
            info!(tenant = %tenant, period = %period, "period locked");
            Ok(())
        })
    }
}

fn run_close(
    ledger: &mut TenantLedger,
    now: DateTime<Utc>,
    period_id: PeriodId,
) -> Result<Option<JournalEntryId>, LedgerError> {
    let period = ledger.calendar.get(period_id)?.clone();

    if ledger.config.reject_close_with_drafts {
        let count = ledger.drafts_in_period(&period);
        if count > 0 {
            return Err(PeriodError::OutstandingDrafts {
                label: period.label(),
                count,
            }
            .into());
        }
    }

    check_continuity(ledger, period_id)?;
    let closing_entry = post_closing_entry(ledger, now, period_id)?;

    if let Some(next) = ledger.calendar.next_after(period_id).map(|p| p.id) {
        let accounts = &ledger.accounts;
        ledger.balances.roll_forward(period_id, next, |account| {
            accounts
                .get(account)
                .map_or(NormalBalance::Debit, |a| a.normal_balance)
        });
    }
    Ok(closing_entry)
}

/// Opening continuity: every bucket's opening must equal the previous
/// period's closing. Only checked once the previous period has closed;
/// before that its closing is still moving.
fn check_continuity(ledger: &TenantLedger, period_id: PeriodId) -> Result<(), LedgerError> {
    let Some(previous) = ledger.calendar.previous(period_id) else {
        return Ok(());
    };
    if !matches!(previous.state, PeriodState::Closed | PeriodState::Locked) {
        return Ok(());
    }
    let previous_id = previous.id;
    let label = ledger.calendar.get(period_id)?.label();

    for account in ledger.balances.accounts_in_period(previous_id) {
        let prior_closing = ledger.balances.closing_base(account, previous_id);
        let opening = ledger
            .balances
            .get(account, period_id)
            .map_or(Decimal::ZERO, |b| b.opening_base);
        if opening != prior_closing {
            let code = ledger
                .accounts
                .get(account)
                .map_or_else(|_| account.to_string(), |a| a.code.clone());
            return Err(PeriodError::ContinuityBreak {
                account: code,
                label,
                opening,
                prior_closing,
            }
            .into());
        }
    }
    Ok(())
}

/// Rolls revenue and expense closings into retained earnings with one
/// balanced entry posted into the closing period.
fn post_closing_entry(
    ledger: &mut TenantLedger,
    now: DateTime<Utc>,
    period_id: PeriodId,
) -> Result<Option<JournalEntryId>, LedgerError> {
    let period = ledger.calendar.get(period_id)?.clone();

    let mut lines = Vec::new();
    // Net P&L position as debit minus credit; negative means profit.
    let mut net = Decimal::ZERO;
    for account_id in ledger.balances.accounts_in_period(period_id) {
        let account = match ledger.accounts.get(account_id) {
            Ok(account) => account,
            Err(_) => continue,
        };
        if !account.account_type.is_profit_and_loss() {
            continue;
        }
        let closing = ledger.balances.closing_base(account_id, period_id);
        let debit_minus_credit = match account.normal_balance {
            NormalBalance::Debit => closing,
            NormalBalance::Credit => -closing,
        };
        if debit_minus_credit.is_zero() {
            continue;
        }
        // Post the opposite side to zero the account.
        if debit_minus_credit > Decimal::ZERO {
            lines.push(LineInput::credit(account_id, debit_minus_credit));
        } else {
            lines.push(LineInput::debit(account_id, -debit_minus_credit));
        }
        net += debit_minus_credit;
    }

    if lines.is_empty() {
        return Ok(None);
    }

    if !net.is_zero() {
        let retained = ledger
            .config
            .retained_earnings_account
            .ok_or(LedgerError::NoRetainedEarningsAccount)?;
        if net > Decimal::ZERO {
            lines.push(LineInput::debit(retained, net));
        } else {
            lines.push(LineInput::credit(retained, -net));
        }
    }

    let draft = DraftEntry::manual(
        period.end_date,
        &format!("Closing entry for period {}", period.label()),
        lines,
    )
    .with_source(JournalSource::Closing);

    let entry = submit_draft_in(ledger, now, draft)?;
    post_in(ledger, now, entry.id, true)?;
    ledger
        .closing_entries
        .entry(period_id)
        .or_default()
        .push(entry.id);
    Ok(Some(entry.id))
}
