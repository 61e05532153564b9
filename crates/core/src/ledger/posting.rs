//! Journal engine operations: submit, approve, post, reverse, void,
//! query.
//!
//! Posting follows validate-fully-then-mutate: every check runs before
//! the first write, so a failing post leaves no trace in balances or
//! numbering. All of it happens under the tenant lock, which is what
//! serializes concurrent posts and keeps entry numbers contiguous.

use chrono::{DateTime, NaiveDate, Utc};
use ledgerkit_shared::{JournalEntryId, PageRequest, PageResponse, TenantId};
use tracing::info;

use super::error::LedgerError;
use super::tenant::TenantLedger;
use super::GeneralLedger;
use crate::journal::{
    DraftEntry, EntryFilter, JournalEntry, JournalError, JournalSource, JournalState,
};

impl GeneralLedger {
    /// Stores a validated draft entry.
    ///
    /// Structural validation runs now (accounts postable, balanced in
    /// base, a period covers the posting date); the period does not yet
    /// have to be open.
    pub fn submit_draft(
        &self,
        tenant: TenantId,
        draft: DraftEntry,
    ) -> Result<JournalEntry, LedgerError> {
        let now = self.clock().now();
        self.with_tenant(tenant, |ledger| submit_draft_in(ledger, now, draft))
    }

    /// Moves a draft to pending approval.
    pub fn submit_for_approval(
        &self,
        tenant: TenantId,
        entry: JournalEntryId,
    ) -> Result<(), LedgerError> {
        self.with_tenant(tenant, |ledger| {
            let entry = ledger.entry_mut(entry)?;
            if entry.state != JournalState::Draft {
                return Err(JournalError::InvalidState {
                    required: "draft",
                    actual: entry.state,
                }
                .into());
            }
            entry.state = JournalState::PendingApproval;
            Ok(())
        })
    }

    /// Approves a draft or pending entry.
    pub fn approve(&self, tenant: TenantId, entry: JournalEntryId) -> Result<(), LedgerError> {
        self.with_tenant(tenant, |ledger| {
            let entry = ledger.entry_mut(entry)?;
            match entry.state {
                JournalState::Draft | JournalState::PendingApproval => {
                    entry.state = JournalState::Approved;
                    Ok(())
                }
                actual => Err(JournalError::InvalidState {
                    required: "draft or pending_approval",
                    actual,
                }
                .into()),
            }
        })
    }

    /// Posts an entry, assigning its entry number and updating
    /// balances.
    ///
    /// Idempotent: posting an already committed entry is a no-op that
    /// returns it with its previously assigned number.
    pub fn post(&self, tenant: TenantId, entry: JournalEntryId) -> Result<JournalEntry, LedgerError> {
        let now = self.clock().now();
        self.with_tenant(tenant, |ledger| post_in(ledger, now, entry, false))
    }

    /// Voids an unposted entry.
    pub fn void(
        &self,
        tenant: TenantId,
        entry: JournalEntryId,
        reason: &str,
    ) -> Result<(), LedgerError> {
        self.with_tenant(tenant, |ledger| {
            let entry = ledger.entry_mut(entry)?;
            if !entry.state.can_void() {
                return Err(JournalError::InvalidState {
                    required: "draft, pending_approval, or approved",
                    actual: entry.state,
                }
                .into());
            }
            entry.state = JournalState::Voided;
            entry.void_reason = Some(reason.to_string());
            Ok(())
        })
    }

    /// Reverses a posted entry by posting its mirror.
    ///
    /// Re-reversing returns [`JournalError::AlreadyReversed`] carrying
    /// the existing reversal's id.
    pub fn reverse(
        &self,
        tenant: TenantId,
        entry: JournalEntryId,
        reverse_date: NaiveDate,
        reason: &str,
    ) -> Result<JournalEntry, LedgerError> {
        let now = self.clock().now();
        self.with_tenant(tenant, |ledger| {
            reverse_in(ledger, now, entry, reverse_date, reason)
        })
    }

    /// Fetches an entry with its lines.
    pub fn get_entry(
        &self,
        tenant: TenantId,
        entry: JournalEntryId,
    ) -> Result<JournalEntry, LedgerError> {
        self.with_tenant(tenant, |ledger| Ok(ledger.entry(entry)?.clone()))
    }

    /// Paginated entry query in submission order.
    pub fn query_entries(
        &self,
        tenant: TenantId,
        filter: &EntryFilter,
        page: PageRequest,
    ) -> Result<PageResponse<JournalEntry>, LedgerError> {
        self.with_tenant(tenant, |ledger| {
            let matching: Vec<&JournalEntry> = ledger
                .entry_order
                .iter()
                .filter_map(|id| ledger.entries.get(id))
                .filter(|entry| filter.matches(entry))
                .collect();
            let total = matching.len() as u64;
            let data: Vec<JournalEntry> = matching
                .into_iter()
                .skip(page.offset())
                .take(page.limit())
                .cloned()
                .collect();
            Ok(PageResponse::new(data, page, total))
        })
    }
}

/// Submit path shared with the producer engines.
pub(crate) fn submit_draft_in(
    ledger: &mut TenantLedger,
    now: DateTime<Utc>,
    draft: DraftEntry,
) -> Result<JournalEntry, LedgerError> {
    let currency = draft
        .currency
        .clone()
        .unwrap_or_else(|| ledger.currencies.base_code().to_string());
    ledger.calendar.find_by_date(draft.posting_date)?;
    let (lines, total_debit, total_credit) =
        ledger.resolve_lines(&draft.lines, &currency, draft.posting_date)?;

    let entry = JournalEntry {
        id: JournalEntryId::new(),
        entry_number: None,
        entry_date: draft.entry_date,
        posting_date: draft.posting_date,
        description: draft.description,
        reference: draft.reference,
        source: draft.source,
        source_document_ref: draft.source_document_ref,
        state: JournalState::Draft,
        currency,
        total_debit,
        total_credit,
        lines,
        reversal_of: None,
        reversed_by: None,
        void_reason: None,
        created_at: now,
        posted_at: None,
    };
    ledger.entry_order.push(entry.id);
    ledger.entries.insert(entry.id, entry.clone());
    Ok(entry)
}

/// Checks everything `post` needs without mutating. Used directly by
/// the intercompany engine to dry-run both sides before either posts.
pub(crate) fn validate_post_in(
    ledger: &TenantLedger,
    entry_id: JournalEntryId,
    allow_closing: bool,
) -> Result<(), LedgerError> {
    let entry = ledger.entry(entry_id)?;
    match entry.state {
        JournalState::Posted | JournalState::Reversed => return Ok(()),
        JournalState::Voided | JournalState::PendingApproval => {
            return Err(JournalError::InvalidState {
                required: "draft or approved",
                actual: entry.state,
            }
            .into());
        }
        JournalState::Draft if ledger.config.require_approval && !is_system_source(entry.source) => {
            return Err(JournalError::ApprovalRequired.into());
        }
        JournalState::Draft | JournalState::Approved => {}
    }

    check_period_gate(ledger, entry, allow_closing)?;
    ledger.revalidate_for_post(entry)?;
    Ok(())
}

/// Post path shared with the producer and intercompany engines.
pub(crate) fn post_in(
    ledger: &mut TenantLedger,
    now: DateTime<Utc>,
    entry_id: JournalEntryId,
    allow_closing: bool,
) -> Result<JournalEntry, LedgerError> {
    let entry = ledger.entry(entry_id)?;
    match entry.state {
        // Idempotent re-invocation.
        JournalState::Posted | JournalState::Reversed => return Ok(entry.clone()),
        JournalState::Voided | JournalState::PendingApproval => {
            return Err(JournalError::InvalidState {
                required: "draft or approved",
                actual: entry.state,
            }
            .into());
        }
        JournalState::Draft if ledger.config.require_approval && !is_system_source(entry.source) => {
            return Err(JournalError::ApprovalRequired.into());
        }
        JournalState::Draft | JournalState::Approved => {}
    }

    let period = check_period_gate(ledger, entry, allow_closing)?;
    let fiscal_year = period.fiscal_year;
    let (lines, total_debit, total_credit) = ledger.revalidate_for_post(entry)?;

    // Everything validated; mutate.
    let number = allocate_entry_number(ledger, fiscal_year);
    let entry = ledger.entry_mut(entry_id)?;
    entry.entry_number = Some(number);
    entry.state = JournalState::Posted;
    entry.lines = lines;
    entry.total_debit = total_debit;
    entry.total_credit = total_credit;
    entry.posted_at = Some(now);
    let snapshot = entry.clone();

    ledger.apply_to_balances(entry_id)?;
    info!(
        entry = %entry_id,
        number,
        fiscal_year,
        debit = %total_debit,
        "entry posted"
    );
    Ok(snapshot)
}

pub(crate) fn reverse_in(
    ledger: &mut TenantLedger,
    now: DateTime<Utc>,
    entry_id: JournalEntryId,
    reverse_date: NaiveDate,
    reason: &str,
) -> Result<JournalEntry, LedgerError> {
    let original = ledger.entry(entry_id)?;
    if let Some(reversal) = original.reversed_by {
        return Err(JournalError::AlreadyReversed {
            original: entry_id,
            reversal,
        }
        .into());
    }
    if original.state != JournalState::Posted {
        return Err(JournalError::InvalidState {
            required: "posted",
            actual: original.state,
        }
        .into());
    }

    // Both sides must land in open periods.
    ledger.calendar.ensure_postable(original.posting_date)?;
    let period = ledger.calendar.ensure_postable(reverse_date)?;
    let fiscal_year = period.fiscal_year;
    let period_id = period.id;

    // Mirror the lines with the original rates so the round trip nets
    // to zero in base currency, whatever rates say today.
    let mut lines = original.lines.clone();
    for line in &mut lines {
        std::mem::swap(&mut line.debit, &mut line.credit);
        line.base_amount = -line.base_amount;
    }
    let original_number = original.entry_number.unwrap_or_default();
    let currency = original.currency.clone();
    let (total_debit, total_credit) = (original.total_credit, original.total_debit);

    let reversal = JournalEntry {
        id: JournalEntryId::new(),
        entry_number: Some(allocate_entry_number(ledger, fiscal_year)),
        entry_date: reverse_date,
        posting_date: reverse_date,
        description: format!("Reversal of entry {original_number}: {reason}"),
        reference: None,
        source: JournalSource::Reversal,
        source_document_ref: None,
        state: JournalState::Posted,
        currency,
        total_debit,
        total_credit,
        lines,
        reversal_of: Some(entry_id),
        reversed_by: None,
        void_reason: None,
        created_at: now,
        posted_at: Some(now),
    };
    let reversal_id = reversal.id;

    ledger.entry_order.push(reversal_id);
    ledger.entries.insert(reversal_id, reversal.clone());
    for line in &reversal.lines {
        let normal = ledger.normal_of(line.account_id);
        ledger.balances.apply_line(period_id, normal, line);
    }

    let original = ledger.entry_mut(entry_id)?;
    original.state = JournalState::Reversed;
    original.reversed_by = Some(reversal_id);

    info!(original = %entry_id, reversal = %reversal_id, "entry reversed");
    Ok(reversal)
}

fn allocate_entry_number(ledger: &mut TenantLedger, fiscal_year: i32) -> u32 {
    let next = ledger.next_entry_number.entry(fiscal_year).or_insert(1);
    let number = *next;
    *next += 1;
    number
}

fn check_period_gate<'a>(
    ledger: &'a TenantLedger,
    entry: &JournalEntry,
    allow_closing: bool,
) -> Result<&'a crate::period::AccountingPeriod, LedgerError> {
    let period = ledger.calendar.find_by_date(entry.posting_date)?;
    let closing_exception = allow_closing
        && entry.source == JournalSource::Closing
        && period.state == crate::period::PeriodState::Closing;
    if !period.state.accepts_postings() && !closing_exception {
        return Err(crate::period::PeriodError::PeriodNotOpen {
            label: period.label(),
            state: period.state,
        }
        .into());
    }
    Ok(period)
}

/// System-generated sources skip the approval gate; they are produced
/// by workflows that carry their own authorization.
fn is_system_source(source: JournalSource) -> bool {
    matches!(source, JournalSource::Reversal | JournalSource::Closing)
}
