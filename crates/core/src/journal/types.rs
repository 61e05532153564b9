//! Journal entry and line types.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use ledgerkit_shared::{AccountId, JournalEntryId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Subsystem that produced a journal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JournalSource {
    /// Hand-keyed entry.
    Manual,
    /// Accounts payable.
    Payables,
    /// Accounts receivable.
    Receivables,
    /// Payroll run.
    Payroll,
    /// Tax accrual or settlement.
    Tax,
    /// Fixed asset depreciation or disposal.
    FixedAssets,
    /// Generated from a recurring template.
    Recurring,
    /// Generated by an allocation run.
    Allocation,
    /// One side of an intercompany pair.
    Intercompany,
    /// Mirror of a previously posted entry.
    Reversal,
    /// System-generated period close rollup.
    Closing,
}

/// Lifecycle state of a journal entry.
///
/// ```text
/// draft -> pending_approval -> approved -> posted -> reversed
///   |              |              |
///   +----void------+-----void-----+--> voided
/// ```
///
/// `posted` leaves only via `reverse`; `reversed` and `voided` are
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JournalState {
    /// Editable, not yet in the ledger.
    Draft,
    /// Submitted for approval.
    PendingApproval,
    /// Approved, awaiting post.
    Approved,
    /// Committed to balances; immutable.
    Posted,
    /// Posted and negated by a reversal entry.
    Reversed,
    /// Abandoned before posting.
    Voided,
}

impl JournalState {
    /// Whether the entry can still be voided.
    #[must_use]
    pub fn can_void(self) -> bool {
        matches!(self, Self::Draft | Self::PendingApproval | Self::Approved)
    }

    /// Whether the entry has been committed to the ledger.
    #[must_use]
    pub fn is_committed(self) -> bool {
        matches!(self, Self::Posted | Self::Reversed)
    }
}

/// Which side of the ledger a line amount lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    /// Left side.
    Debit,
    /// Right side.
    Credit,
}

/// A line as submitted by a caller.
///
/// Carrying one amount plus a side (rather than separate debit and
/// credit fields) makes the exactly-one-side rule structural.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineInput {
    /// Account the line posts to.
    pub account_id: AccountId,
    /// Debit or credit.
    pub entry_type: EntryType,
    /// Amount in the line currency; must be positive.
    pub amount: Decimal,
    /// Line currency; defaults to the entry currency when `None`.
    pub currency: Option<String>,
    /// Optional line memo.
    pub description: Option<String>,
    /// Free-form reporting tags (department, cost_center, ...).
    pub dimensions: BTreeMap<String, String>,
}

impl LineInput {
    /// Creates a debit line.
    #[must_use]
    pub fn debit(account_id: AccountId, amount: Decimal) -> Self {
        Self::new(account_id, EntryType::Debit, amount)
    }

    /// Creates a credit line.
    #[must_use]
    pub fn credit(account_id: AccountId, amount: Decimal) -> Self {
        Self::new(account_id, EntryType::Credit, amount)
    }

    fn new(account_id: AccountId, entry_type: EntryType, amount: Decimal) -> Self {
        Self {
            account_id,
            entry_type,
            amount,
            currency: None,
            description: None,
            dimensions: BTreeMap::new(),
        }
    }

    /// Sets the line currency.
    #[must_use]
    pub fn in_currency(mut self, code: &str) -> Self {
        self.currency = Some(code.to_string());
        self
    }

    /// Adds a reporting dimension tag.
    #[must_use]
    pub fn with_dimension(mut self, key: &str, value: &str) -> Self {
        self.dimensions.insert(key.to_string(), value.to_string());
        self
    }

    /// Sets the line memo.
    #[must_use]
    pub fn with_description(mut self, text: &str) -> Self {
        self.description = Some(text.to_string());
        self
    }
}

/// A journal entry as submitted by a caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftEntry {
    /// Economic event date.
    pub entry_date: NaiveDate,
    /// Date the entry takes effect in the ledger.
    pub posting_date: NaiveDate,
    /// Human description.
    pub description: String,
    /// External reference (invoice number, batch id, ...).
    pub reference: Option<String>,
    /// Producing subsystem.
    pub source: JournalSource,
    /// Opaque pointer to the source document.
    pub source_document_ref: Option<String>,
    /// Entry currency; defaults to the tenant base when `None`.
    pub currency: Option<String>,
    /// The debit/credit lines.
    pub lines: Vec<LineInput>,
}

impl DraftEntry {
    /// Creates a manual draft with same-day entry and posting dates.
    #[must_use]
    pub fn manual(posting_date: NaiveDate, description: &str, lines: Vec<LineInput>) -> Self {
        Self {
            entry_date: posting_date,
            posting_date,
            description: description.to_string(),
            reference: None,
            source: JournalSource::Manual,
            source_document_ref: None,
            currency: None,
            lines,
        }
    }

    /// Sets the producing subsystem.
    #[must_use]
    pub fn with_source(mut self, source: JournalSource) -> Self {
        self.source = source;
        self
    }

    /// Sets the entry currency.
    #[must_use]
    pub fn in_currency(mut self, code: &str) -> Self {
        self.currency = Some(code.to_string());
        self
    }

    /// Sets the external reference.
    #[must_use]
    pub fn with_reference(mut self, reference: &str) -> Self {
        self.reference = Some(reference.to_string());
        self
    }
}

/// A resolved journal line as stored in the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalLine {
    /// Position within the entry, starting at 1.
    pub sequence: u32,
    /// Account posted to.
    pub account_id: AccountId,
    /// Debit amount in the line currency (zero when credit).
    pub debit: Decimal,
    /// Credit amount in the line currency (zero when debit).
    pub credit: Decimal,
    /// Line currency code.
    pub currency: String,
    /// Rate into base applied at resolution time.
    pub fx_rate: Decimal,
    /// Signed (debit - credit) x fx_rate, rounded to base scale.
    pub base_amount: Decimal,
    /// Optional line memo.
    pub description: Option<String>,
    /// Reporting tags.
    pub dimensions: BTreeMap<String, String>,
}

impl JournalLine {
    /// Signed movement in the line currency (debit positive).
    #[must_use]
    pub fn signed_native(&self) -> Decimal {
        self.debit - self.credit
    }
}

/// A journal entry as stored in the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Opaque identifier.
    pub id: JournalEntryId,
    /// Sequential number, assigned at post, per fiscal year.
    pub entry_number: Option<u32>,
    /// Economic event date.
    pub entry_date: NaiveDate,
    /// Date the entry takes effect in the ledger.
    pub posting_date: NaiveDate,
    /// Human description.
    pub description: String,
    /// External reference.
    pub reference: Option<String>,
    /// Producing subsystem.
    pub source: JournalSource,
    /// Opaque pointer to the source document.
    pub source_document_ref: Option<String>,
    /// Lifecycle state.
    pub state: JournalState,
    /// Entry currency code.
    pub currency: String,
    /// Sum of line debits in base currency.
    pub total_debit: Decimal,
    /// Sum of line credits in base currency.
    pub total_credit: Decimal,
    /// Resolved lines.
    pub lines: Vec<JournalLine>,
    /// Set on reversal entries: the entry being negated.
    pub reversal_of: Option<JournalEntryId>,
    /// Set on reversed entries: the negating entry.
    pub reversed_by: Option<JournalEntryId>,
    /// Reason recorded when the entry was voided.
    pub void_reason: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Post timestamp, once posted.
    pub posted_at: Option<DateTime<Utc>>,
}

/// Filter for paginated entry queries. All fields are conjunctive;
/// `None` matches everything.
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    /// Restrict to a producing subsystem.
    pub source: Option<JournalSource>,
    /// Restrict to a lifecycle state.
    pub state: Option<JournalState>,
    /// Restrict to entries with a line on this account.
    pub account: Option<AccountId>,
    /// Earliest posting date, inclusive.
    pub date_from: Option<NaiveDate>,
    /// Latest posting date, inclusive.
    pub date_to: Option<NaiveDate>,
}

impl EntryFilter {
    /// Whether an entry satisfies every set criterion.
    #[must_use]
    pub fn matches(&self, entry: &JournalEntry) -> bool {
        if self.source.is_some_and(|s| s != entry.source) {
            return false;
        }
        if self.state.is_some_and(|s| s != entry.state) {
            return false;
        }
        if let Some(account) = self.account {
            if !entry.lines.iter().any(|line| line.account_id == account) {
                return false;
            }
        }
        if self.date_from.is_some_and(|d| entry.posting_date < d) {
            return false;
        }
        if self.date_to.is_some_and(|d| entry.posting_date > d) {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(JournalState::Draft, true)]
    #[case(JournalState::PendingApproval, true)]
    #[case(JournalState::Approved, true)]
    #[case(JournalState::Posted, false)]
    #[case(JournalState::Reversed, false)]
    #[case(JournalState::Voided, false)]
    fn void_only_before_post(#[case] state: JournalState, #[case] expected: bool) {
        assert_eq!(state.can_void(), expected);
    }

    #[test]
    fn line_input_builders() {
        let account = AccountId::new();
        let line = LineInput::debit(account, dec!(100))
            .in_currency("EUR")
            .with_dimension("department", "sales");

        assert_eq!(line.entry_type, EntryType::Debit);
        assert_eq!(line.currency.as_deref(), Some("EUR"));
        assert_eq!(line.dimensions.get("department").map(String::as_str), Some("sales"));
    }
}
