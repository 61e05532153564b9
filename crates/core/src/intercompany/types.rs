//! Intercompany transaction types.

use chrono::NaiveDate;
use ledgerkit_shared::{AccountId, IntercompanyTxId, JournalEntryId, TenantId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Lifecycle state of an intercompany transaction.
///
/// Both sides always sit in the same state; there is no per-side
/// lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IcState {
    /// Both entries drafted.
    Draft,
    /// Submitted for approval.
    Pending,
    /// Approved, awaiting post.
    Approved,
    /// Both entries posted.
    Posted,
    /// Period balances on both sides matched.
    Reconciled,
    /// Abandoned before posting.
    Cancelled,
}

/// A linked pair of journal entries in two tenants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntercompanyTransaction {
    /// Opaque identifier.
    pub id: IntercompanyTxId,
    /// Tenant owing or transferring out.
    pub source_tenant: TenantId,
    /// Tenant receiving.
    pub target_tenant: TenantId,
    /// Transaction amount in `currency`.
    pub amount: Decimal,
    /// Transaction currency code.
    pub currency: String,
    /// Account debited or credited on the source side.
    pub source_account: AccountId,
    /// Account debited or credited on the target side.
    pub target_account: AccountId,
    /// Posting date for both entries.
    pub posting_date: NaiveDate,
    /// Human description stamped on both entries.
    pub description: String,
    /// Source-side entry, once drafted.
    pub source_entry: Option<JournalEntryId>,
    /// Target-side entry, once drafted.
    pub target_entry: Option<JournalEntryId>,
    /// Shared lifecycle state.
    pub state: IcState,
    /// Message from the last failed post attempt, if any.
    pub last_error: Option<String>,
}

/// Outcome of comparing the two sides' intercompany balances for a
/// period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationReport {
    /// Source tenant's intercompany account balance, base currency.
    pub source_balance: Decimal,
    /// Target tenant's intercompany account balance, base currency.
    pub target_balance: Decimal,
    /// `source_balance + target_balance`; zero when the sides mirror.
    pub difference: Decimal,
}

impl ReconciliationReport {
    /// Whether the two sides cancel out.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.difference.is_zero()
    }
}
