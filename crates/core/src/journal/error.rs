//! Journal engine error types.

use ledgerkit_shared::JournalEntryId;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::coa::CoaError;
use crate::currency::FxError;
use crate::period::PeriodError;

/// Errors raised by journal submission, posting, and reversal.
#[derive(Debug, Error)]
pub enum JournalError {
    /// No entry with this id exists in the tenant.
    #[error("Journal entry not found: {0}")]
    EntryNotFound(JournalEntryId),

    /// An entry needs at least two lines.
    #[error("Journal entry must have at least two lines")]
    TooFewLines,

    /// Line amounts must be strictly positive.
    #[error("Line {sequence} amount must be positive")]
    NonPositiveAmount {
        /// 1-based line position.
        sequence: u32,
    },

    /// Debits and credits do not match in base currency.
    #[error("Entry is unbalanced: debits {debit} vs credits {credit} in base currency")]
    UnbalancedEntry {
        /// Total debits in base currency.
        debit: Decimal,
        /// Total credits in base currency.
        credit: Decimal,
    },

    /// Operation not allowed from the entry's current state.
    #[error("Entry is {actual:?}; operation requires {required}")]
    InvalidState {
        /// States the operation accepts.
        required: &'static str,
        /// State the entry is in.
        actual: super::JournalState,
    },

    /// Reversal requested for an entry that already has one. Carries
    /// the existing reversal id so callers can fetch it.
    #[error("Entry {original} was already reversed by {reversal}")]
    AlreadyReversed {
        /// The entry that was targeted.
        original: JournalEntryId,
        /// The reversal that already negates it.
        reversal: JournalEntryId,
    },

    /// Tenant policy requires approval before posting.
    #[error("Entry must be approved before posting")]
    ApprovalRequired,

    /// Account catalog rejection.
    #[error(transparent)]
    Accounts(#[from] CoaError),

    /// Currency or rate rejection.
    #[error(transparent)]
    Fx(#[from] FxError),

    /// Period gate rejection.
    #[error(transparent)]
    Period(#[from] PeriodError),
}

impl JournalError {
    /// Returns a stable error code for callers that map errors onward.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::EntryNotFound(_) => "ENTRY_NOT_FOUND",
            Self::TooFewLines => "TOO_FEW_LINES",
            Self::NonPositiveAmount { .. } => "NON_POSITIVE_AMOUNT",
            Self::UnbalancedEntry { .. } => "UNBALANCED_ENTRY",
            Self::InvalidState { .. } => "INVALID_STATE",
            Self::AlreadyReversed { .. } => "ALREADY_REVERSED",
            Self::ApprovalRequired => "APPROVAL_REQUIRED",
            Self::Accounts(inner) => inner.error_code(),
            Self::Fx(inner) => inner.error_code(),
            Self::Period(inner) => inner.error_code(),
        }
    }

    /// Whether the caller may retry the operation unchanged.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Accounts(inner) if inner.is_retryable())
    }
}
