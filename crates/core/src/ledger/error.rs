//! Facade-level error type.

use ledgerkit_shared::TenantId;
use thiserror::Error;

use crate::allocation::AllocationError;
use crate::coa::CoaError;
use crate::currency::FxError;
use crate::intercompany::IntercompanyError;
use crate::journal::JournalError;
use crate::period::PeriodError;
use crate::recurring::RecurringError;

/// Any error a ledger operation can surface.
///
/// Engine errors pass through transparently so callers can match on
/// the specific kind; only the tenant-level concerns are new here.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// No tenant with this id.
    #[error("Tenant not found: {0}")]
    TenantNotFound(TenantId),

    /// Close needs a retained earnings account in the tenant config.
    #[error("Tenant has no retained earnings account configured")]
    NoRetainedEarningsAccount,

    /// Journal engine rejection.
    #[error(transparent)]
    Journal(#[from] JournalError),

    /// Period manager rejection.
    #[error(transparent)]
    Period(#[from] PeriodError),

    /// Account catalog rejection.
    #[error(transparent)]
    Accounts(#[from] CoaError),

    /// Currency or rate rejection.
    #[error(transparent)]
    Fx(#[from] FxError),

    /// Recurring engine rejection.
    #[error(transparent)]
    Recurring(#[from] RecurringError),

    /// Allocation engine rejection.
    #[error(transparent)]
    Allocation(#[from] AllocationError),

    /// Intercompany engine rejection.
    #[error(transparent)]
    Intercompany(#[from] IntercompanyError),
}

impl LedgerError {
    /// Returns a stable error code for callers that map errors onward.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::TenantNotFound(_) => "TENANT_NOT_FOUND",
            Self::NoRetainedEarningsAccount => "NO_RETAINED_EARNINGS_ACCOUNT",
            Self::Journal(inner) => inner.error_code(),
            Self::Period(inner) => inner.error_code(),
            Self::Accounts(inner) => inner.error_code(),
            Self::Fx(inner) => inner.error_code(),
            Self::Recurring(inner) => inner.error_code(),
            Self::Allocation(inner) => inner.error_code(),
            Self::Intercompany(inner) => inner.error_code(),
        }
    }

    /// Whether the caller may retry the operation unchanged.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Journal(inner) => inner.is_retryable(),
            Self::Accounts(inner) => inner.is_retryable(),
            _ => false,
        }
    }
}
