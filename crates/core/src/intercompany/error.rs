//! Intercompany engine error types.

use ledgerkit_shared::{IntercompanyTxId, TenantId};
use thiserror::Error;

use super::types::IcState;

/// Errors raised by intercompany transaction handling.
#[derive(Debug, Error)]
pub enum IntercompanyError {
    /// Source and target tenants must differ.
    #[error("Intercompany transaction requires two distinct tenants")]
    SameTenant,

    /// No transaction with this id.
    #[error("Intercompany transaction not found: {0}")]
    TransactionNotFound(IntercompanyTxId),

    /// Operation not allowed from the transaction's current state.
    #[error("Transaction is {actual:?}; operation requires {required}")]
    InvalidState {
        /// States the operation accepts.
        required: &'static str,
        /// State the transaction is in.
        actual: IcState,
    },

    /// One side failed journal validation; the pair was not posted.
    #[error("Posting failed in tenant {tenant}: {message}")]
    SideFailed {
        /// Tenant whose entry was rejected.
        tenant: TenantId,
        /// The underlying journal error, rendered.
        message: String,
    },

    /// Tenant has no intercompany clearing account configured.
    #[error("Tenant {0} has no intercompany account configured")]
    NoClearingAccount(TenantId),
}

impl IntercompanyError {
    /// Returns a stable error code for callers that map errors onward.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::SameTenant => "SAME_TENANT",
            Self::TransactionNotFound(_) => "IC_TRANSACTION_NOT_FOUND",
            Self::InvalidState { .. } => "IC_INVALID_STATE",
            Self::SideFailed { .. } => "IC_SIDE_FAILED",
            Self::NoClearingAccount(_) => "NO_CLEARING_ACCOUNT",
        }
    }
}
