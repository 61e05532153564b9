//! Chart of accounts error types.

use thiserror::Error;

/// Errors raised by chart of accounts operations.
#[derive(Debug, Error)]
pub enum CoaError {
    /// Account code is already taken within the tenant.
    #[error("Account code {0} is already in use")]
    DuplicateCode(String),

    /// No account with the given code or id.
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// Account is inactive and cannot be used.
    #[error("Account {0} is inactive")]
    AccountInactive(String),

    /// Account is a rollup node and never carries journal lines.
    #[error("Account {0} is not postable")]
    NonPostableAccount(String),

    /// Parent reference is missing, postable, or would form a cycle.
    #[error("Invalid parent for account {code}: {reason}")]
    InvalidParent {
        /// Code of the account being created or updated.
        code: String,
        /// Why the parent was rejected.
        reason: String,
    },

    /// Operation is blocked because posted journal lines reference the account.
    #[error("Account {0} is referenced by posted journal lines")]
    InUseByPostedLines(String),

    /// Account type is frozen once the account has posted history.
    #[error("Cannot change type of account {0}: posted journal lines exist")]
    TypeChangeNotAllowed(String),

    /// Deactivation is blocked while the account carries a balance.
    #[error("Account {0} has a non-zero balance in the current open period")]
    NonZeroBalance(String),

    /// Optimistic version check failed; caller should re-read and retry.
    #[error("Concurrent update on account {code}: expected version {expected}, found {actual}")]
    ConcurrentUpdate {
        /// Account code.
        code: String,
        /// Version the caller based its update on.
        expected: i64,
        /// Version currently stored.
        actual: i64,
    },
}

impl CoaError {
    /// Returns a stable error code for callers that map errors onward.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::DuplicateCode(_) => "DUPLICATE_CODE",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::AccountInactive(_) => "ACCOUNT_INACTIVE",
            Self::NonPostableAccount(_) => "NON_POSTABLE_ACCOUNT",
            Self::InvalidParent { .. } => "INVALID_PARENT",
            Self::InUseByPostedLines(_) => "IN_USE_BY_POSTED_LINES",
            Self::TypeChangeNotAllowed(_) => "TYPE_CHANGE_NOT_ALLOWED",
            Self::NonZeroBalance(_) => "NON_ZERO_BALANCE",
            Self::ConcurrentUpdate { .. } => "CONCURRENT_UPDATE",
        }
    }

    /// Returns true if the caller may retry after re-reading state.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrentUpdate { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(
            CoaError::DuplicateCode("1000".into()).error_code(),
            "DUPLICATE_CODE"
        );
        assert_eq!(
            CoaError::InUseByPostedLines("1000".into()).error_code(),
            "IN_USE_BY_POSTED_LINES"
        );
    }

    #[test]
    fn only_concurrent_update_is_retryable() {
        assert!(CoaError::ConcurrentUpdate {
            code: "1000".into(),
            expected: 1,
            actual: 2,
        }
        .is_retryable());
        assert!(!CoaError::DuplicateCode("1000".into()).is_retryable());
        assert!(!CoaError::NonZeroBalance("1000".into()).is_retryable());
    }
}
