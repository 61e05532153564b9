//! Period manager error types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use super::types::PeriodState;

/// Errors raised by period lookup, gating, and the close workflow.
#[derive(Debug, Error)]
pub enum PeriodError {
    /// No period covers the given date.
    #[error("No accounting period contains {0}")]
    NoPeriodForDate(NaiveDate),

    /// No period with the given id.
    #[error("Accounting period not found")]
    PeriodNotFound,

    /// Posting targeted a period that is not open.
    #[error("Period {label} is {state:?} and does not accept postings")]
    PeriodNotOpen {
        /// Period label, e.g. `2024-03`.
        label: String,
        /// State that blocked the posting.
        state: PeriodState,
    },

    /// Close requested for a period already closed or locked.
    #[error("Period {0} is already closed")]
    PeriodAlreadyClosed(String),

    /// Reopen or lock requested for a period that is not closed.
    #[error("Period {0} is not closed")]
    PeriodNotClosed(String),

    /// Operation targeted a locked period.
    #[error("Period {0} is locked")]
    PeriodLocked(String),

    /// State machine rejected a transition.
    #[error("Cannot transition period {label} from {from:?} to {to:?}")]
    InvalidTransition {
        /// Period label.
        label: String,
        /// Current state.
        from: PeriodState,
        /// Requested state.
        to: PeriodState,
    },

    /// Fiscal year periods already exist.
    #[error("Fiscal year {0} already exists")]
    FiscalYearExists(i32),

    /// Opening balance does not match the prior period's closing.
    #[error(
        "Continuity break for account {account} in period {label}: \
         opening {opening} != prior closing {prior_closing}"
    )]
    ContinuityBreak {
        /// Account code.
        account: String,
        /// Period label.
        label: String,
        /// Opening balance found.
        opening: Decimal,
        /// Closing balance of the previous period.
        prior_closing: Decimal,
    },

    /// Close policy rejects periods with unposted drafts.
    #[error("Period {label} has {count} outstanding draft entries")]
    OutstandingDrafts {
        /// Period label.
        label: String,
        /// Number of drafts found.
        count: usize,
    },

    /// Reopen requires an explicit authorization flag.
    #[error("Reopening a closed period requires authorization")]
    NotAuthorized,

    /// Balance query targeted a date with no open-or-closed period.
    #[error("No open or closed period covers {0} for balance queries")]
    InvalidBalancePeriod(NaiveDate),
}

impl PeriodError {
    /// Returns a stable error code for callers that map errors onward.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NoPeriodForDate(_) => "NO_PERIOD_FOR_DATE",
            Self::PeriodNotFound => "PERIOD_NOT_FOUND",
            Self::PeriodNotOpen { .. } => "PERIOD_NOT_OPEN",
            Self::PeriodAlreadyClosed(_) => "PERIOD_ALREADY_CLOSED",
            Self::PeriodNotClosed(_) => "PERIOD_NOT_CLOSED",
            Self::PeriodLocked(_) => "PERIOD_LOCKED",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::FiscalYearExists(_) => "FISCAL_YEAR_EXISTS",
            Self::ContinuityBreak { .. } => "CONTINUITY_BREAK",
            Self::OutstandingDrafts { .. } => "OUTSTANDING_DRAFTS",
            Self::NotAuthorized => "NOT_AUTHORIZED",
            Self::InvalidBalancePeriod(_) => "INVALID_BALANCE_PERIOD",
        }
    }
}
