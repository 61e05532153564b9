//! Accounting period types.

use chrono::NaiveDate;
use ledgerkit_shared::PeriodId;
use serde::{Deserialize, Serialize};

/// Lifecycle state of an accounting period.
///
/// ```text
/// future -> open -> closing -> closed -> locked
///             ^________________/  (reopen, authorized)
/// ```
///
/// `locked` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodState {
    /// Created ahead of the calendar; rejects postings.
    Future,
    /// Accepting postings.
    Open,
    /// Close in progress; rejects new postings, accepts the system
    /// closing journal.
    Closing,
    /// Closed; roll-forward persisted. Can be reopened with
    /// authorization.
    Closed,
    /// Permanently sealed.
    Locked,
}

impl PeriodState {
    /// Whether ordinary journal entries may post into the period.
    #[must_use]
    pub fn accepts_postings(self) -> bool {
        matches!(self, Self::Open)
    }

    /// Whether the state machine permits moving to `next`.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Future, Self::Open)
                | (Self::Open, Self::Closing)
                | (Self::Closing, Self::Closed | Self::Open)
                | (Self::Closed, Self::Locked | Self::Open)
        )
    }
}

/// A bounded interval of the fiscal calendar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountingPeriod {
    /// Opaque identifier.
    pub id: PeriodId,
    /// Fiscal year the period belongs to.
    pub fiscal_year: i32,
    /// 1-based position within the fiscal year.
    pub period_number: u32,
    /// First day, inclusive.
    pub start_date: NaiveDate,
    /// Last day, inclusive.
    pub end_date: NaiveDate,
    /// Lifecycle state.
    pub state: PeriodState,
}

impl AccountingPeriod {
    /// Whether a date falls within the period.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// Display label, e.g. `2024-03`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}-{:02}", self.fiscal_year, self.period_number)
    }
}
