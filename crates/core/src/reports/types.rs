//! Report shapes.

use chrono::NaiveDate;
use ledgerkit_shared::AccountId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::coa::AccountType;

/// Per-account figures fed into the trial balance builder.
///
/// `net` is the closing balance expressed as debit minus credit in
/// base currency, regardless of the account's normal side.
#[derive(Debug, Clone)]
pub struct AccountFigures {
    /// Account identifier.
    pub account_id: AccountId,
    /// Account code.
    pub code: String,
    /// Account name.
    pub name: String,
    /// Account classification.
    pub account_type: AccountType,
    /// Period-to-date debits, base currency.
    pub debits: Decimal,
    /// Period-to-date credits, base currency.
    pub credits: Decimal,
    /// Closing balance as debit minus credit, base currency.
    pub net: Decimal,
}

/// One account row of a trial balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialBalanceRow {
    /// Account identifier.
    pub account_id: AccountId,
    /// Account code.
    pub code: String,
    /// Account name.
    pub name: String,
    /// Account classification.
    pub account_type: AccountType,
    /// Period-to-date debits.
    pub debits: Decimal,
    /// Period-to-date credits.
    pub credits: Decimal,
    /// Closing balance when it sits on the debit side, else zero.
    pub closing_debit: Decimal,
    /// Closing balance when it sits on the credit side, else zero.
    pub closing_credit: Decimal,
}

/// Trial balance as of a date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialBalanceReport {
    /// Date the balances were taken at.
    pub as_of: NaiveDate,
    /// One row per active account, ordered by code.
    pub rows: Vec<TrialBalanceRow>,
    /// Sum of row debits.
    pub total_debits: Decimal,
    /// Sum of row credits.
    pub total_credits: Decimal,
    /// Sum of debit-side closings.
    pub total_closing_debits: Decimal,
    /// Sum of credit-side closings.
    pub total_closing_credits: Decimal,
}

impl TrialBalanceReport {
    /// The trial balance identity: both column pairs must agree.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.total_debits == self.total_credits
            && self.total_closing_debits == self.total_closing_credits
    }
}

/// One group of a dimension rollup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimensionGroup {
    /// Tag value; `None` collects untagged lines.
    pub value: Option<String>,
    /// Summed debits, base currency.
    pub debits: Decimal,
    /// Summed credits, base currency.
    pub credits: Decimal,
    /// Debits minus credits.
    pub net: Decimal,
}

/// Lines rolled up by one dimension key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimensionRollup {
    /// The tag key grouped by.
    pub key: String,
    /// Groups ordered by value, untagged last.
    pub groups: Vec<DimensionGroup>,
}

/// One account row of a period comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodComparisonRow {
    /// Account identifier.
    pub account_id: AccountId,
    /// Account code.
    pub code: String,
    /// Closing at the current date, base currency, normal-side signed.
    pub current: Decimal,
    /// Closing at the comparison date.
    pub prior: Decimal,
    /// `current - prior`.
    pub change: Decimal,
}

/// Two as-of balance queries stitched side by side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodComparison {
    /// Current as-of date.
    pub current_as_of: NaiveDate,
    /// Comparison as-of date.
    pub prior_as_of: NaiveDate,
    /// One row per account present in either query, ordered by code.
    pub rows: Vec<PeriodComparisonRow>,
}
