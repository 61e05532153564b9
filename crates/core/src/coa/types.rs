//! Account domain types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ledgerkit_shared::types::AccountId;

/// High-level account classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    /// Resources owned (cash, receivables, inventory).
    Asset,
    /// Obligations owed (payables, loans).
    Liability,
    /// Owner's residual interest (capital, retained earnings).
    Equity,
    /// Income earned.
    Revenue,
    /// Costs incurred.
    Expense,
}

impl AccountType {
    /// Returns the standard normal balance for this account type.
    ///
    /// Asset/Expense accounts are debit-normal; Liability/Equity/Revenue
    /// accounts are credit-normal.
    #[must_use]
    pub const fn default_normal_balance(self) -> NormalBalance {
        match self {
            Self::Asset | Self::Expense => NormalBalance::Debit,
            Self::Liability | Self::Equity | Self::Revenue => NormalBalance::Credit,
        }
    }

    /// Returns true for profit-and-loss accounts (rolled up at close).
    #[must_use]
    pub const fn is_profit_and_loss(self) -> bool {
        matches!(self, Self::Revenue | Self::Expense)
    }
}

/// The side on which an account's balance normally sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalBalance {
    /// Debit-normal: balance grows with debits.
    Debit,
    /// Credit-normal: balance grows with credits.
    Credit,
}

impl NormalBalance {
    /// Returns the balance change for a (debit, credit) movement.
    ///
    /// Debit-normal: `debit - credit`; credit-normal: `credit - debit`.
    #[must_use]
    pub fn signed_change(self, debit: Decimal, credit: Decimal) -> Decimal {
        match self {
            Self::Debit => debit - credit,
            Self::Credit => credit - debit,
        }
    }
}

/// Account lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    /// Account accepts postings (if postable).
    Active,
    /// Account is retired; no new postings.
    Inactive,
}

/// An entry in the chart of accounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier.
    pub id: AccountId,
    /// Tenant-unique account code (e.g. "1000").
    pub code: String,
    /// Display name (e.g. "Cash").
    pub name: String,
    /// Account classification.
    pub account_type: AccountType,
    /// Normal balance side (defaults from the type, overridable).
    pub normal_balance: NormalBalance,
    /// Parent account for rollup hierarchies.
    pub parent: Option<AccountId>,
    /// Whether journal lines may post directly to this account.
    ///
    /// Non-postable accounts are rollup nodes and never carry lines.
    pub is_postable: bool,
    /// Lifecycle status.
    pub status: AccountStatus,
    /// Currency this account is kept in, when single-currency.
    pub default_currency: Option<String>,
    /// Optimistic concurrency version, bumped on every update.
    pub version: i64,
}

impl Account {
    /// Returns true if the account is active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(AccountType::Asset, NormalBalance::Debit)]
    #[case(AccountType::Expense, NormalBalance::Debit)]
    #[case(AccountType::Liability, NormalBalance::Credit)]
    #[case(AccountType::Equity, NormalBalance::Credit)]
    #[case(AccountType::Revenue, NormalBalance::Credit)]
    fn default_normal_balance_follows_standard_table(
        #[case] account_type: AccountType,
        #[case] expected: NormalBalance,
    ) {
        assert_eq!(account_type.default_normal_balance(), expected);
    }

    #[test]
    fn profit_and_loss_classification() {
        assert!(AccountType::Revenue.is_profit_and_loss());
        assert!(AccountType::Expense.is_profit_and_loss());
        assert!(!AccountType::Asset.is_profit_and_loss());
        assert!(!AccountType::Liability.is_profit_and_loss());
        assert!(!AccountType::Equity.is_profit_and_loss());
    }

    #[test]
    fn debit_normal_signed_change() {
        let nb = NormalBalance::Debit;
        assert_eq!(nb.signed_change(dec!(100), dec!(0)), dec!(100));
        assert_eq!(nb.signed_change(dec!(0), dec!(50)), dec!(-50));
        assert_eq!(nb.signed_change(dec!(100), dec!(30)), dec!(70));
    }

    #[test]
    fn credit_normal_signed_change() {
        let nb = NormalBalance::Credit;
        assert_eq!(nb.signed_change(dec!(0), dec!(100)), dec!(100));
        assert_eq!(nb.signed_change(dec!(50), dec!(0)), dec!(-50));
        assert_eq!(nb.signed_change(dec!(30), dec!(100)), dec!(70));
    }
}
