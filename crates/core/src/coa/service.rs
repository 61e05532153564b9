//! Chart of accounts catalog and lifecycle rules.

use std::collections::HashMap;

use rust_decimal::Decimal;
use ledgerkit_shared::types::AccountId;

use super::error::CoaError;
use super::types::{Account, AccountStatus, AccountType, NormalBalance};

/// Input for creating a new account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    /// Tenant-unique account code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Account classification.
    pub account_type: AccountType,
    /// Normal balance override; defaults from the type when `None`.
    pub normal_balance: Option<NormalBalance>,
    /// Parent account (must be a non-postable rollup node).
    pub parent: Option<AccountId>,
    /// Whether journal lines may post directly to this account.
    pub is_postable: bool,
    /// Currency this account is kept in, when single-currency.
    pub default_currency: Option<String>,
}

impl NewAccount {
    /// Convenience constructor for a postable leaf account.
    #[must_use]
    pub fn postable(code: &str, name: &str, account_type: AccountType) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
            account_type,
            normal_balance: None,
            parent: None,
            is_postable: true,
            default_currency: None,
        }
    }

    /// Sets the account's single currency.
    #[must_use]
    pub fn with_currency(mut self, currency: &str) -> Self {
        self.default_currency = Some(currency.to_string());
        self
    }
}

/// Patch for updating an existing account.
///
/// `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateAccount {
    /// New display name.
    pub name: Option<String>,
    /// New parent (must be a non-postable rollup node).
    pub parent: Option<AccountId>,
    /// New single currency.
    pub default_currency: Option<String>,
    /// Optimistic concurrency check: reject if the stored version differs.
    pub expected_version: Option<i64>,
}

/// Usage facts about an account, supplied by the ledger.
///
/// The catalog itself does not see journal lines or balances, so
/// callers pass in what the lifecycle rules need.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccountUsage {
    /// True if any journal line (any state) references the account.
    pub has_lines: bool,
    /// True if any posted journal line references the account.
    pub has_posted_lines: bool,
    /// Balance in the current open period, base currency.
    pub open_period_balance: Decimal,
}

/// The account catalog for one tenant.
#[derive(Debug, Default)]
pub struct ChartOfAccounts {
    accounts: HashMap<AccountId, Account>,
    by_code: HashMap<String, AccountId>,
}

impl ChartOfAccounts {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an account.
    ///
    /// A code held by an inactive account that has never carried journal
    /// lines may be reused; the stale record is dropped. Codes referenced
    /// by lines are never released.
    pub fn create(
        &mut self,
        input: NewAccount,
        usage_of: impl Fn(AccountId) -> AccountUsage,
    ) -> Result<AccountId, CoaError> {
        if let Some(&existing_id) = self.by_code.get(&input.code) {
            let existing = &self.accounts[&existing_id];
            if existing.is_active() {
                return Err(CoaError::DuplicateCode(input.code));
            }
            if usage_of(existing_id).has_lines {
                return Err(CoaError::InUseByPostedLines(input.code));
            }
            // Stale inactive account with no history: release the code.
            self.accounts.remove(&existing_id);
            self.by_code.remove(&input.code);
        }

        if let Some(parent_id) = input.parent {
            self.check_parent(&input.code, parent_id, None)?;
        }

        let id = AccountId::new();
        let normal_balance = input
            .normal_balance
            .unwrap_or_else(|| input.account_type.default_normal_balance());
        let account = Account {
            id,
            code: input.code.clone(),
            name: input.name,
            account_type: input.account_type,
            normal_balance,
            parent: input.parent,
            is_postable: input.is_postable,
            status: AccountStatus::Active,
            default_currency: input.default_currency,
            version: 1,
        };
        self.by_code.insert(input.code, id);
        self.accounts.insert(id, account);
        Ok(id)
    }

    /// Fetches an account by id.
    pub fn get(&self, id: AccountId) -> Result<&Account, CoaError> {
        self.accounts
            .get(&id)
            .ok_or_else(|| CoaError::AccountNotFound(id.to_string()))
    }

    /// Fetches an account by code.
    pub fn get_by_code(&self, code: &str) -> Result<&Account, CoaError> {
        self.by_code
            .get(code)
            .and_then(|id| self.accounts.get(id))
            .ok_or_else(|| CoaError::AccountNotFound(code.to_string()))
    }

    /// Lists active accounts ordered by code.
    #[must_use]
    pub fn list_active(&self) -> Vec<&Account> {
        let mut active: Vec<&Account> =
            self.accounts.values().filter(|a| a.is_active()).collect();
        active.sort_by(|a, b| a.code.cmp(&b.code));
        active
    }

    /// Iterates over all accounts, any status.
    pub fn iter(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    /// Applies an update patch to an account.
    pub fn update(&mut self, id: AccountId, patch: UpdateAccount) -> Result<(), CoaError> {
        let current = self.get(id)?;
        if let Some(expected) = patch.expected_version {
            if current.version != expected {
                return Err(CoaError::ConcurrentUpdate {
                    code: current.code.clone(),
                    expected,
                    actual: current.version,
                });
            }
        }
        let code = current.code.clone();
        if let Some(parent_id) = patch.parent {
            self.check_parent(&code, parent_id, Some(id))?;
        }

        let account = self
            .accounts
            .get_mut(&id)
            .ok_or_else(|| CoaError::AccountNotFound(id.to_string()))?;
        if let Some(name) = patch.name {
            account.name = name;
        }
        if let Some(parent) = patch.parent {
            account.parent = Some(parent);
        }
        if let Some(currency) = patch.default_currency {
            account.default_currency = Some(currency);
        }
        account.version += 1;
        Ok(())
    }

    /// Changes an account's type.
    ///
    /// Blocked once any posted journal line exists for the account; the
    /// normal balance is re-derived from the new type.
    pub fn change_type(
        &mut self,
        id: AccountId,
        new_type: AccountType,
        usage: AccountUsage,
    ) -> Result<(), CoaError> {
        let account = self
            .accounts
            .get_mut(&id)
            .ok_or_else(|| CoaError::AccountNotFound(id.to_string()))?;
        if usage.has_posted_lines {
            return Err(CoaError::TypeChangeNotAllowed(account.code.clone()));
        }
        account.account_type = new_type;
        account.normal_balance = new_type.default_normal_balance();
        account.version += 1;
        Ok(())
    }

    /// Deactivates an account.
    ///
    /// Blocked while the account carries a non-zero balance in the
    /// current open period.
    pub fn deactivate(&mut self, id: AccountId, usage: AccountUsage) -> Result<(), CoaError> {
        let account = self
            .accounts
            .get_mut(&id)
            .ok_or_else(|| CoaError::AccountNotFound(id.to_string()))?;
        if !usage.open_period_balance.is_zero() {
            return Err(CoaError::NonZeroBalance(account.code.clone()));
        }
        account.status = AccountStatus::Inactive;
        account.version += 1;
        Ok(())
    }

    /// Validates a parent reference: it must exist, be a rollup node,
    /// and not create a cycle through `child`.
    fn check_parent(
        &self,
        child_code: &str,
        parent_id: AccountId,
        child: Option<AccountId>,
    ) -> Result<(), CoaError> {
        let Some(parent) = self.accounts.get(&parent_id) else {
            return Err(CoaError::InvalidParent {
                code: child_code.to_string(),
                reason: "parent account does not exist".to_string(),
            });
        };
        if parent.is_postable {
            return Err(CoaError::InvalidParent {
                code: child_code.to_string(),
                reason: format!("parent {} is postable and cannot have children", parent.code),
            });
        }
        if let Some(child_id) = child {
            // Walk up from the proposed parent; hitting the child means a cycle.
            let mut cursor = Some(parent_id);
            while let Some(current) = cursor {
                if current == child_id {
                    return Err(CoaError::InvalidParent {
                        code: child_code.to_string(),
                        reason: "parent chain forms a cycle".to_string(),
                    });
                }
                cursor = self.accounts.get(&current).and_then(|a| a.parent);
            }
        }
        Ok(())
    }
}
