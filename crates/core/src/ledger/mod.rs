//! The multi-tenant general ledger facade.
//!
//! One [`GeneralLedger`] holds every tenant's ledger behind a
//! per-tenant lock, so a stuck operation in one tenant never blocks
//! another. All mutation goes through here; the engine modules stay
//! pure and are driven by this facade.

mod close;
mod error;
mod intercompany;
mod posting;
mod producers;
mod reporting;
mod tenant;


use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::NaiveDate;
use dashmap::DashMap;
use ledgerkit_shared::{AccountId, PeriodId, TenantId};
use tracing::info;

use crate::clock::{Clock, SystemClock};
use crate::coa::{Account, AccountType, AccountUsage, NewAccount, NormalBalance, UpdateAccount};
use crate::currency::{Currency, ExchangeRate};
use crate::intercompany::IntercompanyTransaction;
use crate::period::{AccountingPeriod, PeriodState};

pub use error::LedgerError;
pub use tenant::TenantConfig;
pub(crate) use tenant::TenantLedger;

/// The multi-tenant ledger facade.
///
/// Tenants are fully isolated: every entity is scoped to one tenant
/// and guarded by that tenant's lock. Intercompany transactions are
/// the one cross-tenant structure and live outside any tenant, keyed
/// separately.
pub struct GeneralLedger {
    tenants: DashMap<TenantId, Arc<Mutex<TenantLedger>>>,
    transactions: Mutex<HashMap<ledgerkit_shared::IntercompanyTxId, IntercompanyTransaction>>,
    clock: Arc<dyn Clock>,
}

impl Default for GeneralLedger {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl GeneralLedger {
    /// Creates a ledger with an injected clock.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            tenants: DashMap::new(),
            transactions: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// The injected clock.
    pub(crate) fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Creates a tenant and returns its id.
    pub fn create_tenant(&self, config: TenantConfig) -> TenantId {
        let id = TenantId::new();
        info!(tenant = %id, base = %config.base_currency.code, "creating tenant");
        self.tenants
            .insert(id, Arc::new(Mutex::new(TenantLedger::new(config))));
        id
    }

    /// Runs a closure under the tenant's lock.
    pub(crate) fn with_tenant<R>(
        &self,
        tenant: TenantId,
        op: impl FnOnce(&mut TenantLedger) -> Result<R, LedgerError>,
    ) -> Result<R, LedgerError> {
        let handle = self
            .tenants
            .get(&tenant)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(LedgerError::TenantNotFound(tenant))?;
        let mut guard = lock_tenant(&handle);
        op(&mut guard)
    }

    /// Grabs the tenant handle for multi-tenant locking.
    pub(crate) fn tenant_handle(
        &self,
        tenant: TenantId,
    ) -> Result<Arc<Mutex<TenantLedger>>, LedgerError> {
        self.tenants
            .get(&tenant)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(LedgerError::TenantNotFound(tenant))
    }

    /// Access to the cross-tenant transaction table.
    pub(crate) fn transactions(
        &self,
    ) -> MutexGuard<'_, HashMap<ledgerkit_shared::IntercompanyTxId, IntercompanyTransaction>> {
        match self.transactions.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    // ---- Chart of accounts ----

    /// Creates an account in a tenant's catalog.
    pub fn create_account(
        &self,
        tenant: TenantId,
        input: NewAccount,
    ) -> Result<AccountId, LedgerError> {
        self.with_tenant(tenant, |ledger| {
            let usages: HashMap<AccountId, AccountUsage> = ledger
                .accounts
                .iter()
                .map(|account| (account.id, ledger.account_usage(account.id)))
                .collect();
            let id = ledger
                .accounts
                .create(input, |account_id| {
                    usages.get(&account_id).copied().unwrap_or_default()
                })?;
            Ok(id)
        })
    }

    /// Applies an update patch to an account.
    pub fn update_account(
        &self,
        tenant: TenantId,
        account: AccountId,
        patch: UpdateAccount,
    ) -> Result<(), LedgerError> {
        self.with_tenant(tenant, |ledger| {
            ledger.accounts.update(account, patch)?;
            Ok(())
        })
    }

    /// Changes an account's type; blocked once posted lines exist.
    pub fn change_account_type(
        &self,
        tenant: TenantId,
        account: AccountId,
        new_type: AccountType,
    ) -> Result<(), LedgerError> {
        self.with_tenant(tenant, |ledger| {
            let usage = ledger.account_usage(account);
            ledger.accounts.change_type(account, new_type, usage)?;
            Ok(())
        })
    }

    /// Deactivates an account; blocked while it carries an open-period
    /// balance.
    pub fn deactivate_account(
        &self,
        tenant: TenantId,
        account: AccountId,
    ) -> Result<(), LedgerError> {
        self.with_tenant(tenant, |ledger| {
            let usage = ledger.account_usage(account);
            ledger.accounts.deactivate(account, usage)?;
            Ok(())
        })
    }

    /// Fetches an account by code.
    pub fn get_account(&self, tenant: TenantId, code: &str) -> Result<Account, LedgerError> {
        self.with_tenant(tenant, |ledger| {
            Ok(ledger.accounts.get_by_code(code)?.clone())
        })
    }

    /// Lists active accounts ordered by code.
    pub fn list_accounts(&self, tenant: TenantId) -> Result<Vec<Account>, LedgerError> {
        self.with_tenant(tenant, |ledger| {
            Ok(ledger.accounts.list_active().into_iter().cloned().collect())
        })
    }

    // ---- Currency ----

    /// Registers a currency with a tenant.
    pub fn register_currency(
        &self,
        tenant: TenantId,
        currency: Currency,
    ) -> Result<(), LedgerError> {
        self.with_tenant(tenant, |ledger| {
            ledger.currencies.register(currency);
            Ok(())
        })
    }

    /// Upserts an exchange rate.
    pub fn upsert_rate(&self, tenant: TenantId, rate: ExchangeRate) -> Result<(), LedgerError> {
        self.with_tenant(tenant, |ledger| {
            ledger.currencies.upsert_rate(rate)?;
            Ok(())
        })
    }

    // ---- Tenant configuration ----

    /// Designates the equity account that receives rolled-up P&L at
    /// close.
    pub fn set_retained_earnings_account(
        &self,
        tenant: TenantId,
        account: AccountId,
    ) -> Result<(), LedgerError> {
        self.with_tenant(tenant, |ledger| {
            ledger.accounts.get(account)?;
            ledger.config.retained_earnings_account = Some(account);
            Ok(())
        })
    }

    /// Designates the tenant's intercompany clearing account.
    pub fn set_intercompany_account(
        &self,
        tenant: TenantId,
        account: AccountId,
    ) -> Result<(), LedgerError> {
        self.with_tenant(tenant, |ledger| {
            ledger.accounts.get(account)?;
            ledger.config.intercompany_account = Some(account);
            Ok(())
        })
    }

    // ---- Fiscal calendar ----

    /// Creates the twelve periods of a fiscal year and opens any whose
    /// start date has already arrived.
    ///
    /// When the period immediately before the new year has already
    /// closed, its closings are carried into the new first period's
    /// openings. Year-end close skips that roll-forward when the next
    /// year does not exist yet, so it has to happen here to keep
    /// opening continuity across the year boundary.
    pub fn create_fiscal_year(
        &self,
        tenant: TenantId,
        year: i32,
    ) -> Result<Vec<PeriodId>, LedgerError> {
        let today = self.clock.today();
        self.with_tenant(tenant, |ledger| {
            let ids = ledger.calendar.create_fiscal_year(year)?;
            if let Some(&first) = ids.first() {
                let prior = ledger
                    .calendar
                    .previous(first)
                    .filter(|p| matches!(p.state, PeriodState::Closed | PeriodState::Locked))
                    .map(|p| p.id);
                if let Some(prior) = prior {
                    let accounts = &ledger.accounts;
                    ledger.balances.roll_forward(prior, first, |account| {
                        accounts
                            .get(account)
                            .map_or(NormalBalance::Debit, |a| a.normal_balance)
                    });
                }
            }
            ledger.calendar.advance_to(today);
            info!(tenant = %tenant, year, "fiscal year created");
            Ok(ids)
        })
    }

    /// Opens future periods whose start date has arrived.
    pub fn advance_calendar(&self, tenant: TenantId) -> Result<usize, LedgerError> {
        let today = self.clock.today();
        self.with_tenant(tenant, |ledger| Ok(ledger.calendar.advance_to(today)))
    }

    /// Lists all periods in calendar order.
    pub fn list_periods(&self, tenant: TenantId) -> Result<Vec<AccountingPeriod>, LedgerError> {
        self.with_tenant(tenant, |ledger| Ok(ledger.calendar.list().to_vec()))
    }

    /// Finds the period containing a date.
    pub fn find_period(
        &self,
        tenant: TenantId,
        date: NaiveDate,
    ) -> Result<AccountingPeriod, LedgerError> {
        self.with_tenant(tenant, |ledger| {
            Ok(ledger.calendar.find_by_date(date)?.clone())
        })
    }
}

/// Locks a tenant, recovering the guard if a previous holder
/// panicked.
pub(crate) fn lock_tenant(handle: &Mutex<TenantLedger>) -> MutexGuard<'_, TenantLedger> {
    match handle.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
