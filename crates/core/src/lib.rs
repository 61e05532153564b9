//! General ledger core for LedgerKit.
//!
//! This crate contains pure business logic with ZERO web or database
//! dependencies. Callers own transport, authentication, and durable
//! storage; this crate owns double-entry correctness.
//!
//! # Modules
//!
//! - `coa` - Chart of accounts and normal-balance rules
//! - `currency` - Currencies, exchange rates, and translation
//! - `journal` - Journal entry domain types and validation
//! - `balance` - Period-indexed account balances
//! - `period` - Accounting periods and the close state machine
//! - `recurring` - Templated recurring journals
//! - `allocation` - Rule-driven amount redistribution
//! - `intercompany` - Paired journals across two tenants
//! - `reports` - Trial balance and balance query primitives
//! - `ledger` - The multi-tenant facade tying the engines together

pub mod allocation;
pub mod balance;
pub mod clock;
pub mod coa;
pub mod currency;
pub mod intercompany;
pub mod journal;
pub mod ledger;
pub mod period;
pub mod recurring;
pub mod reports;

pub use clock::{Clock, FixedClock, SystemClock};
pub use ledger::{GeneralLedger, TenantConfig};
