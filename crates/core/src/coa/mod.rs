//! Chart of accounts.
//!
//! The account catalog against which journal lines are recorded:
//! account types, normal-balance rules, the postable/rollup hierarchy,
//! and the lifecycle rules that keep posted history referentially
//! sound.

pub mod error;
pub mod service;
pub mod types;

pub use error::CoaError;
pub use service::{AccountUsage, ChartOfAccounts, NewAccount, UpdateAccount};
pub use types::{Account, AccountStatus, AccountType, NormalBalance};
