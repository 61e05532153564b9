//! Period-indexed account balances.
//!
//! One bucket per (account, period) holds opening, movements, and
//! closing in both native and base currency. Buckets are mutated only
//! by posting and by period close; everything else reads.

pub mod store;
pub mod types;

pub use store::BalanceStore;
pub use types::{BalanceAsOf, BalanceMismatch, PeriodBalance};
