//! Paired journals across two tenants.
//!
//! An intercompany transaction owns both sides: two balanced entries,
//! one per tenant, that draft, approve, and post together. The pairing
//! record lives outside any single tenant; the facade drives it under
//! a two-tenant lock.

pub mod error;
pub mod types;

pub use error::IntercompanyError;
pub use types::{IcState, IntercompanyTransaction, ReconciliationReport};
