//! Accounting periods and the open/close state machine.
//!
//! Periods partition the fiscal calendar into calendar months without
//! gaps or overlap. Only open periods accept postings; the close
//! workflow itself lives on the ledger facade, which drives the
//! transitions defined here.

pub mod calendar;
pub mod error;
pub mod types;

pub use calendar::FiscalCalendar;
pub use error::PeriodError;
pub use types::{AccountingPeriod, PeriodState};
