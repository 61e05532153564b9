//! Double-entry journal types and validation.
//!
//! Entries are created as drafts, optionally flow through approval,
//! and become immutable once posted. Posting itself lives on the
//! ledger facade; this module owns the data shapes, the state
//! machine, and the pure balance checks.

pub mod error;
pub mod types;
pub mod validation;

pub use error::JournalError;
pub use types::{
    DraftEntry, EntryFilter, EntryType, JournalEntry, JournalLine, JournalSource, JournalState,
    LineInput,
};
pub use validation::{balance_tolerance, check_balance, validate_lines};
