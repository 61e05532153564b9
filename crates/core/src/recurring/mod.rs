//! Recurring journal templates and their schedules.
//!
//! Templates hold line shapes and a schedule; the ledger facade
//! instantiates them into draft or posted entries. Runs are keyed by
//! (template, scheduled date) so a retried run never double-books.

pub mod error;
pub mod schedule;
pub mod types;

pub use error::RecurringError;
pub use schedule::Schedule;
pub use types::{
    DayRule, Frequency, RecurringTemplate, TemplateLine, TemplateStatus, VarianceModel,
};
