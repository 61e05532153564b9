//! Common type definitions.

pub mod id;
pub mod pagination;

pub use id::{
    AccountId, AllocationRuleId, IntercompanyTxId, JournalEntryId, PeriodId, RecurringTemplateId,
    TenantId,
};
