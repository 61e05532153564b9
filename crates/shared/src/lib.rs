//! Shared types for LedgerKit.
//!
//! This crate provides common types used across the workspace:
//! - Typed IDs for type-safe entity references
//! - Pagination types for list queries

pub mod types;

pub use types::id::{
    AccountId, AllocationRuleId, IntercompanyTxId, JournalEntryId, PeriodId, RecurringTemplateId,
    TenantId,
};
pub use types::pagination::{PageMeta, PageRequest, PageResponse};
