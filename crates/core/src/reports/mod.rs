//! Reporting primitives: trial balance, dimension rollup, period
//! comparison.
//!
//! Everything here is a pure read; the facade gathers the figures and
//! these builders assemble them. Nothing in this module mutates
//! balances or entries.

pub mod service;
pub mod types;

pub use service::{dimension_rollup, period_comparison, trial_balance};
pub use types::{
    AccountFigures, DimensionGroup, DimensionRollup, PeriodComparison, PeriodComparisonRow,
    TrialBalanceReport, TrialBalanceRow,
};
