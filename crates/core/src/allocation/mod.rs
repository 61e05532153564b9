//! Rule-driven redistribution of a source amount across target
//! accounts.
//!
//! A rule names a method (percentage, fixed, equal, weighted, formula)
//! and target lines; a run produces one amount per target whose sum is
//! exactly the source amount. Residual handling differs by method and
//! is the whole point of this module.

pub mod error;
pub mod formula;
pub mod spread;
pub mod types;

pub use error::AllocationError;
pub use formula::{evaluate_formula, FormulaError};
pub use spread::allocate;
pub use types::{AllocationMethod, AllocationRule, AllocationTarget};
