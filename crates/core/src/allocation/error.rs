//! Allocation engine error types.

use ledgerkit_shared::AllocationRuleId;
use rust_decimal::Decimal;
use thiserror::Error;

use super::formula::FormulaError;

/// Errors raised by rule validation and allocation runs.
#[derive(Debug, Error)]
pub enum AllocationError {
    /// No rule with this id.
    #[error("Allocation rule not found: {0}")]
    RuleNotFound(AllocationRuleId),

    /// A rule needs at least one target line.
    #[error("Allocation rule has no target lines")]
    EmptyTargets,

    /// Percentage targets must sum to 100.
    #[error("Target percentages sum to {0}, expected 100")]
    InvalidPercentageTotal(Decimal),

    /// Percentage method requires a percentage on every target.
    #[error("Target line {0} has no percentage")]
    MissingPercentage(u32),

    /// Weighted method requires a weight on every target.
    #[error("Target line {0} has no weight")]
    MissingWeight(u32),

    /// Weights must be non-negative.
    #[error("Target line {0} has a negative weight")]
    NegativeWeight(u32),

    /// Weighted method requires a positive weight total.
    #[error("Target weights sum to zero")]
    ZeroWeightTotal,

    /// Fixed method requires an amount on every target.
    #[error("Target line {0} has no amount")]
    MissingAmount(u32),

    /// Formula method requires an expression on every target.
    #[error("Target line {0} has no formula")]
    MissingFormula(u32),

    /// Target amounts do not sum to the source amount.
    #[error("Allocated total {allocated} does not match source amount {expected}")]
    AllocationMismatch {
        /// The amount being redistributed.
        expected: Decimal,
        /// What the targets summed to.
        allocated: Decimal,
    },

    /// A target formula failed to parse or evaluate.
    #[error("Formula error on target line {line_order}: {inner}")]
    Formula {
        /// Target line the formula belongs to.
        line_order: u32,
        /// The underlying parse or evaluation failure.
        inner: FormulaError,
    },

    /// The rule is outside its effective window.
    #[error("Allocation rule {0} is not effective on the run date")]
    RuleNotEffective(AllocationRuleId),

    /// The source selection nets to zero.
    #[error("Source selection nets to zero; nothing to allocate")]
    ZeroSource,
}

impl AllocationError {
    /// Returns a stable error code for callers that map errors onward.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::RuleNotFound(_) => "RULE_NOT_FOUND",
            Self::EmptyTargets => "EMPTY_TARGETS",
            Self::InvalidPercentageTotal(_) => "INVALID_PERCENTAGE_TOTAL",
            Self::MissingPercentage(_) => "MISSING_PERCENTAGE",
            Self::MissingWeight(_) => "MISSING_WEIGHT",
            Self::NegativeWeight(_) => "NEGATIVE_WEIGHT",
            Self::ZeroWeightTotal => "ZERO_WEIGHT_TOTAL",
            Self::MissingAmount(_) => "MISSING_AMOUNT",
            Self::MissingFormula(_) => "MISSING_FORMULA",
            Self::AllocationMismatch { .. } => "ALLOCATION_MISMATCH",
            Self::Formula { .. } => "FORMULA_ERROR",
            Self::RuleNotEffective(_) => "RULE_NOT_EFFECTIVE",
            Self::ZeroSource => "ZERO_SOURCE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn mismatch_message_carries_both_totals() {
        let err = AllocationError::AllocationMismatch {
            expected: dec!(100.00),
            allocated: dec!(99.99),
        };
        assert_eq!(
            err.to_string(),
            "Allocated total 99.99 does not match source amount 100.00"
        );
        assert_eq!(err.error_code(), "ALLOCATION_MISMATCH");
    }
}
