//! Allocation rule types.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use ledgerkit_shared::{AccountId, AllocationRuleId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::AllocationError;

/// How a rule distributes the source amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationMethod {
    /// Each target takes a percentage; last line absorbs rounding.
    Percentage,
    /// Each target takes a literal amount; totals must match exactly.
    FixedAmount,
    /// Even split; last line absorbs rounding.
    Equal,
    /// Split proportional to weights; highest weight absorbs rounding.
    Weighted,
    /// Each target evaluates an expression; totals must match exactly.
    Formula,
}

/// One target line of an allocation rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationTarget {
    /// Account the allocated share posts to.
    pub account_id: AccountId,
    /// Order of the line within the rule; residual tie-breaker.
    pub line_order: u32,
    /// Share in percent, for [`AllocationMethod::Percentage`].
    pub percentage: Option<Decimal>,
    /// Relative weight, for [`AllocationMethod::Weighted`].
    pub weight: Option<Decimal>,
    /// Literal amount, for [`AllocationMethod::FixedAmount`].
    pub amount: Option<Decimal>,
    /// Expression, for [`AllocationMethod::Formula`].
    pub formula: Option<String>,
    /// Dimension tags stamped onto the generated line.
    pub dimensions: BTreeMap<String, String>,
}

impl AllocationTarget {
    /// A bare target with only account and order.
    #[must_use]
    pub fn new(account_id: AccountId, line_order: u32) -> Self {
        Self {
            account_id,
            line_order,
            percentage: None,
            weight: None,
            amount: None,
            formula: None,
            dimensions: BTreeMap::new(),
        }
    }

    /// Sets the percentage share.
    #[must_use]
    pub fn percent(mut self, percentage: Decimal) -> Self {
        self.percentage = Some(percentage);
        self
    }

    /// Sets the relative weight.
    #[must_use]
    pub fn weighted(mut self, weight: Decimal) -> Self {
        self.weight = Some(weight);
        self
    }

    /// Sets the literal amount.
    #[must_use]
    pub fn fixed(mut self, amount: Decimal) -> Self {
        self.amount = Some(amount);
        self
    }

    /// Sets the formula expression.
    #[must_use]
    pub fn with_formula(mut self, formula: &str) -> Self {
        self.formula = Some(formula.to_string());
        self
    }
}

/// An allocation rule: source selector, method, and target lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationRule {
    /// Opaque identifier.
    pub id: AllocationRuleId,
    /// Display name.
    pub name: String,
    /// Distribution method.
    pub method: AllocationMethod,
    /// Account whose amount is being redistributed.
    pub source_account: AccountId,
    /// Optional dimension filter on source lines.
    pub source_dimensions: BTreeMap<String, String>,
    /// Target lines, in `line_order`.
    pub targets: Vec<AllocationTarget>,
    /// First date the rule applies, inclusive.
    pub effective_from: Option<NaiveDate>,
    /// Last date the rule applies, inclusive.
    pub effective_to: Option<NaiveDate>,
    /// Relative priority when several rules match a source.
    pub priority: i32,
}

impl AllocationRule {
    /// Creates a rule with default window and priority.
    #[must_use]
    pub fn new(
        name: &str,
        method: AllocationMethod,
        source_account: AccountId,
        targets: Vec<AllocationTarget>,
    ) -> Self {
        Self {
            id: AllocationRuleId::new(),
            name: name.to_string(),
            method,
            source_account,
            source_dimensions: BTreeMap::new(),
            targets,
            effective_from: None,
            effective_to: None,
            priority: 0,
        }
    }

    /// Whether the rule is in effect on a date.
    #[must_use]
    pub fn is_effective(&self, date: NaiveDate) -> bool {
        self.effective_from.is_none_or(|from| from <= date)
            && self.effective_to.is_none_or(|to| date <= to)
    }

    /// Structural validation of the rule against its method.
    pub fn validate(&self) -> Result<(), AllocationError> {
        if self.targets.is_empty() {
            return Err(AllocationError::EmptyTargets);
        }
        match self.method {
            AllocationMethod::Percentage => {
                let mut total = Decimal::ZERO;
                for target in &self.targets {
                    let pct = target
                        .percentage
                        .ok_or(AllocationError::MissingPercentage(target.line_order))?;
                    total += pct;
                }
                if (total - Decimal::ONE_HUNDRED).abs() > Decimal::new(1, 2) {
                    return Err(AllocationError::InvalidPercentageTotal(total));
                }
            }
            AllocationMethod::FixedAmount => {
                for target in &self.targets {
                    if target.amount.is_none() {
                        return Err(AllocationError::MissingAmount(target.line_order));
                    }
                }
            }
            AllocationMethod::Equal => {}
            AllocationMethod::Weighted => {
                let mut total = Decimal::ZERO;
                for target in &self.targets {
                    let weight = target
                        .weight
                        .ok_or(AllocationError::MissingWeight(target.line_order))?;
                    if weight < Decimal::ZERO {
                        return Err(AllocationError::NegativeWeight(target.line_order));
                    }
                    total += weight;
                }
                if total.is_zero() {
                    return Err(AllocationError::ZeroWeightTotal);
                }
            }
            AllocationMethod::Formula => {
                for target in &self.targets {
                    if target.formula.is_none() {
                        return Err(AllocationError::MissingFormula(target.line_order));
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn targets_pct(percentages: &[Decimal]) -> Vec<AllocationTarget> {
        percentages
            .iter()
            .enumerate()
            .map(|(i, &p)| {
                AllocationTarget::new(AccountId::new(), u32::try_from(i).unwrap() + 1).percent(p)
            })
            .collect()
    }

    #[test]
    fn percentage_total_within_tolerance_accepted() {
        let rule = AllocationRule::new(
            "split",
            AllocationMethod::Percentage,
            AccountId::new(),
            targets_pct(&[dec!(33.33), dec!(33.33), dec!(33.34)]),
        );
        assert!(rule.validate().is_ok());
    }

    #[test]
    fn percentage_total_off_by_more_than_a_basis_point_rejected() {
        let rule = AllocationRule::new(
            "split",
            AllocationMethod::Percentage,
            AccountId::new(),
            targets_pct(&[dec!(50), dec!(49.98)]),
        );
        assert!(matches!(
            rule.validate(),
            Err(AllocationError::InvalidPercentageTotal(total)) if total == dec!(99.98)
        ));
    }

    #[test]
    fn weighted_rule_needs_positive_total() {
        let targets = vec![
            AllocationTarget::new(AccountId::new(), 1).weighted(dec!(0)),
            AllocationTarget::new(AccountId::new(), 2).weighted(dec!(0)),
        ];
        let rule =
            AllocationRule::new("w", AllocationMethod::Weighted, AccountId::new(), targets);
        assert!(matches!(rule.validate(), Err(AllocationError::ZeroWeightTotal)));
    }

    #[test]
    fn effective_window_is_inclusive() {
        let mut rule = AllocationRule::new(
            "split",
            AllocationMethod::Equal,
            AccountId::new(),
            vec![AllocationTarget::new(AccountId::new(), 1)],
        );
        rule.effective_from = NaiveDate::from_ymd_opt(2024, 1, 1);
        rule.effective_to = NaiveDate::from_ymd_opt(2024, 12, 31);

        assert!(rule.is_effective(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()));
        assert!(rule.is_effective(NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()));
        assert!(!rule.is_effective(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()));
    }
}
