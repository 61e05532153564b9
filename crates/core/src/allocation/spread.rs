//! The per-method spread computations.

use std::collections::HashMap;

use rust_decimal::Decimal;

use super::error::AllocationError;
use super::formula::evaluate_formula;
use super::types::{AllocationMethod, AllocationRule};
use crate::currency::round_to_scale;

/// Computes one amount per target, in the rule's target order.
///
/// The returned amounts always sum to exactly `source` (that is the
/// conservation invariant every method upholds). Rounding residuals go
/// to the last line for percentage and equal splits, and to the
/// highest-weight line for weighted splits; fixed and formula methods
/// must already sum exactly or the run fails.
///
/// `vars` feeds formula evaluation; `source` is always bound.
pub fn allocate(
    rule: &AllocationRule,
    source: Decimal,
    scale: u32,
    vars: &HashMap<String, Decimal>,
) -> Result<Vec<Decimal>, AllocationError> {
    rule.validate()?;
    match rule.method {
        AllocationMethod::Percentage => Ok(spread_percentage(rule, source, scale)),
        AllocationMethod::Equal => Ok(spread_equal(rule, source, scale)),
        AllocationMethod::FixedAmount => spread_fixed(rule, source),
        AllocationMethod::Weighted => Ok(spread_weighted(rule, source, scale)),
        AllocationMethod::Formula => spread_formula(rule, source, scale, vars),
    }
}

fn spread_percentage(rule: &AllocationRule, source: Decimal, scale: u32) -> Vec<Decimal> {
    let mut amounts = Vec::with_capacity(rule.targets.len());
    let mut allocated = Decimal::ZERO;
    for (index, target) in rule.targets.iter().enumerate() {
        let amount = if index + 1 == rule.targets.len() {
            source - allocated
        } else {
            let pct = target.percentage.unwrap_or_default();
            round_to_scale(source * pct / Decimal::ONE_HUNDRED, scale)
        };
        allocated += amount;
        amounts.push(amount);
    }
    amounts
}

fn spread_equal(rule: &AllocationRule, source: Decimal, scale: u32) -> Vec<Decimal> {
    let count = rule.targets.len();
    let share = round_to_scale(source / Decimal::from(count), scale);
    let mut amounts = vec![share; count];
    if let Some(last) = amounts.last_mut() {
        *last = source - share * Decimal::from(count - 1);
    }
    amounts
}

fn spread_fixed(rule: &AllocationRule, source: Decimal) -> Result<Vec<Decimal>, AllocationError> {
    let amounts: Vec<Decimal> = rule
        .targets
        .iter()
        .map(|t| t.amount.unwrap_or_default())
        .collect();
    let allocated: Decimal = amounts.iter().copied().sum();
    if allocated != source {
        return Err(AllocationError::AllocationMismatch {
            expected: source,
            allocated,
        });
    }
    Ok(amounts)
}

fn spread_weighted(rule: &AllocationRule, source: Decimal, scale: u32) -> Vec<Decimal> {
    let total: Decimal = rule
        .targets
        .iter()
        .map(|t| t.weight.unwrap_or_default())
        .sum();
    let mut amounts: Vec<Decimal> = rule
        .targets
        .iter()
        .map(|t| round_to_scale(source * t.weight.unwrap_or_default() / total, scale))
        .collect();

    let allocated: Decimal = amounts.iter().copied().sum();
    let residual = source - allocated;
    if !residual.is_zero() {
        // Highest weight absorbs; ties go to the lowest line_order.
        if let Some(absorber) = rule
            .targets
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| {
                a.weight
                    .unwrap_or_default()
                    .cmp(&b.weight.unwrap_or_default())
                    .then(b.line_order.cmp(&a.line_order))
            })
            .map(|(index, _)| index)
        {
            amounts[absorber] += residual;
        }
    }
    amounts
}

fn spread_formula(
    rule: &AllocationRule,
    source: Decimal,
    scale: u32,
    vars: &HashMap<String, Decimal>,
) -> Result<Vec<Decimal>, AllocationError> {
    let mut bound = vars.clone();
    bound.insert("source".to_string(), source);

    let mut amounts = Vec::with_capacity(rule.targets.len());
    for target in &rule.targets {
        let formula = target.formula.as_deref().unwrap_or_default();
        let value = evaluate_formula(formula, &bound).map_err(|inner| {
            AllocationError::Formula {
                line_order: target.line_order,
                inner,
            }
        })?;
        amounts.push(round_to_scale(value, scale));
    }

    let allocated: Decimal = amounts.iter().copied().sum();
    if allocated != source {
        return Err(AllocationError::AllocationMismatch {
            expected: source,
            allocated,
        });
    }
    Ok(amounts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::types::AllocationTarget;
    use ledgerkit_shared::AccountId;
    use rust_decimal_macros::dec;

    fn no_vars() -> HashMap<String, Decimal> {
        HashMap::new()
    }

    fn pct_rule(percentages: &[Decimal]) -> AllocationRule {
        let targets = percentages
            .iter()
            .enumerate()
            .map(|(i, &p)| {
                AllocationTarget::new(AccountId::new(), u32::try_from(i).unwrap() + 1).percent(p)
            })
            .collect();
        AllocationRule::new("pct", AllocationMethod::Percentage, AccountId::new(), targets)
    }

    #[test]
    fn percentage_last_line_absorbs_residual() {
        // 33.33 / 33.33 / 33.34 over 100.00
        let rule = pct_rule(&[dec!(33.33), dec!(33.33), dec!(33.34)]);
        let amounts = allocate(&rule, dec!(100.00), 2, &no_vars()).unwrap();
        assert_eq!(amounts, vec![dec!(33.33), dec!(33.33), dec!(33.34)]);
        assert_eq!(amounts.iter().copied().sum::<Decimal>(), dec!(100.00));
    }

    #[test]
    fn percentage_residual_can_be_negative() {
        let rule = pct_rule(&[dec!(66.67), dec!(33.33)]);
        let amounts = allocate(&rule, dec!(0.01), 2, &no_vars()).unwrap();
        assert_eq!(amounts, vec![dec!(0.01), dec!(0.00)]);
    }

    #[test]
    fn equal_split_last_line_absorbs() {
        let targets = (1..=3)
            .map(|i| AllocationTarget::new(AccountId::new(), i))
            .collect();
        let rule = AllocationRule::new("eq", AllocationMethod::Equal, AccountId::new(), targets);
        let amounts = allocate(&rule, dec!(100.00), 2, &no_vars()).unwrap();
        assert_eq!(amounts, vec![dec!(33.33), dec!(33.33), dec!(33.34)]);
    }

    #[test]
    fn fixed_amounts_must_sum_exactly() {
        let targets = vec![
            AllocationTarget::new(AccountId::new(), 1).fixed(dec!(60.00)),
            AllocationTarget::new(AccountId::new(), 2).fixed(dec!(40.00)),
        ];
        let rule =
            AllocationRule::new("fix", AllocationMethod::FixedAmount, AccountId::new(), targets);
        assert_eq!(
            allocate(&rule, dec!(100.00), 2, &no_vars()).unwrap(),
            vec![dec!(60.00), dec!(40.00)]
        );

        let err = allocate(&rule, dec!(99.00), 2, &no_vars()).unwrap_err();
        assert!(matches!(
            err,
            AllocationError::AllocationMismatch { allocated, .. } if allocated == dec!(100.00)
        ));
    }

    #[test]
    fn weighted_residual_goes_to_highest_weight() {
        let targets = vec![
            AllocationTarget::new(AccountId::new(), 1).weighted(dec!(1)),
            AllocationTarget::new(AccountId::new(), 2).weighted(dec!(1)),
            AllocationTarget::new(AccountId::new(), 3).weighted(dec!(1)),
        ];
        let rule =
            AllocationRule::new("w", AllocationMethod::Weighted, AccountId::new(), targets);
        // 100 / 3 rounds to 33.33 each; residual 0.01 goes to line 1
        // (all weights tie, lowest line_order wins).
        let amounts = allocate(&rule, dec!(100.00), 2, &no_vars()).unwrap();
        assert_eq!(amounts, vec![dec!(33.34), dec!(33.33), dec!(33.33)]);
    }

    #[test]
    fn weighted_residual_prefers_heaviest_line() {
        let targets = vec![
            AllocationTarget::new(AccountId::new(), 1).weighted(dec!(1)),
            AllocationTarget::new(AccountId::new(), 2).weighted(dec!(2)),
        ];
        let rule =
            AllocationRule::new("w", AllocationMethod::Weighted, AccountId::new(), targets);
        // 1/3 of 100.00 = 33.33, 2/3 = 66.67; sums exactly, no residual.
        assert_eq!(
            allocate(&rule, dec!(100.00), 2, &no_vars()).unwrap(),
            vec![dec!(33.33), dec!(66.67)]
        );
        // 0.05: shares 0.02 / 0.03 round from 0.0166 / 0.0333.
        let amounts = allocate(&rule, dec!(0.05), 2, &no_vars()).unwrap();
        assert_eq!(amounts.iter().copied().sum::<Decimal>(), dec!(0.05));
    }

    #[test]
    fn formula_split_binds_source() {
        let targets = vec![
            AllocationTarget::new(AccountId::new(), 1).with_formula("source * 0.6"),
            AllocationTarget::new(AccountId::new(), 2).with_formula("source * 0.4"),
        ];
        let rule =
            AllocationRule::new("f", AllocationMethod::Formula, AccountId::new(), targets);
        assert_eq!(
            allocate(&rule, dec!(100.00), 2, &no_vars()).unwrap(),
            vec![dec!(60.00), dec!(40.00)]
        );
    }

    #[test]
    fn formula_that_does_not_conserve_fails() {
        let targets = vec![
            AllocationTarget::new(AccountId::new(), 1).with_formula("source * 0.5"),
            AllocationTarget::new(AccountId::new(), 2).with_formula("source * 0.4"),
        ];
        let rule =
            AllocationRule::new("f", AllocationMethod::Formula, AccountId::new(), targets);
        assert!(matches!(
            allocate(&rule, dec!(100.00), 2, &no_vars()),
            Err(AllocationError::AllocationMismatch { .. })
        ));
    }

    #[test]
    fn formula_parse_failure_names_the_line() {
        let targets = vec![
            AllocationTarget::new(AccountId::new(), 1).with_formula("source * 0.5"),
            AllocationTarget::new(AccountId::new(), 2).with_formula("source *"),
        ];
        let rule =
            AllocationRule::new("f", AllocationMethod::Formula, AccountId::new(), targets);
        assert!(matches!(
            allocate(&rule, dec!(100.00), 2, &no_vars()),
            Err(AllocationError::Formula { line_order: 2, .. })
        ));
    }
}

#[cfg(test)]
mod props {
    use super::*;
    use crate::allocation::types::AllocationTarget;
    use ledgerkit_shared::AccountId;
    use proptest::prelude::*;

    fn cents(max_units: i64) -> impl Strategy<Value = Decimal> {
        (1i64..=max_units).prop_map(|n| Decimal::new(n, 2))
    }

    proptest! {
        #[test]
        fn equal_split_conserves_source(
            source in cents(10_000_000),
            count in 1usize..=12,
        ) {
            let targets = (1..=count)
                .map(|i| AllocationTarget::new(AccountId::new(), u32::try_from(i).unwrap()))
                .collect();
            let rule = AllocationRule::new(
                "eq",
                AllocationMethod::Equal,
                AccountId::new(),
                targets,
            );
            let amounts = allocate(&rule, source, 2, &std::collections::HashMap::new()).unwrap();
            prop_assert_eq!(amounts.iter().copied().sum::<Decimal>(), source);
        }

        #[test]
        fn weighted_split_conserves_source(
            source in cents(10_000_000),
            weights in proptest::collection::vec(1u32..=1000, 1..=10),
        ) {
            let targets = weights
                .iter()
                .enumerate()
                .map(|(i, &w)| {
                    AllocationTarget::new(AccountId::new(), u32::try_from(i).unwrap() + 1)
                        .weighted(Decimal::from(w))
                })
                .collect();
            let rule = AllocationRule::new(
                "w",
                AllocationMethod::Weighted,
                AccountId::new(),
                targets,
            );
            let amounts = allocate(&rule, source, 2, &std::collections::HashMap::new()).unwrap();
            prop_assert_eq!(amounts.iter().copied().sum::<Decimal>(), source);
        }
    }
}
