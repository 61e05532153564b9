//! Pure structural validation for journal entries.

use rust_decimal::Decimal;

use super::error::JournalError;
use super::types::LineInput;

/// Balance tolerance for a base-currency scale: half a unit of the
/// smallest representable amount, i.e. `0.5 * 10^-scale`.
#[must_use]
pub fn balance_tolerance(scale: u32) -> Decimal {
    Decimal::new(5, scale + 1)
}

/// Checks the double-entry invariant in base currency.
///
/// Totals must agree to within [`balance_tolerance`]; anything wider
/// is a real imbalance, not FX rounding.
pub fn check_balance(
    total_debit: Decimal,
    total_credit: Decimal,
    base_scale: u32,
) -> Result<(), JournalError> {
    let diff = (total_debit - total_credit).abs();
    if diff > balance_tolerance(base_scale) {
        return Err(JournalError::UnbalancedEntry {
            debit: total_debit,
            credit: total_credit,
        });
    }
    Ok(())
}

/// Structural checks that need no tenant state: line count and
/// positive amounts.
pub fn validate_lines(lines: &[LineInput]) -> Result<(), JournalError> {
    if lines.len() < 2 {
        return Err(JournalError::TooFewLines);
    }
    for (index, line) in lines.iter().enumerate() {
        if line.amount <= Decimal::ZERO {
            return Err(JournalError::NonPositiveAmount {
                sequence: u32::try_from(index).unwrap_or(u32::MAX).saturating_add(1),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerkit_shared::AccountId;
    use rust_decimal_macros::dec;

    #[test]
    fn tolerance_is_half_smallest_unit() {
        assert_eq!(balance_tolerance(2), dec!(0.005));
        assert_eq!(balance_tolerance(0), dec!(0.5));
    }

    #[test]
    fn exact_balance_passes() {
        assert!(check_balance(dec!(1000.00), dec!(1000.00), 2).is_ok());
    }

    #[test]
    fn within_tolerance_passes() {
        assert!(check_balance(dec!(110.00), dec!(110.005), 2).is_ok());
    }

    #[test]
    fn beyond_tolerance_fails() {
        let err = check_balance(dec!(500.00), dec!(400.00), 2).unwrap_err();
        assert!(matches!(err, JournalError::UnbalancedEntry { .. }));
    }

    #[test]
    fn single_line_rejected() {
        let lines = vec![LineInput::debit(AccountId::new(), dec!(100))];
        assert!(matches!(
            validate_lines(&lines),
            Err(JournalError::TooFewLines)
        ));
    }

    #[test]
    fn zero_amount_rejected_with_position() {
        let lines = vec![
            LineInput::debit(AccountId::new(), dec!(100)),
            LineInput::credit(AccountId::new(), dec!(0)),
        ];
        assert!(matches!(
            validate_lines(&lines),
            Err(JournalError::NonPositiveAmount { sequence: 2 })
        ));
    }
}

#[cfg(test)]
mod props {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal::Decimal;

    fn cents() -> impl Strategy<Value = Decimal> {
        (1i64..=10_000_000).prop_map(|n| Decimal::new(n, 2))
    }

    proptest! {
        #[test]
        fn equal_totals_always_balance(amount in cents()) {
            prop_assert!(check_balance(amount, amount, 2).is_ok());
        }

        #[test]
        fn totals_differing_by_a_cent_or_more_fail(
            amount in cents(),
            gap in 1i64..=1_000_000,
        ) {
            let other = amount + Decimal::new(gap, 2);
            prop_assert!(check_balance(amount, other, 2).is_err());
        }
    }
}
