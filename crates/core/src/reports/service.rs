//! Pure report builders.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use ledgerkit_shared::AccountId;
use rust_decimal::Decimal;

use super::types::{
    AccountFigures, DimensionGroup, DimensionRollup, PeriodComparison, PeriodComparisonRow,
    TrialBalanceReport, TrialBalanceRow,
};
use crate::journal::JournalLine;

/// Assembles a trial balance from per-account figures.
///
/// Each account's closing lands in exactly one column, by the sign of
/// its debit-minus-credit balance.
#[must_use]
pub fn trial_balance(as_of: NaiveDate, mut figures: Vec<AccountFigures>) -> TrialBalanceReport {
    figures.sort_by(|a, b| a.code.cmp(&b.code));

    let mut rows = Vec::with_capacity(figures.len());
    let mut total_debits = Decimal::ZERO;
    let mut total_credits = Decimal::ZERO;
    let mut total_closing_debits = Decimal::ZERO;
    let mut total_closing_credits = Decimal::ZERO;

    for figure in figures {
        let (closing_debit, closing_credit) = if figure.net >= Decimal::ZERO {
            (figure.net, Decimal::ZERO)
        } else {
            (Decimal::ZERO, -figure.net)
        };
        total_debits += figure.debits;
        total_credits += figure.credits;
        total_closing_debits += closing_debit;
        total_closing_credits += closing_credit;
        rows.push(TrialBalanceRow {
            account_id: figure.account_id,
            code: figure.code,
            name: figure.name,
            account_type: figure.account_type,
            debits: figure.debits,
            credits: figure.credits,
            closing_debit,
            closing_credit,
        });
    }

    TrialBalanceReport {
        as_of,
        rows,
        total_debits,
        total_credits,
        total_closing_debits,
        total_closing_credits,
    }
}

/// Rolls up lines by the value of one dimension key.
///
/// Lines without the tag collect into a final `None` group.
#[must_use]
pub fn dimension_rollup<'a>(
    key: &str,
    lines: impl IntoIterator<Item = &'a JournalLine>,
) -> DimensionRollup {
    let mut tagged: BTreeMap<String, (Decimal, Decimal)> = BTreeMap::new();
    let mut untagged = (Decimal::ZERO, Decimal::ZERO);
    let mut saw_untagged = false;

    for line in lines {
        let base_debit = line.base_amount.max(Decimal::ZERO);
        let base_credit = (-line.base_amount).max(Decimal::ZERO);
        match line.dimensions.get(key) {
            Some(value) => {
                let bucket = tagged.entry(value.clone()).or_default();
                bucket.0 += base_debit;
                bucket.1 += base_credit;
            }
            None => {
                saw_untagged = true;
                untagged.0 += base_debit;
                untagged.1 += base_credit;
            }
        }
    }

    let mut groups: Vec<DimensionGroup> = tagged
        .into_iter()
        .map(|(value, (debits, credits))| DimensionGroup {
            value: Some(value),
            debits,
            credits,
            net: debits - credits,
        })
        .collect();
    if saw_untagged {
        groups.push(DimensionGroup {
            value: None,
            debits: untagged.0,
            credits: untagged.1,
            net: untagged.0 - untagged.1,
        });
    }

    DimensionRollup {
        key: key.to_string(),
        groups,
    }
}

/// Stitches two as-of balance queries into one comparison.
///
/// `current` and `prior` map accounts to (code, normal-side-signed
/// base balance); accounts missing from one side read as zero there.
#[must_use]
pub fn period_comparison(
    current_as_of: NaiveDate,
    prior_as_of: NaiveDate,
    current: &BTreeMap<AccountId, (String, Decimal)>,
    prior: &BTreeMap<AccountId, (String, Decimal)>,
) -> PeriodComparison {
    let mut rows: Vec<PeriodComparisonRow> = Vec::new();
    for (&account_id, (code, balance)) in current {
        let prior_balance = prior
            .get(&account_id)
            .map_or(Decimal::ZERO, |(_, b)| *b);
        rows.push(PeriodComparisonRow {
            account_id,
            code: code.clone(),
            current: *balance,
            prior: prior_balance,
            change: *balance - prior_balance,
        });
    }
    for (&account_id, (code, balance)) in prior {
        if !current.contains_key(&account_id) {
            rows.push(PeriodComparisonRow {
                account_id,
                code: code.clone(),
                current: Decimal::ZERO,
                prior: *balance,
                change: -*balance,
            });
        }
    }
    rows.sort_by(|a, b| a.code.cmp(&b.code));

    PeriodComparison {
        current_as_of,
        prior_as_of,
        rows,
    }
}
