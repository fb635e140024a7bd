//! Property-based tests for draft transaction validation.
//!
//! - Deduplication leaves exactly one copy of every line tuple
//! - `validate` accepts exactly the drafts that satisfy the ledger rules
//! - Balanced drafts with distinct credits always pass

use std::collections::HashSet;

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use serde_json::Value;

use super::types::{RawMovementLine, TransactionDraft, ValidationPolicy};
use super::validation::{compute_totals, normalize_lines, uniform_credit_amount, validate};

/// Strategy for small amounts so that collisions (duplicates, equal credits) are common.
fn small_amount() -> impl Strategy<Value = i64> {
    prop_oneof![Just(0i64), Just(10), Just(25), Just(50), Just(100)]
}

/// Strategy for a form line drawn from a small pool of accounts and descriptions.
fn raw_line() -> impl Strategy<Value = RawMovementLine> {
    (
        prop_oneof![Just("A"), Just("B"), Just("C"), Just("D")],
        small_amount(),
        small_amount(),
        prop_oneof![Just(None), Just(Some("cuota")), Just(Some("sesión"))],
    )
        .prop_map(|(account, debit, credit, description)| {
            let mut line = RawMovementLine::new(account, Value::from(debit), Value::from(credit));
            line.description = description.map(ToString::to_string);
            line
        })
}

/// Strategy for positive cents.
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Helper to build a non-sale draft.
fn make_draft(lines: Vec<RawMovementLine>) -> TransactionDraft {
    let mut draft = TransactionDraft::new(NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(), "AJUSTE");
    draft.lines = lines;
    draft
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// *For any* list of lines, the normalized output holds each
    /// `(account, debit, credit, description)` tuple exactly once.
    #[test]
    fn prop_normalization_deduplicates(lines in prop::collection::vec(raw_line(), 0..12)) {
        let normalized = normalize_lines(&lines);

        let mut seen = HashSet::new();
        for line in &normalized {
            prop_assert!(
                seen.insert((line.account_id.clone(), line.debit, line.credit, line.description.clone())),
                "duplicate tuple survived normalization: {:?}",
                line
            );
        }

        let input_tuples: HashSet<_> = lines
            .iter()
            .map(|line| {
                (
                    line.account_id.clone().unwrap_or_default(),
                    puente_shared::types::wire::decimal_from_value(&line.debit),
                    puente_shared::types::wire::decimal_from_value(&line.credit),
                    line.description.clone(),
                )
            })
            .collect();
        prop_assert_eq!(seen.len(), input_tuples.len());
    }

    /// *For any* non-sale draft, `validate` succeeds iff there are at least two
    /// lines, debits equal credits, the total is positive, and the positive
    /// credits are not all the same amount.
    #[test]
    fn prop_validate_iff_rules_hold(lines in prop::collection::vec(raw_line(), 0..8)) {
        let draft = make_draft(lines);
        let normalized = normalize_lines(&draft.lines);
        let totals = compute_totals(&normalized);

        let expected = normalized.len() >= 2
            && totals.debit_total == totals.credit_total
            && totals.debit_total > Decimal::ZERO
            && uniform_credit_amount(&normalized).is_none();

        let result = validate(&draft, ValidationPolicy::default());
        prop_assert_eq!(result.is_ok(), expected, "result: {:?}", result);
    }

    /// *For any* two distinct positive credits balanced by one debit, the draft passes.
    #[test]
    fn prop_balanced_distinct_credits_accepted(
        first in positive_amount(),
        second in positive_amount(),
    ) {
        prop_assume!(first != second);

        let draft = make_draft(vec![
            RawMovementLine::new("BANCO", Value::from((first + second).to_string()), 0),
            RawMovementLine::new("INGRESOS", 0, Value::from(first.to_string())),
            RawMovementLine::new("OTROS", 0, Value::from(second.to_string())),
        ]);

        let validated = validate(&draft, ValidationPolicy::default());
        prop_assert!(validated.is_ok(), "got: {:?}", validated);
        let validated = validated.unwrap();
        prop_assert_eq!(validated.totals.debit_total, first + second);
        prop_assert!(validated.totals.is_balanced());
    }

    /// *For any* balanced draft, totals are the plain column sums.
    #[test]
    fn prop_totals_are_column_sums(amount in positive_amount()) {
        let draft = make_draft(vec![
            RawMovementLine::new("A", Value::from(amount.to_string()), 0),
            RawMovementLine::new("B", 0, Value::from(amount.to_string())),
        ]);

        let validated = validate(&draft, ValidationPolicy::default()).unwrap();
        prop_assert_eq!(validated.totals.debit_total, amount);
        prop_assert_eq!(validated.totals.credit_total, amount);
        prop_assert_eq!(validated.totals.difference(), Decimal::ZERO);
    }
}
