//! Pre-submission rules for draft transactions.

use std::collections::HashSet;

use rust_decimal::Decimal;
use tracing::debug;

use puente_shared::types::wire::decimal_from_value;

use super::error::LedgerError;
use super::types::{
    MovementLine, RawMovementLine, TransactionDraft, TransactionTotals, ValidatedTransaction,
    ValidationPolicy,
};

/// Normalizes form lines into movement lines.
///
/// Lines without an account are dropped, amounts are coerced (non-numeric is
/// zero), blank descriptions become `None`, and repeated
/// `(account, debit, credit, description)` tuples keep their first occurrence.
#[must_use]
pub fn normalize_lines(raw: &[RawMovementLine]) -> Vec<MovementLine> {
    let mut seen = HashSet::new();

    raw.iter()
        .filter_map(|line| {
            let account_id = line
                .account_id
                .as_deref()
                .map(str::trim)
                .filter(|id| !id.is_empty())?
                .to_string();

            Some(MovementLine {
                id: None,
                account_id,
                account_code: line.account_code.clone(),
                account_name: line.account_name.clone(),
                description: line
                    .description
                    .as_deref()
                    .map(str::trim)
                    .filter(|text| !text.is_empty())
                    .map(ToString::to_string),
                debit: decimal_from_value(&line.debit),
                credit: decimal_from_value(&line.credit),
            })
        })
        .filter(|line| {
            seen.insert((
                line.account_id.clone(),
                line.debit.normalize(),
                line.credit.normalize(),
                line.description.clone(),
            ))
        })
        .collect()
}

/// Sums each column.
#[must_use]
pub fn compute_totals(lines: &[MovementLine]) -> TransactionTotals {
    let debit_total: Decimal = lines.iter().map(|line| line.debit).sum();
    let credit_total: Decimal = lines.iter().map(|line| line.credit).sum();

    TransactionTotals::new(debit_total, credit_total)
}

/// Returns `(count, amount)` when two or more lines carry a positive credit
/// and all of those credits are equal.
#[must_use]
pub fn uniform_credit_amount(lines: &[MovementLine]) -> Option<(usize, Decimal)> {
    let credits: Vec<Decimal> = lines
        .iter()
        .map(|line| line.credit)
        .filter(|credit| *credit > Decimal::ZERO)
        .collect();

    let first = *credits.first()?;
    (credits.len() >= 2 && credits.iter().all(|credit| *credit == first))
        .then_some((credits.len(), first))
}

/// Validates a draft against the ledger rules, in order:
///
/// 1. at least 2 normalized lines
/// 2. debit total equals credit total, exactly
/// 3. debit total is positive
/// 4. credits are not all the same amount (when the policy enables it)
/// 5. sales carry a catalog item and a positive quantity
///
/// # Errors
///
/// Returns the first violated rule as a `LedgerError`.
pub fn validate(
    draft: &TransactionDraft,
    policy: ValidationPolicy,
) -> Result<ValidatedTransaction, LedgerError> {
    let lines = normalize_lines(&draft.lines);

    if lines.len() < 2 {
        return Err(LedgerError::InsufficientMovements { found: lines.len() });
    }

    let totals = compute_totals(&lines);

    if !totals.is_balanced() {
        return Err(LedgerError::Unbalanced {
            debit: totals.debit_total,
            credit: totals.credit_total,
        });
    }

    if totals.debit_total <= Decimal::ZERO {
        return Err(LedgerError::ZeroTotal);
    }

    if policy.reject_uniform_credits
        && let Some((count, amount)) = uniform_credit_amount(&lines)
    {
        return Err(LedgerError::UniformCredits { count, amount });
    }

    if draft.is_sale() {
        let has_item = draft
            .sale
            .item_id
            .as_deref()
            .is_some_and(|id| !id.trim().is_empty());
        if !has_item {
            return Err(LedgerError::SaleItemMissing);
        }
        if !draft.sale.quantity.is_some_and(|qty| qty > Decimal::ZERO) {
            return Err(LedgerError::SaleQuantityInvalid);
        }
    }

    debug!(
        lines = lines.len(),
        total = %totals.debit_total,
        transaction_type = %draft.transaction_type,
        "draft transaction validated"
    );

    Ok(ValidatedTransaction { lines, totals })
}
