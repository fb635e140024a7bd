//! Double-entry bookkeeping checks for draft transactions.
//!
//! This module implements the pre-submission ledger rules:
//! - Movement line normalization and deduplication
//! - Debit/credit totals
//! - Balance, positivity and duplicate-credit checks
//! - Sale-specific requirements

pub mod error;
pub mod types;
pub mod validation;

#[cfg(test)]
mod validation_props;

pub use error::LedgerError;
pub use types::{
    MovementLine, RawMovementLine, SALE_TRANSACTION_TYPE, SaleDetails, TransactionDraft,
    TransactionTotals, ValidatedTransaction, ValidationPolicy,
};
pub use validation::{compute_totals, normalize_lines, uniform_credit_amount, validate};
