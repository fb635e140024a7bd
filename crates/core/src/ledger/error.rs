//! Ledger validation errors.
//!
//! Every variant is a local rejection: nothing here ever reaches the network,
//! and each message names the specific rule that was violated.

use rust_decimal::Decimal;
use thiserror::Error;

/// Reasons a draft transaction is rejected before submission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Fewer than two movements with a resolved account.
    #[error("Transaction must have at least 2 movements with an account (found {found})")]
    InsufficientMovements {
        /// Number of normalized movements.
        found: usize,
    },

    /// Debits and credits differ.
    #[error("Transaction is not balanced. Debit: {debit}, Credit: {credit}")]
    Unbalanced {
        /// Total debit amount.
        debit: Decimal,
        /// Total credit amount.
        credit: Decimal,
    },

    /// Totals balance but are not positive.
    #[error("Transaction totals must be greater than zero")]
    ZeroTotal,

    /// Every credit line carries the same amount; likely a double-submitted line.
    #[error("All {count} credit movements have the same amount ({amount}); looks like a duplicated line")]
    UniformCredits {
        /// Number of positive credit lines.
        count: usize,
        /// The shared credit amount.
        amount: Decimal,
    },

    /// Sale without a catalog item.
    #[error("A sale must reference a catalog item")]
    SaleItemMissing,

    /// Sale without a positive quantity.
    #[error("A sale must have a quantity greater than zero")]
    SaleQuantityInvalid,
}

impl LedgerError {
    /// Returns the error code for diagnostics.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InsufficientMovements { .. } => "INSUFFICIENT_MOVEMENTS",
            Self::Unbalanced { .. } => "UNBALANCED_TRANSACTION",
            Self::ZeroTotal => "ZERO_TOTAL",
            Self::UniformCredits { .. } => "UNIFORM_CREDITS",
            Self::SaleItemMissing => "SALE_ITEM_MISSING",
            Self::SaleQuantityInvalid => "SALE_QUANTITY_INVALID",
        }
    }
}
