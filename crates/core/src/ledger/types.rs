//! Ledger domain types for draft transactions and their validation.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use puente_shared::config::LedgerConfig;
use puente_shared::types::wire;

/// Transaction type routed through the sale registration path.
pub const SALE_TRANSACTION_TYPE: &str = "VENTA";

/// A movement line as typed into the form.
///
/// Amounts stay raw JSON until normalization: the form may hand over numbers,
/// numeric text, or garbage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawMovementLine {
    /// Selected account, if any.
    #[serde(
        default,
        alias = "id_cuenta",
        deserialize_with = "wire::deserialize_optional_id"
    )]
    pub account_id: Option<String>,
    /// Display-only account code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_code: Option<String>,
    /// Display-only account name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_name: Option<String>,
    /// Line description.
    #[serde(default, alias = "descripcion", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Debit amount as entered.
    #[serde(default, alias = "debe")]
    pub debit: Value,
    /// Credit amount as entered.
    #[serde(default, alias = "haber")]
    pub credit: Value,
}

impl RawMovementLine {
    /// Creates a line against an account.
    #[must_use]
    pub fn new(account_id: impl Into<String>, debit: impl Into<Value>, credit: impl Into<Value>) -> Self {
        Self {
            account_id: Some(account_id.into()),
            debit: debit.into(),
            credit: credit.into(),
            ..Self::default()
        }
    }

    /// Sets the line description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A normalized movement line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementLine {
    /// Persisted line id; absent until the server assigns one.
    #[serde(
        default,
        alias = "id_movimiento",
        deserialize_with = "wire::deserialize_optional_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    /// Account the line posts to.
    #[serde(
        default,
        alias = "id_cuenta",
        deserialize_with = "wire::deserialize_id"
    )]
    pub account_id: String,
    /// Denormalized account code, display only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_code: Option<String>,
    /// Denormalized account name, display only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_name: Option<String>,
    /// Line description.
    #[serde(
        default,
        alias = "descripcion",
        deserialize_with = "wire::deserialize_optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
    /// Debit amount.
    #[serde(default, alias = "debe", deserialize_with = "wire::deserialize_decimal")]
    pub debit: Decimal,
    /// Credit amount.
    #[serde(default, alias = "haber", deserialize_with = "wire::deserialize_decimal")]
    pub credit: Decimal,
}

/// Sale-specific fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaleDetails {
    /// Catalog item sold.
    #[serde(
        default,
        alias = "id_producto",
        deserialize_with = "wire::deserialize_optional_id"
    )]
    pub item_id: Option<String>,
    /// Quantity sold.
    #[serde(default, alias = "cantidad")]
    pub quantity: Option<Decimal>,
    /// Appointment the sale belongs to, if any.
    #[serde(
        default,
        alias = "id_cita",
        deserialize_with = "wire::deserialize_optional_id"
    )]
    pub appointment_id: Option<String>,
}

/// A transaction being composed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionDraft {
    /// Accounting date.
    #[serde(alias = "fecha")]
    pub date: NaiveDate,
    /// Free-form classification ("VENTA", "INGRESO", "AJUSTE", ...).
    #[serde(alias = "tipo")]
    pub transaction_type: String,
    /// Header description.
    #[serde(default, alias = "descripcion")]
    pub description: Option<String>,
    /// External reference (invoice, receipt).
    #[serde(default, alias = "referencia")]
    pub reference: Option<String>,
    /// Free-form metadata.
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
    /// Movement lines as entered.
    #[serde(default, alias = "movimientos")]
    pub lines: Vec<RawMovementLine>,
    /// Sale fields; only consulted for sale transactions.
    #[serde(default)]
    pub sale: SaleDetails,
}

impl TransactionDraft {
    /// Creates an empty draft.
    #[must_use]
    pub fn new(date: NaiveDate, transaction_type: impl Into<String>) -> Self {
        Self {
            date,
            transaction_type: transaction_type.into(),
            description: None,
            reference: None,
            metadata: None,
            lines: Vec::new(),
            sale: SaleDetails::default(),
        }
    }

    /// Appends a line.
    #[must_use]
    pub fn with_line(mut self, line: RawMovementLine) -> Self {
        self.lines.push(line);
        self
    }

    /// Returns true if this draft goes through sale registration.
    #[must_use]
    pub fn is_sale(&self) -> bool {
        self.transaction_type
            .trim()
            .eq_ignore_ascii_case(SALE_TRANSACTION_TYPE)
    }
}

/// Column sums of a set of movement lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransactionTotals {
    /// Sum of debits.
    pub debit_total: Decimal,
    /// Sum of credits.
    pub credit_total: Decimal,
}

impl TransactionTotals {
    /// Creates totals from debit and credit sums.
    #[must_use]
    pub const fn new(debit_total: Decimal, credit_total: Decimal) -> Self {
        Self {
            debit_total,
            credit_total,
        }
    }

    /// Returns true if debits equal credits.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.debit_total == self.credit_total
    }

    /// Debits minus credits; what is left to balance.
    #[must_use]
    pub fn difference(&self) -> Decimal {
        self.debit_total - self.credit_total
    }
}

/// A draft that passed every ledger rule.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedTransaction {
    /// Normalized, deduplicated lines.
    pub lines: Vec<MovementLine>,
    /// Totals of those lines.
    pub totals: TransactionTotals,
}

/// Tunable ledger rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationPolicy {
    /// Reject drafts whose positive credits (two or more) all share one amount.
    ///
    /// Heuristic against double-submitted credit lines. Also rejects legitimate
    /// splits that happen to share an amount.
    pub reject_uniform_credits: bool,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            reject_uniform_credits: true,
        }
    }
}

impl From<&LedgerConfig> for ValidationPolicy {
    fn from(config: &LedgerConfig) -> Self {
        Self {
            reject_uniform_credits: config.reject_uniform_credits,
        }
    }
}
