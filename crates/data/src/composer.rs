//! Transaction composer.
//!
//! Holds one draft through its lifecycle:
//!
//! ```text
//! Draft -> Validating -> Rejected
//!                     -> Submitting -> Committed
//!                                   -> Failed
//! ```
//!
//! Rejected and failed drafts are kept for correction; any edit returns the
//! composer to `Draft`.

use std::fmt;

use chrono::NaiveDate;
use serde_json::{Map, Value};
use tracing::{info, warn};

use puente_core::ledger::{
    RawMovementLine, SaleDetails, TransactionDraft, TransactionTotals, ValidationPolicy,
    compute_totals, normalize_lines,
};
use puente_shared::types::RegisterStatus;

use crate::entities::{Account, Transaction};
use crate::error::{DataError, DataResult};
use crate::gateway::{CommittedTransaction, PreparedTransaction, TransactionGateway};
use crate::remote::RemoteProcedures;
use crate::repository::TransactionRepository;

/// Lifecycle state of the composed transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposerState {
    /// Being edited.
    Draft,
    /// Ledger rules running.
    Validating,
    /// A ledger rule failed.
    Rejected {
        /// The violated rule, for the user.
        reason: String,
    },
    /// Remote call in flight.
    Submitting,
    /// The backend accepted the transaction.
    Committed {
        /// Assigned id, when returned.
        transaction_id: Option<String>,
    },
    /// The backend rejected the transaction or could not be reached.
    Failed {
        /// Backend message, verbatim.
        message: String,
    },
}

impl fmt::Display for ComposerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Draft => f.write_str("draft"),
            Self::Validating => f.write_str("validating"),
            Self::Rejected { reason } => write!(f, "rejected: {reason}"),
            Self::Submitting => f.write_str("submitting"),
            Self::Committed { transaction_id } => match transaction_id {
                Some(id) => write!(f, "committed as {id}"),
                None => f.write_str("committed"),
            },
            Self::Failed { message } => write!(f, "failed: {message}"),
        }
    }
}

/// Composes and submits one transaction at a time.
#[derive(Debug)]
pub struct TransactionComposer<R: RemoteProcedures> {
    gateway: TransactionGateway<R>,
    policy: ValidationPolicy,
    draft: TransactionDraft,
    state: ComposerState,
}

impl<R: RemoteProcedures> TransactionComposer<R> {
    /// Starts composing an empty draft.
    #[must_use]
    pub fn new(
        gateway: TransactionGateway<R>,
        policy: ValidationPolicy,
        date: NaiveDate,
        transaction_type: impl Into<String>,
    ) -> Self {
        Self::with_draft(gateway, policy, TransactionDraft::new(date, transaction_type))
    }

    /// Starts composing from an existing draft.
    #[must_use]
    pub fn with_draft(
        gateway: TransactionGateway<R>,
        policy: ValidationPolicy,
        draft: TransactionDraft,
    ) -> Self {
        Self {
            gateway,
            policy,
            draft,
            state: ComposerState::Draft,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> &ComposerState {
        &self.state
    }

    /// Current draft.
    #[must_use]
    pub fn draft(&self) -> &TransactionDraft {
        &self.draft
    }

    /// Sets the header fields.
    pub fn set_header(
        &mut self,
        date: NaiveDate,
        transaction_type: impl Into<String>,
        description: Option<String>,
        reference: Option<String>,
    ) {
        self.touch();
        self.draft.date = date;
        self.draft.transaction_type = transaction_type.into();
        self.draft.description = description;
        self.draft.reference = reference;
    }

    /// Replaces the metadata.
    pub fn set_metadata(&mut self, metadata: Option<Map<String, Value>>) {
        self.touch();
        self.draft.metadata = metadata;
    }

    /// Appends a line.
    pub fn add_line(&mut self, line: RawMovementLine) {
        self.touch();
        self.draft.lines.push(line);
    }

    /// Replaces the line at `index`.
    ///
    /// # Errors
    ///
    /// Returns `DataError::Precondition` if there is no such line.
    pub fn replace_line(&mut self, index: usize, line: RawMovementLine) -> DataResult<()> {
        let slot = self
            .draft
            .lines
            .get_mut(index)
            .ok_or_else(|| DataError::Precondition(format!("no movement line at {index}")))?;
        *slot = line;
        self.touch();
        Ok(())
    }

    /// Removes and returns the line at `index`, if any.
    pub fn remove_line(&mut self, index: usize) -> Option<RawMovementLine> {
        if index >= self.draft.lines.len() {
            return None;
        }
        self.touch();
        Some(self.draft.lines.remove(index))
    }

    /// Sets the sale fields.
    pub fn set_sale(&mut self, sale: SaleDetails) {
        self.touch();
        self.draft.sale = sale;
    }

    /// Totals of the normalized lines, for "remaining to balance" display.
    #[must_use]
    pub fn preview_totals(&self) -> TransactionTotals {
        compute_totals(&normalize_lines(&self.draft.lines))
    }

    /// Starts a fresh draft after a commit.
    pub fn reset(&mut self, date: NaiveDate, transaction_type: impl Into<String>) {
        self.draft = TransactionDraft::new(date, transaction_type);
        self.state = ComposerState::Draft;
    }

    /// Validates and submits the draft.
    ///
    /// On success an optimistic record is pushed into `transactions` and the
    /// current page is re-read; a failing re-read is logged only. Account
    /// codes and names of the optimistic lines come from `accounts`.
    ///
    /// # Errors
    ///
    /// - `DataError::Precondition` while a submission is in flight, after a
    ///   commit, or without a session; nothing is sent.
    /// - `DataError::Validation` when a ledger rule fails; nothing is sent.
    /// - the gateway's error when the backend rejects the transaction.
    ///
    /// A submission whose future is dropped mid-flight leaves the composer in
    /// `Submitting`; only [`reset`](Self::reset) leaves that state.
    pub async fn submit(
        &mut self,
        transactions: &mut TransactionRepository<R>,
        accounts: &[Account],
    ) -> DataResult<CommittedTransaction> {
        match self.state {
            ComposerState::Submitting => {
                return Err(DataError::Precondition(
                    "a submission is already in progress".to_string(),
                ));
            }
            ComposerState::Committed { .. } => {
                return Err(DataError::Precondition(
                    "transaction already committed; start a new draft".to_string(),
                ));
            }
            _ => {}
        }
        let session = transactions.session().clone();
        if !session.is_valid() {
            return Err(DataError::Precondition(
                "no active session; sign in again".to_string(),
            ));
        }

        self.state = ComposerState::Validating;
        let prepared = match PreparedTransaction::prepare(self.draft.clone(), self.policy) {
            Ok(prepared) => prepared,
            Err(err) => {
                self.state = ComposerState::Rejected {
                    reason: err.to_string(),
                };
                return Err(err.into());
            }
        };

        self.state = ComposerState::Submitting;
        let result = if self.draft.is_sale() {
            self.gateway.register_sale(&session, &prepared).await
        } else {
            self.gateway.create_one(&session, &prepared).await
        };

        let committed = match result {
            Ok(committed) => committed,
            Err(err) => {
                warn!(error = %err, code = err.error_code(), "transaction submission failed");
                self.state = ComposerState::Failed {
                    message: err.to_string(),
                };
                return Err(err);
            }
        };

        let record = optimistic_record(&prepared, &committed, accounts);
        if let Err(err) = transactions.push_optimistic(record) {
            warn!(error = %err, "optimistic transaction not cached");
        }
        self.state = ComposerState::Committed {
            transaction_id: committed.transaction_id.clone(),
        };
        info!(transaction_id = ?committed.transaction_id, "transaction committed");

        if let Err(err) = transactions.refresh().await {
            warn!(error = %err, "post-commit refresh failed");
        }
        Ok(committed)
    }



    fn touch(&mut self) {
        if matches!(
            self.state,
            ComposerState::Rejected { .. } | ComposerState::Failed { .. }
        ) {
            self.state = ComposerState::Draft;
        }
    }
}

/// Builds the record shown until the next read brings the server's copy.
///
/// The draft supplies every field; a returned record overrides the fields it
/// carries. Lines keep their assigned ids and the account code and name.
fn optimistic_record(
    prepared: &PreparedTransaction,
    committed: &CommittedTransaction,
    accounts: &[Account],
) -> Transaction {
    let mut record = draft_record(prepared);
    if let Some(returned) = &committed.record {
        match serde_json::from_value::<Transaction>(returned.clone()) {
            Ok(returned) => record = overlay(record, returned),
            Err(err) => warn!(error = %err, "returned transaction record unreadable"),
        }
    }
    if record.id.is_empty() {
        record.id = committed.transaction_id.clone().unwrap_or_default();
    }

    for (index, line) in record.lines.iter_mut().enumerate() {
        if line.id.is_none() {
            line.id = committed.line_ids.get(index).cloned();
        }
        if let Some(account) = accounts.iter().find(|account| account.id == line.account_id) {
            line.account_code.get_or_insert_with(|| account.code.clone());
            line.account_name.get_or_insert_with(|| account.name.clone());
        }
    }
    record
}

fn draft_record(prepared: &PreparedTransaction) -> Transaction {
    let draft = &prepared.draft;
    Transaction {
        id: String::new(),
        date: Some(draft.date),
        transaction_type: draft.transaction_type.trim().to_string(),
        description: draft.description.clone(),
        reference: draft.reference.clone(),
        register_status: RegisterStatus::Active,
        metadata: draft.metadata.clone(),
        created_at: None,
        lines: prepared.validated.lines.clone(),
    }
}

fn overlay(base: Transaction, returned: Transaction) -> Transaction {
    Transaction {
        id: if returned.id.is_empty() {
            base.id
        } else {
            returned.id
        },
        date: returned.date.or(base.date),
        transaction_type: if returned.transaction_type.is_empty() {
            base.transaction_type
        } else {
            returned.transaction_type
        },
        description: returned.description.or(base.description),
        reference: returned.reference.or(base.reference),
        register_status: returned.register_status,
        metadata: returned.metadata.or(base.metadata),
        created_at: returned.created_at.or(base.created_at),
        lines: if returned.lines.is_empty() {
            base.lines
        } else {
            returned.lines
        },
    }
}
