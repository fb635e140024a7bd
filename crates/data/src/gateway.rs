//! Transaction submission procedures.
//!
//! Validated drafts go out through one of two procedures: the batch create
//! used for every generic transaction type, and the sale registration that
//! also records the catalog item sold.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use puente_core::ledger::{
    LedgerError, TransactionDraft, ValidatedTransaction, ValidationPolicy, validate,
};
use puente_shared::Session;
use puente_shared::types::wire::id_from_value;

use crate::entities::transaction::movement_payload;
use crate::error::{DataError, DataResult};
use crate::remote::RemoteProcedures;
use crate::remote::envelope::{Envelope, mutation_outcome, rows};

/// Batch create procedure.
pub const BATCH_PROCEDURE: &str = "transacciones_crear_lote";

/// Sale registration procedure.
pub const SALE_PROCEDURE: &str = "ventas_registrar";

/// A draft paired with its validated lines.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedTransaction {
    /// The draft as composed.
    pub draft: TransactionDraft,
    /// Normalized lines and totals.
    pub validated: ValidatedTransaction,
}

impl PreparedTransaction {
    /// Validates a draft for submission.
    ///
    /// # Errors
    ///
    /// Returns the first ledger rule the draft breaks.
    pub fn prepare(draft: TransactionDraft, policy: ValidationPolicy) -> Result<Self, LedgerError> {
        let validated = validate(&draft, policy)?;
        Ok(Self { draft, validated })
    }

    /// Backend payload: header fields and normalized lines.
    #[must_use]
    pub fn payload(&self) -> Map<String, Value> {
        let draft = &self.draft;
        let mut payload = Map::new();
        payload.insert("fecha".to_string(), Value::String(draft.date.to_string()));
        payload.insert(
            "tipo".to_string(),
            Value::String(draft.transaction_type.trim().to_string()),
        );
        insert_text(&mut payload, "descripcion", draft.description.as_deref());
        insert_text(&mut payload, "referencia", draft.reference.as_deref());
        if let Some(metadata) = &draft.metadata {
            payload.insert("metadata".to_string(), Value::Object(metadata.clone()));
        }
        payload.insert(
            "movimientos".to_string(),
            Value::Array(self.validated.lines.iter().map(movement_payload).collect()),
        );
        payload
    }
}

/// What the backend confirmed for one submitted transaction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommittedTransaction {
    /// Assigned transaction id, when returned.
    pub transaction_id: Option<String>,
    /// Assigned line ids, in line order.
    pub line_ids: Vec<String>,
    /// Authoritative record, when returned.
    pub record: Option<Value>,
    /// Backend message.
    pub message: Option<String>,
}

impl CommittedTransaction {
    fn from_data(data: &Map<String, Value>, message: Option<String>) -> Self {
        let record = data.get("transaccion").filter(|value| value.is_object()).cloned();
        let transaction_id = data
            .get("id_transaccion")
            .and_then(id_from_value)
            .or_else(|| {
                record
                    .as_ref()
                    .and_then(|record| record.get("id").or_else(|| record.get("id_transaccion")))
                    .and_then(id_from_value)
            });
        let line_ids = data
            .get("movimientos_ids")
            .and_then(Value::as_array)
            .map(|ids| ids.iter().filter_map(id_from_value).collect())
            .unwrap_or_default();

        Self {
            transaction_id,
            line_ids,
            record,
            message,
        }
    }
}

/// Submits validated transactions.
#[derive(Debug)]
pub struct TransactionGateway<R: RemoteProcedures> {
    remote: Arc<R>,
}

impl<R: RemoteProcedures> Clone for TransactionGateway<R> {
    fn clone(&self) -> Self {
        Self {
            remote: Arc::clone(&self.remote),
        }
    }
}

impl<R: RemoteProcedures> TransactionGateway<R> {
    /// Creates a gateway over a remote.
    #[must_use]
    pub fn new(remote: Arc<R>) -> Self {
        Self { remote }
    }

    /// Creates several transactions in one call.
    ///
    /// Returns one result per item the backend processed; with
    /// `stop_on_error` the list ends at the first failed item.
    ///
    /// # Errors
    ///
    /// Returns `DataError::Precondition` without a session, or the error of
    /// the call as a whole. Per-item failures are returned inside the list.
    pub async fn create_batch(
        &self,
        session: &Session,
        transactions: &[PreparedTransaction],
        stop_on_error: bool,
    ) -> DataResult<Vec<DataResult<CommittedTransaction>>> {
        require_session(session)?;
        if transactions.is_empty() {
            return Ok(Vec::new());
        }
        let (_, results) = self.call_batch(session, transactions, stop_on_error).await?;
        Ok(results)
    }

    /// Creates one transaction through the batch procedure.
    ///
    /// # Errors
    ///
    /// Returns `DataError::Precondition` without a session, the item's error
    /// when the backend rejects it, or `DataError::Operation` with the raw
    /// response when the batch reports no result for it.
    pub async fn create_one(
        &self,
        session: &Session,
        transaction: &PreparedTransaction,
    ) -> DataResult<CommittedTransaction> {
        require_session(session)?;
        let (raw, results) = self
            .call_batch(session, std::slice::from_ref(transaction), true)
            .await?;
        match results.into_iter().next() {
            Some(result) => result,
            None => Err(DataError::operation(
                "the backend returned no result for the submitted transaction",
                raw,
            )),
        }
    }

    async fn call_batch(
        &self,
        session: &Session,
        transactions: &[PreparedTransaction],
        stop_on_error: bool,
    ) -> DataResult<(Value, Vec<DataResult<CommittedTransaction>>)> {
        let mut payload = session.identity_payload();
        payload.insert(
            "transacciones".to_string(),
            Value::Array(
                transactions
                    .iter()
                    .map(|transaction| Value::Object(transaction.payload()))
                    .collect(),
            ),
        );
        payload.insert("detener_en_error".to_string(), Value::Bool(stop_on_error));

        let raw = self
            .remote
            .call(BATCH_PROCEDURE, Value::Object(payload))
            .await?;

        let results: Vec<DataResult<CommittedTransaction>> = rows(&raw)?
            .iter()
            .map(item_result)
            .collect();

        let failed = results.iter().filter(|result| result.is_err()).count();
        if failed > 0 {
            warn!(submitted = transactions.len(), failed, "batch partially rejected");
        } else {
            info!(
                submitted = transactions.len(),
                returned = results.len(),
                "batch committed"
            );
        }
        Ok((raw, results))
    }

    /// Registers a sale.
    ///
    /// # Errors
    ///
    /// Returns `DataError::Precondition` without a session, or the error
    /// reported by the backend.
    pub async fn register_sale(
        &self,
        session: &Session,
        transaction: &PreparedTransaction,
    ) -> DataResult<CommittedTransaction> {
        require_session(session)?;

        let sale = &transaction.draft.sale;
        let mut payload = session.identity_payload();
        payload.extend(transaction.payload());
        if let Some(item) = &sale.item_id {
            payload.insert("id_producto".to_string(), Value::String(item.clone()));
        }
        if let Some(quantity) = sale.quantity {
            payload.insert(
                "cantidad".to_string(),
                Value::String(quantity.normalize().to_string()),
            );
        }
        if let Some(appointment) = &sale.appointment_id {
            payload.insert("id_cita".to_string(), Value::String(appointment.clone()));
        }

        let raw = self
            .remote
            .call(SALE_PROCEDURE, Value::Object(payload))
            .await?;
        let outcome = mutation_outcome(&raw)?;
        let committed = CommittedTransaction::from_data(&outcome.data, outcome.message);

        info!(transaction_id = ?committed.transaction_id, "sale registered");
        Ok(committed)
    }
}

fn item_result(row: &Value) -> DataResult<CommittedTransaction> {
    match Envelope::from_row(row) {
        Some(envelope) if !envelope.is_ok() => Err(envelope.into_error(row.clone())),
        Some(envelope) => {
            let data = envelope.data.as_object().cloned().unwrap_or_default();
            Ok(CommittedTransaction::from_data(&data, envelope.message))
        }
        None => {
            debug!("batch row without status envelope");
            let data = row.as_object().cloned().unwrap_or_default();
            Ok(CommittedTransaction::from_data(&data, None))
        }
    }
}

fn require_session(session: &Session) -> DataResult<()> {
    if session.is_valid() {
        Ok(())
    } else {
        Err(DataError::Precondition(
            "no active session; sign in again".to_string(),
        ))
    }
}

fn insert_text(payload: &mut Map<String, Value>, key: &str, value: Option<&str>) {
    if let Some(text) = value.map(str::trim).filter(|text| !text.is_empty()) {
        payload.insert(key.to_string(), Value::String(text.to_string()));
    }
}
