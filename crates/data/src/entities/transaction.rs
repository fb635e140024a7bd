//! Ledger transactions as listed and cached.
//!
//! New transactions are normally submitted through the composer and the
//! gateway; the repository's own create/update path covers header edits and
//! deactivation.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use puente_core::cache::EntityKind;
use puente_core::ledger::MovementLine;
use puente_shared::types::{RegisterStatus, wire};

use super::{
    Entity, EntityDraft, MutationMode, Procedures, clean_text, put_status_and_metadata, put_text,
    rename_fields,
};

/// A ledger transaction with its movement lines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction id.
    #[serde(
        default,
        alias = "id_transaccion",
        deserialize_with = "wire::deserialize_id"
    )]
    pub id: String,
    /// Accounting date.
    #[serde(
        default,
        alias = "fecha",
        deserialize_with = "deserialize_optional_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub date: Option<NaiveDate>,
    /// Classification ("VENTA", "INGRESO", ...).
    #[serde(default, alias = "tipo", deserialize_with = "wire::deserialize_text")]
    pub transaction_type: String,
    /// Header description.
    #[serde(
        default,
        alias = "descripcion",
        deserialize_with = "wire::deserialize_optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
    /// External reference.
    #[serde(
        default,
        alias = "referencia",
        deserialize_with = "wire::deserialize_optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub reference: Option<String>,
    /// Soft-delete status.
    #[serde(default, alias = "estado_registro")]
    pub register_status: RegisterStatus,
    /// Free-form metadata.
    #[serde(
        default,
        deserialize_with = "wire::deserialize_optional_object",
        skip_serializing_if = "Option::is_none"
    )]
    pub metadata: Option<Map<String, Value>>,
    /// Creation timestamp as sent by the backend.
    #[serde(
        default,
        deserialize_with = "wire::deserialize_optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<String>,
    /// Movement lines, in entry order.
    #[serde(default, alias = "movimientos", skip_serializing_if = "Vec::is_empty")]
    pub lines: Vec<MovementLine>,
}

impl Entity for Transaction {
    const KIND: EntityKind = EntityKind::Transactions;
    const RECORD_KEY: &'static str = "transaccion";
    const ID_FIELD: &'static str = "id_transaccion";
    const PROCEDURES: Procedures = Procedures {
        list: "transacciones_listar",
        create: "transacciones_crear",
        update: "transacciones_actualizar",
    };
    const CLEAR_ON_LIST_FAILURE: bool = false;
    const WIRE_FIELDS: &'static [(&'static str, &'static str)] = &[
        ("date", "fecha"),
        ("transaction_type", "tipo"),
        ("description", "descripcion"),
        ("reference", "referencia"),
        ("register_status", "estado_registro"),
    ];

    type Draft = TransactionRecordDraft;

    fn id(&self) -> &str {
        &self.id
    }

    fn register_status(&self) -> RegisterStatus {
        self.register_status
    }

    fn wire_payload(fields: &Map<String, Value>) -> Map<String, Value> {
        let mut payload = rename_fields(fields, Self::WIRE_FIELDS);
        if let Some(lines) = payload.remove("lines") {
            let lines: Vec<MovementLine> = serde_json::from_value(lines).unwrap_or_default();
            payload.insert(
                "movimientos".to_string(),
                Value::Array(lines.iter().map(movement_payload).collect()),
            );
        }
        payload
    }
}

/// A movement line under the backend's field names. Account code and name are
/// display-only and stay local.
pub(crate) fn movement_payload(line: &MovementLine) -> Value {
    let mut fields = Map::new();
    if let Some(id) = &line.id {
        fields.insert("id_movimiento".to_string(), Value::String(id.clone()));
    }
    fields.insert("id_cuenta".to_string(), Value::String(line.account_id.clone()));
    fields.insert("debe".to_string(), Value::String(line.debit.to_string()));
    fields.insert("haber".to_string(), Value::String(line.credit.to_string()));
    if let Some(description) = &line.description {
        fields.insert("descripcion".to_string(), Value::String(description.clone()));
    }
    Value::Object(fields)
}

/// Accepts `YYYY-MM-DD`, optionally followed by a time part.
fn deserialize_optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|text| {
        let text = text.trim();
        text.get(..10)
            .unwrap_or(text)
            .parse::<NaiveDate>()
            .ok()
    }))
}

/// Input for creating or updating a transaction record directly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionRecordDraft {
    /// Target transaction (update only).
    pub id: Option<String>,
    /// Accounting date.
    pub date: Option<NaiveDate>,
    /// Classification.
    pub transaction_type: Option<String>,
    /// Header description.
    pub description: Option<String>,
    /// External reference.
    pub reference: Option<String>,
    /// Soft-delete status.
    pub register_status: Option<RegisterStatus>,
    /// Metadata, when explicitly edited.
    pub metadata: Option<Map<String, Value>>,
    /// Replacement movement lines.
    pub lines: Option<Vec<MovementLine>>,
}

impl TransactionRecordDraft {
    /// Draft editing an existing transaction.
    #[must_use]
    pub fn edit(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }
}

impl EntityDraft for TransactionRecordDraft {
    fn target_id(&self) -> Option<&str> {
        clean_text(self.id.as_deref())
    }

    fn validate(&self, mode: MutationMode) -> Result<(), String> {
        if mode == MutationMode::Create {
            if self.date.is_none() {
                return Err("date is required".to_string());
            }
            if clean_text(self.transaction_type.as_deref()).is_none() {
                return Err("transaction type is required".to_string());
            }
        }
        Ok(())
    }

    fn fields(&self, _mode: MutationMode) -> Map<String, Value> {
        let mut fields = Map::new();
        if let Some(date) = self.date {
            fields.insert("date".to_string(), Value::String(date.to_string()));
        }
        put_text(
            &mut fields,
            "transaction_type",
            self.transaction_type.as_deref(),
        );
        put_text(&mut fields, "description", self.description.as_deref());
        put_text(&mut fields, "reference", self.reference.as_deref());
        if let Some(lines) = &self.lines {
            fields.insert(
                "lines".to_string(),
                serde_json::to_value(lines).unwrap_or(Value::Array(Vec::new())),
            );
        }
        put_status_and_metadata(&mut fields, self.register_status, self.metadata.as_ref());
        fields
    }

    fn deactivation(id: &str) -> Self {
        Self {
            id: Some(id.to_string()),
            register_status: Some(RegisterStatus::Inactive),
            ..Self::default()
        }
    }
}
