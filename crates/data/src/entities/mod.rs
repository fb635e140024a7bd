//! Entity records and their mutation drafts.
//!
//! Records are the canonical shape held in lists and in the overlay cache.
//! They serialize with English field names and skip absent optionals, so a
//! cached record overlaid on a server row never blanks a field with `null`.
//! Drafts describe one create or update as record fields; each entity maps
//! those fields to the backend's Spanish field names when the payload is sent.

pub mod account;
pub mod account_group;
pub mod cost_center;
pub mod transaction;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use puente_core::cache::EntityKind;
use puente_shared::types::RegisterStatus;

pub use account::{Account, AccountDraft};
pub use account_group::{AccountGroup, AccountGroupDraft};
pub use cost_center::{CostCenter, CostCenterDraft};
pub use transaction::{Transaction, TransactionRecordDraft};

/// Remote procedure names of one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Procedures {
    /// Paginated read.
    pub list: &'static str,
    /// Create.
    pub create: &'static str,
    /// Update; also used for deactivation.
    pub update: &'static str,
}

/// Whether a draft creates or updates a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationMode {
    /// New record.
    Create,
    /// Existing record; the draft must carry its id.
    Update,
}

/// A pending create or update.
pub trait EntityDraft: Clone + Send + Sync {
    /// Id of the record being updated.
    fn target_id(&self) -> Option<&str>;

    /// Checks required fields; the message is shown to the user.
    fn validate(&self, mode: MutationMode) -> Result<(), String>;

    /// Changed fields under their record names, without identity padding or
    /// target id.
    fn fields(&self, mode: MutationMode) -> Map<String, Value>;

    /// Draft that marks the record inactive and changes nothing else.
    fn deactivation(id: &str) -> Self;
}

/// A record type backed by its own remote procedures and cache bucket.
pub trait Entity: Clone + Serialize + DeserializeOwned + Send + Sync {
    /// Cache bucket.
    const KIND: EntityKind;
    /// Key of the authoritative record in a mutation response's `data`.
    const RECORD_KEY: &'static str;
    /// Payload field carrying the target id on update.
    const ID_FIELD: &'static str;
    /// Remote procedures.
    const PROCEDURES: Procedures;
    /// On a failed list read, clear the list (true) or keep it and flag the error.
    const CLEAR_ON_LIST_FAILURE: bool;
    /// Record field name to backend field name; unlisted fields keep their name.
    const WIRE_FIELDS: &'static [(&'static str, &'static str)];

    /// Draft type for create and update.
    type Draft: EntityDraft;

    /// Normalized id; empty until the server assigns one.
    fn id(&self) -> &str;

    /// Soft-delete status.
    fn register_status(&self) -> RegisterStatus;

    /// Mutation payload fields under the backend's names.
    fn wire_payload(fields: &Map<String, Value>) -> Map<String, Value> {
        rename_fields(fields, Self::WIRE_FIELDS)
    }
}

/// Renames the keys of `fields` listed in `names`.
pub(crate) fn rename_fields(
    fields: &Map<String, Value>,
    names: &[(&str, &str)],
) -> Map<String, Value> {
    fields
        .iter()
        .map(|(key, value)| {
            let wire = names
                .iter()
                .find(|(record, _)| record == key)
                .map_or(key.as_str(), |(_, wire)| wire);
            (wire.to_string(), value.clone())
        })
        .collect()
}

/// Trims a text field, treating blank as absent.
pub(crate) fn clean_text(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|text| !text.is_empty())
}

/// Checks `code` and `name`: required on create, non-blank when sent on update.
pub(crate) fn require_code_and_name(
    code: Option<&str>,
    name: Option<&str>,
    mode: MutationMode,
) -> Result<(), String> {
    for (label, value) in [("code", code), ("name", name)] {
        let missing = match mode {
            MutationMode::Create => clean_text(value).is_none(),
            MutationMode::Update => value.is_some() && clean_text(value).is_none(),
        };
        if missing {
            return Err(format!("{label} is required"));
        }
    }
    Ok(())
}

/// Inserts a trimmed text field when present.
pub(crate) fn put_text(payload: &mut Map<String, Value>, key: &str, value: Option<&str>) {
    if let Some(text) = clean_text(value) {
        payload.insert(key.to_string(), Value::String(text.to_string()));
    }
}

/// Inserts a clearable text field: `None` omits, `Some(None)` sends `null`.
pub(crate) fn put_clearable(
    payload: &mut Map<String, Value>,
    key: &str,
    value: Option<Option<&str>>,
) {
    match value {
        None => {}
        Some(inner) => {
            let value = clean_text(inner).map_or(Value::Null, |text| Value::String(text.to_string()));
            payload.insert(key.to_string(), value);
        }
    }
}

/// Inserts the shared tail of every entity payload: status and touched metadata.
pub(crate) fn put_status_and_metadata(
    payload: &mut Map<String, Value>,
    register_status: Option<RegisterStatus>,
    metadata: Option<&Map<String, Value>>,
) {
    if let Some(status) = register_status {
        payload.insert(
            "register_status".to_string(),
            Value::String(status.as_str().to_string()),
        );
    }
    if let Some(metadata) = metadata {
        payload.insert("metadata".to_string(), Value::Object(metadata.clone()));
    }
}
