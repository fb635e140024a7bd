//! Response normalization.
//!
//! Every procedure answers `{ok, rows, message?}`. The outer `ok` can be true
//! while `rows[0]` is itself a status envelope reporting an error, so both
//! layers are checked. A row is an envelope when it is an object whose
//! `status` is a string; entity records never carry a `status` key.

use serde_json::{Map, Value};

use crate::error::{DataError, DataResult};

const DEFAULT_FAILURE: &str = "the backend reported a failure";

/// A per-row status envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    /// Status text; `"ok"` on success.
    pub status: String,
    /// Backend message.
    pub message: Option<String>,
    /// Payload, usually an object.
    pub data: Value,
}

impl Envelope {
    /// Reads a row as an envelope, if it is one.
    #[must_use]
    pub fn from_row(row: &Value) -> Option<Self> {
        let fields = row.as_object()?;
        let status = fields.get("status")?.as_str()?.trim().to_string();
        Some(Self {
            status,
            message: message_of(fields),
            data: fields.get("data").cloned().unwrap_or(Value::Null),
        })
    }

    /// Returns true for a successful envelope.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("ok")
    }

    /// Converts a failed envelope into an operation error.
    #[must_use]
    pub fn into_error(self, raw: Value) -> DataError {
        let message = self
            .message
            .unwrap_or_else(|| format!("{DEFAULT_FAILURE} (status {})", self.status));
        DataError::operation(message, raw)
    }
}

/// Result of a create/update call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MutationOutcome {
    /// Backend message, if any.
    pub message: Option<String>,
    /// The envelope's `data` object.
    pub data: Map<String, Value>,
    /// A record returned directly as `rows[0]`, without an envelope.
    pub bare_record: Option<Value>,
}

impl MutationOutcome {
    /// Authoritative record under `key`, falling back to a bare row record.
    #[must_use]
    pub fn record(&self, key: &str) -> Option<Value> {
        self.data
            .get(key)
            .filter(|value| value.is_object())
            .or(self.bare_record.as_ref())
            .cloned()
    }
}

/// Checks the outer layer and returns the rows.
///
/// A bare array is accepted as the rows themselves.
///
/// # Errors
///
/// Returns `DataError::Operation` when `ok` is false.
pub fn rows(raw: &Value) -> DataResult<Vec<Value>> {
    match raw {
        Value::Array(rows) => Ok(rows.clone()),
        Value::Object(fields) => {
            if fields.get("ok").is_some_and(is_falsy) {
                let message = message_of(fields).unwrap_or_else(|| DEFAULT_FAILURE.to_string());
                return Err(DataError::operation(message, raw.clone()));
            }
            Ok(fields
                .get("rows")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default())
        }
        _ => Ok(Vec::new()),
    }
}

/// Normalizes a list response into its records.
///
/// When `rows[0]` is an ok envelope its `data` array holds the records if
/// present; otherwise the rows after it do.
///
/// # Errors
///
/// Returns `DataError::Operation` when either layer reports failure.
pub fn list_records(raw: &Value) -> DataResult<Vec<Value>> {
    let mut rows = rows(raw)?;
    let Some(envelope) = rows.first().and_then(Envelope::from_row) else {
        return Ok(rows);
    };
    if !envelope.is_ok() {
        return Err(envelope.into_error(raw.clone()));
    }
    match envelope.data {
        Value::Array(records) => Ok(records),
        _ => {
            rows.remove(0);
            Ok(rows)
        }
    }
}

/// Normalizes a mutation response.
///
/// # Errors
///
/// Returns `DataError::Operation` when either layer reports failure.
pub fn mutation_outcome(raw: &Value) -> DataResult<MutationOutcome> {
    let rows = rows(raw)?;
    let Some(first) = rows.first() else {
        return Ok(MutationOutcome::default());
    };

    match Envelope::from_row(first) {
        Some(envelope) if !envelope.is_ok() => Err(envelope.into_error(raw.clone())),
        Some(envelope) => Ok(MutationOutcome {
            message: envelope.message,
            data: match envelope.data {
                Value::Object(data) => data,
                _ => Map::new(),
            },
            bare_record: None,
        }),
        None => Ok(MutationOutcome {
            message: None,
            data: Map::new(),
            bare_record: first.is_object().then(|| first.clone()),
        }),
    }
}

fn message_of(fields: &Map<String, Value>) -> Option<String> {
    ["message", "mensaje", "error"]
        .iter()
        .find_map(|key| fields.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .filter(|message| !message.is_empty())
        .map(ToString::to_string)
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Bool(flag) => !flag,
        Value::Null => true,
        Value::Number(n) => n.as_i64() == Some(0),
        Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "" | "false" | "0"),
        _ => false,
    }
}
