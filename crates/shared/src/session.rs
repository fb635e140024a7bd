//! Session ingestion.
//!
//! Login payloads have carried the acting user's id under several names over
//! time. They are resolved once here into a canonical [`Session`], so mutation
//! call sites only ever read `actor_id`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{AppError, AppResult};
use crate::types::wire::id_from_value;

/// Field names checked for the session identifier, in precedence order.
pub const SESSION_ID_FIELDS: [&str; 3] = ["session_id", "id_sesion", "token"];

/// Field names checked for the acting user's identifier, in precedence order.
pub const ACTOR_ID_FIELDS: [&str; 5] = ["user_id", "id_usuario", "usuario_id", "id_user", "id"];

/// Payload key carrying the session identifier on every remote call.
pub const SESSION_FIELD: &str = "session_id";

/// Payload key carrying the acting user's identifier on every remote call.
pub const ACTOR_FIELD: &str = "id_usuario";

/// Canonical session identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Active session identifier; also scopes the overlay cache.
    pub session_id: String,
    /// Acting user's identifier, if the login payload carried one.
    pub actor_id: Option<String>,
    /// Display name for logs and prompts.
    pub display_name: Option<String>,
}

impl Session {
    /// Creates a session from already-canonical parts.
    #[must_use]
    pub fn new(session_id: impl Into<String>, actor_id: Option<String>) -> Self {
        Self {
            session_id: session_id.into(),
            actor_id,
            display_name: None,
        }
    }

    /// Normalizes a raw login payload into a session.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidSession` if the payload is not an object or
    /// carries no session identifier under any known field.
    pub fn ingest(raw: &Value) -> AppResult<Self> {
        let Value::Object(fields) = raw else {
            return Err(AppError::InvalidSession(
                "session payload must be a JSON object".to_string(),
            ));
        };

        let session_id = first_id(fields, &SESSION_ID_FIELDS).ok_or_else(|| {
            AppError::InvalidSession("session payload has no session identifier".to_string())
        })?;
        let actor_id = first_id(fields, &ACTOR_ID_FIELDS);
        let display_name = ["nombre", "name", "username"]
            .iter()
            .find_map(|key| fields.get(*key).and_then(Value::as_str))
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(ToString::to_string);

        Ok(Self {
            session_id,
            actor_id,
            display_name,
        })
    }

    /// Returns true if the session can authorize remote calls.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.session_id.trim().is_empty()
    }

    /// Identity fields padded onto every remote payload.
    #[must_use]
    pub fn identity_payload(&self) -> Map<String, Value> {
        let mut payload = Map::new();
        payload.insert(
            SESSION_FIELD.to_string(),
            Value::String(self.session_id.clone()),
        );
        if let Some(actor) = &self.actor_id {
            payload.insert(ACTOR_FIELD.to_string(), Value::String(actor.clone()));
        }
        payload
    }
}

fn first_id(fields: &Map<String, Value>, candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .find_map(|key| fields.get(*key).and_then(id_from_value))
}
