//! Account groups.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use puente_core::cache::EntityKind;
use puente_shared::types::{RegisterStatus, wire};

use super::{
    Entity, EntityDraft, MutationMode, Procedures, clean_text, put_clearable,
    put_status_and_metadata, put_text, require_code_and_name,
};

/// A group of accounts, optionally nested under a parent group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountGroup {
    /// Group id.
    #[serde(default, alias = "id_grupo", deserialize_with = "wire::deserialize_id")]
    pub id: String,
    /// Group code.
    #[serde(default, alias = "codigo", deserialize_with = "wire::deserialize_text")]
    pub code: String,
    /// Group name.
    #[serde(default, alias = "nombre", deserialize_with = "wire::deserialize_text")]
    pub name: String,
    /// Group type.
    #[serde(
        default,
        alias = "tipo",
        deserialize_with = "wire::deserialize_optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub group_type: Option<String>,
    /// Parent group; empty, zero and non-positive references are absent.
    #[serde(
        default,
        alias = "id_grupo_padre",
        deserialize_with = "wire::deserialize_optional_positive_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub parent_id: Option<String>,
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
    /// Optimistic-locking counter.
    #[serde(
        default,
        deserialize_with = "wire::deserialize_optional_i64",
        skip_serializing_if = "Option::is_none"
    )]
    pub version: Option<i64>,
    /// Creation timestamp as sent by the backend.
    #[serde(
        default,
        deserialize_with = "wire::deserialize_optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<String>,
    /// Last update timestamp as sent by the backend.
    #[serde(
        default,
        deserialize_with = "wire::deserialize_optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<String>,
}

impl Entity for AccountGroup {
    const KIND: EntityKind = EntityKind::AccountGroups;
    const RECORD_KEY: &'static str = "grupo_cuenta";
    const ID_FIELD: &'static str = "id_grupo";
    const PROCEDURES: Procedures = Procedures {
        list: "grupos_cuenta_listar",
        create: "grupos_cuenta_crear",
        update: "grupos_cuenta_actualizar",
    };
    const CLEAR_ON_LIST_FAILURE: bool = true;
    const WIRE_FIELDS: &'static [(&'static str, &'static str)] = &[
        ("code", "codigo"),
        ("name", "nombre"),
        ("group_type", "tipo"),
        ("parent_id", "id_grupo_padre"),
        ("register_status", "estado_registro"),
    ];

    type Draft = AccountGroupDraft;

    fn id(&self) -> &str {
        &self.id
    }

    fn register_status(&self) -> RegisterStatus {
        self.register_status
    }
}

/// Input for creating or updating an account group.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountGroupDraft {
    /// Target group (update only).
    pub id: Option<String>,
    /// Group code.
    pub code: Option<String>,
    /// Group name.
    pub name: Option<String>,
    /// Group type.
    pub group_type: Option<String>,
    /// Parent group.
    ///
    /// `None` is omitted from the payload so an edit never erases an existing
    /// parent by accident; `Some(None)` detaches the group explicitly.
    pub parent_id: Option<Option<String>>,
    /// Soft-delete status.
    pub register_status: Option<RegisterStatus>,
    /// Metadata, when explicitly edited.
    pub metadata: Option<Map<String, Value>>,
}

impl AccountGroupDraft {
    /// Draft for a new group.
    #[must_use]
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Draft editing an existing group.
    #[must_use]
    pub fn edit(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    /// Parent reference as it will be sent: empty, zero and negative ids are absent.
    fn normalized_parent(&self) -> Option<Option<String>> {
        self.parent_id.as_ref().map(|parent| {
            parent
                .as_deref()
                .and_then(|raw| wire::positive_id_from_value(&Value::String(raw.to_string())))
        })
    }
}

impl EntityDraft for AccountGroupDraft {
    fn target_id(&self) -> Option<&str> {
        clean_text(self.id.as_deref())
    }

    fn validate(&self, mode: MutationMode) -> Result<(), String> {
        require_code_and_name(self.code.as_deref(), self.name.as_deref(), mode)?;
        if let (Some(id), Some(Some(parent))) = (self.target_id(), self.normalized_parent())
            && parent == id
        {
            return Err("an account group cannot be its own parent".to_string());
        }
        Ok(())
    }

    fn fields(&self, _mode: MutationMode) -> Map<String, Value> {
        let mut fields = Map::new();
        put_text(&mut fields, "code", self.code.as_deref());
        put_text(&mut fields, "name", self.name.as_deref());
        put_text(&mut fields, "group_type", self.group_type.as_deref());
        let parent = self.normalized_parent();
        put_clearable(
            &mut fields,
            "parent_id",
            parent.as_ref().map(Option::as_deref),
        );
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
