//! Cost centers.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use puente_core::cache::EntityKind;
use puente_shared::types::{RegisterStatus, wire};

use super::{
    Entity, EntityDraft, MutationMode, Procedures, clean_text, put_status_and_metadata, put_text,
    require_code_and_name,
};

/// A cost center.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostCenter {
    /// Cost center id.
    #[serde(
        default,
        alias = "id_centro_costo",
        deserialize_with = "wire::deserialize_id"
    )]
    pub id: String,
    /// Code.
    #[serde(default, alias = "codigo", deserialize_with = "wire::deserialize_text")]
    pub code: String,
    /// Name.
    #[serde(default, alias = "nombre", deserialize_with = "wire::deserialize_text")]
    pub name: String,
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

impl Entity for CostCenter {
    const KIND: EntityKind = EntityKind::CostCenters;
    const RECORD_KEY: &'static str = "centro_costo";
    const ID_FIELD: &'static str = "id_centro_costo";
    const PROCEDURES: Procedures = Procedures {
        list: "centros_costo_listar",
        create: "centros_costo_crear",
        update: "centros_costo_actualizar",
    };
    const CLEAR_ON_LIST_FAILURE: bool = false;
    const WIRE_FIELDS: &'static [(&'static str, &'static str)] = &[
        ("code", "codigo"),
        ("name", "nombre"),
        ("register_status", "estado_registro"),
    ];

    type Draft = CostCenterDraft;

    fn id(&self) -> &str {
        &self.id
    }

    fn register_status(&self) -> RegisterStatus {
        self.register_status
    }
}

/// Input for creating or updating a cost center.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CostCenterDraft {
    /// Target cost center (update only).
    pub id: Option<String>,
    /// Code.
    pub code: Option<String>,
    /// Name.
    pub name: Option<String>,
    /// Soft-delete status.
    pub register_status: Option<RegisterStatus>,
    /// Metadata, when explicitly edited.
    pub metadata: Option<Map<String, Value>>,
}

impl CostCenterDraft {
    /// Draft for a new cost center.
    #[must_use]
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Draft editing an existing cost center.
    #[must_use]
    pub fn edit(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }
}

impl EntityDraft for CostCenterDraft {
    fn target_id(&self) -> Option<&str> {
        clean_text(self.id.as_deref())
    }

    fn validate(&self, mode: MutationMode) -> Result<(), String> {
        require_code_and_name(self.code.as_deref(), self.name.as_deref(), mode)
    }

    fn fields(&self, _mode: MutationMode) -> Map<String, Value> {
        let mut fields = Map::new();
        put_text(&mut fields, "code", self.code.as_deref());
        put_text(&mut fields, "name", self.name.as_deref());
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
