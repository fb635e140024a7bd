//! Chart of accounts.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use puente_core::cache::EntityKind;
use puente_shared::types::{RegisterStatus, wire};

use super::{
    Entity, EntityDraft, MutationMode, Procedures, put_clearable, put_status_and_metadata,
    put_text, require_code_and_name,
};

/// An account in the chart of accounts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Account id.
    #[serde(default, alias = "id_cuenta", deserialize_with = "wire::deserialize_id")]
    pub id: String,
    /// Account code (e.g. "1101").
    #[serde(default, alias = "codigo", deserialize_with = "wire::deserialize_text")]
    pub code: String,
    /// Account name.
    #[serde(default, alias = "nombre", deserialize_with = "wire::deserialize_text")]
    pub name: String,
    /// Account group.
    #[serde(
        default,
        alias = "id_grupo",
        deserialize_with = "wire::deserialize_optional_positive_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub group_id: Option<String>,
    /// Account type (asset, liability, ...).
    #[serde(
        default,
        alias = "tipo",
        deserialize_with = "wire::deserialize_optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub account_type: Option<String>,
    /// Sub-type.
    #[serde(
        default,
        alias = "subtipo",
        deserialize_with = "wire::deserialize_optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub sub_type: Option<String>,
    /// Category.
    #[serde(
        default,
        alias = "categoria",
        deserialize_with = "wire::deserialize_optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub category: Option<String>,
    /// Currency code.
    #[serde(
        default,
        alias = "moneda",
        deserialize_with = "wire::deserialize_optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub currency: Option<String>,
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

impl Entity for Account {
    const KIND: EntityKind = EntityKind::Accounts;
    const RECORD_KEY: &'static str = "cuenta";
    const ID_FIELD: &'static str = "id_cuenta";
    const PROCEDURES: Procedures = Procedures {
        list: "cuentas_listar",
        create: "cuentas_crear",
        update: "cuentas_actualizar",
    };
    const CLEAR_ON_LIST_FAILURE: bool = true;
    const WIRE_FIELDS: &'static [(&'static str, &'static str)] = &[
        ("code", "codigo"),
        ("name", "nombre"),
        ("group_id", "id_grupo"),
        ("account_type", "tipo"),
        ("sub_type", "subtipo"),
        ("category", "categoria"),
        ("currency", "moneda"),
        ("register_status", "estado_registro"),
    ];

    type Draft = AccountDraft;

    fn id(&self) -> &str {
        &self.id
    }

    fn register_status(&self) -> RegisterStatus {
        self.register_status
    }
}

/// Input for creating or updating an account.
///
/// `None` leaves a field unchanged. `metadata` is `Some` only when the form
/// touched it, so an untouched edit never overwrites stored metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountDraft {
    /// Target account (update only).
    pub id: Option<String>,
    /// Account code.
    pub code: Option<String>,
    /// Account name.
    pub name: Option<String>,
    /// Account group; `Some(None)` detaches the account from its group.
    pub group_id: Option<Option<String>>,
    /// Account type.
    pub account_type: Option<String>,
    /// Sub-type.
    pub sub_type: Option<String>,
    /// Category.
    pub category: Option<String>,
    /// Currency code.
    pub currency: Option<String>,
    /// Soft-delete status.
    pub register_status: Option<RegisterStatus>,
    /// Metadata, when explicitly edited.
    pub metadata: Option<Map<String, Value>>,
}

impl AccountDraft {
    /// Draft for a new account.
    #[must_use]
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Draft editing an existing account.
    #[must_use]
    pub fn edit(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }
}

impl EntityDraft for AccountDraft {
    fn target_id(&self) -> Option<&str> {
        super::clean_text(self.id.as_deref())
    }

    fn validate(&self, mode: MutationMode) -> Result<(), String> {
        require_code_and_name(self.code.as_deref(), self.name.as_deref(), mode)
    }

    fn fields(&self, _mode: MutationMode) -> Map<String, Value> {
        let mut fields = Map::new();
        put_text(&mut fields, "code", self.code.as_deref());
        put_text(&mut fields, "name", self.name.as_deref());
        put_clearable(
            &mut fields,
            "group_id",
            self.group_id.as_ref().map(Option::as_deref),
        );
        put_text(&mut fields, "account_type", self.account_type.as_deref());
        put_text(&mut fields, "sub_type", self.sub_type.as_deref());
        put_text(&mut fields, "category", self.category.as_deref());
        put_text(&mut fields, "currency", self.currency.as_deref());
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
