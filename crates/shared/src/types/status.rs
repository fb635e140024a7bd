//! Register status: the soft-delete marker carried by every record.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Soft-delete status. Records are never hard-deleted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum RegisterStatus {
    /// Record is in use.
    #[default]
    #[serde(rename = "Activo")]
    Active,
    /// Record was deactivated ("deleted").
    #[serde(rename = "Inactivo")]
    Inactive,
}

impl RegisterStatus {
    /// Wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "Activo",
            Self::Inactive => "Inactivo",
        }
    }

    /// Parses a wire value; anything other than an inactive marker is active.
    #[must_use]
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "inactivo" | "inactive" | "0" | "false" => Self::Inactive,
            _ => Self::Active,
        }
    }

    /// Returns true for active records.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

impl fmt::Display for RegisterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RegisterStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(match raw {
            Some(serde_json::Value::String(s)) => Self::parse_lenient(&s),
            Some(serde_json::Value::Bool(false)) => Self::Inactive,
            Some(serde_json::Value::Number(n)) if n.as_i64() == Some(0) => Self::Inactive,
            _ => Self::Active,
        })
    }
}
