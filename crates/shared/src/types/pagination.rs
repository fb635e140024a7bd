//! Pagination and filter types for list reads.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::status::RegisterStatus;

/// Request parameters for paginated queries, page-number flavour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRequest {
    /// Page number (1-indexed).
    #[serde(default = "default_page")]
    pub page: u32,
    /// Number of items per page.
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    20
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

impl PageRequest {
    /// Calculates the record offset.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.per_page)
    }

    /// Returns the page size.
    #[must_use]
    pub fn limit(&self) -> u64 {
        u64::from(self.per_page)
    }
}

/// Filters understood by every list procedure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListFilters {
    /// Restrict to one register status (e.g. only active records).
    #[serde(
        rename = "estado_registro",
        alias = "register_status",
        skip_serializing_if = "Option::is_none"
    )]
    pub register_status: Option<RegisterStatus>,
    /// Free-text search forwarded to the backend.
    #[serde(
        rename = "busqueda",
        alias = "search",
        skip_serializing_if = "Option::is_none"
    )]
    pub search: Option<String>,
    /// Entity-specific filters forwarded verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ListFilters {
    /// Filters restricted to active records.
    #[must_use]
    pub fn active_only() -> Self {
        Self {
            register_status: Some(RegisterStatus::Active),
            ..Self::default()
        }
    }
}

/// Offset/limit options for one list read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListOptions {
    /// Records to skip.
    pub offset: u64,
    /// Maximum records to return.
    pub limit: u64,
    /// Filters.
    #[serde(flatten)]
    pub filters: ListFilters,
}

impl Default for ListOptions {
    fn default() -> Self {
        PageRequest::default().into()
    }
}

impl ListOptions {
    /// Replaces the filters.
    #[must_use]
    pub fn with_filters(mut self, filters: ListFilters) -> Self {
        self.filters = filters;
        self
    }

    /// Serializes the options as payload fields.
    #[must_use]
    pub fn to_payload(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

impl From<PageRequest> for ListOptions {
    fn from(page: PageRequest) -> Self {
        Self {
            offset: page.offset(),
            limit: page.limit(),
            filters: ListFilters::default(),
        }
    }
}
