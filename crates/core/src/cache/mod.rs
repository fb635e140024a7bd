//! Session-scoped overlay cache.
//!
//! Each repository remembers the effect of its own writes here, keyed by
//! session and entity kind, and overlays them on top of every paginated read.
//!
//! - `store` - the injected key-value store and its implementations
//! - `overlay` - namespaced document of `{kind: {byId: {id: record}}}`
//! - `merge` - overlay of cached records onto a server page

pub mod error;
pub mod merge;
pub mod overlay;
pub mod store;

#[cfg(test)]
mod merge_props;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use error::CacheError;
pub use merge::{merge, record_id};
pub use overlay::OverlayCache;
pub use store::{FileStore, KeyValueStore, MemoryStore};

/// Entity kinds with their own cached map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Chart of accounts.
    Accounts,
    /// Account groups.
    AccountGroups,
    /// Cost centers.
    CostCenters,
    /// Ledger transactions.
    Transactions,
}

impl EntityKind {
    /// All kinds, in document order.
    pub const ALL: [Self; 4] = [
        Self::Accounts,
        Self::AccountGroups,
        Self::CostCenters,
        Self::Transactions,
    ];

    /// Key of this kind's bucket in the cache document.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Accounts => "accounts",
            Self::AccountGroups => "account_groups",
            Self::CostCenters => "cost_centers",
            Self::Transactions => "transactions",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
