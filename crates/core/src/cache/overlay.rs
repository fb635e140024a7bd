//! Namespaced overlay document.
//!
//! One document per session, stored under `"{prefix}:{session}"`:
//!
//! ```json
//! { "accounts": { "byId": { "7": { "id": "7", ... } } }, "account_groups": ..., ... }
//! ```

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use puente_shared::config::CacheConfig;

use super::EntityKind;
use super::error::CacheError;
use super::store::KeyValueStore;

#[derive(Debug, Default, Serialize, Deserialize)]
struct EntityBucket {
    #[serde(rename = "byId", default)]
    by_id: Map<String, Value>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheDocument {
    #[serde(default)]
    accounts: EntityBucket,
    #[serde(default)]
    account_groups: EntityBucket,
    #[serde(default)]
    cost_centers: EntityBucket,
    #[serde(default)]
    transactions: EntityBucket,
}

impl CacheDocument {
    fn bucket(&self, kind: EntityKind) -> &EntityBucket {
        match kind {
            EntityKind::Accounts => &self.accounts,
            EntityKind::AccountGroups => &self.account_groups,
            EntityKind::CostCenters => &self.cost_centers,
            EntityKind::Transactions => &self.transactions,
        }
    }

    fn bucket_mut(&mut self, kind: EntityKind) -> &mut EntityBucket {
        match kind {
            EntityKind::Accounts => &mut self.accounts,
            EntityKind::AccountGroups => &mut self.account_groups,
            EntityKind::CostCenters => &mut self.cost_centers,
            EntityKind::Transactions => &mut self.transactions,
        }
    }
}

/// Session-scoped overlay cache over an injected key-value store.
///
/// Every operation is infallible from the caller's point of view: an empty
/// session key turns writes into no-ops, and a corrupt document reads as an
/// empty cache and is replaced on the next write.
#[derive(Clone)]
pub struct OverlayCache {
    store: Arc<dyn KeyValueStore>,
    prefix: String,
}

impl fmt::Debug for OverlayCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverlayCache")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

impl OverlayCache {
    /// Creates a cache over `store` with the given namespace prefix.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    /// Creates a cache using the configured namespace prefix.
    #[must_use]
    pub fn from_config(store: Arc<dyn KeyValueStore>, config: &CacheConfig) -> Self {
        Self::new(store, config.namespace_prefix.clone())
    }

    /// Storage key of a session's namespace.
    #[must_use]
    pub fn namespace_key(&self, session_key: &str) -> String {
        format!("{}:{}", self.prefix, session_key)
    }

    /// Creates the four entity maps for a session if they are absent.
    pub fn ensure_namespace(&self, session_key: &str) {
        if session_key.is_empty() {
            return;
        }
        let key = self.namespace_key(session_key);
        let document = self.load_or_heal(&key);
        self.save(&key, &document);
    }

    /// Writes one record, replacing any previous entry for `id`.
    pub fn upsert(&self, session_key: &str, kind: EntityKind, id: &str, record: Value) {
        if session_key.is_empty() || id.is_empty() {
            return;
        }
        let key = self.namespace_key(session_key);
        let mut document = self.load_or_heal(&key);
        document
            .bucket_mut(kind)
            .by_id
            .insert(id.to_string(), record);
        self.save(&key, &document);
        debug!(kind = %kind, id = %id, "overlay cache entry written");
    }

    /// Returns every cached record of a kind, keyed by id.
    ///
    /// Unreadable or corrupt storage yields an empty map.
    #[must_use]
    pub fn read_all(&self, session_key: &str, kind: EntityKind) -> Map<String, Value> {
        if session_key.is_empty() {
            return Map::new();
        }
        let key = self.namespace_key(session_key);
        match self.load(&key) {
            Ok(Some(mut document)) => std::mem::take(&mut document.bucket_mut(kind).by_id),
            Ok(None) => Map::new(),
            Err(err) => {
                warn!(key = %key, error = %err, "overlay cache unreadable, treating as empty");
                Map::new()
            }
        }
    }

    /// Returns one cached record.
    #[must_use]
    pub fn get(&self, session_key: &str, kind: EntityKind, id: &str) -> Option<Value> {
        if session_key.is_empty() {
            return None;
        }
        match self.load(&self.namespace_key(session_key)) {
            Ok(Some(document)) => document.bucket(kind).by_id.get(id).cloned(),
            _ => None,
        }
    }

    /// Drops one cached record. Only ever called on explicit operator request.
    pub fn evict(&self, session_key: &str, kind: EntityKind, id: &str) {
        if session_key.is_empty() {
            return;
        }
        let key = self.namespace_key(session_key);
        let mut document = self.load_or_heal(&key);
        if document.bucket_mut(kind).by_id.remove(id).is_some() {
            self.save(&key, &document);
        }
    }

    /// Removes a session's whole namespace.
    pub fn discard(&self, session_key: &str) {
        if session_key.is_empty() {
            return;
        }
        self.store.remove(&self.namespace_key(session_key));
        debug!(session = %session_key, "overlay cache namespace discarded");
    }

    /// Moves to a new session: the previous namespace is discarded.
    pub fn switch_session(&self, previous: &str, next: &str) {
        if previous != next {
            self.discard(previous);
        }
        self.ensure_namespace(next);
    }

    fn load(&self, key: &str) -> Result<Option<CacheDocument>, CacheError> {
        self.store
            .get(key)
            .map(|raw| serde_json::from_str(&raw))
            .transpose()
            .map_err(CacheError::from)
    }

    fn load_or_heal(&self, key: &str) -> CacheDocument {
        match self.load(key) {
            Ok(document) => document.unwrap_or_default(),
            Err(err) => {
                warn!(key = %key, error = %err, "overlay cache corrupt, resetting namespace");
                CacheDocument::default()
            }
        }
    }

    fn save(&self, key: &str, document: &CacheDocument) {
        let result = serde_json::to_string(document)
            .map_err(CacheError::from)
            .and_then(|raw| self.store.set(key, raw));
        if let Err(err) = result {
            warn!(key = %key, error = %err, "overlay cache write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::store::MemoryStore;
    use serde_json::json;

    fn cache() -> (Arc<MemoryStore>, OverlayCache) {
        let store = Arc::new(MemoryStore::new());
        let cache = OverlayCache::new(store.clone(), "test.overlay");
        (store, cache)
    }

    #[test]
    fn test_ensure_namespace_creates_all_buckets() {
        let (store, cache) = cache();
        cache.ensure_namespace("s1");

        let raw: Value = serde_json::from_str(&store.get("test.overlay:s1").unwrap()).unwrap();
        for kind in EntityKind::ALL {
            assert_eq!(raw[kind.as_str()], json!({"byId": {}}));
        }
    }

    #[test]
    fn test_ensure_namespace_is_idempotent() {
        let (store, cache) = cache();
        cache.ensure_namespace("s1");
        cache.upsert("s1", EntityKind::Accounts, "7", json!({"id": "7"}));
        let before = store.get("test.overlay:s1");

        cache.ensure_namespace("s1");
        assert_eq!(store.get("test.overlay:s1"), before);
    }

    #[test]
    fn test_empty_session_is_a_no_op() {
        let (store, cache) = cache();
        cache.ensure_namespace("");
        cache.upsert("", EntityKind::Accounts, "1", json!({"id": "1"}));
        assert!(store.is_empty());
        assert!(cache.read_all("", EntityKind::Accounts).is_empty());
    }

    #[test]
    fn test_upsert_ignores_empty_id() {
        let (_, cache) = cache();
        cache.upsert("s1", EntityKind::CostCenters, "", json!({"name": "x"}));
        assert!(cache.read_all("s1", EntityKind::CostCenters).is_empty());
    }

    #[test]
    fn test_upsert_overwrites_and_separates_kinds() {
        let (_, cache) = cache();
        cache.upsert("s1", EntityKind::Accounts, "7", json!({"id": "7", "name": "Caja"}));
        cache.upsert("s1", EntityKind::Accounts, "7", json!({"id": "7", "name": "Caja chica"}));
        cache.upsert("s1", EntityKind::AccountGroups, "7", json!({"id": "7", "name": "Activos"}));

        let accounts = cache.read_all("s1", EntityKind::Accounts);
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts["7"]["name"], json!("Caja chica"));
        assert_eq!(
            cache.get("s1", EntityKind::AccountGroups, "7").unwrap()["name"],
            json!("Activos")
        );
    }

    #[test]
    fn test_sessions_do_not_share_entries() {
        let (_, cache) = cache();
        cache.upsert("s1", EntityKind::Accounts, "1", json!({"id": "1"}));
        assert!(cache.read_all("s2", EntityKind::Accounts).is_empty());
    }

    #[test]
    fn test_corrupt_document_reads_empty_and_heals_on_write() {
        let (store, cache) = cache();
        store.set("test.overlay:s1", "{not json".to_string()).unwrap();

        assert!(cache.read_all("s1", EntityKind::Accounts).is_empty());

        cache.upsert("s1", EntityKind::Accounts, "3", json!({"id": "3"}));
        assert_eq!(cache.read_all("s1", EntityKind::Accounts).len(), 1);
    }

    #[test]
    fn test_evict_and_discard() {
        let (store, cache) = cache();
        cache.upsert("s1", EntityKind::Transactions, "t1", json!({"id": "t1"}));
        cache.upsert("s1", EntityKind::Transactions, "t2", json!({"id": "t2"}));

        cache.evict("s1", EntityKind::Transactions, "t1");
        let remaining = cache.read_all("s1", EntityKind::Transactions);
        assert_eq!(remaining.keys().collect::<Vec<_>>(), vec!["t2"]);

        cache.discard("s1");
        assert_eq!(store.get("test.overlay:s1"), None);
    }

    #[test]
    fn test_switch_session_discards_previous_namespace() {
        let (store, cache) = cache();
        cache.upsert("old", EntityKind::Accounts, "1", json!({"id": "1"}));

        cache.switch_session("old", "new");

        assert_eq!(store.get("test.overlay:old"), None);
        assert!(store.get("test.overlay:new").is_some());
        assert!(cache.read_all("new", EntityKind::Accounts).is_empty());
    }

    #[test]
    fn test_from_config_uses_prefix() {
        let store = Arc::new(MemoryStore::new());
        let cache = OverlayCache::from_config(store, &CacheConfig::default());
        assert_eq!(cache.namespace_key("abc"), "puente.overlay:abc");
    }
}
