//! Generic entity repository.
//!
//! Reads a server page, overlays the session's cached writes on top, and keeps
//! the merged list in memory. Writes go to the backend first; only a confirmed
//! success is written back into the cache and the list.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use puente_core::cache::{OverlayCache, merge, record_id};
use puente_shared::Session;
use puente_shared::types::{ListOptions, RegisterStatus};

use crate::entities::{
    Account, AccountGroup, CostCenter, Entity, EntityDraft, MutationMode, Transaction,
};
use crate::error::{DataError, DataResult};
use crate::remote::RemoteProcedures;
use crate::remote::envelope::{list_records, mutation_outcome};

/// Repository over one entity type.
#[derive(Debug)]
pub struct EntityRepository<E: Entity, R: RemoteProcedures> {
    remote: Arc<R>,
    cache: OverlayCache,
    session: Session,
    items: Vec<E>,
    last_error: Option<String>,
    last_options: ListOptions,
}

/// Chart of accounts repository.
pub type AccountRepository<R> = EntityRepository<Account, R>;
/// Account group repository.
pub type AccountGroupRepository<R> = EntityRepository<AccountGroup, R>;
/// Cost center repository.
pub type CostCenterRepository<R> = EntityRepository<CostCenter, R>;
/// Transaction repository.
pub type TransactionRepository<R> = EntityRepository<Transaction, R>;

impl<E: Entity, R: RemoteProcedures> EntityRepository<E, R> {
    /// Creates a repository for `session`, preparing its cache namespace.
    #[must_use]
    pub fn new(remote: Arc<R>, cache: OverlayCache, session: Session) -> Self {
        cache.ensure_namespace(&session.session_id);
        Self {
            remote,
            cache,
            session,
            items: Vec::new(),
            last_error: None,
            last_options: ListOptions::default(),
        }
    }

    /// Active session.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Switches to another session, discarding the previous cache namespace.
    pub fn set_session(&mut self, session: Session) {
        self.cache
            .switch_session(&self.session.session_id, &session.session_id);
        self.session = session;
        self.items.clear();
        self.last_error = None;
    }

    /// Current merged list.
    #[must_use]
    pub fn items(&self) -> &[E] {
        &self.items
    }

    /// Message of the last failed list read, cleared by the next success.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Options of the last list read.
    #[must_use]
    pub fn last_options(&self) -> &ListOptions {
        &self.last_options
    }

    /// Looks up a record in the current list.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&E> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// Reads one page and merges it with the cached writes of this session.
    ///
    /// # Errors
    ///
    /// Returns `DataError::Precondition` without a session identifier, or the
    /// transport/operation error of the read. On failure accounts and groups
    /// clear their list; cost centers and transactions keep it and set
    /// [`last_error`](Self::last_error).
    pub async fn list(&mut self, options: ListOptions) -> DataResult<&[E]> {
        self.last_options = options;
        match self.fetch_page().await {
            Ok(items) => {
                debug!(kind = %E::KIND, count = items.len(), "list merged with overlay cache");
                self.items = items;
                self.last_error = None;
                Ok(&self.items)
            }
            Err(err) => {
                warn!(kind = %E::KIND, error = %err, code = err.error_code(), "list failed");
                if E::CLEAR_ON_LIST_FAILURE {
                    self.items.clear();
                }
                self.last_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Re-reads the page last requested with [`list`](Self::list).
    ///
    /// # Errors
    ///
    /// Same as [`list`](Self::list).
    pub async fn refresh(&mut self) -> DataResult<&[E]> {
        self.list(self.last_options.clone()).await
    }

    /// Creates a record.
    ///
    /// # Errors
    ///
    /// Returns `DataError::Precondition` for a missing session or required
    /// field, or the error reported by the backend.
    pub async fn create(&mut self, draft: E::Draft) -> DataResult<E> {
        self.require_session()?;
        draft
            .validate(MutationMode::Create)
            .map_err(DataError::Precondition)?;

        let fields = draft.fields(MutationMode::Create);
        let payload = self.padded(E::wire_payload(&fields));
        self.mutate(E::PROCEDURES.create, payload, fields, None).await
    }

    /// Updates a record; only the fields set on the draft are sent.
    ///
    /// # Errors
    ///
    /// Returns `DataError::Precondition` for a missing session, a missing
    /// target id or an invalid field, or the error reported by the backend.
    pub async fn update(&mut self, draft: E::Draft) -> DataResult<E> {
        self.require_session()?;
        let id = draft
            .target_id()
            .map(ToString::to_string)
            .ok_or_else(|| DataError::Precondition(format!("{} update requires an id", E::KIND)))?;
        draft
            .validate(MutationMode::Update)
            .map_err(DataError::Precondition)?;

        let fields = draft.fields(MutationMode::Update);
        let mut payload = self.padded(E::wire_payload(&fields));
        payload.insert(E::ID_FIELD.to_string(), Value::String(id.clone()));
        self.mutate(E::PROCEDURES.update, payload, fields, Some(id)).await
    }

    /// Marks a record inactive through the update procedure.
    ///
    /// # Errors
    ///
    /// Same as [`update`](Self::update).
    pub async fn deactivate(&mut self, id: &str) -> DataResult<E> {
        self.update(<E::Draft as EntityDraft>::deactivation(id))
            .await
    }

    /// Writes a record confirmed elsewhere into the cache and the list.
    ///
    /// # Errors
    ///
    /// Returns `DataError::Decode` if the record cannot be serialized.
    pub fn push_optimistic(&mut self, record: E) -> DataResult<()> {
        self.write_back(record)
    }

    async fn fetch_page(&self) -> DataResult<Vec<E>> {
        self.require_session()?;

        let mut payload = self.session.identity_payload();
        payload.extend(self.last_options.to_payload());
        let raw = self
            .remote
            .call(E::PROCEDURES.list, Value::Object(payload))
            .await?;

        let server: Vec<Value> = list_records(&raw)?
            .into_iter()
            .filter_map(canonical::<E>)
            .collect();

        // Cache-only records must pass the status filter; overlays always apply.
        let wanted = self.last_options.filters.register_status;
        let server_ids: HashSet<String> = server.iter().filter_map(record_id).collect();
        let cached: Map<String, Value> = self
            .cache
            .read_all(&self.session.session_id, E::KIND)
            .into_iter()
            .filter(|(id, record)| {
                server_ids.contains(id) || wanted.is_none_or(|status| status_of(record) == status)
            })
            .collect();

        merge(&server, &cached)
            .into_iter()
            .map(|record| serde_json::from_value(record).map_err(DataError::from))
            .collect()
    }

    async fn mutate(
        &mut self,
        procedure: &str,
        payload: Map<String, Value>,
        fields: Map<String, Value>,
        target_id: Option<String>,
    ) -> DataResult<E> {
        let raw = self.remote.call(procedure, Value::Object(payload)).await?;
        let outcome = mutation_outcome(&raw)?;

        let record: E = match outcome.record(E::RECORD_KEY) {
            Some(record) => serde_json::from_value(record)?,
            None => self.fallback_record(fields, target_id.as_deref())?,
        };

        debug!(kind = %E::KIND, id = %record.id(), procedure, "mutation confirmed");
        self.write_back(record.clone())?;
        Ok(record)
    }

    /// Record to write back when the backend confirmed without returning one:
    /// the known record with the changed fields on top.
    fn fallback_record(
        &self,
        fields: Map<String, Value>,
        target_id: Option<&str>,
    ) -> DataResult<E> {
        let mut base = match target_id {
            Some(id) => self.known_record(id)?,
            None => Map::new(),
        };
        base.extend(fields);
        if let Some(id) = target_id {
            base.insert("id".to_string(), Value::String(id.to_string()));
        }
        Ok(serde_json::from_value(Value::Object(base))?)
    }

    fn known_record(&self, id: &str) -> DataResult<Map<String, Value>> {
        let known = match self.find(id) {
            Some(item) => serde_json::to_value(item)?,
            None => self
                .cache
                .get(&self.session.session_id, E::KIND, id)
                .unwrap_or(Value::Null),
        };
        Ok(match known {
            Value::Object(map) => map,
            _ => Map::new(),
        })
    }

    fn write_back(&mut self, record: E) -> DataResult<()> {
        let value = serde_json::to_value(&record)?;
        self.cache
            .upsert(&self.session.session_id, E::KIND, record.id(), value);

        let position = (!record.id().is_empty())
            .then(|| self.items.iter().position(|item| item.id() == record.id()))
            .flatten();
        match position {
            Some(index) => self.items[index] = record,
            None => self.items.insert(0, record),
        }
        Ok(())
    }

    fn require_session(&self) -> DataResult<()> {
        if self.session.is_valid() {
            Ok(())
        } else {
            Err(DataError::Precondition(
                "no active session; sign in again".to_string(),
            ))
        }
    }

    fn padded(&self, fields: Map<String, Value>) -> Map<String, Value> {
        let mut payload = self.session.identity_payload();
        payload.extend(fields);
        payload
    }
}

impl<R: RemoteProcedures> EntityRepository<AccountGroup, R> {
    /// Active groups that may be chosen as parent of `exclude_id`.
    #[must_use]
    pub fn parent_candidates(&self, exclude_id: Option<&str>) -> Vec<&AccountGroup> {
        self.items
            .iter()
            .filter(|group| group.register_status.is_active())
            .filter(|group| exclude_id != Some(group.id.as_str()))
            .collect()
    }
}

/// Maps a raw row into the entity's canonical serialized shape.
fn canonical<E: Entity>(row: Value) -> Option<Value> {
    let record = serde_json::from_value::<E>(row)
        .and_then(serde_json::to_value);
    match record {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(kind = %E::KIND, error = %err, "skipping malformed row");
            None
        }
    }
}

fn status_of(record: &Value) -> RegisterStatus {
    record
        .get("register_status")
        .and_then(Value::as_str)
        .map_or(RegisterStatus::Active, RegisterStatus::parse_lenient)
}
