//! Scripted remote shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex};

use serde_json::{Value, json};

use puente_core::cache::{MemoryStore, OverlayCache};
use puente_data::{RemoteProcedures, TransportError};
use puente_shared::Session;

/// Replays queued responses and records every call.
#[derive(Default)]
pub struct ScriptedRemote {
    responses: Mutex<VecDeque<Result<Value, TransportError>>>,
    calls: Mutex<Vec<(String, Value)>>,
}

impl ScriptedRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, response: Value) {
        self.responses.lock().unwrap().push_back(Ok(response));
    }

    pub fn fail(&self, error: TransportError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last_payload(&self) -> Value {
        self.calls
            .lock()
            .unwrap()
            .last()
            .map(|(_, payload)| payload.clone())
            .expect("no call recorded")
    }
}

impl RemoteProcedures for ScriptedRemote {
    fn call(
        &self,
        procedure: &str,
        payload: Value,
    ) -> impl Future<Output = Result<Value, TransportError>> + Send {
        self.calls
            .lock()
            .unwrap()
            .push((procedure.to_string(), payload));
        let response = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Unreachable("no scripted response".into())));
        async move { response }
    }
}

pub fn session() -> Session {
    Session::new("sess-1", Some("42".to_string()))
}

pub fn cache() -> (Arc<MemoryStore>, OverlayCache) {
    let store = Arc::new(MemoryStore::new());
    let cache = OverlayCache::new(store.clone(), "test.overlay");
    (store, cache)
}

pub fn list_ok(rows: Value) -> Value {
    json!({"ok": true, "rows": rows})
}

pub fn mutation_ok(key: &str, record: Value) -> Value {
    json!({"ok": true, "rows": [{"status": "ok", "message": "ok", "data": {key: record}}]})
}
