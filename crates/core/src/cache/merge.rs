//! Overlay of cached records onto a server page.

use std::collections::HashSet;

use serde_json::{Map, Value};

use puente_shared::types::wire::id_from_value;

/// Normalized id of a record's `id` field.
#[must_use]
pub fn record_id(record: &Value) -> Option<String> {
    record.get("id").and_then(id_from_value)
}

/// Merges cached records into a server list.
///
/// Records that only exist in the cache come first, in ascending key order.
/// Server records follow in server order; when the cache holds the same id its
/// fields are shallow-merged on top, cached values winning. Server records
/// without an id, and non-object values, pass through untouched.
#[must_use]
pub fn merge(server_list: &[Value], cached: &Map<String, Value>) -> Vec<Value> {
    let server_ids: HashSet<String> = server_list.iter().filter_map(record_id).collect();

    let mut merged: Vec<Value> = cached
        .iter()
        .filter(|(id, _)| !server_ids.contains(id.as_str()))
        .map(|(_, record)| record.clone())
        .collect();
    merged.reserve(server_list.len());

    for record in server_list {
        let overlay = record_id(record).and_then(|id| cached.get(&id));
        merged.push(match (record, overlay) {
            (Value::Object(server), Some(Value::Object(local))) => {
                let mut combined = server.clone();
                for (key, value) in local {
                    combined.insert(key.clone(), value.clone());
                }
                Value::Object(combined)
            }
            _ => record.clone(),
        });
    }

    merged
}
