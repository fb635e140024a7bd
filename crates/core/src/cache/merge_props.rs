//! Property-based tests for list merging.
//!
//! - Merging is idempotent
//! - Every cached field is visible in the merged output
//! - Output length is server length plus cache-only records

use std::collections::BTreeSet;

use proptest::prelude::*;
use serde_json::{Map, Value, json};

use super::merge::{merge, record_id};

/// Strategy for a server page with distinct ids from a small pool.
fn server_page() -> impl Strategy<Value = Vec<Value>> {
    prop::collection::btree_set(0u32..20, 0..8).prop_map(|ids| {
        ids.into_iter()
            .map(|id| json!({"id": id, "name": format!("server-{id}"), "code": id * 10}))
            .collect()
    })
}

/// Strategy for cached records keyed by id from the same pool.
fn cached_records() -> impl Strategy<Value = Map<String, Value>> {
    prop::collection::btree_map(0u32..20, "[a-z]{1,6}", 0..8).prop_map(|entries| {
        entries
            .into_iter()
            .map(|(id, name)| (id.to_string(), json!({"id": id.to_string(), "name": name})))
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// *For any* page and cache, merging the merged list again changes nothing.
    #[test]
    fn prop_merge_is_idempotent(server in server_page(), cached in cached_records()) {
        let once = merge(&server, &cached);
        let twice = merge(&once, &cached);
        prop_assert_eq!(once, twice);
    }

    /// *For any* cached record, the merged record with that id carries its fields.
    #[test]
    fn prop_cached_fields_win(server in server_page(), cached in cached_records()) {
        let merged = merge(&server, &cached);

        for (id, record) in &cached {
            let found = merged
                .iter()
                .find(|candidate| record_id(candidate).as_deref() == Some(id.as_str()));
            prop_assert!(found.is_some(), "cached id {} missing from merge", id);
            prop_assert_eq!(&found.unwrap()["name"], &record["name"]);
        }
    }

    /// *For any* page and cache, the merge adds exactly the cache-only ids.
    #[test]
    fn prop_length_counts_cache_only_records(server in server_page(), cached in cached_records()) {
        let server_ids: BTreeSet<String> = server.iter().filter_map(record_id).collect();
        let cache_only = cached.keys().filter(|id| !server_ids.contains(*id)).count();

        let merged = merge(&server, &cached);
        prop_assert_eq!(merged.len(), server.len() + cache_only);

        for record in &merged[..cache_only] {
            let id = record_id(record).unwrap();
            prop_assert!(!server_ids.contains(&id));
        }
    }
}
