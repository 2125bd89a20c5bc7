//! End-to-end conflict resolution.

use serde_json::json;
use songbook_sync_protocol::{
    decode, encode, BatchSyncRequest, EntityKind, FailureCode, OperationResult, Resolution,
    ResolveConflictsRequest, ResolveConflictsResponse, SyncOperation, WireFormat,
};
use songbook_sync_server::Endpoint;
use songbook_testkit::prelude::*;
use std::time::Duration;

/// Seeds a song, moves it forward, and returns the conflict a stale client gets.
fn conflicted(server: &TestServer) -> songbook_sync_protocol::ConflictRecord {
    let original = server.seed(
        EntityKind::Song,
        "song-1",
        fields(json!({"title": "Original", "key": "C", "meta": {"ccli": "111", "author": "A"}})),
    );
    server.advance(Duration::from_secs(5));
    server.seed(
        EntityKind::Song,
        "song-1",
        fields(json!({"title": "Server edit", "key": "C", "meta": {"ccli": "111", "author": "A"}})),
    );

    let response = server
        .sync(&BatchSyncRequest::new(vec![SyncOperation::update(
            "op-1",
            EntityKind::Song,
            "song-1",
            fields(json!({"key": "E"})),
            original.last_modified,
        )]))
        .unwrap();
    response.conflicts.into_iter().next().unwrap()
}

#[test]
fn keep_server_leaves_record_untouched() {
    let server = TestServer::memory();
    let conflict = conflicted(&server);
    let before = server.get(EntityKind::Song, "song-1").unwrap();
    let before_bytes = serde_json::to_vec(&before).unwrap();
    server.advance(Duration::from_secs(1));

    let response = server
        .resolve(&ResolveConflictsRequest::new(vec![Resolution::keep_server(
            conflict.operation_id,
            conflict.entity_kind,
            conflict.entity_id,
        )]))
        .unwrap();

    assert!(matches!(
        response.results[0].result(),
        Some(OperationResult::Acknowledged { .. })
    ));
    let after = server.get(EntityKind::Song, "song-1").unwrap();
    assert_eq!(serde_json::to_vec(&after).unwrap(), before_bytes);
}

#[test]
fn keep_client_applies_the_client_data() {
    let server = TestServer::memory();
    let conflict = conflicted(&server);

    let response = server
        .resolve(&ResolveConflictsRequest::new(vec![Resolution::keep_client(
            conflict.operation_id.clone(),
            conflict.entity_kind,
            conflict.entity_id.clone(),
            conflict.client_data.clone(),
        )]))
        .unwrap();

    assert_eq!(response.results[0].operation_id(), "op-1");
    let stored = server.get(EntityKind::Song, "song-1").unwrap();
    assert_eq!(stored.get_str("key"), Some("E"));
    assert_eq!(stored.get_str("title"), Some("Server edit"));
    assert!(stored.last_modified > conflict.server_last_modified);
}

#[test]
fn merge_patches_nested_fields() {
    let server = TestServer::memory();
    let conflict = conflicted(&server);

    server
        .resolve(&ResolveConflictsRequest::new(vec![Resolution::merge(
            conflict.operation_id,
            conflict.entity_kind,
            conflict.entity_id,
            fields(json!({"key": "E", "meta": {"author": "B", "ccli": null}})),
        )]))
        .unwrap();

    let stored = server.get(EntityKind::Song, "song-1").unwrap();
    assert_eq!(stored.get_str("key"), Some("E"));
    assert_eq!(stored.get("meta"), Some(&json!({"author": "B"})));
}

#[test]
fn resolutions_fail_individually() {
    let server = TestServer::memory();
    let conflict = conflicted(&server);

    let response = server
        .resolve(&ResolveConflictsRequest::new(vec![
            Resolution::keep_client("x", EntityKind::Setlist, "gone", setlist("S", &[])),
            Resolution::merge("y", EntityKind::Song, "song-1", fields(json!({"title": ""}))),
            Resolution::keep_server(conflict.operation_id, conflict.entity_kind, conflict.entity_id),
        ]))
        .unwrap();

    assert_eq!(response.results[0].failure_code(), Some(FailureCode::NotFound));
    assert_eq!(
        response.results[1].failure_code(),
        Some(FailureCode::InvalidPayload)
    );
    assert!(response.results[2].is_success());
}

#[test]
fn non_list_resolutions_is_a_validation_error() {
    let server = TestServer::memory();
    let err = server
        .resolve_conflicts(&json!({ "resolutions": {"operationId": "x"} }))
        .unwrap_err();
    assert_eq!(err.problems(), ["resolutions must be an array"]);

    let err = server
        .resolve_conflicts(&json!({
            "resolutions": [{"operationId": "x", "entityKind": "song", "entityId": "s", "choice": "merge"}]
        }))
        .unwrap_err();
    assert_eq!(err.problems(), ["resolutions[0].data is required for merge"]);
}

#[test]
fn resolve_over_cbor() {
    let server = TestServer::memory();
    let conflict = conflicted(&server);
    let request = ResolveConflictsRequest::new(vec![Resolution::keep_server(
        conflict.operation_id,
        conflict.entity_kind,
        conflict.entity_id,
    )]);

    let bytes = server
        .handle_bytes(
            Endpoint::ResolveConflicts,
            &encode(&request, WireFormat::Cbor).unwrap(),
            WireFormat::Cbor,
        )
        .unwrap();
    let response: ResolveConflictsResponse = decode(&bytes, WireFormat::Cbor).unwrap();
    assert!(response.results[0].is_success());
}
