//! End-to-end BatchSync behavior.

use serde_json::json;
use songbook_store::{EntityStore, InMemoryStore, ManualClock, StoreResult};
use songbook_sync_protocol::{
    BatchSyncRequest, EntityKind, FailureCode, Fields, OperationResult, Record, SyncOperation,
    Timestamp, WireFormat,
};
use songbook_sync_server::{Endpoint, ServerConfig, ServerError};
use songbook_testkit::prelude::*;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[test]
fn stale_song_update_is_reported_as_conflict() {
    let server = TestServer::memory();
    let stored = server.seed(EntityKind::Song, "song-1", song("How Great Thou Art"));
    let older = stored.last_modified.saturating_sub(Duration::from_secs(30));

    let response = server
        .sync(&BatchSyncRequest::new(vec![SyncOperation::update(
            "op-1",
            EntityKind::Song,
            "song-1",
            song("How Great"),
            older,
        )]))
        .unwrap();

    assert!(response.results.is_empty());
    assert_eq!(response.conflicts.len(), 1);
    let conflict = &response.conflicts[0];
    assert_eq!(conflict.operation_id, "op-1");
    assert_eq!(conflict.server_data, stored);
    assert_eq!(conflict.server_last_modified, stored.last_modified);
    assert_eq!(server.get(EntityKind::Song, "song-1"), Some(stored));
}

#[test]
fn current_or_newer_update_is_applied() {
    let server = TestServer::memory();
    let stored = server.seed(EntityKind::Setlist, "sl-1", setlist("Morning", &["a"]));
    server.advance(Duration::from_secs(1));

    for (op, ts) in [
        ("same", stored.last_modified),
        ("newer", server.now().saturating_add(Duration::from_secs(60))),
    ] {
        let current = server.get(EntityKind::Setlist, "sl-1").unwrap();
        let ts = ts.max(current.last_modified);
        let response = server
            .sync(&BatchSyncRequest::new(vec![SyncOperation::update(
                op,
                EntityKind::Setlist,
                "sl-1",
                fields(json!({ "songIds": ["a", "b", op] })),
                ts,
            )]))
            .unwrap();
        assert!(response.conflicts.is_empty(), "{op} conflicted");
        let stored = server.get(EntityKind::Setlist, "sl-1").unwrap();
        assert_eq!(stored.get("songIds"), Some(&json!(["a", "b", op])));
        assert_eq!(stored.get_str("name"), Some("Morning"));
    }
}

#[test]
fn changes_since_an_hour_ago_returns_the_three_new_records() {
    let server = TestServer::memory();
    let hour_ago = server.now().saturating_sub(Duration::from_secs(3600));
    server.seed_at(
        EntityKind::Song,
        "ancient",
        hour_ago.saturating_sub(Duration::from_secs(1)),
        song("Old"),
    );

    server.advance(Duration::from_secs(10));
    let response = server
        .batch_sync(&json!({
            "operations": [
                {"id": "1", "kind": "create", "entityKind": "song", "payload": {"title": "One"}},
                {"id": "2", "kind": "create", "entityKind": "song", "payload": {"title": "Two"}},
                {"id": "3", "kind": "create", "entityKind": "setlist", "payload": {"name": "Set"}}
            ],
            "clientLastSync": hour_ago.as_millis()
        }))
        .unwrap();

    let kinds: Vec<_> = response
        .server_changes
        .iter()
        .map(|c| c.entity_kind)
        .collect();
    assert_eq!(
        kinds,
        vec![EntityKind::Song, EntityKind::Song, EntityKind::Setlist]
    );
    assert!(response
        .server_changes
        .iter()
        .all(|c| c.data.last_modified > hour_ago));
}

#[test]
fn deleted_records_leave_reads_and_feed() {
    let server = TestServer::memory();
    server.seed(EntityKind::Arrangement, "arr-1", arrangement("s1", "Acoustic"));
    let before = server.now().saturating_sub(Duration::from_millis(1));

    let response = server
        .sync(
            &BatchSyncRequest::new(vec![SyncOperation::delete(
                "del",
                EntityKind::Arrangement,
                "arr-1",
            )])
            .with_last_sync(before),
        )
        .unwrap();

    assert_eq!(
        response.results[0].result(),
        Some(&OperationResult::Deleted {
            entity_id: "arr-1".into(),
            existed: true
        })
    );
    assert!(server.get(EntityKind::Arrangement, "arr-1").is_none());
    assert!(response.server_changes.is_empty());
    assert!(server.changes_since(Some(Timestamp::EPOCH)).unwrap().is_empty());
}

#[test]
fn delete_of_missing_id_succeeds_for_every_kind() {
    let server = TestServer::memory();
    let ops = EntityKind::ALL
        .into_iter()
        .map(|kind| SyncOperation::delete(format!("del-{kind}"), kind, "ghost"))
        .collect();

    let response = server.sync(&BatchSyncRequest::new(ops)).unwrap();
    assert_eq!(response.results.len(), 4);
    assert!(response.results.iter().all(|r| matches!(
        r.result(),
        Some(OperationResult::Deleted { existed: false, .. })
    )));
}

#[test]
fn user_update_upserts_but_song_update_does_not() {
    let server = TestServer::memory();
    let response = server
        .sync(&BatchSyncRequest::new(vec![
            SyncOperation::update("u", EntityKind::User, "google|77", user("n@x.org"), Timestamp::EPOCH),
            SyncOperation::update("s", EntityKind::Song, "nope", song("X"), Timestamp::EPOCH),
        ]))
        .unwrap();

    assert!(response.results[0].is_success());
    assert_eq!(response.results[1].failure_code(), Some(FailureCode::NotFound));
    assert!(server.get(EntityKind::User, "google|77").is_some());
    assert_eq!(server.count(EntityKind::Song), 0);
}

#[test]
fn oversized_batch_is_rejected_with_zero_writes() {
    let server = TestServer::memory_with_config(ServerConfig::new().with_max_batch_size(3));
    let ops: Vec<_> = (0..4)
        .map(|i| json!({"id": format!("op-{i}"), "kind": "create", "entityKind": "song", "payload": {"title": "t"}}))
        .collect();

    let err = server.batch_sync(&json!({ "operations": ops })).unwrap_err();
    assert!(err.is_client_error());
    assert_eq!(err.problems(), ["batch of 4 operations exceeds the maximum of 3"]);
    assert_eq!(server.total(), 0);
}

#[test]
fn validation_reports_every_problem() {
    let server = TestServer::memory();
    let err = server
        .batch_sync(&json!({
            "operations": [
                {"id": "a", "kind": "upsert", "entityKind": "song"},
                {"id": "b", "kind": "update", "entityKind": "review"},
                {"id": "a", "kind": "delete", "entityKind": "song", "entityId": "x"}
            ]
        }))
        .unwrap_err();

    let problems = err.problems();
    assert!(problems.len() >= 4, "{problems:?}");
    assert!(problems.iter().any(|p| p.contains("operations[0].kind")));
    assert!(problems.iter().any(|p| p.contains("operations[1].entityKind")));
    assert!(problems.iter().any(|p| p.contains("operations[1].entityId")));
    assert!(problems.iter().any(|p| p.contains("duplicated")));
    assert_eq!(server.total(), 0);
}

#[test]
fn unavailable_store_fails_the_call_before_any_write() {
    let clock = Arc::new(ManualClock::new(Timestamp::from_millis(START_MILLIS)));
    let flaky = Arc::new(FlakyStore::new(Arc::new(InMemoryStore::with_clock(clock.clone()))));
    let server = TestServer::over(flaky.clone(), clock);
    flaky.set_offline(true);

    let err = server
        .sync(&BatchSyncRequest::new(vec![SyncOperation::create(
            "c",
            EntityKind::Song,
            song("Lost"),
        )]))
        .unwrap_err();

    assert!(matches!(err, ServerError::StoreUnavailable(_)));
    assert!(err.is_server_error());
    assert_eq!(flaky.writes(), 0);
}

#[test]
fn mid_batch_store_error_is_a_per_operation_failure() {
    let clock = Arc::new(ManualClock::new(Timestamp::from_millis(START_MILLIS)));
    let flaky = Arc::new(FlakyStore::new(Arc::new(InMemoryStore::with_clock(clock.clone()))));
    let server = TestServer::over(flaky.clone(), clock);
    flaky.fail_id("cursed");

    let response = server
        .sync(&BatchSyncRequest::new(vec![
            SyncOperation::update("1", EntityKind::User, "cursed", user("a@b.c"), Timestamp::EPOCH),
            SyncOperation::create("2", EntityKind::Song, song("Fine")),
        ]))
        .unwrap();

    assert_eq!(response.results[0].failure_code(), Some(FailureCode::StoreError));
    assert!(response.results[1].is_success());
}

#[test]
fn broken_feed_fails_the_call() {
    let clock = Arc::new(ManualClock::new(Timestamp::from_millis(START_MILLIS)));
    let flaky = Arc::new(FlakyStore::new(Arc::new(InMemoryStore::with_clock(clock.clone()))));
    let server = TestServer::over(flaky.clone(), clock);
    flaky.set_feed_broken(true);

    let err = server
        .sync(&BatchSyncRequest::new(Vec::new()).with_last_sync(Timestamp::EPOCH))
        .unwrap_err();
    assert!(matches!(err, ServerError::Store(_)));
}

#[test]
fn file_store_round_trip_over_json_bytes() {
    let server = TestServer::file();
    let body = serde_json::to_vec(&json!({
        "operations": [{"id": "c", "kind": "create", "entityKind": "user", "payload": {"email": "a@b.c"}}]
    }))
    .unwrap();

    let bytes = server
        .handle_bytes(Endpoint::BatchSync, &body, WireFormat::Json)
        .unwrap();
    let response: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(response["results"][0]["status"], "success");
    assert_eq!(response["results"][0]["result"]["type"], "created");
    assert_eq!(response["results"][0]["result"]["record"]["email"], "a@b.c");
    assert!(response["serverTimestamp"].is_u64());
    assert_eq!(server.store.count(EntityKind::User).unwrap(), 1);
}

/// Lands one write from another client right after the first song query of
/// a feed.
struct WriteDuringFeed {
    inner: Arc<InMemoryStore>,
    pending: Mutex<Option<(EntityKind, &'static str)>>,
}

impl EntityStore for WriteDuringFeed {
    fn ping(&self) -> StoreResult<()> {
        self.inner.ping()
    }

    fn insert(
        &self,
        kind: EntityKind,
        fields: Fields,
    ) -> StoreResult<Record> {
        self.inner.insert(kind, fields)
    }

    fn get(
        &self,
        kind: EntityKind,
        id: &str,
    ) -> StoreResult<Option<Record>> {
        self.inner.get(kind, id)
    }

    fn put(
        &self,
        kind: EntityKind,
        id: &str,
        fields: Fields,
    ) -> StoreResult<Record> {
        self.inner.put(kind, id, fields)
    }

    fn remove(&self, kind: EntityKind, id: &str) -> StoreResult<bool> {
        self.inner.remove(kind, id)
    }

    fn modified_since(
        &self,
        kind: EntityKind,
        since: Timestamp,
    ) -> StoreResult<Vec<Record>> {
        let records = self.inner.modified_since(kind, since)?;
        if kind == EntityKind::Song {
            if let Some((late_kind, id)) = self.pending.lock().unwrap().take() {
                self.inner.put(late_kind, id, song("Late"))?;
            }
        }
        Ok(records)
    }

    fn count(&self, kind: EntityKind) -> StoreResult<usize> {
        self.inner.count(kind)
    }

    fn checkpoint(&self) -> StoreResult<Timestamp> {
        self.inner.checkpoint()
    }
}

#[test]
fn write_racing_the_feed_is_caught_by_the_next_sync() {
    for late_kind in [EntityKind::Song, EntityKind::Arrangement] {
        let clock = Arc::new(ManualClock::new(Timestamp::from_millis(START_MILLIS)));
        let inner = Arc::new(InMemoryStore::with_clock(clock.clone()));
        let racing = Arc::new(WriteDuringFeed {
            inner: inner.clone(),
            pending: Mutex::new(Some((late_kind, "late"))),
        });
        let server = TestServer::over(racing, clock);

        let first = server
            .sync(
                &BatchSyncRequest::new(vec![SyncOperation::create("c", EntityKind::Song, song("Own"))])
                    .with_last_sync(Timestamp::EPOCH),
            )
            .unwrap();
        let late = inner.get(late_kind, "late").unwrap().unwrap();

        assert!(late.last_modified > first.server_timestamp);
        assert!(first.server_changes.iter().all(|c| c.data.id != "late"));
        assert!(first
            .server_changes
            .iter()
            .all(|c| c.data.last_modified <= first.server_timestamp));

        let second = server
            .sync(&BatchSyncRequest::new(Vec::new()).with_last_sync(first.server_timestamp))
            .unwrap();
        assert!(second
            .server_changes
            .iter()
            .any(|c| c.entity_kind == late_kind && c.data.id == "late"));
    }
}
