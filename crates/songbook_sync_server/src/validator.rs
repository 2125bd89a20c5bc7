//! Structural validation of inbound requests.
//!
//! Validation runs on the untyped document so that every problem in a
//! request is reported together. A request with any problem is rejected
//! whole; nothing is partially admitted.

use crate::error::ValidationError;
use serde_json::{Map, Value};
use songbook_sync_protocol::{
    EntityKind, Fields, OperationKind, Resolution, ResolutionChoice, SyncOperation, Timestamp,
};
use std::collections::HashSet;

/// A structurally valid BatchSync request.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedBatch {
    /// Operations in submission order. Ids are unique; updates carry an
    /// entity id and client timestamp; deletes carry an entity id.
    pub operations: Vec<SyncOperation>,
    /// Reference time for the catch-up feed.
    pub client_last_sync: Option<Timestamp>,
}

#[derive(Default)]
struct Problems(Vec<String>);

impl Problems {
    fn push(&mut self, problem: impl Into<String>) {
        self.0.push(problem.into());
    }

    fn finish<T>(self, value: T) -> Result<T, ValidationError> {
        if self.0.is_empty() {
            Ok(value)
        } else {
            Err(ValidationError { problems: self.0 })
        }
    }
}

fn is_absent(obj: &Map<String, Value>, key: &str) -> bool {
    matches!(obj.get(key), None | Some(Value::Null))
}

fn optional_string(
    obj: &Map<String, Value>,
    key: &str,
    at: &str,
    problems: &mut Problems,
) -> Option<String> {
    match obj.get(key) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(_) => {
            problems.push(format!("{at}{key} must be a non-empty string"));
            None
        }
    }
}

fn required_string(
    obj: &Map<String, Value>,
    key: &str,
    at: &str,
    problems: &mut Problems,
) -> Option<String> {
    if is_absent(obj, key) {
        problems.push(format!("{at}{key} is required"));
        return None;
    }
    optional_string(obj, key, at, problems)
}

fn optional_timestamp(
    obj: &Map<String, Value>,
    key: &str,
    at: &str,
    problems: &mut Problems,
) -> Option<Timestamp> {
    match obj.get(key) {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) if n.as_u64().is_some() => n.as_u64().map(Timestamp::from_millis),
        Some(_) => {
            problems.push(format!(
                "{at}{key} must be a non-negative integer of milliseconds since the epoch"
            ));
            None
        }
    }
}

fn optional_object(
    obj: &Map<String, Value>,
    key: &str,
    at: &str,
    problems: &mut Problems,
) -> Option<Fields> {
    match obj.get(key) {
        None | Some(Value::Null) => None,
        Some(Value::Object(map)) => Some(map.clone()),
        Some(_) => {
            problems.push(format!("{at}{key} must be an object"));
            None
        }
    }
}

/// Parses an enumerated name, reporting unknown or mistyped values.
fn enumerated<T>(
    obj: &Map<String, Value>,
    key: &str,
    at: &str,
    allowed: &str,
    parse: impl Fn(&str) -> Option<T>,
    problems: &mut Problems,
) -> Option<T> {
    match obj.get(key) {
        None | Some(Value::Null) => {
            problems.push(format!("{at}{key} is required"));
            None
        }
        Some(Value::String(name)) => {
            let parsed = parse(name);
            if parsed.is_none() {
                problems.push(format!("{at}{key} '{name}' is not one of {allowed}"));
            }
            parsed
        }
        Some(_) => {
            problems.push(format!("{at}{key} must be a string"));
            None
        }
    }
}

/// Reads the top-level array `key`, enforcing the size cap.
fn top_level_array<'a>(
    request: &'a Value,
    key: &str,
    noun: &str,
    max: usize,
    problems: &mut Problems,
) -> Option<&'a Vec<Value>> {
    let Some(obj) = request.as_object() else {
        problems.push("request must be an object");
        return None;
    };
    match obj.get(key) {
        None | Some(Value::Null) => {
            problems.push(format!("{key} is required"));
            None
        }
        Some(Value::Array(items)) => {
            if items.len() > max {
                problems.push(format!(
                    "batch of {} {noun} exceeds the maximum of {max}",
                    items.len()
                ));
            }
            Some(items)
        }
        Some(_) => {
            problems.push(format!("{key} must be an array"));
            None
        }
    }
}

/// Validates a BatchSync request.
///
/// # Errors
///
/// Returns every problem found: non-object request, missing or non-array
/// `operations`, a batch over `max_batch_size`, unknown operation or entity
/// kinds, missing ids, missing payloads, missing update timestamps, and
/// duplicate operation ids.
pub fn validate_batch(
    request: &Value,
    max_batch_size: usize,
) -> Result<ValidatedBatch, ValidationError> {
    let mut problems = Problems::default();

    let client_last_sync = request
        .as_object()
        .and_then(|obj| optional_timestamp(obj, "clientLastSync", "", &mut problems));

    let mut operations = Vec::new();
    if let Some(items) =
        top_level_array(request, "operations", "operations", max_batch_size, &mut problems)
    {
        let mut seen = HashSet::new();
        for (index, item) in items.iter().enumerate() {
            if let Some(op) = parse_operation(index, item, &mut seen, &mut problems) {
                operations.push(op);
            }
        }
    }

    problems.finish(ValidatedBatch {
        operations,
        client_last_sync,
    })
}

fn parse_operation(
    index: usize,
    item: &Value,
    seen: &mut HashSet<String>,
    problems: &mut Problems,
) -> Option<SyncOperation> {
    let at = format!("operations[{index}].");
    let Some(obj) = item.as_object() else {
        problems.push(format!("operations[{index}] must be an object"));
        return None;
    };

    let id = required_string(obj, "id", &at, problems);
    if let Some(id) = &id {
        if !seen.insert(id.clone()) {
            problems.push(format!("{at}id '{id}' is duplicated in this batch"));
        }
    }

    let kind = enumerated(
        obj,
        "kind",
        &at,
        "create, update, delete",
        OperationKind::from_name,
        problems,
    );
    let entity_kind = enumerated(
        obj,
        "entityKind",
        &at,
        "song, setlist, arrangement, user",
        EntityKind::from_name,
        problems,
    );
    let entity_id = optional_string(obj, "entityId", &at, problems);
    let payload = optional_object(obj, "payload", &at, problems);
    let client_timestamp = optional_timestamp(obj, "clientTimestamp", &at, problems);
    let client_id = optional_string(obj, "clientId", &at, problems);

    if let Some(kind) = kind {
        if kind.requires_entity_id() && is_absent(obj, "entityId") {
            problems.push(format!("{at}entityId is required for {kind}"));
        }
        if kind.requires_payload() && is_absent(obj, "payload") {
            problems.push(format!("{at}payload is required for {kind}"));
        }
        if kind == OperationKind::Update && is_absent(obj, "clientTimestamp") {
            problems.push(format!("{at}clientTimestamp is required for update"));
        }
    }

    Some(SyncOperation {
        id: id?,
        kind: kind?,
        entity_kind: entity_kind?,
        entity_id,
        payload: payload.unwrap_or_default(),
        client_timestamp,
        client_id,
    })
}

/// Validates a ResolveConflicts request.
///
/// # Errors
///
/// Returns every problem found, including a non-list `resolutions`, unknown
/// choices, and `client`/`merge` resolutions without `data`.
pub fn validate_resolutions(
    request: &Value,
    max_resolutions: usize,
) -> Result<Vec<Resolution>, ValidationError> {
    let mut problems = Problems::default();
    let mut resolutions = Vec::new();

    if let Some(items) = top_level_array(
        request,
        "resolutions",
        "resolutions",
        max_resolutions,
        &mut problems,
    ) {
        for (index, item) in items.iter().enumerate() {
            if let Some(resolution) = parse_resolution(index, item, &mut problems) {
                resolutions.push(resolution);
            }
        }
    }

    problems.finish(resolutions)
}

fn parse_resolution(index: usize, item: &Value, problems: &mut Problems) -> Option<Resolution> {
    let at = format!("resolutions[{index}].");
    let Some(obj) = item.as_object() else {
        problems.push(format!("resolutions[{index}] must be an object"));
        return None;
    };

    let operation_id = required_string(obj, "operationId", &at, problems);
    let choice = enumerated(
        obj,
        "choice",
        &at,
        "client, server, merge",
        ResolutionChoice::from_name,
        problems,
    );
    let entity_kind = enumerated(
        obj,
        "entityKind",
        &at,
        "song, setlist, arrangement, user",
        EntityKind::from_name,
        problems,
    );
    let entity_id = required_string(obj, "entityId", &at, problems);
    let data = optional_object(obj, "data", &at, problems);

    if let Some(choice) = choice {
        if choice.requires_data() && is_absent(obj, "data") {
            problems.push(format!("{at}data is required for {choice}"));
        }
    }

    Some(Resolution {
        operation_id: operation_id?,
        entity_kind: entity_kind?,
        entity_id: entity_id?,
        choice: choice?,
        data,
    })
}

/// Validates a status lookup request, returning the ids in request order.
pub fn validate_status(request: &Value) -> Result<Vec<String>, ValidationError> {
    let mut problems = Problems::default();
    let mut ids = Vec::new();

    if let Some(items) = top_level_array(request, "operationIds", "ids", usize::MAX, &mut problems)
    {
        for (index, item) in items.iter().enumerate() {
            match item.as_str() {
                Some(id) => ids.push(id.to_string()),
                None => problems.push(format!("operationIds[{index}] must be a string")),
            }
        }
    }

    problems.finish(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn valid_batch_parses() {
        let batch = validate_batch(
            &json!({
                "clientLastSync": 1000,
                "operations": [
                    {"id": "a", "kind": "create", "entityKind": "song", "payload": {"title": "T"}},
                    {"id": "b", "kind": "update", "entityKind": "user", "entityId": "u1",
                     "payload": {"email": "x@y"}, "clientTimestamp": 5, "clientId": "web"},
                    {"id": "c", "kind": "delete", "entityKind": "setlist", "entityId": "s1"}
                ]
            }),
            50,
        )
        .unwrap();

        assert_eq!(batch.client_last_sync, Some(Timestamp::from_millis(1000)));
        assert_eq!(batch.operations.len(), 3);
        assert_eq!(batch.operations[1].kind, OperationKind::Update);
        assert_eq!(batch.operations[1].entity_id.as_deref(), Some("u1"));
        assert_eq!(batch.operations[1].client_id.as_deref(), Some("web"));
        assert!(batch.operations[2].payload.is_empty());
    }

    #[test]
    fn empty_batch_is_valid() {
        let batch = validate_batch(&json!({"operations": []}), 50).unwrap();
        assert!(batch.operations.is_empty());
        assert!(batch.client_last_sync.is_none());
    }

    #[test]
    fn non_object_request() {
        let err = validate_batch(&json!([1, 2]), 50).unwrap_err();
        assert_eq!(err.problems, vec!["request must be an object".to_string()]);
    }

    #[test]
    fn operations_must_be_an_array() {
        let err = validate_batch(&json!({"operations": {"id": "a"}}), 50).unwrap_err();
        assert_eq!(err.problems, vec!["operations must be an array".to_string()]);

        let err = validate_batch(&json!({}), 50).unwrap_err();
        assert_eq!(err.problems, vec!["operations is required".to_string()]);
    }

    #[test]
    fn oversized_batch_is_rejected() {
        let ops: Vec<Value> = (0..3)
            .map(|i| json!({"id": format!("op{i}"), "kind": "delete", "entityKind": "song", "entityId": "x"}))
            .collect();
        let err = validate_batch(&json!({ "operations": ops }), 2).unwrap_err();
        assert_eq!(
            err.problems,
            vec!["batch of 3 operations exceeds the maximum of 2".to_string()]
        );
    }

    #[test]
    fn every_problem_is_enumerated() {
        let err = validate_batch(
            &json!({
                "clientLastSync": "yesterday",
                "operations": [
                    {"id": "a", "kind": "upsert", "entityKind": "song", "payload": {}},
                    {"id": "b", "kind": "update", "entityKind": "album", "payload": {}},
                    {"id": "a", "kind": "delete", "entityKind": "song"},
                    "not an op"
                ]
            }),
            50,
        )
        .unwrap_err();

        let problems = err.problems.join("\n");
        assert!(problems.contains("clientLastSync must be a non-negative integer"));
        assert!(problems.contains("operations[0].kind 'upsert' is not one of create, update, delete"));
        assert!(problems.contains("operations[1].entityKind 'album' is not one of"));
        assert!(problems.contains("operations[1].entityId is required for update"));
        assert!(problems.contains("operations[1].clientTimestamp is required for update"));
        assert!(problems.contains("operations[2].id 'a' is duplicated"));
        assert!(problems.contains("operations[2].entityId is required for delete"));
        assert!(problems.contains("operations[3] must be an object"));
        assert_eq!(err.problems.len(), 8);
    }

    #[test]
    fn create_requires_payload_but_not_entity_id() {
        let err = validate_batch(
            &json!({"operations": [{"id": "a", "kind": "create", "entityKind": "song"}]}),
            50,
        )
        .unwrap_err();
        assert_eq!(
            err.problems,
            vec!["operations[0].payload is required for create".to_string()]
        );
    }

    #[test]
    fn mistyped_fields_are_reported_once() {
        let err = validate_batch(
            &json!({"operations": [{
                "id": 7, "kind": "update", "entityKind": "song", "entityId": 3,
                "payload": [], "clientTimestamp": -1
            }]}),
            50,
        )
        .unwrap_err();

        assert_eq!(err.problems.len(), 4);
        assert!(err.problems[0].contains("operations[0].id must be a non-empty string"));
        assert!(err.problems[1].contains("operations[0].entityId must be a non-empty string"));
        assert!(err.problems[2].contains("operations[0].payload must be an object"));
        assert!(err.problems[3].contains("operations[0].clientTimestamp must be"));
    }

    #[test]
    fn resolutions_validate() {
        let resolutions = validate_resolutions(
            &json!({"resolutions": [
                {"operationId": "a", "choice": "server", "entityKind": "song", "entityId": "s1"},
                {"operationId": "b", "choice": "merge", "entityKind": "user", "entityId": "u1",
                 "data": {"name": "N"}}
            ]}),
            50,
        )
        .unwrap();

        assert_eq!(resolutions.len(), 2);
        assert_eq!(resolutions[0].choice, ResolutionChoice::Server);
        assert!(resolutions[0].data.is_none());
        assert!(resolutions[1].data.is_some());
    }

    #[test]
    fn resolutions_must_be_a_list() {
        let err = validate_resolutions(&json!({"resolutions": "all-server"}), 50).unwrap_err();
        assert_eq!(err.problems, vec!["resolutions must be an array".to_string()]);
    }

    #[test]
    fn client_resolution_requires_data() {
        let err = validate_resolutions(
            &json!({"resolutions": [
                {"operationId": "a", "choice": "client", "entityKind": "song", "entityId": "s1"},
                {"operationId": "b", "choice": "ours", "entityKind": "song", "entityId": "s1"}
            ]}),
            50,
        )
        .unwrap_err();

        assert_eq!(err.problems.len(), 2);
        assert!(err.problems[0].contains("resolutions[0].data is required for client"));
        assert!(err.problems[1].contains("resolutions[1].choice 'ours'"));
    }

    #[test]
    fn status_ids() {
        let ids = validate_status(&json!({"operationIds": ["a", "b"]})).unwrap();
        assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);

        let err = validate_status(&json!({"operationIds": ["a", 1]})).unwrap_err();
        assert_eq!(err.problems, vec!["operationIds[1] must be a string".to_string()]);
    }
}
