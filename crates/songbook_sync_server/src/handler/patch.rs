//! Field-level write strategies.

use serde_json::Value;
use songbook_sync_protocol::Fields;

/// Replaces top-level fields of `target` with those in `payload`.
///
/// Fields absent from `payload` are kept. A `null` in `payload` is stored
/// as `null`.
pub(crate) fn overlay(target: &mut Fields, payload: Fields) {
    for (key, value) in payload {
        target.insert(key, value);
    }
}

/// Applies `patch` to `target` as an RFC 7386 JSON merge patch.
///
/// Nested objects merge recursively, `null` removes a field, and any other
/// value replaces the field wholesale.
pub(crate) fn merge_patch(mut target: Fields, patch: Fields) -> Fields {
    for (key, value) in patch {
        match value {
            Value::Null => {
                target.remove(&key);
            }
            Value::Object(nested) => {
                let base = match target.remove(&key) {
                    Some(Value::Object(existing)) => existing,
                    _ => Fields::new(),
                };
                target.insert(key, Value::Object(merge_patch(base, nested)));
            }
            other => {
                target.insert(key, other);
            }
        }
    }
    target
}
