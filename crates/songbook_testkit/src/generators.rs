//! Property-based test generators using proptest.
//!
//! Provides strategies for generating sync operations and batches that
//! pass structural validation.

use proptest::prelude::*;
use serde_json::{json, Value};
use songbook_sync_protocol::{EntityKind, Fields, SyncOperation, Timestamp};

/// Strategy for generating entity kinds.
pub fn entity_kind_strategy() -> impl Strategy<Value = EntityKind> {
    prop::sample::select(EntityKind::ALL.to_vec())
}

/// Strategy for generating client timestamps around the fixture clock.
pub fn timestamp_strategy() -> impl Strategy<Value = Timestamp> {
    (crate::START_MILLIS - 60_000..crate::START_MILLIS + 60_000).prop_map(Timestamp::from_millis)
}

fn label_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z][A-Za-z ]{0,15}").expect("Invalid regex")
}

/// Strategy for generating a payload valid for `kind` on create.
pub fn payload_strategy(kind: EntityKind) -> BoxedStrategy<Fields> {
    match kind {
        EntityKind::Song => (label_strategy(), prop::option::of(40u64..200))
            .prop_map(|(title, tempo)| {
                let mut f = crate::song(&title);
                if let Some(tempo) = tempo {
                    f.insert("tempo".into(), tempo.into());
                }
                f
            })
            .boxed(),
        EntityKind::Setlist => (label_strategy(), prop::collection::vec("[a-z0-9]{4}", 0..4))
            .prop_map(|(name, ids)| {
                let ids: Vec<&str> = ids.iter().map(String::as_str).collect();
                crate::setlist(&name, &ids)
            })
            .boxed(),
        EntityKind::Arrangement => ("[a-z0-9]{4}", label_strategy())
            .prop_map(|(song_id, name)| crate::arrangement(&song_id, &name))
            .boxed(),
        EntityKind::User => "[a-z]{1,8}"
            .prop_map(|name| crate::user(&format!("{name}@example.com")))
            .boxed(),
    }
}

/// Strategy for generating a payload that breaks `kind`'s field rules.
pub fn invalid_payload_strategy(kind: EntityKind) -> BoxedStrategy<Fields> {
    let key = match kind {
        EntityKind::Song => "title",
        EntityKind::Setlist | EntityKind::Arrangement => "name",
        EntityKind::User => "email",
    };
    prop_oneof![Just(Value::Null), any::<i64>().prop_map(Value::from), Just(json!([]))]
        .prop_map(move |bad| {
            let mut f = Fields::new();
            f.insert(key.into(), bad);
            f
        })
        .boxed()
}

/// Strategy for generating one operation against ids drawn from `ids`.
///
/// The operation id is a placeholder; [`batch_strategy`] renumbers.
pub fn operation_strategy(ids: Vec<String>) -> BoxedStrategy<SyncOperation> {
    let id = prop::sample::select(ids);
    let create = entity_kind_strategy()
        .prop_flat_map(|kind| payload_strategy(kind).prop_map(move |p| SyncOperation::create("", kind, p)));
    let update = (entity_kind_strategy(), id.clone(), timestamp_strategy())
        .prop_flat_map(|(kind, id, ts)| {
            prop_oneof![payload_strategy(kind), invalid_payload_strategy(kind)]
                .prop_map(move |p| SyncOperation::update("", kind, id.clone(), p, ts))
        });
    let delete = (entity_kind_strategy(), id).prop_map(|(kind, id)| SyncOperation::delete("", kind, id));

    prop_oneof![3 => create, 4 => update, 2 => delete].boxed()
}

/// Strategy for generating a batch of up to `max` operations with unique
/// operation ids `op-0`, `op-1`, ...
pub fn batch_strategy(ids: Vec<String>, max: usize) -> impl Strategy<Value = Vec<SyncOperation>> {
    prop::collection::vec(operation_strategy(ids), 0..=max).prop_map(|ops| {
        ops.into_iter()
            .enumerate()
            .map(|(i, mut op)| {
                op.id = format!("op-{i}");
                op
            })
            .collect()
    })
}
