//! Song handler.

use super::{non_empty_string, string_array, CollectionHandler, EntityRules, PayloadMode};
use serde_json::Value;
use songbook_sync_protocol::{EntityKind, Fields};

/// Handler for songs.
pub type SongHandler = CollectionHandler<SongRules>;

/// A song needs a title. Tags, when given, are strings; tempo is a
/// positive number of beats per minute.
pub struct SongRules;

impl EntityRules for SongRules {
    const KIND: EntityKind = EntityKind::Song;

    fn check(fields: &Fields, mode: PayloadMode) -> Result<(), String> {
        non_empty_string(fields, "title", mode)?;
        string_array(fields, "tags")?;
        match fields.get("tempo") {
            None | Some(Value::Null) => Ok(()),
            Some(Value::Number(n)) if n.as_u64().is_some_and(|bpm| bpm > 0) => Ok(()),
            Some(_) => Err("tempo must be a positive integer".into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn check(value: Value, mode: PayloadMode) -> Result<(), String> {
        match value {
            Value::Object(map) => SongRules::check(&map, mode),
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn title_required_on_create_only() {
        assert!(check(json!({"title": "Holy"}), PayloadMode::Create).is_ok());
        assert_eq!(
            check(json!({"key": "E"}), PayloadMode::Create),
            Err("title is required".to_string())
        );
        assert!(check(json!({"key": "E"}), PayloadMode::Patch).is_ok());
        assert!(check(json!({"title": "  "}), PayloadMode::Patch).is_err());
    }

    #[test]
    fn tags_and_tempo() {
        assert!(check(json!({"tags": ["hymn"], "tempo": 72}), PayloadMode::Patch).is_ok());
        assert!(check(json!({"tags": "hymn"}), PayloadMode::Patch).is_err());
        assert!(check(json!({"tempo": 0}), PayloadMode::Patch).is_err());
        assert!(check(json!({"tempo": "fast"}), PayloadMode::Patch).is_err());
    }
}
