//! Setlist handler.

use super::{non_empty_string, string_array, CollectionHandler, EntityRules, PayloadMode};
use songbook_sync_protocol::{EntityKind, Fields};

/// Handler for setlists.
pub type SetlistHandler = CollectionHandler<SetlistRules>;

/// A setlist needs a name; `songIds` is an ordered list of song ids.
pub struct SetlistRules;

impl EntityRules for SetlistRules {
    const KIND: EntityKind = EntityKind::Setlist;

    fn check(fields: &Fields, mode: PayloadMode) -> Result<(), String> {
        non_empty_string(fields, "name", mode)?;
        string_array(fields, "songIds")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn check(value: Value, mode: PayloadMode) -> Result<(), String> {
        match value {
            Value::Object(map) => SetlistRules::check(&map, mode),
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn setlist_rules() {
        assert!(check(json!({"name": "Sunday AM", "songIds": ["a", "b"]}), PayloadMode::Create).is_ok());
        assert!(check(json!({"songIds": []}), PayloadMode::Create).is_err());
        assert!(check(json!({"songIds": []}), PayloadMode::Patch).is_ok());
        assert_eq!(
            check(json!({"songIds": [1, 2]}), PayloadMode::Patch),
            Err("songIds must be an array of strings".to_string())
        );
    }
}
