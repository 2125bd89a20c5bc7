//! User handler.

use super::{CollectionHandler, EntityRules, PayloadMode};
use serde_json::Value;
use songbook_sync_protocol::{EntityKind, Fields};

/// Handler for users.
pub type UserHandler = CollectionHandler<UserRules>;

/// Users are issued by an external identity provider and may reach the
/// server first through an update, so writes to a missing id create it.
pub struct UserRules;

impl EntityRules for UserRules {
    const KIND: EntityKind = EntityKind::User;
    const UPSERT_MISSING: bool = true;

    fn check(fields: &Fields, mode: PayloadMode) -> Result<(), String> {
        match fields.get("email") {
            Some(Value::String(email)) if email.contains('@') => Ok(()),
            Some(_) => Err("email must be an address".into()),
            None if mode == PayloadMode::Create => Err("email is required".into()),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn check(value: Value, mode: PayloadMode) -> Result<(), String> {
        match value {
            Value::Object(map) => UserRules::check(&map, mode),
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn user_email() {
        assert!(check(json!({"email": "lead@church.org"}), PayloadMode::Create).is_ok());
        assert!(check(json!({"displayName": "Sam"}), PayloadMode::Create).is_err());
        assert!(check(json!({"displayName": "Sam"}), PayloadMode::Patch).is_ok());
        assert!(check(json!({"email": "nope"}), PayloadMode::Patch).is_err());
    }

    #[test]
    fn users_upsert() {
        assert!(UserRules::UPSERT_MISSING);
    }
}
