//! Core protocol types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Entity field set carried by payloads and stored records.
///
/// Payloads are opaque to the dispatcher and interpreted only by the
/// handler for their entity kind.
pub type Fields = serde_json::Map<String, serde_json::Value>;

/// Wall-clock instant in milliseconds since the Unix epoch.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The Unix epoch.
    pub const EPOCH: Timestamp = Timestamp(0);

    /// Creates a timestamp from milliseconds since the Unix epoch.
    #[inline]
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Returns milliseconds since the Unix epoch.
    #[inline]
    #[must_use]
    pub const fn as_millis(&self) -> u64 {
        self.0
    }

    /// Reads the system clock.
    ///
    /// A clock set before 1970 reads as the epoch.
    #[must_use]
    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self(millis)
    }

    /// Returns this timestamp moved forward by `duration`.
    #[must_use]
    pub fn saturating_add(&self, duration: Duration) -> Self {
        Self(self.0.saturating_add(duration.as_millis() as u64))
    }

    /// Returns this timestamp moved backward by `duration`.
    #[must_use]
    pub fn saturating_sub(&self, duration: Duration) -> Self {
        Self(self.0.saturating_sub(duration.as_millis() as u64))
    }

    /// Returns the next representable timestamp.
    #[must_use]
    pub fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

impl From<u64> for Timestamp {
    fn from(millis: u64) -> Self {
        Self(millis)
    }
}

/// The record types the sync engine knows how to synchronize.
///
/// The set is closed: every dispatch over it is an exhaustive `match`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// A song (title, lyrics, chords).
    Song,
    /// An ordered list of songs for a performance.
    Setlist,
    /// A musical arrangement of a song.
    Arrangement,
    /// A platform user.
    User,
}

impl EntityKind {
    /// All kinds, in catch-up feed order.
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Song,
        EntityKind::Setlist,
        EntityKind::Arrangement,
        EntityKind::User,
    ];

    /// Returns the wire name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Song => "song",
            EntityKind::Setlist => "setlist",
            EntityKind::Arrangement => "arrangement",
            EntityKind::User => "user",
        }
    }

    /// Parses a wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "song" => Some(EntityKind::Song),
            "setlist" => Some(EntityKind::Setlist),
            "arrangement" => Some(EntityKind::Arrangement),
            "user" => Some(EntityKind::User),
            _ => None,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of queued client edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    /// Create a new record; the store assigns its id.
    Create,
    /// Update an existing record, subject to the conflict check.
    Update,
    /// Remove a record unconditionally.
    Delete,
}

impl OperationKind {
    /// Returns the wire name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Create => "create",
            OperationKind::Update => "update",
            OperationKind::Delete => "delete",
        }
    }

    /// Parses a wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "create" => Some(OperationKind::Create),
            "update" => Some(OperationKind::Update),
            "delete" => Some(OperationKind::Delete),
            _ => None,
        }
    }

    /// Returns true if this kind addresses an existing record by id.
    pub fn requires_entity_id(&self) -> bool {
        !matches!(self, OperationKind::Create)
    }

    /// Returns true if this kind carries a payload.
    pub fn requires_payload(&self) -> bool {
        !matches!(self, OperationKind::Delete)
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_kind_names() {
        for kind in EntityKind::ALL {
            assert_eq!(EntityKind::from_name(kind.as_str()), Some(kind));
        }
        assert_eq!(EntityKind::from_name("album"), None);
        assert_eq!(EntityKind::from_name("Song"), None);
    }

    #[test]
    fn entity_kind_serializes_lowercase() {
        let json = serde_json::to_string(&EntityKind::Arrangement).unwrap();
        assert_eq!(json, "\"arrangement\"");
    }

    #[test]
    fn operation_kind_requirements() {
        assert!(!OperationKind::Create.requires_entity_id());
        assert!(OperationKind::Update.requires_entity_id());
        assert!(OperationKind::Delete.requires_entity_id());

        assert!(OperationKind::Create.requires_payload());
        assert!(OperationKind::Update.requires_payload());
        assert!(!OperationKind::Delete.requires_payload());
    }

    #[test]
    fn timestamp_arithmetic() {
        let t = Timestamp::from_millis(10_000);
        assert_eq!(t.saturating_add(Duration::from_secs(1)).as_millis(), 11_000);
        assert_eq!(t.saturating_sub(Duration::from_secs(20)), Timestamp::EPOCH);
        assert_eq!(t.next().as_millis(), 10_001);
    }

    #[test]
    fn timestamp_is_a_plain_integer_on_the_wire() {
        let json = serde_json::to_string(&Timestamp::from_millis(42)).unwrap();
        assert_eq!(json, "42");
    }
}
