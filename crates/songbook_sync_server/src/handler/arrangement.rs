//! Arrangement handler.

use super::{non_empty_string, CollectionHandler, EntityRules, PayloadMode};
use songbook_sync_protocol::{EntityKind, Fields};

/// Handler for arrangements.
pub type ArrangementHandler = CollectionHandler<ArrangementRules>;

/// An arrangement belongs to a song (`songId`) and has a name.
///
/// The song reference is not checked against the song collection: the
/// client may create both in one batch, in either order.
pub struct ArrangementRules;

impl EntityRules for ArrangementRules {
    const KIND: EntityKind = EntityKind::Arrangement;

    fn check(fields: &Fields, mode: PayloadMode) -> Result<(), String> {
        non_empty_string(fields, "songId", mode)?;
        non_empty_string(fields, "name", mode)
    }
}
