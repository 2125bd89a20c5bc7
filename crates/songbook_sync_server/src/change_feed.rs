//! Catch-up feed.

use songbook_store::{EntityStore, StoreResult};
use songbook_sync_protocol::{ChangeEntry, EntityKind, Timestamp};
use tracing::debug;

/// Collects records modified after a client's last sync, across every
/// entity kind.
///
/// The feed is not filtered by origin: it includes writes made by the very
/// batch that requested it. Deleted records leave no trace and so never
/// appear.
pub struct ChangeFeedBuilder<'a> {
    store: &'a dyn EntityStore,
    until: Option<Timestamp>,
}

impl<'a> ChangeFeedBuilder<'a> {
    /// Creates a builder reading from `store`.
    pub fn new(store: &'a dyn EntityStore) -> Self {
        Self { store, until: None }
    }

    /// Leaves out records stamped after `until`.
    #[must_use]
    pub fn up_to(mut self, until: Timestamp) -> Self {
        self.until = Some(until);
        self
    }

    /// Returns every record with `last_modified > since`, grouped by kind
    /// in [`EntityKind::ALL`] order and by `(last_modified, id)` within a
    /// kind.
    ///
    /// Without a reference time the feed is empty; first-time clients do a
    /// full fetch instead.
    pub fn changes_since(&self, since: Option<Timestamp>) -> StoreResult<Vec<ChangeEntry>> {
        let Some(since) = since else {
            return Ok(Vec::new());
        };

        let mut changes = Vec::new();
        for kind in EntityKind::ALL {
            let mut records = self.store.modified_since(kind, since)?;
            if let Some(until) = self.until {
                records.retain(|r| r.last_modified <= until);
            }
            debug!(entity_kind = %kind, %since, count = records.len(), "collected changes");
            changes.extend(records.into_iter().map(|r| ChangeEntry::new(kind, r)));
        }
        Ok(changes)
    }
}
