//! Entity sync handlers.
//!
//! One handler per entity kind applies a single create, update or delete
//! against the store. Updates carry the conflict check: when the stored
//! record is strictly newer than the client's timestamp the handler returns
//! [`UpdateOutcome::Conflict`] instead of writing.
//!
//! The four handlers share one implementation, [`CollectionHandler`],
//! parameterized by the kind's [`EntityRules`].

mod arrangement;
mod patch;
mod setlist;
mod song;
mod user;

pub use arrangement::{ArrangementHandler, ArrangementRules};
pub use setlist::{SetlistHandler, SetlistRules};
pub use song::{SongHandler, SongRules};
pub use user::{UserHandler, UserRules};

use serde_json::Value;
use songbook_store::{EntityStore, StoreError};
use songbook_sync_protocol::{
    strip_reserved, EntityKind, FailureCode, Fields, Record, Timestamp,
};
use std::marker::PhantomData;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Result type for handler operations.
pub type HandlerResult<T> = Result<T, HandlerError>;

/// Failure of a single operation. Never fatal to the batch.
#[derive(Error, Debug)]
pub enum HandlerError {
    /// The target record does not exist.
    #[error("{kind} {id} not found")]
    NotFound {
        /// Entity kind.
        kind: EntityKind,
        /// Requested id.
        id: String,
    },

    /// The payload violates the kind's field rules.
    #[error("invalid {kind} payload: {reason}")]
    InvalidPayload {
        /// Entity kind.
        kind: EntityKind,
        /// Which rule was violated.
        reason: String,
    },

    /// The operation lacks a field its kind requires.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// The store rejected the read or write.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl HandlerError {
    /// Returns the wire failure code.
    pub fn code(&self) -> FailureCode {
        match self {
            HandlerError::NotFound { .. } => FailureCode::NotFound,
            HandlerError::InvalidPayload { .. } => FailureCode::InvalidPayload,
            HandlerError::InvalidOperation(_) => FailureCode::InvalidOperation,
            HandlerError::Store(_) => FailureCode::StoreError,
        }
    }
}

/// Result of a checked update.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    /// The payload was written.
    Applied(Record),
    /// The stored record is newer than the client's view; nothing was written.
    Conflict {
        /// The record as currently stored.
        server: Record,
    },
}

/// Which field rules apply to a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadMode {
    /// A complete new record: required fields must be present.
    Create,
    /// A partial change: only fields present are checked.
    Patch,
}

/// Applies one operation of a given entity kind.
pub trait EntitySyncHandler: Send + Sync {
    /// The kind this handler owns.
    fn kind(&self) -> EntityKind;

    /// Creates and stores a new record. Conflicts are impossible.
    fn create(&self, payload: Fields) -> HandlerResult<Record>;

    /// Overlays `payload` onto the stored record unless the stored record
    /// was modified strictly after `client_timestamp`.
    fn update(
        &self,
        id: &str,
        payload: Fields,
        client_timestamp: Timestamp,
    ) -> HandlerResult<UpdateOutcome>;

    /// Overlays `payload` onto the stored record with no timestamp check.
    fn overwrite(&self, id: &str, payload: Fields) -> HandlerResult<Record>;

    /// Applies `patch` as a JSON merge patch onto the stored record.
    fn merge(&self, id: &str, patch: Fields) -> HandlerResult<Record>;

    /// Removes a record unconditionally. Returns whether it existed.
    fn delete(&self, id: &str) -> HandlerResult<bool>;
}

/// Field rules and write policy for one entity kind.
pub trait EntityRules: Send + Sync + 'static {
    /// The kind these rules govern.
    const KIND: EntityKind;

    /// Whether writing a missing id creates it instead of failing.
    const UPSERT_MISSING: bool = false;

    /// Checks a payload, returning the first rule it violates.
    fn check(fields: &Fields, mode: PayloadMode) -> Result<(), String>;
}

/// Handler shared by every entity kind.
pub struct CollectionHandler<R> {
    store: Arc<dyn EntityStore>,
    _rules: PhantomData<fn() -> R>,
}

impl<R: EntityRules> CollectionHandler<R> {
    /// Creates a handler writing through `store`.
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self {
            store,
            _rules: PhantomData,
        }
    }

    fn check(&self, fields: &Fields, mode: PayloadMode) -> HandlerResult<()> {
        R::check(fields, mode).map_err(|reason| HandlerError::InvalidPayload {
            kind: R::KIND,
            reason,
        })
    }

    fn not_found(&self, id: &str) -> HandlerError {
        HandlerError::NotFound {
            kind: R::KIND,
            id: id.to_string(),
        }
    }

    fn load(&self, id: &str, payload: &mut Fields) -> HandlerResult<Option<Record>> {
        strip_reserved(payload);
        Ok(self.store.get(R::KIND, id)?)
    }

    /// Overlays `payload` onto `current`, or creates the record when the
    /// kind upserts. A missing record is reported before the payload is
    /// checked.
    fn apply(&self, id: &str, payload: Fields, current: Option<Record>) -> HandlerResult<Record> {
        let Some(current) = current else {
            if !R::UPSERT_MISSING {
                return Err(self.not_found(id));
            }
            self.check(&payload, PayloadMode::Patch)?;
            debug!(entity_kind = %R::KIND, entity_id = id, "creating missing record on update");
            return Ok(self.store.put(R::KIND, id, payload)?);
        };

        self.check(&payload, PayloadMode::Patch)?;
        let mut fields = current.fields;
        patch::overlay(&mut fields, payload);
        Ok(self.store.put(R::KIND, id, fields)?)
    }
}

impl<R: EntityRules> EntitySyncHandler for CollectionHandler<R> {
    fn kind(&self) -> EntityKind {
        R::KIND
    }

    fn create(&self, mut payload: Fields) -> HandlerResult<Record> {
        strip_reserved(&mut payload);
        self.check(&payload, PayloadMode::Create)?;
        Ok(self.store.insert(R::KIND, payload)?)
    }

    fn update(
        &self,
        id: &str,
        mut payload: Fields,
        client_timestamp: Timestamp,
    ) -> HandlerResult<UpdateOutcome> {
        let current = self.load(id, &mut payload)?;

        if let Some(current) = &current {
            if current.last_modified > client_timestamp {
                debug!(
                    entity_kind = %R::KIND,
                    entity_id = id,
                    server = %current.last_modified,
                    client = %client_timestamp,
                    "stale update"
                );
                return Ok(UpdateOutcome::Conflict {
                    server: current.clone(),
                });
            }
        }

        self.apply(id, payload, current).map(UpdateOutcome::Applied)
    }

    fn overwrite(&self, id: &str, mut payload: Fields) -> HandlerResult<Record> {
        let current = self.load(id, &mut payload)?;
        self.apply(id, payload, current)
    }

    fn merge(&self, id: &str, mut patch: Fields) -> HandlerResult<Record> {
        strip_reserved(&mut patch);
        let base = match self.store.get(R::KIND, id)? {
            Some(current) => current.fields,
            None if R::UPSERT_MISSING => Fields::new(),
            None => return Err(self.not_found(id)),
        };

        let merged = patch::merge_patch(base, patch);
        self.check(&merged, PayloadMode::Patch)?;
        Ok(self.store.put(R::KIND, id, merged)?)
    }

    fn delete(&self, id: &str) -> HandlerResult<bool> {
        Ok(self.store.remove(R::KIND, id)?)
    }
}

/// The four handlers, one per [`EntityKind`].
pub struct HandlerSet {
    song: SongHandler,
    setlist: SetlistHandler,
    arrangement: ArrangementHandler,
    user: UserHandler,
}

impl HandlerSet {
    /// Creates all handlers over one store.
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self {
            song: SongHandler::new(Arc::clone(&store)),
            setlist: SetlistHandler::new(Arc::clone(&store)),
            arrangement: ArrangementHandler::new(Arc::clone(&store)),
            user: UserHandler::new(store),
        }
    }

    /// Returns the handler for `kind`.
    pub fn for_kind(&self, kind: EntityKind) -> &dyn EntitySyncHandler {
        match kind {
            EntityKind::Song => &self.song,
            EntityKind::Setlist => &self.setlist,
            EntityKind::Arrangement => &self.arrangement,
            EntityKind::User => &self.user,
        }
    }
}

/// Requires `key` to be a non-empty string, or only checks its type when
/// patching and it is absent.
pub(crate) fn non_empty_string(fields: &Fields, key: &str, mode: PayloadMode) -> Result<(), String> {
    match fields.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(()),
        Some(_) => Err(format!("{key} must be a non-empty string")),
        None if mode == PayloadMode::Create => Err(format!("{key} is required")),
        None => Ok(()),
    }
}

/// Allows `key` to be absent, null, or an array of strings.
pub(crate) fn string_array(fields: &Fields, key: &str) -> Result<(), String> {
    match fields.get(key) {
        None | Some(Value::Null) => Ok(()),
        Some(Value::Array(items)) if items.iter().all(Value::is_string) => Ok(()),
        Some(_) => Err(format!("{key} must be an array of strings")),
    }
}
