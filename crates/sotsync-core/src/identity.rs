// ── Identity map ──
//
// Run-scoped table mapping natural keys to either "buffered, not yet
// persisted" or a concrete store-assigned id. The map only ever moves
// forward: not seen -> pending -> committed. A key never goes back.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SyncError;
use crate::model::{EntityKind, NaturalKey};

/// Surrogate id assigned by the target store upon persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectId(Uuid);

impl ObjectId {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A reference slot value: either a concrete surrogate id or a deferred
/// token naming a key whose id is not yet known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ref {
    Id(ObjectId),
    Deferred(NaturalKey),
}

impl Ref {
    pub fn id(&self) -> Option<ObjectId> {
        match self {
            Ref::Id(id) => Some(*id),
            Ref::Deferred(_) => None,
        }
    }
}

/// State of one natural key within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identity {
    /// Buffered this run, not yet persisted.
    Pending,
    /// Persisted, with its concrete surrogate id.
    Committed(ObjectId),
}

/// The run-scoped identity table. Owned by one apply engine instance,
/// created empty at run start and discarded at run end.
#[derive(Debug, Default)]
pub struct IdentityMap {
    entries: HashMap<(EntityKind, NaturalKey), Identity>,
}

impl IdentityMap {
    /// Record a key as buffered. Fails on double-buffering, which is a
    /// programming invariant violation.
    pub fn bind_pending(&mut self, kind: EntityKind, key: NaturalKey) -> Result<(), SyncError> {
        match self.entries.entry((kind, key)) {
            Entry::Occupied(occupied) => {
                let (kind, key) = occupied.key().clone();
                Err(SyncError::DuplicateKey { kind, key })
            }
            Entry::Vacant(vacant) => {
                vacant.insert(Identity::Pending);
                Ok(())
            }
        }
    }

    /// Move a key forward to its committed id. A pending entry is resolved;
    /// an unseen key (found via direct store lookup) is recorded directly.
    /// Re-committing an already committed key is rejected — transitions
    /// never move backward.
    pub fn commit(
        &mut self,
        kind: EntityKind,
        key: NaturalKey,
        id: ObjectId,
    ) -> Result<(), SyncError> {
        match self.entries.get(&(kind, key.clone())) {
            Some(Identity::Committed(_)) => Err(SyncError::DuplicateKey { kind, key }),
            _ => {
                self.entries.insert((kind, key), Identity::Committed(id));
                Ok(())
            }
        }
    }

    /// Forget a pending key whose buffering was rolled back (for example a
    /// per-object batch failure). Committed entries are never removed.
    pub fn forget_pending(&mut self, kind: EntityKind, key: &NaturalKey) {
        if let Some(Identity::Pending) = self.entries.get(&(kind, key.clone())) {
            self.entries.remove(&(kind, key.clone()));
        }
    }

    pub fn get(&self, kind: EntityKind, key: &NaturalKey) -> Option<Identity> {
        self.entries.get(&(kind, key.clone())).copied()
    }

    /// Resolve a key to a reference: committed ids become concrete,
    /// pending keys become deferred tokens, unseen keys resolve to `None`.
    pub fn resolve(&self, kind: EntityKind, key: &NaturalKey) -> Option<Ref> {
        match self.get(kind, key) {
            Some(Identity::Committed(id)) => Some(Ref::Id(id)),
            Some(Identity::Pending) => Some(Ref::Deferred(key.clone())),
            None => None,
        }
    }
}
