// ── Target store boundary ──
//
// The persistence layer the apply engine writes to, specified at its
// interface. Per-object writes are the unit of atomicity; there is no
// multi-object transaction. `Unavailable` is the only fatal error.

pub mod memory;
pub mod object;

pub use memory::MemoryStore;
pub use object::{Payload, RefField, RefSlot, Row, governed_refs};

use crate::error::StoreError;
use crate::identity::ObjectId;
use crate::model::{EntityKind, NaturalKey};

/// Outcome of one object inside a batch create.
pub type BatchOutcome = (NaturalKey, Result<ObjectId, StoreError>);

/// The transactional store that holds the target inventory.
///
/// The store enforces referential integrity: it rejects rows whose
/// references do not point at existing rows, and refuses to delete rows
/// that are still referenced.
pub trait TargetStore {
    /// Look up the surrogate id for a natural key persisted in a prior run
    /// (or earlier in this one). `Ok(None)` means not found.
    fn find(&self, kind: EntityKind, key: &NaturalKey) -> Result<Option<ObjectId>, StoreError>;

    /// Persist a batch of constructed objects. Per-object failures are
    /// reported in the outcome list; the outer error is reserved for
    /// store-connectivity loss.
    fn batch_create(
        &mut self,
        kind: EntityKind,
        rows: Vec<Row>,
    ) -> Result<Vec<BatchOutcome>, StoreError>;

    /// Write the named changed attributes (and any reference slots carried
    /// by `row`) onto an existing object. The incoming row is authoritative
    /// for its kind's [`governed_refs`]: existing slots for those fields are
    /// dropped even when the row carries none.
    fn update(
        &mut self,
        kind: EntityKind,
        id: ObjectId,
        row: Row,
        fields: &[&'static str],
    ) -> Result<(), StoreError>;

    /// Drop every reference slot filling `field` on one object, leaving the
    /// payload untouched.
    fn clear_reference(
        &mut self,
        kind: EntityKind,
        id: ObjectId,
        field: RefField,
    ) -> Result<(), StoreError>;

    /// Delete one object. `Protected` when dependents still reference it.
    fn delete(&mut self, kind: EntityKind, id: ObjectId) -> Result<(), StoreError>;
}
