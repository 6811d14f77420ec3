// ── In-memory target store ──
//
// Reference implementation of `TargetStore` with the same integrity rules a
// relational backing store enforces: unique natural keys per kind, no rows
// with unresolved or dangling references, no deletion of rows that are
// still referenced. Used by tests and the snapshot-to-snapshot CLI path.

use std::collections::HashMap;

use crate::error::StoreError;
use crate::identity::{ObjectId, Ref};
use crate::model::{EntityKind, NaturalKey};
use crate::store::object::{RefField, Row, governed_refs};
use crate::store::{BatchOutcome, TargetStore};

#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: HashMap<ObjectId, Row>,
    index: HashMap<(EntityKind, NaturalKey), ObjectId>,
    offline: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate losing the connection to the persistence layer. Every call
    /// afterwards fails with `Unavailable`.
    pub fn go_offline(&mut self) {
        self.offline = true;
    }

    pub fn get(&self, id: ObjectId) -> Option<&Row> {
        self.rows.get(&id)
    }

    /// Direct key lookup without the trait's connectivity error path.
    pub fn lookup(&self, kind: EntityKind, key: &NaturalKey) -> Option<ObjectId> {
        self.index.get(&(kind, key.clone())).copied()
    }

    pub fn count(&self, kind: EntityKind) -> usize {
        self.rows.values().filter(|row| row.kind() == kind).count()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows_of(&self, kind: EntityKind) -> impl Iterator<Item = (ObjectId, &Row)> {
        self.rows
            .iter()
            .filter(move |(_, row)| row.kind() == kind)
            .map(|(id, row)| (*id, row))
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline {
            return Err(StoreError::Unavailable("memory store offline".into()));
        }
        Ok(())
    }

    /// Every reference slot must hold a concrete id pointing at a live row.
    fn check_refs(&self, row: &Row) -> Result<(), StoreError> {
        for slot in &row.refs {
            match &slot.target {
                Ref::Deferred(key) => {
                    return Err(StoreError::Validation(format!(
                        "unresolved deferred reference {:?} -> {key}",
                        slot.field
                    )));
                }
                Ref::Id(id) => {
                    if !self.rows.contains_key(id) {
                        return Err(StoreError::Validation(format!(
                            "dangling reference {:?} -> {id}",
                            slot.field
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

impl TargetStore for MemoryStore {
    fn find(&self, kind: EntityKind, key: &NaturalKey) -> Result<Option<ObjectId>, StoreError> {
        self.check_online()?;
        Ok(self.lookup(kind, key))
    }

    fn batch_create(
        &mut self,
        kind: EntityKind,
        rows: Vec<Row>,
    ) -> Result<Vec<BatchOutcome>, StoreError> {
        self.check_online()?;

        let mut outcomes = Vec::with_capacity(rows.len());
        for row in rows {
            let key = row.key();
            debug_assert_eq!(row.kind(), kind);

            if self.index.contains_key(&(kind, key.clone())) {
                outcomes.push((key, Err(StoreError::Validation("duplicate key".into()))));
                continue;
            }
            if let Err(err) = self.check_refs(&row) {
                outcomes.push((key, Err(err)));
                continue;
            }

            let id = ObjectId::new();
            self.index.insert((kind, key.clone()), id);
            self.rows.insert(id, row);
            outcomes.push((key, Ok(id)));
        }
        Ok(outcomes)
    }

    fn update(
        &mut self,
        kind: EntityKind,
        id: ObjectId,
        row: Row,
        _fields: &[&'static str],
    ) -> Result<(), StoreError> {
        self.check_online()?;
        self.check_refs(&row)?;

        let existing = self.rows.get_mut(&id).ok_or(StoreError::NotFound)?;

        // Reference slots are merged per field. The row is authoritative
        // for its kind's governed fields: existing slots for those are
        // dropped outright, so a tagged-VLAN set passed whole lands whole
        // and a cleared attribute releases its reference. Non-governed
        // fields (a cluster's master) are upserted only when carried.
        let governed = governed_refs(kind);
        let mut merged: Vec<_> = existing
            .refs
            .iter()
            .filter(|slot| {
                !governed.contains(&slot.field)
                    && !row.refs.iter().any(|new| new.field == slot.field)
            })
            .cloned()
            .collect();
        merged.extend(row.refs);

        let old_key = existing.key();
        *existing = Row {
            payload: row.payload,
            refs: merged,
        };

        let new_key = existing.key();
        if new_key != old_key {
            self.index.remove(&(kind, old_key));
            self.index.insert((kind, new_key), id);
        }
        Ok(())
    }

    fn clear_reference(
        &mut self,
        _kind: EntityKind,
        id: ObjectId,
        field: RefField,
    ) -> Result<(), StoreError> {
        self.check_online()?;
        let row = self.rows.get_mut(&id).ok_or(StoreError::NotFound)?;
        row.refs.retain(|slot| slot.field != field);
        Ok(())
    }

    fn delete(&mut self, kind: EntityKind, id: ObjectId) -> Result<(), StoreError> {
        self.check_online()?;

        let row = self.rows.get(&id).ok_or(StoreError::NotFound)?;
        let key = row.key();

        let referenced = self
            .rows
            .iter()
            .filter(|(other, _)| **other != id)
            .any(|(_, other)| other.refs.iter().any(|slot| slot.target == Ref::Id(id)));
        if referenced {
            return Err(StoreError::Protected);
        }

        self.rows.remove(&id);
        self.index.remove(&(kind, key));
        Ok(())
    }
}
