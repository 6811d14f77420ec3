// ── In-memory entity graph ──
//
// One `Graph` per adapter (source of record, target), built once per run by
// a collector and read-only thereafter. Natural keys are unique per kind
// within one graph; insertion order is preserved for deterministic diffs.

use indexmap::IndexMap;

use crate::error::SyncError;
use crate::model::{
    Building, Circuit, Cluster, Connection, Device, EntityKind, Hardware, IpAddress, NaturalKey,
    PatchPanel, PatchPanelPort, Port, Provider, Rack, Room, Subnet, SyncModel, Vendor, Vlan, Vrf,
};

/// Keyed collection of one entity kind.
#[derive(Debug, Clone)]
pub struct EntitySet<T: SyncModel> {
    entries: IndexMap<NaturalKey, T>,
}

impl<T: SyncModel> Default for EntitySet<T> {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }
}

impl<T: SyncModel> EntitySet<T> {
    /// Insert an entity, failing on a natural-key collision.
    pub fn insert(&mut self, entity: T) -> Result<(), SyncError> {
        let key = entity.key();
        if self.entries.contains_key(&key) {
            return Err(SyncError::DuplicateKey { kind: T::KIND, key });
        }
        self.entries.insert(key, entity);
        Ok(())
    }

    pub fn get(&self, key: &NaturalKey) -> Option<&T> {
        self.entries.get(key)
    }

    /// Like [`EntitySet::get`] but failing with `NotFound`.
    pub fn require(&self, key: &NaturalKey) -> Result<&T, SyncError> {
        self.get(key).ok_or_else(|| SyncError::NotFound {
            kind: T::KIND,
            key: key.clone(),
        })
    }

    pub fn contains(&self, key: &NaturalKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Lazy, restartable iteration in insertion order.
    pub fn all(&self) -> impl Iterator<Item = &T> {
        self.entries.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = &NaturalKey> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Implemented by every model type to locate its set inside a [`Graph`].
pub trait GraphSlot: SyncModel {
    fn set(graph: &Graph) -> &EntitySet<Self>;
    fn set_mut(graph: &mut Graph) -> &mut EntitySet<Self>;
}

macro_rules! graph_slots {
    ( $( $kind:ident => $field:ident : $ty:ty ),+ $(,)? ) => {
        /// The per-adapter entity graph: one typed set per entity kind.
        #[derive(Debug, Clone, Default)]
        pub struct Graph {
            $( pub(crate) $field: EntitySet<$ty>, )+
        }

        $(
            impl GraphSlot for $ty {
                fn set(graph: &Graph) -> &EntitySet<Self> {
                    &graph.$field
                }

                fn set_mut(graph: &mut Graph) -> &mut EntitySet<Self> {
                    &mut graph.$field
                }
            }
        )+

        impl Graph {
            /// Untyped presence check, used by the orphan rule and
            /// reference resolution.
            pub fn contains(&self, kind: EntityKind, key: &NaturalKey) -> bool {
                match kind {
                    $( EntityKind::$kind => self.$field.contains(key), )+
                }
            }

            /// The declared containment parent of an entity in this graph,
            /// or `None` when the entity is absent or parentless.
            pub fn parent_link(
                &self,
                kind: EntityKind,
                key: &NaturalKey,
            ) -> Option<(EntityKind, NaturalKey)> {
                match kind {
                    $( EntityKind::$kind => self.$field.get(key).and_then(SyncModel::parent), )+
                }
            }

            /// Total entity count across all kinds.
            pub fn len(&self) -> usize {
                0 $( + self.$field.len() )+
            }

            pub fn is_empty(&self) -> bool {
                self.len() == 0
            }
        }
    };
}

graph_slots! {
    Building       => buildings: Building,
    Room           => rooms: Room,
    Rack           => racks: Rack,
    Vendor         => vendors: Vendor,
    Hardware       => hardware: Hardware,
    Cluster        => clusters: Cluster,
    Device         => devices: Device,
    Port           => ports: Port,
    Vrf            => vrfs: Vrf,
    Subnet         => subnets: Subnet,
    IpAddress      => ip_addresses: IpAddress,
    Vlan           => vlans: Vlan,
    Connection     => connections: Connection,
    Provider       => providers: Provider,
    Circuit        => circuits: Circuit,
    PatchPanel     => patch_panels: PatchPanel,
    PatchPanelPort => patch_panel_ports: PatchPanelPort,
}

impl Graph {
    /// Typed insert; fails with `DuplicateKey` on collision.
    pub fn insert<T: GraphSlot>(&mut self, entity: T) -> Result<(), SyncError> {
        T::set_mut(self).insert(entity)
    }

    /// Typed set accessor.
    pub fn all<'a, T: GraphSlot + 'a>(&'a self) -> impl Iterator<Item = &'a T> {
        T::set(self).all()
    }

    pub fn get<T: GraphSlot>(&self, key: &NaturalKey) -> Option<&T> {
        T::set(self).get(key)
    }

    /// Whether an entity exists and its whole containment chain resolves
    /// inside this graph.
    pub fn resolves(&self, kind: EntityKind, key: &NaturalKey) -> bool {
        if !self.contains(kind, key) {
            return false;
        }
        let mut link = self.parent_link(kind, key);
        while let Some((parent_kind, parent_key)) = link {
            if !self.contains(parent_kind, &parent_key) {
                return false;
            }
            link = self.parent_link(parent_kind, &parent_key);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Building, Room};

    fn building(name: &str) -> Building {
        Building {
            name: name.into(),
            ..Building::default()
        }
    }

    #[test]
    fn insert_rejects_duplicate_keys() {
        let mut graph = Graph::default();
        graph.insert(building("DC1")).unwrap();
        let err = graph.insert(building("DC1")).unwrap_err();
        assert!(matches!(err, SyncError::DuplicateKey { .. }));
    }

    #[test]
    fn require_reports_not_found() {
        let graph = Graph::default();
        let err = graph
            .buildings
            .require(&NaturalKey::from("DC9"))
            .unwrap_err();
        assert!(matches!(err, SyncError::NotFound { .. }));
    }

    #[test]
    fn resolves_walks_the_containment_chain() {
        let mut graph = Graph::default();
        graph.insert(building("DC1")).unwrap();
        graph
            .insert(Room {
                name: "R1".into(),
                building: "DC1".into(),
                ..Room::default()
            })
            .unwrap();
        // Room in a known building resolves; a room pointing at a missing
        // building does not.
        graph
            .insert(Room {
                name: "R2".into(),
                building: "DC9".into(),
                ..Room::default()
            })
            .unwrap();

        assert!(graph.resolves(EntityKind::Room, &NaturalKey::from(["R1", "DC1"])));
        assert!(!graph.resolves(EntityKind::Room, &NaturalKey::from(["R2", "DC9"])));
    }
}
