// ── Diff engine ──
//
// Natural-key comparison of the source-of-record graph against the target
// graph, producing per-kind create/update/delete sets. Updates carry the
// minimal changed-attribute list; collection attributes compare as sets.

use serde::Serialize;

use crate::graph::{Graph, GraphSlot};
use crate::model::{
    Building, Circuit, Cluster, Connection, Device, EntityKind, Hardware, IpAddress, NaturalKey,
    PatchPanel, PatchPanelPort, Port, Provider, Rack, Room, Subnet, SyncModel, Vendor, Vlan, Vrf,
};

/// One pending update: the desired entity plus the names of the attributes
/// that actually changed. Only those attributes are written.
#[derive(Debug, Clone)]
pub struct UpdatePlan<T> {
    pub desired: T,
    pub fields: Vec<&'static str>,
}

/// Create/update/delete sets for one entity kind.
#[derive(Debug, Clone)]
pub struct TypeDiff<T: SyncModel> {
    /// Present in source, absent in target.
    pub create: Vec<T>,
    /// Present in both with a non-empty changed-attribute set.
    pub update: Vec<UpdatePlan<T>>,
    /// Present in target, absent in source.
    pub delete: Vec<NaturalKey>,
    /// Source entities dropped because their parent chain does not resolve.
    pub orphaned: Vec<NaturalKey>,
}

impl<T: SyncModel> Default for TypeDiff<T> {
    fn default() -> Self {
        Self {
            create: Vec::new(),
            update: Vec::new(),
            delete: Vec::new(),
            orphaned: Vec::new(),
        }
    }
}

impl<T: SyncModel> TypeDiff<T> {
    pub fn is_empty(&self) -> bool {
        self.create.is_empty() && self.update.is_empty() && self.delete.is_empty()
    }
}

/// Per-kind change counts, for summaries.
#[derive(Debug, Clone, Serialize)]
pub struct KindChanges {
    pub kind: EntityKind,
    pub create: usize,
    pub update: usize,
    pub delete: usize,
}

/// The complete diff between two graphs, one set per kind.
#[derive(Debug, Clone, Default)]
pub struct SyncDiff {
    pub buildings: TypeDiff<Building>,
    pub rooms: TypeDiff<Room>,
    pub racks: TypeDiff<Rack>,
    pub vendors: TypeDiff<Vendor>,
    pub hardware: TypeDiff<Hardware>,
    pub vrfs: TypeDiff<Vrf>,
    pub subnets: TypeDiff<Subnet>,
    pub vlans: TypeDiff<Vlan>,
    pub clusters: TypeDiff<Cluster>,
    pub devices: TypeDiff<Device>,
    pub ports: TypeDiff<Port>,
    pub patch_panels: TypeDiff<PatchPanel>,
    pub patch_panel_ports: TypeDiff<PatchPanelPort>,
    pub ip_addresses: TypeDiff<IpAddress>,
    pub providers: TypeDiff<Provider>,
    pub circuits: TypeDiff<Circuit>,
    pub connections: TypeDiff<Connection>,
}

macro_rules! for_each_kind {
    ($diff:expr, $td:ident => $body:expr) => {{
        {
            let $td = &$diff.buildings;
            $body
        }
        {
            let $td = &$diff.rooms;
            $body
        }
        {
            let $td = &$diff.racks;
            $body
        }
        {
            let $td = &$diff.vendors;
            $body
        }
        {
            let $td = &$diff.hardware;
            $body
        }
        {
            let $td = &$diff.vrfs;
            $body
        }
        {
            let $td = &$diff.subnets;
            $body
        }
        {
            let $td = &$diff.vlans;
            $body
        }
        {
            let $td = &$diff.clusters;
            $body
        }
        {
            let $td = &$diff.devices;
            $body
        }
        {
            let $td = &$diff.ports;
            $body
        }
        {
            let $td = &$diff.patch_panels;
            $body
        }
        {
            let $td = &$diff.patch_panel_ports;
            $body
        }
        {
            let $td = &$diff.ip_addresses;
            $body
        }
        {
            let $td = &$diff.providers;
            $body
        }
        {
            let $td = &$diff.circuits;
            $body
        }
        {
            let $td = &$diff.connections;
            $body
        }
    }};
}

impl SyncDiff {
    /// `true` when all three sets are empty for every kind — the two graphs
    /// have converged.
    pub fn is_empty(&self) -> bool {
        let mut empty = true;
        for_each_kind!(self, td => {
            empty = empty && td.is_empty();
        });
        empty
    }

    /// Per-kind change counts in creation order, kinds with no changes
    /// omitted.
    pub fn changes(&self) -> Vec<KindChanges> {
        fn push<T: SyncModel>(out: &mut Vec<KindChanges>, td: &TypeDiff<T>) {
            if !td.is_empty() {
                out.push(KindChanges {
                    kind: T::KIND,
                    create: td.create.len(),
                    update: td.update.len(),
                    delete: td.delete.len(),
                });
            }
        }

        let mut out = Vec::new();
        for_each_kind!(self, td => push(&mut out, td));
        out
    }
}

/// Compare two graphs kind-by-kind, parents before children.
pub fn diff(source: &Graph, target: &Graph) -> SyncDiff {
    SyncDiff {
        buildings: diff_kind(source, target),
        rooms: diff_kind(source, target),
        racks: diff_kind(source, target),
        vendors: diff_kind(source, target),
        hardware: diff_kind(source, target),
        vrfs: diff_kind(source, target),
        subnets: diff_kind(source, target),
        vlans: diff_kind(source, target),
        clusters: diff_kind(source, target),
        devices: diff_kind(source, target),
        ports: diff_kind(source, target),
        patch_panels: diff_kind(source, target),
        patch_panel_ports: diff_kind(source, target),
        ip_addresses: diff_kind(source, target),
        providers: diff_kind(source, target),
        circuits: diff_kind(source, target),
        connections: diff_kind(source, target),
    }
}

fn diff_kind<T: GraphSlot>(source: &Graph, target: &Graph) -> TypeDiff<T> {
    let mut td = TypeDiff::default();

    for entity in source.all::<T>() {
        let key = entity.key();
        match target.get::<T>(&key) {
            None => {
                // Orphan rule: never propose a child whose declared parent
                // chain is missing from the source graph.
                if let Some((parent_kind, parent_key)) = entity.parent() {
                    if !source.resolves(parent_kind, &parent_key) {
                        tracing::warn!(
                            kind = %T::KIND,
                            key = %key,
                            parent_kind = %parent_kind,
                            parent_key = %parent_key,
                            "dropping orphaned entity from create set"
                        );
                        td.orphaned.push(key);
                        continue;
                    }
                }
                td.create.push(entity.clone());
            }
            Some(current) => {
                let fields = entity.delta(current);
                if !fields.is_empty() {
                    td.update.push(UpdatePlan {
                        desired: entity.clone(),
                        fields,
                    });
                }
            }
        }
    }

    for key in T::set(target).keys() {
        if !T::set(source).contains(key) {
            td.delete.push(key.clone());
        }
    }

    td
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Building, Rack, Room};
    use pretty_assertions::assert_eq;

    fn site(graph: &mut Graph) {
        graph
            .insert(Building {
                name: "DC1".into(),
                ..Building::default()
            })
            .unwrap();
        graph
            .insert(Room {
                name: "R1".into(),
                building: "DC1".into(),
                ..Room::default()
            })
            .unwrap();
        graph
            .insert(Rack {
                name: "RK1".into(),
                building: "DC1".into(),
                room: "R1".into(),
                height: 42,
                ..Rack::default()
            })
            .unwrap();
    }

    #[test]
    fn create_set_is_ordered_parent_first() {
        let mut source = Graph::default();
        site(&mut source);
        let target = Graph::default();

        let d = diff(&source, &target);
        assert_eq!(d.buildings.create.len(), 1);
        assert_eq!(d.rooms.create.len(), 1);
        assert_eq!(d.racks.create.len(), 1);
        assert!(d.racks.delete.is_empty());
    }

    #[test]
    fn identical_graphs_diff_empty() {
        let mut source = Graph::default();
        site(&mut source);
        let mut target = Graph::default();
        site(&mut target);

        assert!(diff(&source, &target).is_empty());
    }

    #[test]
    fn update_carries_only_changed_fields() {
        let mut source = Graph::default();
        site(&mut source);
        let mut target = Graph::default();
        target
            .insert(Building {
                name: "DC1".into(),
                ..Building::default()
            })
            .unwrap();
        target
            .insert(Room {
                name: "R1".into(),
                building: "DC1".into(),
                ..Room::default()
            })
            .unwrap();
        target
            .insert(Rack {
                name: "RK1".into(),
                building: "DC1".into(),
                room: "R1".into(),
                height: 47,
                ..Rack::default()
            })
            .unwrap();

        let d = diff(&source, &target);
        assert_eq!(d.racks.update.len(), 1);
        assert_eq!(d.racks.update[0].fields, vec!["height"]);
        assert!(d.rooms.update.is_empty());
    }

    #[test]
    fn orphaned_child_is_dropped_with_diagnostic() {
        let mut source = Graph::default();
        // Room whose building never made it into the source graph.
        source
            .insert(Room {
                name: "R1".into(),
                building: "MISSING".into(),
                ..Room::default()
            })
            .unwrap();
        let target = Graph::default();

        let d = diff(&source, &target);
        assert!(d.rooms.create.is_empty());
        assert_eq!(d.rooms.orphaned.len(), 1);
    }

    #[test]
    fn removed_entities_land_in_delete() {
        let source = Graph::default();
        let mut target = Graph::default();
        site(&mut target);

        let d = diff(&source, &target);
        assert_eq!(d.buildings.delete.len(), 1);
        assert_eq!(d.rooms.delete.len(), 1);
        assert_eq!(d.racks.delete.len(), 1);
    }
}
