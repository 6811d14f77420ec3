// ── Inventory collection ──
//
// The boundary to the inventories being reconciled: anything that can hand
// back raw records mappable onto the entity schema. The supplied
// implementation loads JSON snapshots; live collectors implement the same
// trait elsewhere.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::CollectError;
use crate::graph::Graph;
use crate::model::{
    Building, Circuit, Cluster, Connection, Device, Hardware, IpAddress, PatchPanel,
    PatchPanelPort, Port, Provider, Rack, Room, Subnet, Vendor, Vlan, Vrf,
};
use crate::options::SyncOptions;

/// Building tag prefix that marks a facility code for customer resolution.
const SITECODE_TAG: &str = "sitecode-";

/// Produces one immutable entity graph per run.
pub trait Collector {
    fn collect(&mut self) -> Result<Graph, CollectError>;
}

/// A full inventory as flat per-kind record lists, the JSON snapshot shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub buildings: Vec<Building>,
    pub rooms: Vec<Room>,
    pub racks: Vec<Rack>,
    pub vendors: Vec<Vendor>,
    pub hardware: Vec<Hardware>,
    pub clusters: Vec<Cluster>,
    pub devices: Vec<Device>,
    pub ports: Vec<Port>,
    pub vrfs: Vec<Vrf>,
    pub subnets: Vec<Subnet>,
    pub ip_addresses: Vec<IpAddress>,
    pub vlans: Vec<Vlan>,
    pub connections: Vec<Connection>,
    pub providers: Vec<Provider>,
    pub circuits: Vec<Circuit>,
    pub patch_panels: Vec<PatchPanel>,
    pub patch_panel_ports: Vec<PatchPanelPort>,
}

enum Input {
    Path(PathBuf),
    Loaded(Snapshot),
}

/// Collector over a JSON snapshot, honoring the run options that shape
/// collection: `ignore_tag`, `hostname_mapping`, `customer_is_facility`.
pub struct SnapshotCollector {
    input: Input,
    options: SyncOptions,
}

impl SnapshotCollector {
    pub fn from_path(path: impl Into<PathBuf>, options: SyncOptions) -> Self {
        Self {
            input: Input::Path(path.into()),
            options,
        }
    }

    pub fn from_snapshot(snapshot: Snapshot, options: SyncOptions) -> Self {
        Self {
            input: Input::Loaded(snapshot),
            options,
        }
    }
}

impl Collector for SnapshotCollector {
    fn collect(&mut self) -> Result<Graph, CollectError> {
        let snapshot = match &self.input {
            Input::Path(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
            Input::Loaded(snapshot) => snapshot.clone(),
        };
        build_graph(snapshot, &self.options)
    }
}

fn build_graph(snapshot: Snapshot, options: &SyncOptions) -> Result<Graph, CollectError> {
    let mut graph = Graph::default();
    let ignore = |tags: &[String]| {
        options
            .ignore_tag
            .as_ref()
            .is_some_and(|tag| tags.iter().any(|t| t == tag))
    };

    // Facility codes come from building tags: `sitecode-ord1` on "DC1"
    // resolves customer "ord1" to DC1.
    let facilities: HashMap<String, String> = if options.customer_is_facility {
        snapshot
            .buildings
            .iter()
            .flat_map(|building| {
                building.tags.iter().filter_map(|tag| {
                    tag.strip_prefix(SITECODE_TAG)
                        .map(|code| (code.to_string(), building.name.clone()))
                })
            })
            .collect()
    } else {
        HashMap::new()
    };

    for building in snapshot.buildings {
        if ignore(&building.tags) {
            continue;
        }
        graph.insert(building)?;
    }
    for room in snapshot.rooms {
        graph.insert(room)?;
    }
    for rack in snapshot.racks {
        if ignore(&rack.tags) {
            continue;
        }
        graph.insert(rack)?;
    }
    for vendor in snapshot.vendors {
        graph.insert(vendor)?;
    }
    for hardware in snapshot.hardware {
        graph.insert(hardware)?;
    }
    for cluster in snapshot.clusters {
        if ignore(&cluster.tags) {
            continue;
        }
        graph.insert(cluster)?;
    }
    for mut device in snapshot.devices {
        if ignore(&device.tags) {
            continue;
        }
        // Hostname rules outrank everything, then facility resolution,
        // then whatever location the inventory collected.
        if let Some(location) = options.location_override(&device.name) {
            device.building = Some(location.to_string());
        } else if let Some(facility) = device
            .customer
            .as_ref()
            .and_then(|code| facilities.get(code))
        {
            device.building = Some(facility.clone());
        }
        graph.insert(device)?;
    }
    for port in snapshot.ports {
        if ignore(&port.tags) {
            continue;
        }
        graph.insert(port)?;
    }
    for vrf in snapshot.vrfs {
        if ignore(&vrf.tags) {
            continue;
        }
        graph.insert(vrf)?;
    }
    for subnet in snapshot.subnets {
        if ignore(&subnet.tags) {
            continue;
        }
        graph.insert(subnet)?;
    }
    for ip in snapshot.ip_addresses {
        if ignore(&ip.tags) {
            continue;
        }
        graph.insert(ip)?;
    }
    for vlan in snapshot.vlans {
        if ignore(&vlan.tags) {
            continue;
        }
        graph.insert(vlan)?;
    }
    for connection in snapshot.connections {
        if ignore(&connection.tags) {
            continue;
        }
        graph.insert(connection)?;
    }
    for provider in snapshot.providers {
        if ignore(&provider.tags) {
            continue;
        }
        graph.insert(provider)?;
    }
    for circuit in snapshot.circuits {
        if ignore(&circuit.tags) {
            continue;
        }
        graph.insert(circuit)?;
    }
    for panel in snapshot.patch_panels {
        graph.insert(panel)?;
    }
    for panel_port in snapshot.patch_panel_ports {
        graph.insert(panel_port)?;
    }

    tracing::debug!(entities = graph.len(), "snapshot collected");
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NaturalKey;
    use crate::options::HostnameRule;

    fn collect(snapshot: Snapshot, options: SyncOptions) -> Graph {
        SnapshotCollector::from_snapshot(snapshot, options)
            .collect()
            .unwrap()
    }

    #[test]
    fn ignore_tag_drops_tagged_entities() {
        let snapshot = Snapshot {
            devices: vec![
                Device {
                    name: "keep".into(),
                    hardware: "EX".into(),
                    ..Device::default()
                },
                Device {
                    name: "drop".into(),
                    hardware: "EX".into(),
                    tags: vec!["no-sync".into()],
                    ..Device::default()
                },
            ],
            ..Snapshot::default()
        };
        let graph = collect(
            snapshot,
            SyncOptions {
                ignore_tag: Some("no-sync".into()),
                ..SyncOptions::default()
            },
        );
        assert!(graph.get::<Device>(&NaturalKey::from("keep")).is_some());
        assert!(graph.get::<Device>(&NaturalKey::from("drop")).is_none());
    }

    #[test]
    fn hostname_rule_outranks_collected_location() {
        let snapshot = Snapshot {
            devices: vec![Device {
                name: "edge-01".into(),
                building: Some("DC9".into()),
                hardware: "EX".into(),
                ..Device::default()
            }],
            ..Snapshot::default()
        };
        let graph = collect(
            snapshot,
            SyncOptions {
                hostname_mapping: vec![HostnameRule::new(r"^edge-", "DC1").unwrap()],
                ..SyncOptions::default()
            },
        );
        let device = graph.get::<Device>(&NaturalKey::from("edge-01")).unwrap();
        assert_eq!(device.building.as_deref(), Some("DC1"));
    }

    #[test]
    fn customer_resolves_through_sitecode_tags() {
        let snapshot = Snapshot {
            buildings: vec![Building {
                name: "DC1".into(),
                tags: vec!["sitecode-ord1".into()],
                ..Building::default()
            }],
            devices: vec![Device {
                name: "sw1".into(),
                customer: Some("ord1".into()),
                hardware: "EX".into(),
                ..Device::default()
            }],
            ..Snapshot::default()
        };
        let graph = collect(
            snapshot,
            SyncOptions {
                customer_is_facility: true,
                ..SyncOptions::default()
            },
        );
        let device = graph.get::<Device>(&NaturalKey::from("sw1")).unwrap();
        assert_eq!(device.building.as_deref(), Some("DC1"));
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let snapshot = Snapshot {
            buildings: vec![Building {
                name: "DC1".into(),
                ..Building::default()
            }],
            ..Snapshot::default()
        };
        let json = serde_json::to_string(&snapshot).unwrap();
        let graph = collect(
            serde_json::from_str(&json).unwrap(),
            SyncOptions::default(),
        );
        assert_eq!(graph.len(), 1);
    }
}
