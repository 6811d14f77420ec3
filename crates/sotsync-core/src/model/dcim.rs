// ── DCIM entity types ──
//
// Buildings, rooms, racks, hardware, devices, ports, patch panels, and
// cabling. Natural keys follow the source-of-record conventions: most kinds
// key on name, scoped kinds key on their containment chain.

use serde::{Deserialize, Serialize};

use super::common::{CustomField, NaturalKey, VlanMembership};
use super::{EntityKind, SyncModel, delta_field, delta_set};

/// A site. Owns rooms.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Building {
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub contact_name: Option<String>,
    #[serde(default)]
    pub contact_phone: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub custom_fields: Vec<CustomField>,
}

impl SyncModel for Building {
    const KIND: EntityKind = EntityKind::Building;

    fn key(&self) -> NaturalKey {
        NaturalKey::single(&self.name)
    }

    fn delta(&self, target: &Self) -> Vec<&'static str> {
        let mut changes = Vec::new();
        delta_field!(changes, self.address, target.address, "address");
        delta_field!(changes, self.latitude, target.latitude, "latitude");
        delta_field!(changes, self.longitude, target.longitude, "longitude");
        delta_field!(changes, self.contact_name, target.contact_name, "contact_name");
        delta_field!(changes, self.contact_phone, target.contact_phone, "contact_phone");
        delta_set!(changes, &self.tags, &target.tags, "tags");
        delta_set!(changes, &self.custom_fields, &target.custom_fields, "custom_fields");
        changes
    }
}

/// A rack group inside a building.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub name: String,
    pub building: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub custom_fields: Vec<CustomField>,
}

impl SyncModel for Room {
    const KIND: EntityKind = EntityKind::Room;

    fn key(&self) -> NaturalKey {
        NaturalKey::new([&self.name, &self.building])
    }

    fn parent(&self) -> Option<(EntityKind, NaturalKey)> {
        Some((EntityKind::Building, NaturalKey::single(&self.building)))
    }

    fn delta(&self, target: &Self) -> Vec<&'static str> {
        let mut changes = Vec::new();
        delta_field!(changes, self.notes, target.notes, "notes");
        delta_set!(changes, &self.custom_fields, &target.custom_fields, "custom_fields");
        changes
    }
}

/// A rack inside a room.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rack {
    pub name: String,
    pub building: String,
    pub room: String,
    #[serde(default)]
    pub height: u16,
    #[serde(default)]
    pub numbering_start_from_bottom: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub custom_fields: Vec<CustomField>,
}

impl SyncModel for Rack {
    const KIND: EntityKind = EntityKind::Rack;

    fn key(&self) -> NaturalKey {
        NaturalKey::new([&self.name, &self.building, &self.room])
    }

    fn parent(&self) -> Option<(EntityKind, NaturalKey)> {
        Some((EntityKind::Room, NaturalKey::new([&self.room, &self.building])))
    }

    fn delta(&self, target: &Self) -> Vec<&'static str> {
        let mut changes = Vec::new();
        delta_field!(changes, self.height, target.height, "height");
        delta_field!(
            changes,
            self.numbering_start_from_bottom,
            target.numbering_start_from_bottom,
            "numbering_start_from_bottom"
        );
        delta_set!(changes, &self.tags, &target.tags, "tags");
        delta_set!(changes, &self.custom_fields, &target.custom_fields, "custom_fields");
        changes
    }
}

/// A hardware manufacturer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vendor {
    pub name: String,
    #[serde(default)]
    pub custom_fields: Vec<CustomField>,
}

impl SyncModel for Vendor {
    const KIND: EntityKind = EntityKind::Vendor;

    fn key(&self) -> NaturalKey {
        NaturalKey::single(&self.name)
    }

    fn delta(&self, target: &Self) -> Vec<&'static str> {
        let mut changes = Vec::new();
        delta_set!(changes, &self.custom_fields, &target.custom_fields, "custom_fields");
        changes
    }
}

/// A device model (hardware type), cross-referencing its vendor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Hardware {
    pub name: String,
    pub manufacturer: String,
    #[serde(default)]
    pub size: Option<u16>,
    #[serde(default)]
    pub depth: Option<String>,
    #[serde(default)]
    pub part_number: Option<String>,
    #[serde(default)]
    pub custom_fields: Vec<CustomField>,
}

impl SyncModel for Hardware {
    const KIND: EntityKind = EntityKind::Hardware;

    fn key(&self) -> NaturalKey {
        NaturalKey::single(&self.name)
    }

    fn delta(&self, target: &Self) -> Vec<&'static str> {
        let mut changes = Vec::new();
        delta_field!(changes, self.manufacturer, target.manufacturer, "manufacturer");
        delta_field!(changes, self.size, target.size, "size");
        delta_field!(changes, self.depth, target.depth, "depth");
        delta_field!(changes, self.part_number, target.part_number, "part_number");
        delta_set!(changes, &self.custom_fields, &target.custom_fields, "custom_fields");
        changes
    }
}

/// A stacked-device cluster (virtual chassis). The master member's device
/// record carries `master_device`; the cluster's master reference is patched
/// in after device commit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub name: String,
    #[serde(default)]
    pub members: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub custom_fields: Vec<CustomField>,
}

impl SyncModel for Cluster {
    const KIND: EntityKind = EntityKind::Cluster;

    fn key(&self) -> NaturalKey {
        NaturalKey::single(&self.name)
    }

    fn delta(&self, target: &Self) -> Vec<&'static str> {
        let mut changes = Vec::new();
        delta_set!(changes, &self.members, &target.members, "members");
        delta_set!(changes, &self.tags, &target.tags, "tags");
        delta_set!(changes, &self.custom_fields, &target.custom_fields, "custom_fields");
        changes
    }
}

/// A network device. Cross-references building, rack, hardware, and cluster.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub name: String,
    #[serde(default)]
    pub building: Option<String>,
    #[serde(default)]
    pub room: Option<String>,
    #[serde(default)]
    pub rack: Option<String>,
    #[serde(default)]
    pub rack_position: Option<u16>,
    #[serde(default)]
    pub rack_orientation: Option<String>,
    pub hardware: String,
    #[serde(default)]
    pub os: Option<String>,
    #[serde(default)]
    pub os_version: Option<String>,
    #[serde(default)]
    pub in_service: bool,
    #[serde(default)]
    pub serial_no: Option<String>,
    #[serde(default)]
    pub cluster_host: Option<String>,
    #[serde(default)]
    pub master_device: bool,
    /// Collector-side hint for facility-based location resolution.
    /// Never diffed.
    #[serde(default)]
    pub customer: Option<String>,
    /// Stack slot inside `cluster_host`, computed during apply. Derived,
    /// never diffed.
    #[serde(default)]
    pub vc_position: Option<u16>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub custom_fields: Vec<CustomField>,
}

impl SyncModel for Device {
    const KIND: EntityKind = EntityKind::Device;

    fn key(&self) -> NaturalKey {
        NaturalKey::single(&self.name)
    }

    fn delta(&self, target: &Self) -> Vec<&'static str> {
        let mut changes = Vec::new();
        delta_field!(changes, self.building, target.building, "building");
        delta_field!(changes, self.room, target.room, "room");
        delta_field!(changes, self.rack, target.rack, "rack");
        delta_field!(changes, self.rack_position, target.rack_position, "rack_position");
        delta_field!(
            changes,
            self.rack_orientation,
            target.rack_orientation,
            "rack_orientation"
        );
        delta_field!(changes, self.hardware, target.hardware, "hardware");
        delta_field!(changes, self.os, target.os, "os");
        delta_field!(changes, self.os_version, target.os_version, "os_version");
        delta_field!(changes, self.in_service, target.in_service, "in_service");
        delta_field!(changes, self.serial_no, target.serial_no, "serial_no");
        delta_field!(changes, self.cluster_host, target.cluster_host, "cluster_host");
        delta_field!(changes, self.master_device, target.master_device, "master_device");
        delta_set!(changes, &self.tags, &target.tags, "tags");
        delta_set!(changes, &self.custom_fields, &target.custom_fields, "custom_fields");
        changes
    }
}

/// Link mode of a port.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortMode {
    Access,
    #[default]
    Tagged,
}

/// A device interface. Owned by its device.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Port {
    pub device: String,
    pub name: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub mtu: Option<u16>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub mac_addr: Option<String>,
    #[serde(default)]
    pub port_type: String,
    #[serde(default)]
    pub mode: PortMode,
    #[serde(default)]
    pub vlans: Vec<VlanMembership>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub custom_fields: Vec<CustomField>,
}

impl SyncModel for Port {
    const KIND: EntityKind = EntityKind::Port;

    fn key(&self) -> NaturalKey {
        NaturalKey::new([&self.device, &self.name])
    }

    fn parent(&self) -> Option<(EntityKind, NaturalKey)> {
        Some((EntityKind::Device, NaturalKey::single(&self.device)))
    }

    fn delta(&self, target: &Self) -> Vec<&'static str> {
        let mut changes = Vec::new();
        delta_field!(changes, self.enabled, target.enabled, "enabled");
        delta_field!(changes, self.mtu, target.mtu, "mtu");
        delta_field!(changes, self.description, target.description, "description");
        delta_field!(changes, self.mac_addr, target.mac_addr, "mac_addr");
        delta_field!(changes, self.port_type, target.port_type, "port_type");
        delta_field!(changes, self.mode, target.mode, "mode");
        delta_set!(changes, &self.vlans, &target.vlans, "vlans");
        delta_set!(changes, &self.tags, &target.tags, "tags");
        delta_set!(changes, &self.custom_fields, &target.custom_fields, "custom_fields");
        changes
    }
}

/// What a cable end terminates on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationKind {
    #[default]
    Interface,
    Circuit,
    PatchPanel,
}

/// A cable between two terminations. Keyed on both endpoints so the same
/// physical link loads identically from either inventory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub src_device: String,
    pub src_port: String,
    #[serde(default)]
    pub src_port_mac: Option<String>,
    pub dst_device: String,
    pub dst_port: String,
    #[serde(default)]
    pub dst_port_mac: Option<String>,
    #[serde(default)]
    pub src_type: TerminationKind,
    #[serde(default)]
    pub dst_type: TerminationKind,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl SyncModel for Connection {
    const KIND: EntityKind = EntityKind::Connection;

    fn key(&self) -> NaturalKey {
        NaturalKey::new([
            self.src_device.as_str(),
            self.src_port.as_str(),
            self.src_port_mac.as_deref().unwrap_or_default(),
            self.dst_device.as_str(),
            self.dst_port.as_str(),
            self.dst_port_mac.as_deref().unwrap_or_default(),
        ])
    }

    fn delta(&self, target: &Self) -> Vec<&'static str> {
        let mut changes = Vec::new();
        delta_field!(changes, self.src_type, target.src_type, "src_type");
        delta_field!(changes, self.dst_type, target.dst_type, "dst_type");
        delta_set!(changes, &self.tags, &target.tags, "tags");
        changes
    }
}

/// A patch panel mounted in a rack.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatchPanel {
    pub name: String,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub size: Option<u16>,
    #[serde(default)]
    pub building: Option<String>,
    #[serde(default)]
    pub room: Option<String>,
    #[serde(default)]
    pub rack: Option<String>,
    #[serde(default)]
    pub position: Option<u16>,
}

impl SyncModel for PatchPanel {
    const KIND: EntityKind = EntityKind::PatchPanel;

    fn key(&self) -> NaturalKey {
        NaturalKey::single(&self.name)
    }

    fn delta(&self, target: &Self) -> Vec<&'static str> {
        let mut changes = Vec::new();
        delta_field!(changes, self.vendor, target.vendor, "vendor");
        delta_field!(changes, self.model, target.model, "model");
        delta_field!(changes, self.size, target.size, "size");
        delta_field!(changes, self.building, target.building, "building");
        delta_field!(changes, self.room, target.room, "room");
        delta_field!(changes, self.rack, target.rack, "rack");
        delta_field!(changes, self.position, target.position, "position");
        changes
    }
}

/// A front port on a patch panel. Owned by its panel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatchPanelPort {
    pub panel: String,
    pub name: String,
    #[serde(default)]
    pub port_no: Option<u16>,
}

impl SyncModel for PatchPanelPort {
    const KIND: EntityKind = EntityKind::PatchPanelPort;

    fn key(&self) -> NaturalKey {
        NaturalKey::new([&self.panel, &self.name])
    }

    fn parent(&self) -> Option<(EntityKind, NaturalKey)> {
        Some((EntityKind::PatchPanel, NaturalKey::single(&self.panel)))
    }

    fn delta(&self, target: &Self) -> Vec<&'static str> {
        let mut changes = Vec::new();
        delta_field!(changes, self.port_no, target.port_no, "port_no");
        changes
    }
}
