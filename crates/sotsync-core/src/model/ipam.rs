// ── IPAM entity types ──

use serde::{Deserialize, Serialize};

use super::common::{CustomField, NaturalKey};
use super::{EntityKind, SyncModel, delta_field, delta_set};

/// A VRF group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vrf {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub custom_fields: Vec<CustomField>,
}

impl SyncModel for Vrf {
    const KIND: EntityKind = EntityKind::Vrf;

    fn key(&self) -> NaturalKey {
        NaturalKey::single(&self.name)
    }

    fn delta(&self, target: &Self) -> Vec<&'static str> {
        let mut changes = Vec::new();
        delta_field!(changes, self.description, target.description, "description");
        delta_set!(changes, &self.tags, &target.tags, "tags");
        delta_set!(changes, &self.custom_fields, &target.custom_fields, "custom_fields");
        changes
    }
}

/// A prefix, keyed on network address, mask length, and VRF scope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subnet {
    pub network: String,
    pub mask_bits: u8,
    #[serde(default)]
    pub vrf: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub custom_fields: Vec<CustomField>,
}

impl SyncModel for Subnet {
    const KIND: EntityKind = EntityKind::Subnet;

    fn key(&self) -> NaturalKey {
        NaturalKey::new([
            self.network.as_str(),
            &self.mask_bits.to_string(),
            self.vrf.as_deref().unwrap_or_default(),
        ])
    }

    fn delta(&self, target: &Self) -> Vec<&'static str> {
        let mut changes = Vec::new();
        delta_field!(changes, self.description, target.description, "description");
        delta_set!(changes, &self.tags, &target.tags, "tags");
        delta_set!(changes, &self.custom_fields, &target.custom_fields, "custom_fields");
        changes
    }
}

/// An IP address in CIDR form (`10.0.0.5/24`), keyed on address and VRF.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IpAddress {
    pub address: String,
    #[serde(default)]
    pub vrf: Option<String>,
    #[serde(default)]
    pub available: bool,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub device: Option<String>,
    #[serde(default)]
    pub interface: Option<String>,
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub custom_fields: Vec<CustomField>,
}

impl SyncModel for IpAddress {
    const KIND: EntityKind = EntityKind::IpAddress;

    fn key(&self) -> NaturalKey {
        NaturalKey::new([
            self.address.as_str(),
            self.vrf.as_deref().unwrap_or_default(),
        ])
    }

    fn delta(&self, target: &Self) -> Vec<&'static str> {
        let mut changes = Vec::new();
        delta_field!(changes, self.available, target.available, "available");
        delta_field!(changes, self.label, target.label, "label");
        delta_field!(changes, self.device, target.device, "device");
        delta_field!(changes, self.interface, target.interface, "interface");
        delta_field!(changes, self.primary, target.primary, "primary");
        delta_set!(changes, &self.tags, &target.tags, "tags");
        delta_set!(changes, &self.custom_fields, &target.custom_fields, "custom_fields");
        changes
    }
}

/// A VLAN, scoped to a building when the source knows one; building-less
/// VLANs live in the global scope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vlan {
    pub name: String,
    pub vlan_id: u16,
    #[serde(default)]
    pub building: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub custom_fields: Vec<CustomField>,
}

impl Vlan {
    /// Natural key for a VLAN identified by `(name, vid)` inside a building
    /// scope, or the global scope when `building` is `None`.
    pub fn scoped_key(name: &str, vid: u16, building: Option<&str>) -> NaturalKey {
        NaturalKey::new([name, &vid.to_string(), building.unwrap_or_default()])
    }
}

impl SyncModel for Vlan {
    const KIND: EntityKind = EntityKind::Vlan;

    fn key(&self) -> NaturalKey {
        Self::scoped_key(&self.name, self.vlan_id, self.building.as_deref())
    }

    fn delta(&self, target: &Self) -> Vec<&'static str> {
        let mut changes = Vec::new();
        delta_field!(changes, self.description, target.description, "description");
        delta_set!(changes, &self.tags, &target.tags, "tags");
        delta_set!(changes, &self.custom_fields, &target.custom_fields, "custom_fields");
        changes
    }
}
