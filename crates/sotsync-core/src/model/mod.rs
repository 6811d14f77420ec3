// ── Entity model ──
//
// Typed records for every synchronized entity kind, grouped by domain the
// way the upstream inventories group them. Attributes are explicit optional
// fields, never key-presence-checked maps: "absent" and "cleared" are
// distinguishable at the type level.

pub mod circuits;
pub mod common;
pub mod dcim;
pub mod ipam;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use circuits::{Circuit, Provider};
pub use common::{CustomField, NaturalKey, VlanMembership};
pub use dcim::{
    Building, Cluster, Connection, Device, Hardware, PatchPanel, PatchPanelPort, Port, PortMode,
    Rack, Room, TerminationKind, Vendor,
};
pub use ipam::{IpAddress, Subnet, Vlan, Vrf};

/// Every entity kind the engine reconciles.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EntityKind {
    Building,
    Room,
    Rack,
    Vendor,
    Hardware,
    Cluster,
    Device,
    Port,
    Vrf,
    Subnet,
    IpAddress,
    Vlan,
    Connection,
    Provider,
    Circuit,
    PatchPanel,
    PatchPanelPort,
}

/// Commit order for creations: parents and cross-referenced kinds before the
/// kinds that point at them.
pub const CREATE_ORDER: [EntityKind; 17] = [
    EntityKind::Building,
    EntityKind::Room,
    EntityKind::Rack,
    EntityKind::Vendor,
    EntityKind::Hardware,
    EntityKind::Vrf,
    EntityKind::Subnet,
    EntityKind::Vlan,
    EntityKind::Cluster,
    EntityKind::Device,
    EntityKind::Port,
    EntityKind::PatchPanel,
    EntityKind::PatchPanelPort,
    EntityKind::IpAddress,
    EntityKind::Provider,
    EntityKind::Circuit,
    EntityKind::Connection,
];

/// Flush order for queued deletions: leaf and dependent kinds first, so a
/// kind is never deleted while something that references it still exists.
pub const DELETE_ORDER: [EntityKind; 17] = [
    EntityKind::Connection,
    EntityKind::Circuit,
    EntityKind::Provider,
    EntityKind::IpAddress,
    EntityKind::PatchPanelPort,
    EntityKind::PatchPanel,
    EntityKind::Port,
    EntityKind::Cluster,
    EntityKind::Device,
    EntityKind::Hardware,
    EntityKind::Rack,
    EntityKind::Room,
    EntityKind::Vrf,
    EntityKind::Subnet,
    EntityKind::Vlan,
    EntityKind::Building,
    EntityKind::Vendor,
];

/// Behavior every synchronized entity type implements: its kind, natural
/// key, declared containment parent, and attribute-level diffing.
pub trait SyncModel: Clone + fmt::Debug {
    const KIND: EntityKind;

    /// The ordered identifying tuple for this entity.
    fn key(&self) -> NaturalKey;

    /// The containment parent, if this kind is owned by another. Ownership
    /// is a strict tree; cross-tree references are not parents.
    fn parent(&self) -> Option<(EntityKind, NaturalKey)> {
        None
    }

    /// Names of attributes where `self` (desired) differs from `target`
    /// (current). Collection attributes compare with set equality.
    fn delta(&self, target: &Self) -> Vec<&'static str>;
}

/// Push `$name` when the scalar attributes differ.
macro_rules! delta_field {
    ($changes:ident, $src:expr, $tgt:expr, $name:literal) => {
        if $src != $tgt {
            $changes.push($name);
        }
    };
}

/// Push `$name` when the collection attributes differ as sets.
macro_rules! delta_set {
    ($changes:ident, $src:expr, $tgt:expr, $name:literal) => {
        if !crate::model::common::set_eq($src, $tgt) {
            $changes.push($name);
        }
    };
}

pub(crate) use {delta_field, delta_set};
