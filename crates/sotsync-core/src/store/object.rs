// ── Store object model ──
//
// The shape the apply engine hands to the target store: the constructed
// entity payload plus named reference slots. Reference slots hold either a
// concrete surrogate id or a deferred token; a row must carry only concrete
// ids by the time it reaches the store.

use crate::identity::{ObjectId, Ref};
use crate::model::{
    Building, Circuit, Cluster, Connection, Device, EntityKind, Hardware, IpAddress, NaturalKey,
    PatchPanel, PatchPanelPort, Port, Provider, Rack, Room, Subnet, SyncModel, Vendor, Vlan, Vrf,
};

/// Which reference a [`RefSlot`] fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefField {
    Building,
    Room,
    Rack,
    Vendor,
    Hardware,
    Cluster,
    /// A cluster's designated master device. Patched in after device commit.
    Master,
    Device,
    /// The interface an address or cable end is bound to.
    Interface,
    UntaggedVlan,
    /// May appear once per tagged VLAN.
    TaggedVlan,
    Vrf,
    Provider,
    Panel,
    SrcPort,
    DstPort,
    SrcCircuit,
    DstCircuit,
}

/// Reference fields a kind's constructed row is authoritative for.
///
/// An update drops every existing slot for these fields before merging the
/// incoming row's slots, so an attribute cleared at the source releases its
/// reference instead of leaving the old slot behind. Fields written
/// out-of-band (a cluster's [`RefField::Master`]) are deliberately absent
/// and survive updates that do not carry them.
pub fn governed_refs(kind: EntityKind) -> &'static [RefField] {
    match kind {
        EntityKind::Building
        | EntityKind::Vendor
        | EntityKind::Cluster
        | EntityKind::Vrf
        | EntityKind::Provider => &[],
        EntityKind::Room | EntityKind::Vlan => &[RefField::Building],
        EntityKind::Rack => &[RefField::Building, RefField::Room],
        EntityKind::Hardware => &[RefField::Vendor],
        EntityKind::Device => &[
            RefField::Building,
            RefField::Rack,
            RefField::Hardware,
            RefField::Cluster,
        ],
        EntityKind::Port => &[
            RefField::Device,
            RefField::UntaggedVlan,
            RefField::TaggedVlan,
        ],
        EntityKind::Subnet => &[RefField::Vrf],
        EntityKind::IpAddress => &[RefField::Vrf, RefField::Device, RefField::Interface],
        EntityKind::Connection => &[
            RefField::SrcPort,
            RefField::DstPort,
            RefField::SrcCircuit,
            RefField::DstCircuit,
        ],
        EntityKind::Circuit => &[RefField::Provider, RefField::SrcPort, RefField::DstPort],
        EntityKind::PatchPanel => &[RefField::Vendor, RefField::Building, RefField::Rack],
        EntityKind::PatchPanelPort => &[RefField::Panel],
    }
}

/// One named reference carried by a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefSlot {
    pub field: RefField,
    pub target: Ref,
}

impl RefSlot {
    pub fn new(field: RefField, target: Ref) -> Self {
        Self { field, target }
    }
}

macro_rules! payload {
    ( $( $variant:ident ),+ $(,)? ) => {
        /// The typed entity payload of a row.
        #[derive(Debug, Clone)]
        pub enum Payload {
            $( $variant($variant), )+
        }

        impl Payload {
            pub fn kind(&self) -> EntityKind {
                match self {
                    $( Payload::$variant(_) => EntityKind::$variant, )+
                }
            }

            pub fn key(&self) -> NaturalKey {
                match self {
                    $( Payload::$variant(e) => e.key(), )+
                }
            }
        }

        $(
            impl From<$variant> for Payload {
                fn from(entity: $variant) -> Self {
                    Payload::$variant(entity)
                }
            }
        )+
    };
}

payload! {
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

/// A constructed-but-unpersisted target object: payload plus references.
#[derive(Debug, Clone)]
pub struct Row {
    pub payload: Payload,
    pub refs: Vec<RefSlot>,
}

impl Row {
    pub fn new(payload: impl Into<Payload>, refs: Vec<RefSlot>) -> Self {
        Self {
            payload: payload.into(),
            refs,
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.payload.kind()
    }

    pub fn key(&self) -> NaturalKey {
        self.payload.key()
    }

    /// First reference filling `field`, if present.
    pub fn reference(&self, field: RefField) -> Option<&Ref> {
        self.refs
            .iter()
            .find(|slot| slot.field == field)
            .map(|slot| &slot.target)
    }

    /// Concrete id filling `field`, if present and resolved.
    pub fn ref_id(&self, field: RefField) -> Option<ObjectId> {
        self.reference(field).and_then(Ref::id)
    }

    /// All reference slots still holding deferred tokens.
    pub fn deferred(&self) -> impl Iterator<Item = &RefSlot> {
        self.refs
            .iter()
            .filter(|slot| matches!(slot.target, Ref::Deferred(_)))
    }
}
