// sotsync-core: reconciliation engine converging a network inventory onto
// its source of record.

pub mod collect;
pub mod diff;
pub mod dns;
pub mod engine;
pub mod error;
pub mod graph;
pub mod identity;
pub mod model;
pub mod options;
pub mod reconcile;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use collect::{Collector, Snapshot, SnapshotCollector};
pub use diff::{KindChanges, SyncDiff, TypeDiff, UpdatePlan, diff};
pub use dns::{DnsResolver, StaticDns, SystemDns};
pub use engine::{Action, Diagnostic, Engine, KindCounts, RunReport};
pub use error::{CollectError, DnsError, StoreError, SyncError};
pub use graph::{EntitySet, Graph};
pub use identity::{Identity, IdentityMap, ObjectId, Ref};
pub use options::{HostnameRule, SyncOptions};
pub use store::{MemoryStore, Payload, RefField, RefSlot, Row, TargetStore, governed_refs};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    // Identity primitives
    CREATE_ORDER, DELETE_ORDER, CustomField, EntityKind, NaturalKey, SyncModel, VlanMembership,
    // DCIM
    Building, Cluster, Connection, Device, Hardware, PatchPanel, PatchPanelPort, Port, PortMode,
    Rack, Room, TerminationKind, Vendor,
    // IPAM
    IpAddress, Subnet, Vlan, Vrf,
    // Circuits
    Circuit, Provider,
};
