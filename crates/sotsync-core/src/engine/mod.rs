// ── Apply engine ──
//
// Walks a diff in dependency order against the target store: creates are
// buffered and batch-committed per kind, updates land immediately with only
// their changed attributes, deletes queue up and flush leaf-first at the
// end. All run-scoped state (identity map, queues, report) is created empty
// here and discarded when the run ends.

pub mod report;
mod rows;

pub use report::{Action, Diagnostic, KindCounts, RunReport};

use crate::diff::{self, SyncDiff, TypeDiff};
use crate::dns::DnsResolver;
use crate::error::{StoreError, SyncError};
use crate::graph::Graph;
use crate::identity::{Identity, IdentityMap, ObjectId, Ref};
use crate::model::{
    Building, Circuit, Cluster, Connection, DELETE_ORDER, Device, EntityKind, Hardware, IpAddress,
    NaturalKey, PatchPanel, PatchPanelPort, Port, Provider, Rack, Room, Subnet, SyncModel, Vendor,
    Vlan, Vrf,
};
use crate::options::SyncOptions;
use crate::reconcile::primary_ip;
use crate::store::{RefField, RefSlot, Row, TargetStore};
use self::rows::{BuildRow, ResolveCx, designated_master};

/// State owned by one run: the identity map, the deletion and master-patch
/// queues, and the report under construction.
struct RunState {
    identities: IdentityMap,
    deletions: Vec<(EntityKind, NaturalKey)>,
    master_patches: Vec<(NaturalKey, String)>,
    report: RunReport,
}

impl RunState {
    fn new() -> Self {
        Self {
            identities: IdentityMap::default(),
            deletions: Vec::new(),
            master_patches: Vec::new(),
            report: RunReport::new(false),
        }
    }
}

fn fatal_store(err: StoreError) -> SyncError {
    SyncError::StoreUnavailable(err.to_string())
}

/// One reconciliation run over a source and target graph.
pub struct Engine<'a, S: TargetStore, D: DnsResolver> {
    source: &'a Graph,
    target: &'a Graph,
    store: &'a mut S,
    dns: &'a D,
    options: &'a SyncOptions,
}

impl<'a, S: TargetStore, D: DnsResolver> Engine<'a, S, D> {
    pub fn new(
        source: &'a Graph,
        target: &'a Graph,
        store: &'a mut S,
        dns: &'a D,
        options: &'a SyncOptions,
    ) -> Self {
        Self {
            source,
            target,
            store,
            dns,
            options,
        }
    }

    /// Diff the graphs and apply the result.
    pub fn run(&mut self) -> Result<RunReport, SyncError> {
        let diff = diff::diff(self.source, self.target);
        self.apply(&diff)
    }

    /// Apply a previously computed diff. Only store-connectivity loss
    /// aborts; every entity-level failure skips that entity and is
    /// recorded in the report.
    pub fn apply(&mut self, diff: &SyncDiff) -> Result<RunReport, SyncError> {
        if self.options.dry_run {
            tracing::info!("dry run, reporting planned changes only");
            return Ok(RunReport::planned(diff));
        }

        let mut st = RunState::new();

        self.process::<Building>(&diff.buildings, &mut st)?;
        self.process::<Room>(&diff.rooms, &mut st)?;
        self.process::<Rack>(&diff.racks, &mut st)?;
        self.process::<Vendor>(&diff.vendors, &mut st)?;
        self.process::<Hardware>(&diff.hardware, &mut st)?;
        self.process::<Vrf>(&diff.vrfs, &mut st)?;
        self.process::<Subnet>(&diff.subnets, &mut st)?;
        self.process::<Vlan>(&diff.vlans, &mut st)?;
        self.process::<Cluster>(&diff.clusters, &mut st)?;
        self.queue_master_patches(diff, &mut st);
        self.process::<Device>(&diff.devices, &mut st)?;
        self.flush_master_patches(&mut st)?;
        self.process::<Port>(&diff.ports, &mut st)?;
        self.process::<PatchPanel>(&diff.patch_panels, &mut st)?;
        self.process::<PatchPanelPort>(&diff.patch_panel_ports, &mut st)?;
        self.process::<IpAddress>(&diff.ip_addresses, &mut st)?;
        self.process::<Provider>(&diff.providers, &mut st)?;
        self.process::<Circuit>(&diff.circuits, &mut st)?;
        self.process::<Connection>(&diff.connections, &mut st)?;

        if self.options.use_dns {
            self.primary_addresses(&mut st)?;
        }

        if self.options.delete_on_sync {
            self.flush_deletions(&mut st)?;
        } else if !st.deletions.is_empty() {
            tracing::info!(
                queued = st.deletions.len(),
                "deletions queued but delete_on_sync is off"
            );
        }

        st.report.finish();
        Ok(st.report)
    }

    /// Creates (buffered, then batch-committed), updates (immediate), and
    /// deletes (queued) for one kind.
    fn process<T: BuildRow>(&mut self, td: &TypeDiff<T>, st: &mut RunState) -> Result<(), SyncError> {
        let kind = T::KIND;

        let mut rows = Vec::with_capacity(td.create.len());
        for entity in &td.create {
            let key = entity.key();
            st.identities.bind_pending(kind, key.clone())?;
            let mut cx = ResolveCx {
                identities: &mut st.identities,
                store: &*self.store,
                source: self.source,
            };
            match entity.build(&mut cx) {
                Ok(row) => rows.push(row),
                Err(err @ SyncError::StoreUnavailable(_)) => return Err(err),
                Err(err) => {
                    st.identities.forget_pending(kind, &key);
                    st.report.skipped(kind, &key, Action::Create, &err);
                }
            }
        }
        if !rows.is_empty() {
            tracing::debug!(%kind, count = rows.len(), "committing create batch");
            let outcomes = self.store.batch_create(kind, rows).map_err(fatal_store)?;
            for (key, result) in outcomes {
                match result {
                    Ok(id) => {
                        st.identities.commit(kind, key, id)?;
                        st.report.created(kind);
                    }
                    Err(err) => {
                        st.identities.forget_pending(kind, &key);
                        st.report.skipped(
                            kind,
                            &key,
                            Action::Create,
                            &SyncError::Validation {
                                kind,
                                key: key.clone(),
                                reason: err.to_string(),
                            },
                        );
                    }
                }
            }
        }

        for plan in &td.update {
            let key = plan.desired.key();
            let Some(id) = self.existing_id(&mut st.identities, kind, &key)? else {
                st.report.skipped(
                    kind,
                    &key,
                    Action::Update,
                    &SyncError::NotFound {
                        kind,
                        key: key.clone(),
                    },
                );
                continue;
            };
            let mut cx = ResolveCx {
                identities: &mut st.identities,
                store: &*self.store,
                source: self.source,
            };
            let row = match plan.desired.build(&mut cx) {
                Ok(row) => row,
                Err(err @ SyncError::StoreUnavailable(_)) => return Err(err),
                Err(err) => {
                    st.report.skipped(kind, &key, Action::Update, &err);
                    continue;
                }
            };
            match self.store.update(kind, id, row, &plan.fields) {
                Ok(()) => st.report.updated(kind),
                Err(StoreError::Unavailable(reason)) => {
                    return Err(SyncError::StoreUnavailable(reason));
                }
                Err(err) => st.report.skipped(
                    kind,
                    &key,
                    Action::Update,
                    &SyncError::Validation {
                        kind,
                        key: key.clone(),
                        reason: err.to_string(),
                    },
                ),
            }
        }

        for key in &td.delete {
            st.deletions.push((kind, key.clone()));
        }
        Ok(())
    }

    /// Committed id for a key: identity map first, then the store.
    fn existing_id(
        &self,
        identities: &mut IdentityMap,
        kind: EntityKind,
        key: &NaturalKey,
    ) -> Result<Option<ObjectId>, SyncError> {
        if let Some(Identity::Committed(id)) = identities.get(kind, key) {
            return Ok(Some(id));
        }
        match self.store.find(kind, key) {
            Ok(Some(id)) => {
                identities.commit(kind, key.clone(), id)?;
                Ok(Some(id))
            }
            Ok(None) => Ok(None),
            Err(StoreError::Unavailable(reason)) => Err(SyncError::StoreUnavailable(reason)),
            Err(err) => Err(SyncError::Validation {
                kind,
                key: key.clone(),
                reason: err.to_string(),
            }),
        }
    }

    /// A cluster's master is the member flagged as master in the source,
    /// else the first member. The patch itself waits until devices commit.
    fn queue_master_patches(&self, diff: &SyncDiff, st: &mut RunState) {
        let changed = diff
            .clusters
            .create
            .iter()
            .chain(diff.clusters.update.iter().map(|plan| &plan.desired));
        for cluster in changed {
            if let Some(master) = designated_master(self.source, cluster) {
                st.master_patches.push((cluster.key(), master.clone()));
            }
        }
    }

    fn flush_master_patches(&mut self, st: &mut RunState) -> Result<(), SyncError> {
        let patches = std::mem::take(&mut st.master_patches);
        let source = self.source;
        for (cluster_key, master_name) in patches {
            let device_key = NaturalKey::single(&master_name);
            let cluster_id =
                self.existing_id(&mut st.identities, EntityKind::Cluster, &cluster_key)?;
            let device_id = self.existing_id(&mut st.identities, EntityKind::Device, &device_key)?;
            let (Some(cluster_id), Some(device_id)) = (cluster_id, device_id) else {
                st.report.skipped(
                    EntityKind::Cluster,
                    &cluster_key,
                    Action::Update,
                    &SyncError::UnresolvedReference {
                        kind: EntityKind::Cluster,
                        key: cluster_key.clone(),
                        ref_kind: EntityKind::Device,
                        ref_key: device_key,
                    },
                );
                continue;
            };
            let Some(cluster) = source.get::<Cluster>(&cluster_key) else {
                continue;
            };
            let row = Row::new(
                cluster.clone(),
                vec![RefSlot::new(RefField::Master, Ref::Id(device_id))],
            );
            match self.store.update(EntityKind::Cluster, cluster_id, row, &["master"]) {
                Ok(()) => {
                    tracing::debug!(cluster = %cluster_key, master = %master_name, "master patched");
                }
                Err(StoreError::Unavailable(reason)) => {
                    return Err(SyncError::StoreUnavailable(reason));
                }
                Err(err) => st.report.skipped(
                    EntityKind::Cluster,
                    &cluster_key,
                    Action::Update,
                    &SyncError::Validation {
                        kind: EntityKind::Cluster,
                        key: cluster_key.clone(),
                        reason: err.to_string(),
                    },
                ),
            }
        }
        Ok(())
    }

    /// Resolve each eligible device's name through DNS and converge its
    /// primary address: flag it where already assigned, reassign it to the
    /// management port where it lives elsewhere, create it where absent.
    fn primary_addresses(&mut self, st: &mut RunState) -> Result<(), SyncError> {
        let source = self.source;
        let target = self.target;
        for device in source.all::<Device>() {
            let device_key = device.key();
            if !primary_ip::eligible(&device.name) {
                continue;
            }
            let Some(host) = primary_ip::hostname(&device.name) else {
                continue;
            };
            let addr = match self.dns.resolve(host) {
                Ok(addr) => addr,
                Err(err) => {
                    st.report.skipped(
                        EntityKind::Device,
                        &device_key,
                        Action::PrimaryAddress,
                        &SyncError::Dns {
                            host: host.to_string(),
                            source: err,
                        },
                    );
                    continue;
                }
            };
            // Only devices that actually landed in the store get a primary.
            if self
                .existing_id(&mut st.identities, EntityKind::Device, &device_key)?
                .is_none()
            {
                continue;
            }

            let existing = primary_ip::find_existing(source, addr)
                .or_else(|| primary_ip::find_existing(target, addr))
                .cloned();
            match existing {
                Some(ip) if ip.device.as_deref() == Some(device.name.as_str()) => {
                    if ip.primary {
                        continue;
                    }
                    let mut desired = ip;
                    desired.primary = true;
                    self.write_ip(st, desired, &["primary"])?;
                }
                Some(ip) => {
                    let Some(interface) = self.ensure_mgmt_port(st, device)? else {
                        continue;
                    };
                    let mut desired = ip;
                    desired.device = Some(device.name.clone());
                    desired.interface = Some(interface);
                    desired.primary = true;
                    self.write_ip(st, desired, &["device", "interface", "primary"])?;
                }
                None => {
                    let Some(interface) = self.ensure_mgmt_port(st, device)? else {
                        continue;
                    };
                    let prefix = primary_ip::prefix_for(addr, &[source, target]);
                    let desired = IpAddress {
                        address: format!("{addr}/{prefix}"),
                        device: Some(device.name.clone()),
                        interface: Some(interface),
                        primary: true,
                        ..IpAddress::default()
                    };
                    self.create_one(st, desired, Action::PrimaryAddress)?;
                }
            }
        }
        Ok(())
    }

    /// The device's management port name, creating a `Management` port when
    /// no probe name matches.
    fn ensure_mgmt_port(
        &mut self,
        st: &mut RunState,
        device: &Device,
    ) -> Result<Option<String>, SyncError> {
        if let Some(port) = primary_ip::mgmt_port(self.source, &device.name)
            .or_else(|| primary_ip::mgmt_port(self.target, &device.name))
        {
            return Ok(Some(port.name.clone()));
        }
        let port = Port {
            device: device.name.clone(),
            name: primary_ip::MGMT_PORT_NAME.into(),
            enabled: true,
            port_type: "other".into(),
            ..Port::default()
        };
        Ok(self
            .create_one(st, port, Action::PrimaryAddress)?
            .map(|_| primary_ip::MGMT_PORT_NAME.to_string()))
    }

    fn write_ip(
        &mut self,
        st: &mut RunState,
        desired: IpAddress,
        fields: &[&'static str],
    ) -> Result<(), SyncError> {
        let key = desired.key();
        let Some(id) = self.existing_id(&mut st.identities, EntityKind::IpAddress, &key)? else {
            st.report.skipped(
                EntityKind::IpAddress,
                &key,
                Action::PrimaryAddress,
                &SyncError::NotFound {
                    kind: EntityKind::IpAddress,
                    key: key.clone(),
                },
            );
            return Ok(());
        };
        let mut cx = ResolveCx {
            identities: &mut st.identities,
            store: &*self.store,
            source: self.source,
        };
        let row = match desired.build(&mut cx) {
            Ok(row) => row,
            Err(err @ SyncError::StoreUnavailable(_)) => return Err(err),
            Err(err) => {
                st.report
                    .skipped(EntityKind::IpAddress, &key, Action::PrimaryAddress, &err);
                return Ok(());
            }
        };
        match self.store.update(EntityKind::IpAddress, id, row, fields) {
            Ok(()) => st.report.updated(EntityKind::IpAddress),
            Err(StoreError::Unavailable(reason)) => {
                return Err(SyncError::StoreUnavailable(reason));
            }
            Err(err) => st.report.skipped(
                EntityKind::IpAddress,
                &key,
                Action::PrimaryAddress,
                &SyncError::Validation {
                    kind: EntityKind::IpAddress,
                    key: key.clone(),
                    reason: err.to_string(),
                },
            ),
        }
        Ok(())
    }

    /// Out-of-band single create used by the primary-address step.
    fn create_one<T: BuildRow>(
        &mut self,
        st: &mut RunState,
        entity: T,
        action: Action,
    ) -> Result<Option<ObjectId>, SyncError> {
        let kind = T::KIND;
        let key = entity.key();
        if let Some(id) = self.existing_id(&mut st.identities, kind, &key)? {
            return Ok(Some(id));
        }
        st.identities.bind_pending(kind, key.clone())?;
        let mut cx = ResolveCx {
            identities: &mut st.identities,
            store: &*self.store,
            source: self.source,
        };
        let row = match entity.build(&mut cx) {
            Ok(row) => row,
            Err(err @ SyncError::StoreUnavailable(_)) => return Err(err),
            Err(err) => {
                st.identities.forget_pending(kind, &key);
                st.report.skipped(kind, &key, action, &err);
                return Ok(None);
            }
        };
        let outcomes = self
            .store
            .batch_create(kind, vec![row])
            .map_err(fatal_store)?;
        match outcomes.into_iter().next() {
            Some((key, Ok(id))) => {
                st.identities.commit(kind, key, id)?;
                st.report.created(kind);
                Ok(Some(id))
            }
            Some((key, Err(err))) => {
                st.identities.forget_pending(kind, &key);
                st.report.skipped(
                    kind,
                    &key,
                    action,
                    &SyncError::Validation {
                        kind,
                        key: key.clone(),
                        reason: err.to_string(),
                    },
                );
                Ok(None)
            }
            None => Ok(None),
        }
    }

    /// A cluster and its member devices reference each other: devices hold
    /// a cluster slot, the cluster holds a master slot. When both sides are
    /// queued for deletion, each delete would see the other and fail
    /// `Protected`, so the cycle is broken up front. The counterpart of the
    /// create-side master patch, run in reverse.
    fn unlink_cluster_refs(&mut self, queued: &[(EntityKind, NaturalKey)]) -> Result<(), SyncError> {
        for (kind, key) in queued {
            let field = match kind {
                EntityKind::Cluster => RefField::Master,
                EntityKind::Device => RefField::Cluster,
                _ => continue,
            };
            let id = match self.store.find(*kind, key) {
                Ok(Some(id)) => id,
                Ok(None) => continue,
                Err(StoreError::Unavailable(reason)) => {
                    return Err(SyncError::StoreUnavailable(reason));
                }
                Err(err) => {
                    tracing::warn!(%kind, %key, error = %err, "lookup failed during unlink");
                    continue;
                }
            };
            match self.store.clear_reference(*kind, id, field) {
                Ok(()) => {}
                Err(StoreError::Unavailable(reason)) => {
                    return Err(SyncError::StoreUnavailable(reason));
                }
                Err(err) => {
                    tracing::warn!(%kind, %key, error = %err, "reference unlink failed");
                }
            }
        }
        Ok(())
    }

    /// Flush the deletion queue leaf-first. A `Protected` delete is logged
    /// and dropped from the queue.
    fn flush_deletions(&mut self, st: &mut RunState) -> Result<(), SyncError> {
        let queued = std::mem::take(&mut st.deletions);
        self.unlink_cluster_refs(&queued)?;
        for kind in DELETE_ORDER {
            for (_, key) in queued.iter().filter(|(queued_kind, _)| *queued_kind == kind) {
                match self.store.find(kind, key) {
                    Ok(Some(id)) => match self.store.delete(kind, id) {
                        Ok(()) => st.report.deleted(kind),
                        Err(StoreError::Protected) => st.report.skipped(
                            kind,
                            key,
                            Action::Delete,
                            &SyncError::Protected {
                                kind,
                                key: key.clone(),
                            },
                        ),
                        Err(StoreError::Unavailable(reason)) => {
                            return Err(SyncError::StoreUnavailable(reason));
                        }
                        Err(err) => st.report.skipped(
                            kind,
                            key,
                            Action::Delete,
                            &SyncError::Validation {
                                kind,
                                key: key.clone(),
                                reason: err.to_string(),
                            },
                        ),
                    },
                    Ok(None) => {}
                    Err(StoreError::Unavailable(reason)) => {
                        return Err(SyncError::StoreUnavailable(reason));
                    }
                    Err(err) => {
                        tracing::warn!(%kind, %key, error = %err, "lookup failed during delete");
                    }
                }
            }
        }
        Ok(())
    }
}
