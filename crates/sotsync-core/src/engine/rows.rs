// ── Row construction ──
//
// Turns a desired entity into a store row: the payload plus every named
// reference, resolved through the identity map with a store-lookup
// fallback. A reference that resolves nowhere fails the whole row; the
// engine skips that entity and keeps going.

use crate::error::{StoreError, SyncError};
use crate::graph::Graph;
use crate::identity::{IdentityMap, Ref};
use crate::model::{
    Building, Circuit, Cluster, Connection, Device, EntityKind, Hardware, IpAddress, NaturalKey,
    PatchPanel, PatchPanelPort, Port, Provider, Rack, Room, Subnet, SyncModel, TerminationKind,
    Vendor, Vlan, Vrf,
};
use crate::reconcile::{membership, position};
use crate::store::{RefField, RefSlot, Row, TargetStore};

/// Resolution context for one row: the identity map, the store for
/// prior-run lookups, and the source graph for scope decisions.
pub(crate) struct ResolveCx<'a, S: TargetStore> {
    pub identities: &'a mut IdentityMap,
    pub store: &'a S,
    pub source: &'a Graph,
}

impl<S: TargetStore> ResolveCx<'_, S> {
    /// Identity-map hit first, then a store lookup recorded back into the
    /// map, then `UnresolvedReference`.
    pub(crate) fn resolve(
        &mut self,
        at: (EntityKind, &NaturalKey),
        ref_kind: EntityKind,
        ref_key: &NaturalKey,
    ) -> Result<Ref, SyncError> {
        if let Some(reference) = self.identities.resolve(ref_kind, ref_key) {
            return Ok(reference);
        }
        match self.store.find(ref_kind, ref_key) {
            Ok(Some(id)) => {
                self.identities.commit(ref_kind, ref_key.clone(), id)?;
                Ok(Ref::Id(id))
            }
            Ok(None) => Err(SyncError::UnresolvedReference {
                kind: at.0,
                key: at.1.clone(),
                ref_kind,
                ref_key: ref_key.clone(),
            }),
            Err(StoreError::Unavailable(reason)) => Err(SyncError::StoreUnavailable(reason)),
            Err(err) => Err(SyncError::Validation {
                kind: at.0,
                key: at.1.clone(),
                reason: err.to_string(),
            }),
        }
    }

    /// VLAN lookup: the building scope first when one is known, then the
    /// global scope.
    fn vlan_ref(
        &mut self,
        at: (EntityKind, &NaturalKey),
        name: &str,
        vid: u16,
        building: Option<&str>,
    ) -> Result<Ref, SyncError> {
        if let Some(site) = building {
            match self.resolve(at, EntityKind::Vlan, &Vlan::scoped_key(name, vid, Some(site))) {
                Err(SyncError::UnresolvedReference { .. }) => {}
                other => return other,
            }
        }
        self.resolve(at, EntityKind::Vlan, &Vlan::scoped_key(name, vid, None))
    }
}

/// The member a cluster's master reference points at: the member flagged
/// as master in the source, else the first member.
pub(crate) fn designated_master<'a>(source: &Graph, cluster: &'a Cluster) -> Option<&'a String> {
    cluster
        .members
        .iter()
        .find(|member| {
            source
                .get::<Device>(&NaturalKey::single(member.as_str()))
                .is_some_and(|device| device.master_device)
        })
        .or_else(|| cluster.members.first())
}

/// Implemented per entity type: construct the store row for a desired
/// entity, resolving its references.
pub(crate) trait BuildRow: SyncModel + Into<crate::store::Payload> {
    fn build<S: TargetStore>(&self, cx: &mut ResolveCx<'_, S>) -> Result<Row, SyncError>;
}

impl BuildRow for Building {
    fn build<S: TargetStore>(&self, _cx: &mut ResolveCx<'_, S>) -> Result<Row, SyncError> {
        Ok(Row::new(self.clone(), Vec::new()))
    }
}

impl BuildRow for Room {
    fn build<S: TargetStore>(&self, cx: &mut ResolveCx<'_, S>) -> Result<Row, SyncError> {
        let key = self.key();
        let building = cx.resolve(
            (Self::KIND, &key),
            EntityKind::Building,
            &NaturalKey::single(&self.building),
        )?;
        Ok(Row::new(
            self.clone(),
            vec![RefSlot::new(RefField::Building, building)],
        ))
    }
}

impl BuildRow for Rack {
    fn build<S: TargetStore>(&self, cx: &mut ResolveCx<'_, S>) -> Result<Row, SyncError> {
        let key = self.key();
        let at = (Self::KIND, &key);
        let building = cx.resolve(at, EntityKind::Building, &NaturalKey::single(&self.building))?;
        let room = cx.resolve(
            at,
            EntityKind::Room,
            &NaturalKey::new([&self.room, &self.building]),
        )?;
        Ok(Row::new(
            self.clone(),
            vec![
                RefSlot::new(RefField::Building, building),
                RefSlot::new(RefField::Room, room),
            ],
        ))
    }
}

impl BuildRow for Vendor {
    fn build<S: TargetStore>(&self, _cx: &mut ResolveCx<'_, S>) -> Result<Row, SyncError> {
        Ok(Row::new(self.clone(), Vec::new()))
    }
}

impl BuildRow for Hardware {
    fn build<S: TargetStore>(&self, cx: &mut ResolveCx<'_, S>) -> Result<Row, SyncError> {
        let key = self.key();
        let vendor = cx.resolve(
            (Self::KIND, &key),
            EntityKind::Vendor,
            &NaturalKey::single(&self.manufacturer),
        )?;
        Ok(Row::new(
            self.clone(),
            vec![RefSlot::new(RefField::Vendor, vendor)],
        ))
    }
}

impl BuildRow for Cluster {
    // The master reference is patched in after device commit.
    fn build<S: TargetStore>(&self, _cx: &mut ResolveCx<'_, S>) -> Result<Row, SyncError> {
        Ok(Row::new(self.clone(), Vec::new()))
    }
}

impl BuildRow for Device {
    fn build<S: TargetStore>(&self, cx: &mut ResolveCx<'_, S>) -> Result<Row, SyncError> {
        let key = self.key();
        let at = (Self::KIND, &key);
        let mut device = self.clone();
        let mut refs = Vec::new();

        if let Some(building) = &device.building {
            let reference = cx.resolve(at, EntityKind::Building, &NaturalKey::single(building))?;
            refs.push(RefSlot::new(RefField::Building, reference));
        }
        if let (Some(rack), Some(building), Some(room)) =
            (&device.rack, &device.building, &device.room)
        {
            let reference = cx.resolve(
                at,
                EntityKind::Rack,
                &NaturalKey::new([rack, building, room]),
            )?;
            refs.push(RefSlot::new(RefField::Rack, reference));
        }
        let hardware = cx.resolve(at, EntityKind::Hardware, &NaturalKey::single(&device.hardware))?;
        refs.push(RefSlot::new(RefField::Hardware, hardware));

        if let Some(cluster_name) = device.cluster_host.clone() {
            let cluster_key = NaturalKey::single(&cluster_name);
            let reference = cx.resolve(at, EntityKind::Cluster, &cluster_key)?;
            refs.push(RefSlot::new(RefField::Cluster, reference));
            // Stack slot is derived from the member name; the master always
            // takes slot 1, whether flagged or designated as first member.
            if let Some(cluster) = cx.source.get::<Cluster>(&cluster_key) {
                let is_master = device.master_device
                    || designated_master(cx.source, cluster)
                        .is_some_and(|master| *master == device.name);
                device.vc_position = Some(if is_master {
                    1
                } else {
                    position::slot(&device.name, &cluster.members)
                });
            }
        }

        Ok(Row::new(device, refs))
    }
}

impl BuildRow for Port {
    fn build<S: TargetStore>(&self, cx: &mut ResolveCx<'_, S>) -> Result<Row, SyncError> {
        let key = self.key();
        let at = (Self::KIND, &key);
        let device = cx.resolve(at, EntityKind::Device, &NaturalKey::single(&self.device))?;
        let mut refs = vec![RefSlot::new(RefField::Device, device)];

        let building = cx
            .source
            .get::<Device>(&NaturalKey::single(&self.device))
            .and_then(|d| d.building.clone());
        match membership::assignment(self) {
            membership::VlanAssignment::None => {}
            membership::VlanAssignment::Untagged(member) => {
                let vlan = cx.vlan_ref(at, &member.name, member.vid, building.as_deref())?;
                refs.push(RefSlot::new(RefField::UntaggedVlan, vlan));
            }
            membership::VlanAssignment::Tagged(members) => {
                for member in members {
                    let vlan = cx.vlan_ref(at, &member.name, member.vid, building.as_deref())?;
                    refs.push(RefSlot::new(RefField::TaggedVlan, vlan));
                }
            }
        }

        Ok(Row::new(self.clone(), refs))
    }
}

impl BuildRow for Vrf {
    fn build<S: TargetStore>(&self, _cx: &mut ResolveCx<'_, S>) -> Result<Row, SyncError> {
        Ok(Row::new(self.clone(), Vec::new()))
    }
}

impl BuildRow for Subnet {
    fn build<S: TargetStore>(&self, cx: &mut ResolveCx<'_, S>) -> Result<Row, SyncError> {
        let key = self.key();
        let mut refs = Vec::new();
        if let Some(vrf) = &self.vrf {
            let reference =
                cx.resolve((Self::KIND, &key), EntityKind::Vrf, &NaturalKey::single(vrf))?;
            refs.push(RefSlot::new(RefField::Vrf, reference));
        }
        Ok(Row::new(self.clone(), refs))
    }
}

impl BuildRow for IpAddress {
    fn build<S: TargetStore>(&self, cx: &mut ResolveCx<'_, S>) -> Result<Row, SyncError> {
        let key = self.key();
        let at = (Self::KIND, &key);
        let mut refs = Vec::new();
        if let Some(vrf) = &self.vrf {
            let reference = cx.resolve(at, EntityKind::Vrf, &NaturalKey::single(vrf))?;
            refs.push(RefSlot::new(RefField::Vrf, reference));
        }
        if let Some(device) = &self.device {
            let reference = cx.resolve(at, EntityKind::Device, &NaturalKey::single(device))?;
            refs.push(RefSlot::new(RefField::Device, reference));
            if let Some(interface) = &self.interface {
                let reference =
                    cx.resolve(at, EntityKind::Port, &NaturalKey::new([device, interface]))?;
                refs.push(RefSlot::new(RefField::Interface, reference));
            }
        }
        Ok(Row::new(self.clone(), refs))
    }
}

impl BuildRow for Vlan {
    fn build<S: TargetStore>(&self, cx: &mut ResolveCx<'_, S>) -> Result<Row, SyncError> {
        let key = self.key();
        let mut refs = Vec::new();
        if let Some(building) = &self.building {
            let reference = cx.resolve(
                (Self::KIND, &key),
                EntityKind::Building,
                &NaturalKey::single(building),
            )?;
            refs.push(RefSlot::new(RefField::Building, reference));
        }
        Ok(Row::new(self.clone(), refs))
    }
}

impl BuildRow for Connection {
    fn build<S: TargetStore>(&self, cx: &mut ResolveCx<'_, S>) -> Result<Row, SyncError> {
        let key = self.key();
        let at = (Self::KIND, &key);
        let mut refs = Vec::new();

        let ends = [
            (
                self.src_type,
                &self.src_device,
                &self.src_port,
                RefField::SrcPort,
                RefField::SrcCircuit,
            ),
            (
                self.dst_type,
                &self.dst_device,
                &self.dst_port,
                RefField::DstPort,
                RefField::DstCircuit,
            ),
        ];
        for (termination, device, port, port_field, circuit_field) in ends {
            match termination {
                TerminationKind::Interface => {
                    let reference =
                        cx.resolve(at, EntityKind::Port, &NaturalKey::new([device, port]))?;
                    refs.push(RefSlot::new(port_field, reference));
                }
                TerminationKind::PatchPanel => {
                    let reference = cx.resolve(
                        at,
                        EntityKind::PatchPanelPort,
                        &NaturalKey::new([device, port]),
                    )?;
                    refs.push(RefSlot::new(port_field, reference));
                }
                TerminationKind::Circuit => {
                    let reference =
                        cx.resolve(at, EntityKind::Circuit, &NaturalKey::single(device))?;
                    refs.push(RefSlot::new(circuit_field, reference));
                }
            }
        }

        Ok(Row::new(self.clone(), refs))
    }
}

impl BuildRow for Provider {
    fn build<S: TargetStore>(&self, _cx: &mut ResolveCx<'_, S>) -> Result<Row, SyncError> {
        Ok(Row::new(self.clone(), Vec::new()))
    }
}

impl BuildRow for Circuit {
    fn build<S: TargetStore>(&self, cx: &mut ResolveCx<'_, S>) -> Result<Row, SyncError> {
        let key = self.key();
        let at = (Self::KIND, &key);
        let provider = cx.resolve(at, EntityKind::Provider, &NaturalKey::single(&self.provider))?;
        let mut refs = vec![RefSlot::new(RefField::Provider, provider)];

        if let (Some(device), Some(interface)) = (&self.origin_dev, &self.origin_int) {
            let reference =
                cx.resolve(at, EntityKind::Port, &NaturalKey::new([device, interface]))?;
            refs.push(RefSlot::new(RefField::SrcPort, reference));
        }
        if let (Some(device), Some(interface)) = (&self.endpoint_dev, &self.endpoint_int) {
            let reference =
                cx.resolve(at, EntityKind::Port, &NaturalKey::new([device, interface]))?;
            refs.push(RefSlot::new(RefField::DstPort, reference));
        }
        Ok(Row::new(self.clone(), refs))
    }
}

impl BuildRow for PatchPanel {
    fn build<S: TargetStore>(&self, cx: &mut ResolveCx<'_, S>) -> Result<Row, SyncError> {
        let key = self.key();
        let at = (Self::KIND, &key);
        let mut refs = Vec::new();
        if let Some(vendor) = &self.vendor {
            let reference = cx.resolve(at, EntityKind::Vendor, &NaturalKey::single(vendor))?;
            refs.push(RefSlot::new(RefField::Vendor, reference));
        }
        if let Some(building) = &self.building {
            let reference = cx.resolve(at, EntityKind::Building, &NaturalKey::single(building))?;
            refs.push(RefSlot::new(RefField::Building, reference));
            if let (Some(rack), Some(room)) = (&self.rack, &self.room) {
                let reference =
                    cx.resolve(at, EntityKind::Rack, &NaturalKey::new([rack, building, room]))?;
                refs.push(RefSlot::new(RefField::Rack, reference));
            }
        }
        Ok(Row::new(self.clone(), refs))
    }
}

impl BuildRow for PatchPanelPort {
    fn build<S: TargetStore>(&self, cx: &mut ResolveCx<'_, S>) -> Result<Row, SyncError> {
        let key = self.key();
        let panel = cx.resolve(
            (Self::KIND, &key),
            EntityKind::PatchPanel,
            &NaturalKey::single(&self.panel),
        )?;
        Ok(Row::new(
            self.clone(),
            vec![RefSlot::new(RefField::Panel, panel)],
        ))
    }
}
