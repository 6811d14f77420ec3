//! End-to-end reconciliation runs against the in-memory store.

use sotsync_core::{
    Building, CREATE_ORDER, Cluster, Device, Engine, EntityKind, Graph, Hardware, IpAddress,
    MemoryStore, NaturalKey, Payload, Port, PortMode, Rack, Ref, RefField, Room, StaticDns, Subnet,
    SyncError, SyncOptions, Vendor, Vlan, VlanMembership, diff,
};

fn building(name: &str) -> Building {
    Building {
        name: name.into(),
        ..Building::default()
    }
}

fn room(name: &str, building: &str) -> Room {
    Room {
        name: name.into(),
        building: building.into(),
        ..Room::default()
    }
}

fn rack(name: &str, building: &str, room: &str) -> Rack {
    Rack {
        name: name.into(),
        building: building.into(),
        room: room.into(),
        height: 42,
        ..Rack::default()
    }
}

fn hardware_pair(graph: &mut Graph) {
    graph
        .insert(Vendor {
            name: "Juniper".into(),
            ..Vendor::default()
        })
        .unwrap();
    graph
        .insert(Hardware {
            name: "EX4300".into(),
            manufacturer: "Juniper".into(),
            ..Hardware::default()
        })
        .unwrap();
}

fn device(name: &str) -> Device {
    Device {
        name: name.into(),
        hardware: "EX4300".into(),
        in_service: true,
        ..Device::default()
    }
}

fn port(device: &str, name: &str) -> Port {
    Port {
        device: device.into(),
        name: name.into(),
        enabled: true,
        port_type: "1000base-t".into(),
        ..Port::default()
    }
}

/// Populate a store with a graph by applying it onto nothing.
fn seed(store: &mut MemoryStore, graph: &Graph) {
    let empty = Graph::default();
    let options = SyncOptions::default();
    let dns = StaticDns::new();
    let report = Engine::new(graph, &empty, store, &dns, &options)
        .run()
        .unwrap();
    assert_eq!(report.total_skipped(), 0, "seeding must not skip anything");
}

fn run(
    source: &Graph,
    target: &Graph,
    store: &mut MemoryStore,
    dns: &StaticDns,
    options: &SyncOptions,
) -> sotsync_core::RunReport {
    Engine::new(source, target, store, dns, options)
        .run()
        .unwrap()
}

#[test]
fn site_scenario_creates_with_concrete_references() {
    let mut source = Graph::default();
    source.insert(building("DC1")).unwrap();
    source.insert(room("R1", "DC1")).unwrap();
    source.insert(rack("RK1", "DC1", "R1")).unwrap();

    let target = Graph::default();
    let mut store = MemoryStore::new();
    let report = run(
        &source,
        &target,
        &mut store,
        &StaticDns::new(),
        &SyncOptions::default(),
    );

    assert_eq!(report.counts[&EntityKind::Building].created, 1);
    assert_eq!(report.counts[&EntityKind::Room].created, 1);
    assert_eq!(report.counts[&EntityKind::Rack].created, 1);
    assert_eq!(report.total_skipped(), 0);

    let rack_id = store
        .lookup(EntityKind::Rack, &NaturalKey::from(["RK1", "DC1", "R1"]))
        .unwrap();
    let rack_row = store.get(rack_id).unwrap();
    let building_id = store
        .lookup(EntityKind::Building, &NaturalKey::from("DC1"))
        .unwrap();
    assert_eq!(rack_row.ref_id(RefField::Building), Some(building_id));
    assert!(rack_row.ref_id(RefField::Room).is_some());
}

#[test]
fn no_dangling_references_after_apply() {
    let mut source = Graph::default();
    source.insert(building("DC1")).unwrap();
    source.insert(room("R1", "DC1")).unwrap();
    source.insert(rack("RK1", "DC1", "R1")).unwrap();
    hardware_pair(&mut source);
    let mut dev = device("sw1");
    dev.building = Some("DC1".into());
    source.insert(dev).unwrap();
    source.insert(port("sw1", "eth0")).unwrap();

    let mut store = MemoryStore::new();
    seed(&mut store, &source);

    for kind in CREATE_ORDER {
        for (_, row) in store.rows_of(kind) {
            assert_eq!(row.deferred().count(), 0);
            for slot in &row.refs {
                match slot.target {
                    Ref::Id(id) => assert!(store.get(id).is_some()),
                    Ref::Deferred(_) => panic!("deferred reference left in store"),
                }
            }
        }
    }
}

#[test]
fn rerun_converges_to_empty_diff() {
    let mut source = Graph::default();
    source.insert(building("DC1")).unwrap();
    source.insert(room("R1", "DC1")).unwrap();
    hardware_pair(&mut source);
    source.insert(device("sw1")).unwrap();

    let mut store = MemoryStore::new();
    seed(&mut store, &source);

    // Second run with the target re-collected as the source state: no
    // writes at all.
    let recollected = source.clone();
    let report = run(
        &source,
        &recollected,
        &mut store,
        &StaticDns::new(),
        &SyncOptions::default(),
    );
    assert_eq!(report.total_changes(), 0);
    assert!(diff(&source, &recollected).is_empty());
}

#[test]
fn removed_device_and_ports_delete_cleanly() {
    let mut target = Graph::default();
    hardware_pair(&mut target);
    target.insert(device("sw1")).unwrap();
    target.insert(port("sw1", "eth0")).unwrap();
    target.insert(port("sw1", "eth1")).unwrap();

    let mut store = MemoryStore::new();
    seed(&mut store, &target);
    assert_eq!(store.count(EntityKind::Port), 2);

    // Hardware and vendor stay; the device and its ports go.
    let mut source = Graph::default();
    hardware_pair(&mut source);

    let options = SyncOptions {
        delete_on_sync: true,
        ..SyncOptions::default()
    };
    let report = run(&source, &target, &mut store, &StaticDns::new(), &options);

    assert_eq!(report.counts[&EntityKind::Port].deleted, 2);
    assert_eq!(report.counts[&EntityKind::Device].deleted, 1);
    assert_eq!(report.total_skipped(), 0, "no delete may be blocked");
    assert_eq!(store.count(EntityKind::Device), 0);
    assert_eq!(store.count(EntityKind::Port), 0);
}

#[test]
fn cluster_and_members_delete_cleanly() {
    let mut target = Graph::default();
    hardware_pair(&mut target);
    target
        .insert(Cluster {
            name: "C1".into(),
            members: vec!["C1 - Switch 1".into(), "C1 - Switch 2".into()],
            ..Cluster::default()
        })
        .unwrap();
    let mut master = device("C1 - Switch 1");
    master.cluster_host = Some("C1".into());
    master.master_device = true;
    target.insert(master).unwrap();
    let mut member = device("C1 - Switch 2");
    member.cluster_host = Some("C1".into());
    target.insert(member).unwrap();

    let mut store = MemoryStore::new();
    seed(&mut store, &target);

    // The whole stack disappears from the source; the cluster row holds a
    // master reference and the member rows hold cluster references, and
    // neither direction may block the other's delete.
    let mut source = Graph::default();
    hardware_pair(&mut source);

    let options = SyncOptions {
        delete_on_sync: true,
        ..SyncOptions::default()
    };
    let report = run(&source, &target, &mut store, &StaticDns::new(), &options);

    assert_eq!(report.counts[&EntityKind::Cluster].deleted, 1);
    assert_eq!(report.counts[&EntityKind::Device].deleted, 2);
    assert_eq!(report.total_skipped(), 0, "no delete may be blocked");
    assert_eq!(store.count(EntityKind::Cluster), 0);
    assert_eq!(store.count(EntityKind::Device), 0);
}

#[test]
fn deletions_stay_queued_without_delete_on_sync() {
    let mut target = Graph::default();
    target.insert(building("DC1")).unwrap();

    let mut store = MemoryStore::new();
    seed(&mut store, &target);

    let source = Graph::default();
    let report = run(
        &source,
        &target,
        &mut store,
        &StaticDns::new(),
        &SyncOptions::default(),
    );
    assert_eq!(report.total_changes(), 0);
    assert_eq!(store.count(EntityKind::Building), 1);
}

#[test]
fn cluster_master_is_patched_and_positions_assigned() {
    let mut source = Graph::default();
    hardware_pair(&mut source);
    source
        .insert(Cluster {
            name: "C1".into(),
            members: vec!["C1 - Switch 1".into(), "C1 - Switch 2".into()],
            ..Cluster::default()
        })
        .unwrap();
    let mut master = device("C1 - Switch 1");
    master.cluster_host = Some("C1".into());
    master.master_device = true;
    source.insert(master).unwrap();
    let mut member = device("C1 - Switch 2");
    member.cluster_host = Some("C1".into());
    source.insert(member).unwrap();

    let mut store = MemoryStore::new();
    let report = run(
        &source,
        &Graph::default(),
        &mut store,
        &StaticDns::new(),
        &SyncOptions::default(),
    );
    assert_eq!(report.total_skipped(), 0);

    let cluster_id = store
        .lookup(EntityKind::Cluster, &NaturalKey::from("C1"))
        .unwrap();
    let master_id = store
        .lookup(EntityKind::Device, &NaturalKey::from("C1 - Switch 1"))
        .unwrap();
    let cluster_row = store.get(cluster_id).unwrap();
    assert_eq!(cluster_row.ref_id(RefField::Master), Some(master_id));

    let positions: Vec<(String, Option<u16>)> = ["C1 - Switch 1", "C1 - Switch 2"]
        .iter()
        .map(|name| {
            let id = store
                .lookup(EntityKind::Device, &NaturalKey::from(*name))
                .unwrap();
            match &store.get(id).unwrap().payload {
                Payload::Device(device) => ((*name).to_string(), device.vc_position),
                other => panic!("unexpected payload {other:?}"),
            }
        })
        .collect();
    assert_eq!(positions[0].1, Some(1), "master takes slot 1");
    assert_eq!(positions[1].1, Some(3), "switch 2 lands in slot 3");
}

#[test]
fn unflagged_first_member_is_the_master() {
    let mut source = Graph::default();
    hardware_pair(&mut source);
    source
        .insert(Cluster {
            name: "C1".into(),
            members: vec!["C1 - Switch 1".into(), "C1 - Switch 2".into()],
            ..Cluster::default()
        })
        .unwrap();
    for name in ["C1 - Switch 1", "C1 - Switch 2"] {
        let mut member = device(name);
        member.cluster_host = Some("C1".into());
        source.insert(member).unwrap();
    }

    let mut store = MemoryStore::new();
    seed(&mut store, &source);

    let cluster_id = store
        .lookup(EntityKind::Cluster, &NaturalKey::from("C1"))
        .unwrap();
    let first_id = store
        .lookup(EntityKind::Device, &NaturalKey::from("C1 - Switch 1"))
        .unwrap();
    assert_eq!(
        store.get(cluster_id).unwrap().ref_id(RefField::Master),
        Some(first_id)
    );
    match &store.get(first_id).unwrap().payload {
        Payload::Device(device) => assert_eq!(device.vc_position, Some(1)),
        other => panic!("unexpected payload {other:?}"),
    }
}

#[test]
fn port_vlan_update_carries_the_whole_tagged_set() {
    let vlan = |name: &str, vid: u16| Vlan {
        name: name.into(),
        vlan_id: vid,
        ..Vlan::default()
    };
    let membership = |name: &str, vid: u16| VlanMembership {
        name: name.into(),
        vid,
    };

    let mut target = Graph::default();
    hardware_pair(&mut target);
    target.insert(device("sw1")).unwrap();
    target.insert(vlan("prod", 100)).unwrap();
    target.insert(vlan("mgmt", 200)).unwrap();
    let mut p = port("sw1", "eth0");
    p.vlans = vec![membership("prod", 100)];
    target.insert(p).unwrap();

    let mut store = MemoryStore::new();
    seed(&mut store, &target);

    // Desired state tags both VLANs.
    let mut source = Graph::default();
    hardware_pair(&mut source);
    source.insert(device("sw1")).unwrap();
    source.insert(vlan("prod", 100)).unwrap();
    source.insert(vlan("mgmt", 200)).unwrap();
    let mut changed = port("sw1", "eth0");
    changed.vlans = vec![membership("prod", 100), membership("mgmt", 200)];
    source.insert(changed).unwrap();

    let report = run(
        &source,
        &target,
        &mut store,
        &StaticDns::new(),
        &SyncOptions::default(),
    );
    assert_eq!(report.counts[&EntityKind::Port].updated, 1);

    let port_id = store
        .lookup(EntityKind::Port, &NaturalKey::from(["sw1", "eth0"]))
        .unwrap();
    let row = store.get(port_id).unwrap();
    let tagged = row
        .refs
        .iter()
        .filter(|slot| slot.field == RefField::TaggedVlan)
        .count();
    assert_eq!(tagged, 2);
}

#[test]
fn emptied_vlan_set_releases_the_refs() {
    let mut target = Graph::default();
    hardware_pair(&mut target);
    target.insert(device("sw1")).unwrap();
    target
        .insert(Vlan {
            name: "prod".into(),
            vlan_id: 100,
            ..Vlan::default()
        })
        .unwrap();
    let mut p = port("sw1", "eth0");
    p.vlans = vec![VlanMembership {
        name: "prod".into(),
        vid: 100,
    }];
    target.insert(p).unwrap();

    let mut store = MemoryStore::new();
    seed(&mut store, &target);

    // The port loses its VLANs and the VLAN itself goes away.
    let mut source = Graph::default();
    hardware_pair(&mut source);
    source.insert(device("sw1")).unwrap();
    source.insert(port("sw1", "eth0")).unwrap();

    let options = SyncOptions {
        delete_on_sync: true,
        ..SyncOptions::default()
    };
    let report = run(&source, &target, &mut store, &StaticDns::new(), &options);
    assert_eq!(report.counts[&EntityKind::Port].updated, 1);
    assert_eq!(report.total_skipped(), 0);

    let port_id = store
        .lookup(EntityKind::Port, &NaturalKey::from(["sw1", "eth0"]))
        .unwrap();
    let tagged = store
        .get(port_id)
        .unwrap()
        .refs
        .iter()
        .filter(|slot| slot.field == RefField::TaggedVlan)
        .count();
    assert_eq!(tagged, 0, "emptied set must not keep old slots");
    assert_eq!(store.count(EntityKind::Vlan), 0);
}

#[test]
fn cleared_building_releases_the_device_reference() {
    let mut target = Graph::default();
    target.insert(building("DC1")).unwrap();
    hardware_pair(&mut target);
    let mut dev = device("sw1");
    dev.building = Some("DC1".into());
    target.insert(dev).unwrap();

    let mut store = MemoryStore::new();
    seed(&mut store, &target);

    // The device moves out of any building and the building is gone.
    let mut source = Graph::default();
    hardware_pair(&mut source);
    source.insert(device("sw1")).unwrap();

    let options = SyncOptions {
        delete_on_sync: true,
        ..SyncOptions::default()
    };
    let report = run(&source, &target, &mut store, &StaticDns::new(), &options);
    assert_eq!(report.counts[&EntityKind::Device].updated, 1);
    assert_eq!(report.total_skipped(), 0);

    let device_id = store
        .lookup(EntityKind::Device, &NaturalKey::from("sw1"))
        .unwrap();
    assert!(store.get(device_id).unwrap().ref_id(RefField::Building).is_none());
    assert_eq!(store.count(EntityKind::Building), 0);
}

#[test]
fn access_port_with_single_vlan_gets_untagged_ref() {
    let mut source = Graph::default();
    hardware_pair(&mut source);
    source.insert(device("sw1")).unwrap();
    source
        .insert(Vlan {
            name: "prod".into(),
            vlan_id: 100,
            ..Vlan::default()
        })
        .unwrap();
    let mut p = port("sw1", "eth0");
    p.mode = PortMode::Access;
    p.vlans = vec![VlanMembership {
        name: "prod".into(),
        vid: 100,
    }];
    source.insert(p).unwrap();

    let mut store = MemoryStore::new();
    seed(&mut store, &source);

    let port_id = store
        .lookup(EntityKind::Port, &NaturalKey::from(["sw1", "eth0"]))
        .unwrap();
    let row = store.get(port_id).unwrap();
    assert!(row.ref_id(RefField::UntaggedVlan).is_some());
    assert!(row.ref_id(RefField::TaggedVlan).is_none());
}

#[test]
fn orphaned_room_is_dropped_not_created() {
    let mut source = Graph::default();
    source.insert(room("R1", "MISSING")).unwrap();

    let mut store = MemoryStore::new();
    let report = run(
        &source,
        &Graph::default(),
        &mut store,
        &StaticDns::new(),
        &SyncOptions::default(),
    );
    assert_eq!(report.total_changes(), 0);
    assert_eq!(store.len(), 0);
}

#[test]
fn unresolved_reference_skips_only_that_entity() {
    let mut source = Graph::default();
    hardware_pair(&mut source);
    source.insert(device("sw1")).unwrap();
    // Cross-reference to a hardware model nobody collected.
    let mut broken = device("sw2");
    broken.hardware = "QFX-MISSING".into();
    source.insert(broken).unwrap();

    let mut store = MemoryStore::new();
    let report = run(
        &source,
        &Graph::default(),
        &mut store,
        &StaticDns::new(),
        &SyncOptions::default(),
    );

    assert_eq!(report.counts[&EntityKind::Device].created, 1);
    assert_eq!(report.counts[&EntityKind::Device].skipped, 1);
    assert_eq!(report.diagnostics.len(), 1);
    assert!(report.diagnostics[0].reason.contains("unresolved"));
    assert!(store
        .lookup(EntityKind::Device, &NaturalKey::from("sw1"))
        .is_some());
    assert!(store
        .lookup(EntityKind::Device, &NaturalKey::from("sw2"))
        .is_none());
}

// ── Primary-address resolution ──────────────────────────────────────

#[test]
fn primary_flag_set_on_already_assigned_address() {
    let mut source = Graph::default();
    hardware_pair(&mut source);
    source.insert(device("core.example.com")).unwrap();
    source.insert(port("core.example.com", "mgmt0")).unwrap();
    source
        .insert(IpAddress {
            address: "10.1.2.3/24".into(),
            device: Some("core.example.com".into()),
            interface: Some("mgmt0".into()),
            primary: false,
            ..IpAddress::default()
        })
        .unwrap();

    let dns = StaticDns::new().with("core.example.com", "10.1.2.3".parse().unwrap());
    let options = SyncOptions {
        use_dns: true,
        ..SyncOptions::default()
    };
    let mut store = MemoryStore::new();
    let report = run(&source, &Graph::default(), &mut store, &dns, &options);
    assert_eq!(report.counts[&EntityKind::IpAddress].updated, 1);

    let ip_id = store
        .lookup(EntityKind::IpAddress, &NaturalKey::from(["10.1.2.3/24", ""]))
        .unwrap();
    match &store.get(ip_id).unwrap().payload {
        Payload::IpAddress(ip) => assert!(ip.primary),
        other => panic!("unexpected payload {other:?}"),
    }
}

#[test]
fn address_assigned_elsewhere_moves_to_management_port() {
    let mut target = Graph::default();
    hardware_pair(&mut target);
    target.insert(device("old.example.com")).unwrap();
    target.insert(port("old.example.com", "eth0")).unwrap();
    target
        .insert(IpAddress {
            address: "10.1.2.3/24".into(),
            device: Some("old.example.com".into()),
            interface: Some("eth0".into()),
            ..IpAddress::default()
        })
        .unwrap();

    let mut store = MemoryStore::new();
    seed(&mut store, &target);

    let mut source = target.clone();
    source.insert(device("core.example.com")).unwrap();
    source.insert(port("core.example.com", "mgmt0")).unwrap();

    let dns = StaticDns::new().with("core.example.com", "10.1.2.3".parse().unwrap());
    let options = SyncOptions {
        use_dns: true,
        ..SyncOptions::default()
    };
    let report = run(&source, &target, &mut store, &dns, &options);
    assert!(report.counts[&EntityKind::IpAddress].updated >= 1);

    let ip_id = store
        .lookup(EntityKind::IpAddress, &NaturalKey::from(["10.1.2.3/24", ""]))
        .unwrap();
    let row = store.get(ip_id).unwrap();
    let core_id = store
        .lookup(EntityKind::Device, &NaturalKey::from("core.example.com"))
        .unwrap();
    assert_eq!(row.ref_id(RefField::Device), Some(core_id));
    match &row.payload {
        Payload::IpAddress(ip) => {
            assert!(ip.primary);
            assert_eq!(ip.interface.as_deref(), Some("mgmt0"));
        }
        other => panic!("unexpected payload {other:?}"),
    }
}

#[test]
fn unknown_address_is_created_with_subnet_prefix() {
    let mut source = Graph::default();
    hardware_pair(&mut source);
    source.insert(device("core.example.com")).unwrap();
    source
        .insert(Subnet {
            network: "10.1.2.0".into(),
            mask_bits: 24,
            ..Subnet::default()
        })
        .unwrap();

    let dns = StaticDns::new().with("core.example.com", "10.1.2.3".parse().unwrap());
    let options = SyncOptions {
        use_dns: true,
        ..SyncOptions::default()
    };
    let mut store = MemoryStore::new();
    let report = run(&source, &Graph::default(), &mut store, &dns, &options);
    assert_eq!(report.counts[&EntityKind::IpAddress].created, 1);
    // No management-shaped port existed, so one was created.
    assert!(store
        .lookup(
            EntityKind::Port,
            &NaturalKey::from(["core.example.com", "Management"])
        )
        .is_some());
    assert!(store
        .lookup(EntityKind::IpAddress, &NaturalKey::from(["10.1.2.3/24", ""]))
        .is_some());
}

#[test]
fn dns_miss_skips_the_device_only() {
    let mut source = Graph::default();
    hardware_pair(&mut source);
    source.insert(device("core.example.com")).unwrap();
    source.insert(device("edge.example.com")).unwrap();

    // Only one of the two names resolves.
    let dns = StaticDns::new().with("edge.example.com", "10.0.0.7".parse().unwrap());
    let options = SyncOptions {
        use_dns: true,
        ..SyncOptions::default()
    };
    let mut store = MemoryStore::new();
    let report = run(&source, &Graph::default(), &mut store, &dns, &options);

    assert_eq!(report.counts[&EntityKind::IpAddress].created, 1);
    assert!(report
        .diagnostics
        .iter()
        .any(|d| d.reason.contains("DNS lookup failed")));
}

#[test]
fn stack_member_names_are_not_resolved() {
    let mut source = Graph::default();
    hardware_pair(&mut source);
    source.insert(device("C1 - Switch 2")).unwrap();

    // Resolver would answer, but member-shaped names are never asked.
    let dns = StaticDns::new().with("C1 - Switch 2", "10.0.0.9".parse().unwrap());
    let options = SyncOptions {
        use_dns: true,
        ..SyncOptions::default()
    };
    let mut store = MemoryStore::new();
    let report = run(&source, &Graph::default(), &mut store, &dns, &options);
    assert_eq!(store.count(EntityKind::IpAddress), 0);
    assert_eq!(report.counts.get(&EntityKind::IpAddress), None);
}

#[test]
fn dry_run_plans_without_writing() {
    let mut source = Graph::default();
    source.insert(building("DC1")).unwrap();

    let options = SyncOptions {
        dry_run: true,
        ..SyncOptions::default()
    };
    let mut store = MemoryStore::new();
    let report = run(
        &source,
        &Graph::default(),
        &mut store,
        &StaticDns::new(),
        &options,
    );
    assert!(report.dry_run);
    assert_eq!(report.counts[&EntityKind::Building].created, 1);
    assert!(store.is_empty());
}

#[test]
fn store_outage_aborts_the_run() {
    let mut source = Graph::default();
    source.insert(building("DC1")).unwrap();

    let mut store = MemoryStore::new();
    store.go_offline();

    let target = Graph::default();
    let dns = StaticDns::new();
    let options = SyncOptions::default();
    let err = Engine::new(&source, &target, &mut store, &dns, &options)
        .run()
        .unwrap_err();
    assert!(matches!(err, SyncError::StoreUnavailable(_)));
}
