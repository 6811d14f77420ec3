//! Subcommand handlers: both operate on JSON inventory snapshots, with the
//! target snapshot seeded into an in-memory store before applying.

use sotsync_core::{
    Collector, Engine, Graph, MemoryStore, SnapshotCollector, SyncOptions, SystemDns, diff,
};

use crate::cli::{DiffArgs, SyncArgs};
use crate::error::CliError;
use crate::output;

pub fn diff_cmd(args: &DiffArgs, options: &SyncOptions) -> Result<(), CliError> {
    let source = SnapshotCollector::from_path(&args.source, options.clone()).collect()?;
    let target = SnapshotCollector::from_path(&args.target, SyncOptions::default()).collect()?;

    let d = diff(&source, &target);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&d.changes())?);
    } else {
        output::print_changes(&d.changes());
    }
    Ok(())
}

pub fn sync_cmd(args: &SyncArgs, mut options: SyncOptions) -> Result<(), CliError> {
    options.dry_run |= args.dry_run;
    options.delete_on_sync |= args.delete;
    options.use_dns |= args.use_dns;

    let source = SnapshotCollector::from_path(&args.source, options.clone()).collect()?;
    let target = SnapshotCollector::from_path(&args.target, SyncOptions::default()).collect()?;

    // Seed the store with the target inventory by applying it onto an
    // empty graph, then run the real reconciliation against it.
    let mut store = MemoryStore::new();
    let dns = SystemDns;
    let empty = Graph::default();
    let seed_options = SyncOptions::default();
    Engine::new(&target, &empty, &mut store, &dns, &seed_options).run()?;

    let report = Engine::new(&source, &target, &mut store, &dns, &options).run()?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        output::print_report(&report);
    }
    Ok(())
}
