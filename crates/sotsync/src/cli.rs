//! Argument definitions for the `sotsync` binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "sotsync",
    about = "Reconcile a network inventory against its source of record",
    version
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to the config file (defaults to the platform config dir).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compare two inventory snapshots and show the pending changes.
    Diff(DiffArgs),
    /// Converge a target snapshot onto a source-of-record snapshot.
    Sync(SyncArgs),
}

#[derive(Debug, Args)]
pub struct DiffArgs {
    /// Source-of-record snapshot (JSON).
    #[arg(long)]
    pub source: PathBuf,

    /// Target inventory snapshot (JSON).
    #[arg(long)]
    pub target: PathBuf,

    /// Emit machine-readable JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct SyncArgs {
    /// Source-of-record snapshot (JSON).
    #[arg(long)]
    pub source: PathBuf,

    /// Target inventory snapshot (JSON).
    #[arg(long)]
    pub target: PathBuf,

    /// Plan only: report what would change, write nothing.
    #[arg(long)]
    pub dry_run: bool,

    /// Also delete target entities absent from the source.
    #[arg(long)]
    pub delete: bool,

    /// Resolve device primary addresses through DNS.
    #[arg(long)]
    pub use_dns: bool,

    /// Emit the run report as JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}
