mod cli;
mod commands;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::error::CliError;

fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    let settings = match &cli.global.config {
        Some(path) => sotsync_config::load_settings_from(path)?,
        None => sotsync_config::load_settings()?,
    };

    // The debug setting raises the floor; -v flags can still go higher.
    let verbosity = if settings.debug {
        cli.global.verbose.max(2)
    } else {
        cli.global.verbose
    };
    init_tracing(verbosity);

    let options = settings.sync_options()?;

    match cli.command {
        Command::Diff(args) => commands::diff_cmd(&args, &options),
        Command::Sync(args) => commands::sync_cmd(&args, options),
    }
}
