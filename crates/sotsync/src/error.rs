//! CLI error types with miette diagnostics.

use miette::Diagnostic;
use thiserror::Error;

use sotsync_core::{CollectError, SyncError};

/// Exit codes.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const SNAPSHOT: i32 = 4;
    pub const STORE: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    #[error("could not load snapshot")]
    #[diagnostic(
        code(sotsync::snapshot),
        help("Check that the file exists and is a valid JSON inventory snapshot.")
    )]
    Snapshot(#[from] CollectError),

    #[error("reconciliation run aborted")]
    #[diagnostic(
        code(sotsync::run_aborted),
        help("Only a lost store connection aborts a run; see the cause below.")
    )]
    Run(#[from] SyncError),

    #[error("configuration error")]
    #[diagnostic(
        code(sotsync::config),
        help("Check the config file syntax and SOTSYNC_ environment overrides.")
    )]
    Config(#[from] sotsync_config::ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid JSON payload: {0}")]
    #[diagnostic(code(sotsync::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Snapshot(_) => exit_code::SNAPSHOT,
            Self::Run(SyncError::StoreUnavailable(_)) => exit_code::STORE,
            Self::Config(_) => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}
