//! Shared configuration for the sotsync CLI.
//!
//! TOML settings plus `SOTSYNC_`-prefixed environment overrides, and
//! translation to `sotsync_core::SyncOptions`.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use sotsync_core::{HostnameRule, SyncOptions};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// One device-name pattern pinned to a location, in config form.
/// Patterns compile when settings are turned into run options.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HostnameMap {
    pub pattern: String,
    pub location: String,
}

/// Top-level TOML settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    /// Verbose engine logging.
    #[serde(default)]
    pub debug: bool,

    /// Plan only, write nothing.
    #[serde(default)]
    pub dry_run: bool,

    /// Resolve primary addresses through DNS after apply.
    #[serde(default)]
    pub use_dns: bool,

    /// Flush the deletion queue at the end of a run.
    #[serde(default)]
    pub delete_on_sync: bool,

    /// Source entities carrying this tag are not collected.
    #[serde(default)]
    pub ignore_tag: Option<String>,

    /// Device-name patterns pinned to locations, first match wins.
    #[serde(default)]
    pub hostname_mapping: Vec<HostnameMap>,

    /// Resolve the collected customer field through building site-code tags.
    #[serde(default)]
    pub customer_is_facility: bool,
}

impl Settings {
    /// Compile the settings into engine run options. Fails on an invalid
    /// hostname pattern.
    pub fn sync_options(&self) -> Result<SyncOptions, ConfigError> {
        let mut hostname_mapping = Vec::with_capacity(self.hostname_mapping.len());
        for entry in &self.hostname_mapping {
            let rule = HostnameRule::new(&entry.pattern, &entry.location).map_err(|err| {
                ConfigError::Validation {
                    field: "hostname_mapping".into(),
                    reason: format!("pattern '{}': {err}", entry.pattern),
                }
            })?;
            hostname_mapping.push(rule);
        }
        Ok(SyncOptions {
            dry_run: self.dry_run,
            use_dns: self.use_dns,
            delete_on_sync: self.delete_on_sync,
            ignore_tag: self.ignore_tag.clone(),
            hostname_mapping,
            customer_is_facility: self.customer_is_facility,
        })
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "sotsync", "sotsync").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("sotsync");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load settings from a specific file plus environment.
pub fn load_settings_from(path: &Path) -> Result<Settings, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Settings::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("SOTSYNC_"));

    let settings: Settings = figment.extract()?;
    Ok(settings)
}

/// Load settings from the canonical config path plus environment.
pub fn load_settings() -> Result<Settings, ConfigError> {
    load_settings_from(&config_path())
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize settings to TOML and write to the canonical config path.
pub fn save_settings(settings: &Settings) -> Result<(), ConfigError> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(settings)?;
    std::fs::write(&path, toml_str)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn file_settings_load_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            r#"
use_dns = true
ignore_tag = "no-sync"

[[hostname_mapping]]
pattern = "^edge-"
location = "DC1"
"#
        )
        .unwrap();

        let settings = load_settings_from(&path).unwrap();
        assert!(settings.use_dns);
        assert!(!settings.delete_on_sync);
        assert_eq!(settings.ignore_tag.as_deref(), Some("no-sync"));

        let options = settings.sync_options().unwrap();
        assert_eq!(options.location_override("edge-01"), Some("DC1"));
    }

    #[test]
    fn invalid_pattern_is_a_validation_error() {
        let settings = Settings {
            hostname_mapping: vec![HostnameMap {
                pattern: "(".into(),
                location: "DC1".into(),
            }],
            ..Settings::default()
        };
        assert!(matches!(
            settings.sync_options(),
            Err(ConfigError::Validation { .. })
        ));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let settings = load_settings_from(Path::new("/nonexistent/sotsync.toml")).unwrap();
        assert!(!settings.dry_run);
        assert!(settings.hostname_mapping.is_empty());
    }
}
