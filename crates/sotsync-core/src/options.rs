// ── Run options ──
//
// The behavior switches one reconciliation run honors. Built by the config
// crate from its file/env settings; constructed directly in tests.

use regex::Regex;

/// A device-name pattern that pins matching devices to a location,
/// consulted before any collected location.
#[derive(Debug, Clone)]
pub struct HostnameRule {
    pattern: Regex,
    pub location: String,
}

impl HostnameRule {
    pub fn new(pattern: &str, location: impl Into<String>) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            location: location.into(),
        })
    }

    pub fn matches(&self, name: &str) -> bool {
        self.pattern.is_match(name)
    }
}

/// Behavior switches for one run.
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Plan only: diff and report, write nothing.
    pub dry_run: bool,
    /// Resolve device primary addresses through DNS after apply.
    pub use_dns: bool,
    /// Flush the deletion queue at the end of the run.
    pub delete_on_sync: bool,
    /// Source entities carrying this tag are not collected.
    pub ignore_tag: Option<String>,
    /// First matching rule wins; none matching falls back to the collected
    /// location.
    pub hostname_mapping: Vec<HostnameRule>,
    /// Treat the collected customer field as a facility code resolved
    /// through building site-code tags.
    pub customer_is_facility: bool,
}

impl SyncOptions {
    /// Location pinned by the first matching hostname rule, if any.
    pub fn location_override(&self, device_name: &str) -> Option<&str> {
        self.hostname_mapping
            .iter()
            .find(|rule| rule.matches(device_name))
            .map(|rule| rule.location.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_matching_rule_wins() {
        let options = SyncOptions {
            hostname_mapping: vec![
                HostnameRule::new(r"^edge-", "DC1").unwrap(),
                HostnameRule::new(r"^edge-b", "DC2").unwrap(),
            ],
            ..SyncOptions::default()
        };
        assert_eq!(options.location_override("edge-b01"), Some("DC1"));
        assert_eq!(options.location_override("core-01"), None);
    }
}
