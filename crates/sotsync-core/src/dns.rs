// ── DNS collaborator ──
//
// Forward resolution for the primary-address step. A miss is recoverable:
// the engine skips that device and keeps going.

use std::collections::HashMap;
use std::net::{IpAddr, ToSocketAddrs};

use crate::error::DnsError;

/// Forward-resolves one hostname to an address.
pub trait DnsResolver {
    fn resolve(&self, host: &str) -> Result<IpAddr, DnsError>;
}

/// System resolver backed by the platform's lookup machinery.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemDns;

impl DnsResolver for SystemDns {
    fn resolve(&self, host: &str) -> Result<IpAddr, DnsError> {
        (host, 0u16)
            .to_socket_addrs()
            .map_err(|_| DnsError::NotFound)?
            .next()
            .map(|addr| addr.ip())
            .ok_or(DnsError::NotFound)
    }
}

/// Fixed-table resolver for tests and offline runs.
#[derive(Debug, Clone, Default)]
pub struct StaticDns {
    records: HashMap<String, IpAddr>,
}

impl StaticDns {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, host: impl Into<String>, addr: IpAddr) -> Self {
        self.records.insert(host.into(), addr);
        self
    }

    pub fn insert(&mut self, host: impl Into<String>, addr: IpAddr) {
        self.records.insert(host.into(), addr);
    }
}

impl DnsResolver for StaticDns {
    fn resolve(&self, host: &str) -> Result<IpAddr, DnsError> {
        self.records.get(host).copied().ok_or(DnsError::NotFound)
    }
}
