// ── Circuit entity types ──

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::common::NaturalKey;
use super::{EntityKind, SyncModel, delta_field, delta_set};

/// A circuit provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    pub name: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub vendor_url: Option<String>,
    #[serde(default)]
    pub vendor_acct: Option<String>,
    #[serde(default)]
    pub vendor_contact1: Option<String>,
    #[serde(default)]
    pub vendor_contact2: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl SyncModel for Provider {
    const KIND: EntityKind = EntityKind::Provider;

    fn key(&self) -> NaturalKey {
        NaturalKey::single(&self.name)
    }

    fn delta(&self, target: &Self) -> Vec<&'static str> {
        let mut changes = Vec::new();
        delta_field!(changes, self.notes, target.notes, "notes");
        delta_field!(changes, self.vendor_url, target.vendor_url, "vendor_url");
        delta_field!(changes, self.vendor_acct, target.vendor_acct, "vendor_acct");
        delta_field!(changes, self.vendor_contact1, target.vendor_contact1, "vendor_contact1");
        delta_field!(changes, self.vendor_contact2, target.vendor_contact2, "vendor_contact2");
        delta_set!(changes, &self.tags, &target.tags, "tags");
        changes
    }
}

/// A provider circuit, optionally terminated on device interfaces.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    pub circuit_id: String,
    pub provider: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub circuit_type: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub install_date: Option<NaiveDate>,
    #[serde(default)]
    pub bandwidth: Option<u32>,
    #[serde(default)]
    pub origin_dev: Option<String>,
    #[serde(default)]
    pub origin_int: Option<String>,
    #[serde(default)]
    pub endpoint_dev: Option<String>,
    #[serde(default)]
    pub endpoint_int: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl SyncModel for Circuit {
    const KIND: EntityKind = EntityKind::Circuit;

    fn key(&self) -> NaturalKey {
        NaturalKey::single(&self.circuit_id)
    }

    fn delta(&self, target: &Self) -> Vec<&'static str> {
        let mut changes = Vec::new();
        delta_field!(changes, self.provider, target.provider, "provider");
        delta_field!(changes, self.notes, target.notes, "notes");
        delta_field!(changes, self.circuit_type, target.circuit_type, "circuit_type");
        delta_field!(changes, self.status, target.status, "status");
        delta_field!(changes, self.install_date, target.install_date, "install_date");
        delta_field!(changes, self.bandwidth, target.bandwidth, "bandwidth");
        delta_field!(changes, self.origin_dev, target.origin_dev, "origin_dev");
        delta_field!(changes, self.origin_int, target.origin_int, "origin_int");
        delta_field!(changes, self.endpoint_dev, target.endpoint_dev, "endpoint_dev");
        delta_field!(changes, self.endpoint_int, target.endpoint_int, "endpoint_int");
        delta_set!(changes, &self.tags, &target.tags, "tags");
        changes
    }
}
