// ── Run report ──
//
// Per-kind counters plus one diagnostic record for every entity the run
// skipped. Serializable for the CLI's JSON output.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::diff::SyncDiff;
use crate::error::SyncError;
use crate::model::{EntityKind, NaturalKey};

/// What the engine was doing when a diagnostic was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Create,
    Update,
    Delete,
    PrimaryAddress,
}

/// One skipped entity and why.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub kind: EntityKind,
    pub key: NaturalKey,
    pub action: Action,
    pub reason: String,
}

/// Outcome counters for one entity kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KindCounts {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub skipped: usize,
}

/// The result of one reconciliation run.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub dry_run: bool,
    pub counts: BTreeMap<EntityKind, KindCounts>,
    pub diagnostics: Vec<Diagnostic>,
}

impl RunReport {
    pub fn new(dry_run: bool) -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            dry_run,
            counts: BTreeMap::new(),
            diagnostics: Vec::new(),
        }
    }

    /// A dry-run report: the diff's planned counts, no writes performed.
    pub fn planned(diff: &SyncDiff) -> Self {
        let mut report = Self::new(true);
        for change in diff.changes() {
            report.counts.insert(
                change.kind,
                KindCounts {
                    created: change.create,
                    updated: change.update,
                    deleted: change.delete,
                    skipped: 0,
                },
            );
        }
        report.finish();
        report
    }

    pub(crate) fn created(&mut self, kind: EntityKind) {
        self.counts.entry(kind).or_default().created += 1;
    }

    pub(crate) fn updated(&mut self, kind: EntityKind) {
        self.counts.entry(kind).or_default().updated += 1;
    }

    pub(crate) fn deleted(&mut self, kind: EntityKind) {
        self.counts.entry(kind).or_default().deleted += 1;
    }

    pub(crate) fn skipped(
        &mut self,
        kind: EntityKind,
        key: &NaturalKey,
        action: Action,
        err: &SyncError,
    ) {
        tracing::warn!(%kind, %key, ?action, error = %err, "entity skipped");
        self.counts.entry(kind).or_default().skipped += 1;
        self.diagnostics.push(Diagnostic {
            kind,
            key: key.clone(),
            action,
            reason: err.to_string(),
        });
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Total writes performed (or planned, for a dry run).
    pub fn total_changes(&self) -> usize {
        self.counts
            .values()
            .map(|c| c.created + c.updated + c.deleted)
            .sum()
    }

    pub fn total_skipped(&self) -> usize {
        self.counts.values().map(|c| c.skipped).sum()
    }
}
