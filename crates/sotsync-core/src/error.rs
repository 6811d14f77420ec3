// ── Core error types ──
//
// Error taxonomy for one reconciliation run. Entity-level failures
// (unresolved references, store validation, protected deletes, DNS misses)
// are isolated to the entity that raised them and recorded as diagnostics;
// only store connectivity loss aborts a run.

use thiserror::Error;

use crate::model::{EntityKind, NaturalKey};

/// Unified error type for the reconciliation core.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A referenced natural key is absent. Callers decide fallback or skip.
    #[error("{kind} {key} not found")]
    NotFound { kind: EntityKind, key: NaturalKey },

    /// Double-insert into a graph or identity map. Programming invariant
    /// violation, treated as fatal.
    #[error("duplicate {kind} key {key}")]
    DuplicateKey { kind: EntityKind, key: NaturalKey },

    /// A dependent entity's parent or cross-reference was never committed.
    /// The entity is skipped and the run continues.
    #[error("{kind} {key} references unresolved {ref_kind} {ref_key}")]
    UnresolvedReference {
        kind: EntityKind,
        key: NaturalKey,
        ref_kind: EntityKind,
        ref_key: NaturalKey,
    },

    /// The target store rejected a write under its own integrity rules.
    /// The entity is skipped and the run continues.
    #[error("store rejected {kind} {key}: {reason}")]
    Validation {
        kind: EntityKind,
        key: NaturalKey,
        reason: String,
    },

    /// A delete was blocked by a remaining dependent. The entity is removed
    /// from the deletion queue and the run continues.
    #[error("delete of {kind} {key} blocked by dependent objects")]
    Protected { kind: EntityKind, key: NaturalKey },

    /// DNS resolution failed; the primary-address step is skipped for the
    /// affected device only.
    #[error("DNS lookup failed for {host}")]
    Dns {
        host: String,
        #[source]
        source: DnsError,
    },

    /// The persistence layer cannot be reached at all. Fatal: aborts the run.
    #[error("target store unavailable: {0}")]
    StoreUnavailable(String),
}

/// Failures while loading an inventory into a graph.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("reading snapshot: {0}")]
    Io(#[from] std::io::Error),

    #[error("parsing snapshot: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Graph(#[from] SyncError),
}

/// Failures surfaced by the DNS collaborator.
#[derive(Debug, Error)]
pub enum DnsError {
    #[error("no address record")]
    NotFound,

    #[error("query timed out")]
    Timeout,
}

/// Failures surfaced by the target store.
///
/// `Unavailable` is the only fatal variant; everything else is scoped to a
/// single object write.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("object not found")]
    NotFound,

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("protected by dependent objects")]
    Protected,

    #[error("store unavailable: {0}")]
    Unavailable(String),
}
