//! Cross-reference audit log.
//!
//! Every successful counterpart creation appends one `(local, remote,
//! origin)` entry. The sync engine only ever writes here; lookups exist for
//! operators inspecting what was linked.

mod jsonl;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::{LocalId, RemoteId};
use crate::origin::Origin;

pub use jsonl::JsonlCrossReferenceLog;

/// One linked pair, immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossReferenceEntry {
    pub local_id: LocalId,
    pub remote_id: RemoteId,
    /// The side whose change caused the link to be created.
    pub origin: Origin,
    pub recorded_at: DateTime<Utc>,
}

impl CrossReferenceEntry {
    pub fn new(local_id: LocalId, remote_id: RemoteId, origin: Origin) -> Self {
        CrossReferenceEntry {
            local_id,
            remote_id,
            origin,
            recorded_at: Utc::now(),
        }
    }

    /// Whether this entry references `id` on the given side.
    pub fn references(&self, side: Origin, id: u64) -> bool {
        match side {
            Origin::Local => self.local_id.0 == id,
            Origin::Remote => self.remote_id.0 == id,
        }
    }
}

/// Write-only sink for cross-reference entries.
///
/// Fire-and-forget: implementations log their own failures and never make
/// the sync fail.
pub trait CrossReferenceLog: Send + Sync {
    fn append(&self, entry: CrossReferenceEntry);
}
