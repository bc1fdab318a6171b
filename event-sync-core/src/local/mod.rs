//! Local content store access.

mod file_store;
mod record;

use serde_json::Value;

use crate::error::EventSyncResult;
use crate::event::LocalId;

pub use file_store::FileStore;
pub use record::{LocalRecord, STATUS_FIELD};

/// Create/load/query/save/delete against the local content store.
///
/// Unlike the remote gateway, failures here are real errors and propagate
/// to whoever fired the trigger.
pub trait LocalStore: Send + Sync {
    /// A new, unsaved record of the given kind.
    fn create(&self, kind: &str) -> LocalRecord {
        LocalRecord::new(kind)
    }

    fn load(&self, id: LocalId) -> EventSyncResult<Option<LocalRecord>>;

    /// Ids of records of `kind` whose `field` equals `value`.
    fn query(&self, kind: &str, field: &str, value: &Value) -> EventSyncResult<Vec<LocalId>>;

    /// Persist a record, assigning its id on first save.
    fn save(&self, record: &mut LocalRecord) -> EventSyncResult<LocalId>;

    fn delete(&self, ids: &[LocalId]) -> EventSyncResult<()>;
}

/// Field equality as the stores see it: `42` and `"42"` are the same id.
pub fn field_matches(stored: Option<&Value>, wanted: &Value) -> bool {
    match stored {
        None => false,
        Some(stored) if stored == wanted => true,
        Some(stored) => match (scalar_key(stored), scalar_key(wanted)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        },
    }
}

fn scalar_key(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.trim().to_string()),
        _ => None,
    }
}
