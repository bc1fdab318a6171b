use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::event::{LocalId, RemoteId};
use crate::remote::Params;

/// Publish flag stored on every local record (`1` published, `0` draft).
pub const STATUS_FIELD: &str = "status";

/// A record handle in the local content store.
///
/// Fields are read and written by name. The id is only populated once the
/// store has saved the record for the first time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<LocalId>,
    kind: String,
    #[serde(default)]
    fields: Params,
}

impl LocalRecord {
    pub fn new(kind: &str) -> Self {
        LocalRecord {
            id: None,
            kind: kind.to_string(),
            fields: Params::new(),
        }
    }

    pub fn id(&self) -> Option<LocalId> {
        self.id
    }

    /// Called by a store when it first persists the record.
    pub fn assign_id(&mut self, id: LocalId) {
        self.id = Some(id);
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn fields(&self) -> &Params {
        &self.fields
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    pub fn set(&mut self, field: &str, value: impl Into<Value>) {
        self.fields.insert(field.to_string(), value.into());
    }

    /// The remote id held in a cross-reference field, if any.
    pub fn remote_reference(&self, field: &str) -> Option<RemoteId> {
        self.get(field).and_then(RemoteId::from_value)
    }

    pub fn is_published(&self) -> bool {
        self.get(STATUS_FIELD)
            .is_some_and(crate::event::value_is_truthy)
    }

    pub fn set_published(&mut self, published: bool) {
        self.set(STATUS_FIELD, u8::from(published));
    }
}

impl fmt::Display for LocalRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => write!(f, "{} #{}", self.kind, id),
            None => write!(f, "{} (unsaved)", self.kind),
        }
    }
}
