//! In-memory stores.
//!
//! Useful for embedding the engine in tests or dry runs. The remote store
//! follows the remote API's result shapes (`is_error`, `id`, `values`) and
//! records every call it receives.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::error::{EventSyncError, EventSyncResult};
use crate::event::{LocalId, RemoteId};
use crate::local::{LocalRecord, LocalStore, field_matches};
use crate::origin::Origin;
use crate::remote::{Params, RemoteAction, RemoteTransport};
use crate::xref::{CrossReferenceEntry, CrossReferenceLog};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// Local store
// =============================================================================

#[derive(Default)]
struct LocalState {
    records: BTreeMap<LocalId, LocalRecord>,
    next_id: u64,
    saves: usize,
    deleted: Vec<LocalId>,
    fail_saves: bool,
}

/// A local content store held in memory.
#[derive(Default)]
pub struct MemoryLocalStore {
    state: Mutex<LocalState>,
}

impl MemoryLocalStore {
    pub fn new() -> Self {
        MemoryLocalStore::default()
    }

    /// Insert a record directly, bypassing save accounting.
    pub fn insert(&self, mut record: LocalRecord) -> LocalId {
        let mut state = lock(&self.state);
        let id = match record.id() {
            Some(id) => id,
            None => {
                state.next_id += 1;
                LocalId(state.next_id)
            }
        };
        state.next_id = state.next_id.max(id.0);
        record.assign_id(id);
        state.records.insert(id, record);
        id
    }

    pub fn get(&self, id: LocalId) -> Option<LocalRecord> {
        lock(&self.state).records.get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        lock(&self.state).records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        lock(&self.state).saves
    }

    /// Ids removed through [`LocalStore::delete`].
    pub fn deleted(&self) -> Vec<LocalId> {
        lock(&self.state).deleted.clone()
    }

    /// Make every following save fail.
    pub fn fail_saves(&self, fail: bool) {
        lock(&self.state).fail_saves = fail;
    }
}

impl LocalStore for MemoryLocalStore {
    fn load(&self, id: LocalId) -> EventSyncResult<Option<LocalRecord>> {
        Ok(self.get(id))
    }

    fn query(&self, kind: &str, field: &str, value: &Value) -> EventSyncResult<Vec<LocalId>> {
        Ok(lock(&self.state)
            .records
            .iter()
            .filter(|(_, r)| r.kind() == kind && field_matches(r.get(field), value))
            .map(|(id, _)| *id)
            .collect())
    }

    fn save(&self, record: &mut LocalRecord) -> EventSyncResult<LocalId> {
        let mut state = lock(&self.state);
        if state.fail_saves {
            return Err(EventSyncError::LocalStore(format!(
                "validation failed for {record}"
            )));
        }

        let id = match record.id() {
            Some(id) => id,
            None => {
                state.next_id += 1;
                let id = LocalId(state.next_id);
                record.assign_id(id);
                id
            }
        };
        state.records.insert(id, record.clone());
        state.saves += 1;
        Ok(id)
    }

    fn delete(&self, ids: &[LocalId]) -> EventSyncResult<()> {
        let mut state = lock(&self.state);
        for id in ids {
            if state.records.remove(id).is_some() {
                state.deleted.push(*id);
            }
        }
        Ok(())
    }
}

// =============================================================================
// Remote store
// =============================================================================

/// Parameters that shape a query rather than filter it.
const QUERY_OPTIONS: &[&str] = &["return", "options", "sequential"];

#[derive(Default)]
struct RemoteState {
    records: BTreeMap<RemoteId, Params>,
    next_id: u64,
    calls: Vec<(RemoteAction, Params)>,
    failing: HashSet<RemoteAction>,
}

/// A remote store held in memory, serving a single entity kind.
pub struct MemoryRemoteStore {
    entity: String,
    state: Mutex<RemoteState>,
}

impl Default for MemoryRemoteStore {
    fn default() -> Self {
        MemoryRemoteStore::new("Event")
    }
}

impl MemoryRemoteStore {
    pub fn new(entity: &str) -> Self {
        MemoryRemoteStore {
            entity: entity.to_string(),
            state: Mutex::new(RemoteState::default()),
        }
    }

    /// Seed a record. An `id` in `values` is kept, otherwise one is assigned.
    pub fn insert(&self, values: Value) -> RemoteId {
        let mut values = match values {
            Value::Object(map) => map,
            _ => Params::new(),
        };
        let mut state = lock(&self.state);
        let id = match values.get("id").and_then(RemoteId::from_value) {
            Some(id) => id,
            None => RemoteId(state.next_id + 1),
        };
        state.next_id = state.next_id.max(id.0);
        values.insert("id".into(), id.to_value());
        state.records.insert(id, values);
        id
    }

    pub fn record(&self, id: RemoteId) -> Option<Params> {
        lock(&self.state).records.get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        lock(&self.state).records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Parameters of every call made with `action`, in order.
    pub fn calls(&self, action: RemoteAction) -> Vec<Params> {
        lock(&self.state)
            .calls
            .iter()
            .filter(|(a, _)| *a == action)
            .map(|(_, p)| p.clone())
            .collect()
    }

    pub fn call_count(&self, action: RemoteAction) -> usize {
        self.calls(action).len()
    }

    /// Create calls that carried no `id`, i.e. real creations.
    pub fn creations(&self) -> Vec<Params> {
        self.calls(RemoteAction::Create)
            .into_iter()
            .filter(|p| !p.contains_key("id"))
            .collect()
    }

    /// Create calls that carried an `id`, i.e. updates.
    pub fn updates(&self) -> Vec<Params> {
        self.calls(RemoteAction::Create)
            .into_iter()
            .filter(|p| p.contains_key("id"))
            .collect()
    }

    /// Make every following call with `action` fail.
    pub fn fail_on(&self, action: RemoteAction) {
        lock(&self.state).failing.insert(action);
    }

    pub fn clear_failures(&self) {
        lock(&self.state).failing.clear();
    }

    fn matching(state: &RemoteState, params: &Params) -> Vec<Params> {
        state
            .records
            .values()
            .filter(|record| {
                params
                    .iter()
                    .filter(|(k, _)| !QUERY_OPTIONS.contains(&k.as_str()))
                    .all(|(k, v)| field_matches(record.get(k), v))
            })
            .cloned()
            .collect()
    }

    fn project(record: Params, params: &Params) -> Params {
        let Some(Value::Array(fields)) = params.get("return") else {
            return record;
        };
        let mut projected = Params::new();
        if let Some(id) = record.get("id") {
            projected.insert("id".into(), id.clone());
        }
        for field in fields.iter().filter_map(Value::as_str) {
            if let Some(value) = record.get(field) {
                projected.insert(field.to_string(), value.clone());
            }
        }
        projected
    }

    fn require_id(&self, params: &Params) -> EventSyncResult<RemoteId> {
        params
            .get("id")
            .and_then(RemoteId::from_value)
            .ok_or_else(|| EventSyncError::Remote("Mandatory key(s) missing from params array: id".into()))
    }

    fn handle(
        &self,
        state: &mut RemoteState,
        action: RemoteAction,
        params: &Params,
    ) -> EventSyncResult<Params> {
        match action {
            RemoteAction::Get => {
                let values: Vec<Value> = Self::matching(state, params)
                    .into_iter()
                    .map(|r| Value::Object(Self::project(r, params)))
                    .collect();
                let count = values.len();
                Ok(object(json!({
                    "is_error": 0,
                    "count": count,
                    "values": values,
                })))
            }
            RemoteAction::GetSingle => {
                let mut found = Self::matching(state, params);
                if found.len() != 1 {
                    return Err(EventSyncError::Remote(format!(
                        "Expected one {} but found {}",
                        self.entity,
                        found.len()
                    )));
                }
                Ok(Self::project(found.remove(0), params))
            }
            RemoteAction::Create => {
                let id = match params.get("id") {
                    Some(_) => {
                        let id = self.require_id(params)?;
                        if !state.records.contains_key(&id) {
                            return Err(EventSyncError::Remote(format!(
                                "{} {} does not exist",
                                self.entity, id
                            )));
                        }
                        id
                    }
                    None => {
                        if params.get("title").and_then(Value::as_str).is_none_or(str::is_empty) {
                            return Err(EventSyncError::Remote(
                                "Mandatory key(s) missing from params array: title".into(),
                            ));
                        }
                        state.next_id += 1;
                        RemoteId(state.next_id)
                    }
                };

                let record = state.records.entry(id).or_default();
                for (k, v) in params {
                    record.insert(k.clone(), v.clone());
                }
                record.insert("id".into(), id.to_value());
                let record = record.clone();

                Ok(object(json!({
                    "is_error": 0,
                    "id": id.0,
                    "count": 1,
                    "values": [record],
                })))
            }
            RemoteAction::Delete => {
                let id = self.require_id(params)?;
                if state.records.remove(&id).is_none() {
                    return Err(EventSyncError::Remote(format!(
                        "Could not delete {} {}",
                        self.entity, id
                    )));
                }
                Ok(object(json!({ "is_error": 0, "count": 1, "values": 1 })))
            }
        }
    }
}

fn object(value: Value) -> Params {
    match value {
        Value::Object(map) => map,
        _ => Params::new(),
    }
}

#[async_trait]
impl RemoteTransport for MemoryRemoteStore {
    async fn call(
        &self,
        entity: &str,
        action: RemoteAction,
        params: Params,
    ) -> EventSyncResult<Params> {
        let mut state = lock(&self.state);
        state.calls.push((action, params.clone()));

        if entity != self.entity {
            return Err(EventSyncError::Remote(format!("API ({entity}, {action}) does not exist")));
        }
        if state.failing.contains(&action) {
            return Err(EventSyncError::Remote(format!("{action} unavailable")));
        }

        self.handle(&mut state, action, &params)
    }
}

// =============================================================================
// Cross-reference log
// =============================================================================

/// A cross-reference log held in memory.
#[derive(Default)]
pub struct MemoryCrossReferenceLog {
    entries: Mutex<Vec<CrossReferenceEntry>>,
}

impl MemoryCrossReferenceLog {
    pub fn new() -> Self {
        MemoryCrossReferenceLog::default()
    }

    pub fn entries(&self) -> Vec<CrossReferenceEntry> {
        lock(&self.entries).clone()
    }

    pub fn lookup(&self, side: Origin, id: u64) -> Vec<CrossReferenceEntry> {
        lock(&self.entries)
            .iter()
            .filter(|e| e.references(side, id))
            .cloned()
            .collect()
    }
}

impl CrossReferenceLog for MemoryCrossReferenceLog {
    fn append(&self, entry: CrossReferenceEntry) {
        lock(&self.entries).push(entry);
    }
}
