//! Create/update/delete orchestration in both directions.

mod outcome;
mod to_local;
mod to_remote;

use async_trait::async_trait;

use crate::config::FieldMapping;
use crate::error::EventSyncResult;
use crate::event::RemoteEvent;
use crate::guard::SyncGuard;
use crate::local::{LocalRecord, LocalStore};
use crate::origin::Origin;
use crate::remote::RemoteGateway;
use crate::resolver::IdentityResolver;
use crate::xref::CrossReferenceLog;

pub use outcome::{SkipReason, SyncKind, SyncOutcome};
pub use to_local::ToLocal;
pub use to_remote::ToRemote;

/// One direction of propagation: changes on the source side become changes
/// on the other store.
///
/// Create and update share one upsert path in both directions, so a create
/// trigger for an already linked record turns into an update and never a
/// duplicate.
#[async_trait]
pub trait SyncDirection: Send + Sync {
    type Source: Send + Sync;

    /// The side whose changes this direction consumes.
    fn origin(&self) -> Origin;

    async fn create(&self, source: &Self::Source, guard: &mut SyncGuard) -> EventSyncResult<SyncOutcome>;

    async fn update(&self, source: &Self::Source, guard: &mut SyncGuard) -> EventSyncResult<SyncOutcome>;

    async fn delete(&self, source: &Self::Source) -> EventSyncResult<SyncOutcome>;
}

/// A change reported by one of the stores.
#[derive(Debug, Clone)]
pub enum Trigger {
    LocalSaved { record: LocalRecord, is_new: bool },
    LocalDeleted(LocalRecord),
    RemoteSaved { event: RemoteEvent, is_new: bool },
    RemoteDeleted(RemoteEvent),
}

impl Trigger {
    pub fn origin(&self) -> Origin {
        match self {
            Trigger::LocalSaved { .. } | Trigger::LocalDeleted(_) => Origin::Local,
            Trigger::RemoteSaved { .. } | Trigger::RemoteDeleted(_) => Origin::Remote,
        }
    }

    pub fn kind(&self) -> SyncKind {
        match self {
            Trigger::LocalSaved { is_new: true, .. } | Trigger::RemoteSaved { is_new: true, .. } => {
                SyncKind::Create
            }
            Trigger::LocalSaved { .. } | Trigger::RemoteSaved { .. } => SyncKind::Update,
            Trigger::LocalDeleted(_) | Trigger::RemoteDeleted(_) => SyncKind::Delete,
        }
    }
}

/// Both directions over one pair of stores.
pub struct EventSync<'a, R: ?Sized, L: ?Sized> {
    to_remote: ToRemote<'a, R, L>,
    to_local: ToLocal<'a, R, L>,
}

impl<'a, R, L> EventSync<'a, R, L>
where
    R: RemoteGateway + ?Sized,
    L: LocalStore + ?Sized,
{
    pub fn new(
        remote: &'a R,
        local: &'a L,
        mapping: &'a FieldMapping,
        xref: &'a dyn CrossReferenceLog,
    ) -> Self {
        let resolver = IdentityResolver::new(remote, local, mapping);
        EventSync {
            to_remote: ToRemote::new(resolver, xref),
            to_local: ToLocal::new(resolver, xref),
        }
    }

    /// Handle a trigger with a guard of its own.
    pub async fn handle(&self, trigger: &Trigger) -> EventSyncResult<SyncOutcome> {
        let mut guard = SyncGuard::new();
        self.handle_with(trigger, &mut guard).await
    }

    /// Handle a trigger raised on behalf of another one, sharing its guard.
    pub async fn handle_with(&self, trigger: &Trigger, guard: &mut SyncGuard) -> EventSyncResult<SyncOutcome> {
        let origin = trigger.origin();
        tracing::debug!(
            %origin,
            towards = %origin.opposite(),
            kind = %trigger.kind(),
            guard_spent = guard.is_spent(),
            "handling trigger"
        );

        match trigger {
            Trigger::LocalSaved { record, is_new: true } => self.to_remote.create(record, guard).await,
            Trigger::LocalSaved { record, .. } => self.to_remote.update(record, guard).await,
            Trigger::LocalDeleted(record) => self.to_remote.delete(record).await,
            Trigger::RemoteSaved { event, is_new: true } => self.to_local.create(event, guard).await,
            Trigger::RemoteSaved { event, .. } => self.to_local.update(event, guard).await,
            Trigger::RemoteDeleted(event) => self.to_local.delete(event).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{LocalId, RemoteId};
    use crate::memory::{MemoryCrossReferenceLog, MemoryLocalStore, MemoryRemoteStore};
    use crate::remote::{ApiGateway, RemoteAction};
    use serde_json::json;

    fn mapping() -> FieldMapping {
        FieldMapping::new("event", "field_event_id", "custom_10")
    }

    #[test]
    fn test_trigger_origin_and_kind() {
        let record = LocalRecord::new("event");
        let saved = Trigger::LocalSaved {
            record: record.clone(),
            is_new: true,
        };
        assert_eq!(saved.origin(), Origin::Local);
        assert_eq!(saved.kind(), SyncKind::Create);

        let deleted = Trigger::RemoteDeleted(RemoteEvent::new(RemoteId(1), ""));
        assert_eq!(deleted.origin(), Origin::Remote);
        assert_eq!(deleted.kind(), SyncKind::Delete);
    }

    #[test]
    fn test_directions_consume_their_origin() {
        let remote = ApiGateway::new(MemoryRemoteStore::default());
        let local = MemoryLocalStore::new();
        let xref = MemoryCrossReferenceLog::new();
        let mapping = mapping();
        let sync = EventSync::new(&remote, &local, &mapping, &xref);

        assert_eq!(sync.to_remote.origin(), Origin::Local);
        assert_eq!(sync.to_local.origin(), Origin::Remote);
    }

    #[tokio::test]
    async fn test_write_back_save_does_not_bounce() {
        let remote = ApiGateway::new(MemoryRemoteStore::default());
        let local = MemoryLocalStore::new();
        let xref = MemoryCrossReferenceLog::new();
        let mapping = mapping();
        let sync = EventSync::new(&remote, &local, &mapping, &xref);

        remote.transport().insert(json!({ "id": 42, "title": "Annual Gala" }));
        let event = RemoteEvent::new(RemoteId(42), "Annual Gala");

        let mut guard = SyncGuard::new();
        let outcome = sync
            .handle_with(&Trigger::RemoteSaved { event, is_new: true }, &mut guard)
            .await
            .unwrap();
        let SyncOutcome::Created { local_id, .. } = outcome else {
            panic!("expected creation, got {outcome:?}");
        };

        // The local save is reported as an update trigger sharing the guard.
        let record = local.get(local_id).unwrap();
        let nested = Trigger::LocalSaved {
            record,
            is_new: false,
        };
        let first = sync.handle_with(&nested, &mut guard).await.unwrap();
        let second = sync.handle_with(&nested, &mut guard).await.unwrap();

        assert!(matches!(first, SyncOutcome::Updated { .. }));
        assert_eq!(second, SyncOutcome::Skipped(SkipReason::GuardSpent));
        assert_eq!(remote.transport().creations().len(), 0);
    }

    #[tokio::test]
    async fn test_handle_uses_fresh_guard_per_trigger() {
        let remote = ApiGateway::new(MemoryRemoteStore::default());
        let local = MemoryLocalStore::new();
        let xref = MemoryCrossReferenceLog::new();
        let mapping = mapping();
        let sync = EventSync::new(&remote, &local, &mapping, &xref);

        remote.transport().insert(json!({ "id": 100, "title": "Gala", "custom_10": 7 }));
        let mut record = LocalRecord::new("event");
        record.assign_id(LocalId(7));
        record.set("title", "Gala");
        let trigger = Trigger::LocalSaved {
            record,
            is_new: false,
        };

        for _ in 0..3 {
            let outcome = sync.handle(&trigger).await.unwrap();
            assert!(matches!(outcome, SyncOutcome::Updated { .. }));
        }
        assert_eq!(remote.transport().updates().len(), 3);
    }

    #[tokio::test]
    async fn test_round_trip_through_both_directions() {
        let remote = ApiGateway::new(MemoryRemoteStore::default());
        let local = MemoryLocalStore::new();
        let xref = MemoryCrossReferenceLog::new();
        let mapping = mapping();
        let sync = EventSync::new(&remote, &local, &mapping, &xref);

        let mut record = LocalRecord::new("event");
        record.set("title", "Board Meeting");
        let local_id = local.insert(record);
        let record = local.get(local_id).unwrap();

        let created = sync
            .handle(&Trigger::LocalSaved { record, is_new: true })
            .await
            .unwrap();
        let SyncOutcome::Created { remote_id, .. } = created else {
            panic!("expected creation, got {created:?}");
        };

        // The remote store echoes the creation back as a remote trigger.
        let values = remote.transport().record(remote_id).unwrap();
        let event = RemoteEvent::from_values(&values).unwrap();
        let echoed = sync
            .handle(&Trigger::RemoteSaved { event, is_new: true })
            .await
            .unwrap();

        assert_eq!(
            echoed,
            SyncOutcome::Updated {
                local_id,
                remote_id
            }
        );
        assert_eq!(local.len(), 1);
        assert_eq!(remote.transport().len(), 1);

        let deleted = sync
            .handle(&Trigger::RemoteDeleted(RemoteEvent::new(remote_id, "")))
            .await
            .unwrap();
        assert_eq!(deleted, SyncOutcome::Deleted { count: 1 });
        assert!(local.is_empty());
        assert_eq!(remote.transport().call_count(RemoteAction::Delete), 0);
    }
}
