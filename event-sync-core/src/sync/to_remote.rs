//! Local change -> remote store.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{EventSyncError, EventSyncResult};
use crate::event::{LocalId, RemoteId, Schedule};
use crate::guard::SyncGuard;
use crate::local::{LocalRecord, LocalStore};
use crate::origin::Origin;
use crate::remote::{Params, RemoteAction, RemoteGateway, created_id, succeeded};
use crate::resolver::IdentityResolver;
use crate::sync::{SkipReason, SyncDirection, SyncOutcome};
use crate::xref::{CrossReferenceEntry, CrossReferenceLog};

/// Propagates saves and deletes of local records to the remote store.
pub struct ToRemote<'a, R: ?Sized, L: ?Sized> {
    resolver: IdentityResolver<'a, R, L>,
    xref: &'a dyn CrossReferenceLog,
}

impl<'a, R, L> ToRemote<'a, R, L>
where
    R: RemoteGateway + ?Sized,
    L: LocalStore + ?Sized,
{
    pub fn new(resolver: IdentityResolver<'a, R, L>, xref: &'a dyn CrossReferenceLog) -> Self {
        ToRemote { resolver, xref }
    }

    fn is_synced_kind(&self, record: &LocalRecord) -> bool {
        record.kind() == self.resolver.mapping().local_content_kind
    }

    /// Title and (optionally) schedule of a local record as remote params.
    fn event_params(&self, record: &LocalRecord, with_schedule: bool) -> Params {
        let mapping = self.resolver.mapping();
        let mut params = Params::new();

        let title = record.get_str(&mapping.local_title_field).unwrap_or_default();
        params.insert("title".into(), Value::from(title));

        if with_schedule {
            let dates = [
                ("start_date", mapping.local_start_field.as_deref()),
                ("end_date", mapping.local_end_field.as_deref()),
            ];
            for (remote_field, local_field) in dates {
                let parsed = local_field
                    .and_then(|f| record.get_str(f))
                    .and_then(Schedule::parse_date);
                if let Some(date) = parsed {
                    params.insert(remote_field.into(), Value::from(Schedule::format_remote(&date)));
                }
            }
        }

        params
    }

    async fn upsert(&self, record: &LocalRecord, guard: &mut SyncGuard) -> EventSyncResult<SyncOutcome> {
        if !self.is_synced_kind(record) {
            tracing::debug!(kind = record.kind(), "ignoring local record of unsynced kind");
            return Ok(SyncOutcome::Skipped(SkipReason::OtherKind));
        }
        let local_id = record
            .id()
            .ok_or_else(|| EventSyncError::UnsavedRecord(record.kind().to_string()))?;

        let (templates, existing): (Vec<_>, Vec<_>) = self
            .resolver
            .find_remote_by_local_id(local_id)
            .await
            .into_iter()
            .partition(|e| e.is_template);
        if existing.len() > 1 {
            let ids: Vec<String> = existing.iter().map(|e| e.id.to_string()).collect();
            tracing::warn!(%local_id, remote_ids = %ids.join(", "), "local record has several remote counterparts, updating the first");
        }

        let counterpart = match existing.first() {
            Some(event) => Some(event.id),
            None if !templates.is_empty() => {
                tracing::debug!(%local_id, remote_id = %templates[0].id, "local record points at a remote template, skipping");
                return Ok(SyncOutcome::Skipped(SkipReason::Template));
            }
            // The record's own cross-reference is the fallback when the remote
            // query finds nothing, so a failed lookup never duplicates a linked
            // event.
            None => match record.remote_reference(&self.resolver.mapping().local_cross_reference_field) {
                Some(remote_id) if self.resolver.is_template(remote_id).await => {
                    tracing::debug!(%local_id, %remote_id, "local reference resolves to a remote template, skipping");
                    return Ok(SyncOutcome::Skipped(SkipReason::Template));
                }
                reference => reference,
            },
        };

        match counterpart {
            None => self.create_remote(record, local_id).await,
            Some(remote_id) => self.update_remote(record, local_id, remote_id, guard).await,
        }
    }

    async fn create_remote(&self, record: &LocalRecord, local_id: LocalId) -> EventSyncResult<SyncOutcome> {
        let mapping = self.resolver.mapping();

        let mut params = self.event_params(record, true);
        params.insert(
            "event_type_id".into(),
            Value::from(mapping.remote_event_type.as_str()),
        );
        params.insert(
            mapping.remote_cross_reference_field.clone(),
            local_id.to_value(),
        );

        let result = self
            .resolver
            .remote()
            .invoke(&mapping.remote_entity, RemoteAction::Create, params)
            .await;

        let Some(remote_id) = created_id(&result) else {
            tracing::warn!(%local_id, "remote create returned no id, nothing linked");
            return Ok(SyncOutcome::Skipped(SkipReason::RemoteFailed));
        };

        let mut linked = record.clone();
        linked.set(&mapping.local_cross_reference_field, remote_id.to_value());
        self.resolver.local().save(&mut linked)?;

        self.xref
            .append(CrossReferenceEntry::new(local_id, remote_id, Origin::Local));
        tracing::info!(%local_id, %remote_id, "created remote event");

        Ok(SyncOutcome::Created {
            local_id,
            remote_id,
        })
    }

    async fn update_remote(
        &self,
        record: &LocalRecord,
        local_id: LocalId,
        remote_id: RemoteId,
        guard: &mut SyncGuard,
    ) -> EventSyncResult<SyncOutcome> {
        if !guard.try_consume() {
            tracing::debug!(%local_id, %remote_id, "update already propagated, skipping");
            return Ok(SyncOutcome::Skipped(SkipReason::GuardSpent));
        }

        let mapping = self.resolver.mapping();
        let mut params = self.event_params(record, mapping.push_schedule_on_update);
        params.insert("id".into(), remote_id.to_value());

        let result = self
            .resolver
            .remote()
            .invoke(&mapping.remote_entity, RemoteAction::Create, params)
            .await;

        if !succeeded(&result) {
            tracing::warn!(%local_id, %remote_id, "remote update did not succeed");
            return Ok(SyncOutcome::Skipped(SkipReason::RemoteFailed));
        }

        tracing::info!(%local_id, %remote_id, "updated remote event");
        Ok(SyncOutcome::Updated {
            local_id,
            remote_id,
        })
    }
}

#[async_trait]
impl<R, L> SyncDirection for ToRemote<'_, R, L>
where
    R: RemoteGateway + ?Sized,
    L: LocalStore + ?Sized,
{
    type Source = LocalRecord;

    fn origin(&self) -> Origin {
        Origin::Local
    }

    async fn create(&self, record: &LocalRecord, guard: &mut SyncGuard) -> EventSyncResult<SyncOutcome> {
        self.upsert(record, guard).await
    }

    async fn update(&self, record: &LocalRecord, guard: &mut SyncGuard) -> EventSyncResult<SyncOutcome> {
        self.upsert(record, guard).await
    }

    async fn delete(&self, record: &LocalRecord) -> EventSyncResult<SyncOutcome> {
        if !self.is_synced_kind(record) {
            return Ok(SyncOutcome::Skipped(SkipReason::OtherKind));
        }

        let mapping = self.resolver.mapping();
        let Some(remote_id) = record.remote_reference(&mapping.local_cross_reference_field) else {
            tracing::debug!(record = %record, "deleted local record was never linked");
            return Ok(SyncOutcome::Skipped(SkipReason::NoCounterpart));
        };

        let mut params = Params::new();
        params.insert("id".into(), remote_id.to_value());
        let result = self
            .resolver
            .remote()
            .invoke(&mapping.remote_entity, RemoteAction::Delete, params)
            .await;

        if !succeeded(&result) {
            tracing::warn!(%remote_id, "remote delete did not succeed");
            return Ok(SyncOutcome::Skipped(SkipReason::RemoteFailed));
        }

        tracing::info!(%remote_id, record = %record, "deleted remote event");
        Ok(SyncOutcome::Deleted { count: 1 })
    }
}
