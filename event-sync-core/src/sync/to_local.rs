//! Remote change -> local store.

use async_trait::async_trait;

use crate::error::EventSyncResult;
use crate::event::{LocalId, RemoteEvent, Schedule};
use crate::guard::SyncGuard;
use crate::local::{LocalRecord, LocalStore};
use crate::origin::Origin;
use crate::remote::{Params, RemoteAction, RemoteGateway, succeeded};
use crate::resolver::IdentityResolver;
use crate::sync::{SkipReason, SyncDirection, SyncOutcome};
use crate::xref::{CrossReferenceEntry, CrossReferenceLog};

/// Materializes remote events as local records.
pub struct ToLocal<'a, R: ?Sized, L: ?Sized> {
    resolver: IdentityResolver<'a, R, L>,
    xref: &'a dyn CrossReferenceLog,
}

impl<'a, R, L> ToLocal<'a, R, L>
where
    R: RemoteGateway + ?Sized,
    L: LocalStore + ?Sized,
{
    pub fn new(resolver: IdentityResolver<'a, R, L>, xref: &'a dyn CrossReferenceLog) -> Self {
        ToLocal { resolver, xref }
    }

    /// Copy title, schedule and description from the remote event.
    /// Schedule and description values the event lacks are left as they are.
    fn apply(&self, record: &mut LocalRecord, event: &RemoteEvent) {
        let mapping = self.resolver.mapping();

        record.set(&mapping.local_title_field, event.title.as_str());

        let dates = [
            (mapping.local_start_field.as_deref(), event.schedule.start),
            (mapping.local_end_field.as_deref(), event.schedule.end),
        ];
        for (field, date) in dates {
            if let (Some(field), Some(date)) = (field, date) {
                record.set(field, Schedule::format_local(&date));
            }
        }

        if let (Some(field), Some(description)) =
            (mapping.local_description_field.as_deref(), &event.description)
        {
            record.set(field, description.as_str());
        }
    }

    async fn upsert(&self, event: &RemoteEvent, guard: &mut SyncGuard) -> EventSyncResult<SyncOutcome> {
        let remote_id = event.id;

        if event.is_template || self.resolver.is_template(remote_id).await {
            tracing::debug!(%remote_id, "remote record is a template, not syncing");
            return Ok(SyncOutcome::Skipped(SkipReason::Template));
        }

        let counterpart = match self.resolver.remote_counterpart_id(remote_id).await {
            Some(local_id) => Some(local_id),
            // The write-back may have failed on an earlier trigger, in which
            // case only the local side knows about the link.
            None => self
                .resolver
                .find_local_by_remote_id(remote_id)?
                .first()
                .copied(),
        };

        match counterpart {
            None => self.create_local(event).await,
            Some(local_id) => self.update_local(event, local_id, guard).await,
        }
    }

    async fn create_local(&self, event: &RemoteEvent) -> EventSyncResult<SyncOutcome> {
        let mapping = self.resolver.mapping();
        let remote_id = event.id;

        let mut record = self.resolver.local().create(&mapping.local_content_kind);
        self.apply(&mut record, event);
        record.set(&mapping.local_cross_reference_field, remote_id.to_value());
        record.set_published(false);

        let local_id = self.resolver.local().save(&mut record)?;

        let mut params = Params::new();
        params.insert("id".into(), remote_id.to_value());
        params.insert(
            mapping.remote_cross_reference_field.clone(),
            local_id.to_value(),
        );
        let result = self
            .resolver
            .remote()
            .invoke(&mapping.remote_entity, RemoteAction::Create, params)
            .await;
        if !succeeded(&result) {
            tracing::warn!(%local_id, %remote_id, "could not write local id back to remote event");
        }

        self.xref
            .append(CrossReferenceEntry::new(local_id, remote_id, Origin::Remote));
        tracing::info!(%local_id, %remote_id, "created local record");

        Ok(SyncOutcome::Created {
            local_id,
            remote_id,
        })
    }

    async fn update_local(
        &self,
        event: &RemoteEvent,
        local_id: LocalId,
        guard: &mut SyncGuard,
    ) -> EventSyncResult<SyncOutcome> {
        let remote_id = event.id;

        if !guard.try_consume() {
            tracing::debug!(%local_id, %remote_id, "update already propagated, skipping");
            return Ok(SyncOutcome::Skipped(SkipReason::GuardSpent));
        }

        let Some(mut record) = self.resolver.local().load(local_id)? else {
            tracing::warn!(%local_id, %remote_id, "remote event points at a missing local record, recreating");
            return self.create_local(event).await;
        };

        self.apply(&mut record, event);
        self.resolver.local().save(&mut record)?;

        tracing::info!(%local_id, %remote_id, "updated local record");
        Ok(SyncOutcome::Updated {
            local_id,
            remote_id,
        })
    }
}

#[async_trait]
impl<R, L> SyncDirection for ToLocal<'_, R, L>
where
    R: RemoteGateway + ?Sized,
    L: LocalStore + ?Sized,
{
    type Source = RemoteEvent;

    fn origin(&self) -> Origin {
        Origin::Remote
    }

    async fn create(&self, event: &RemoteEvent, guard: &mut SyncGuard) -> EventSyncResult<SyncOutcome> {
        self.upsert(event, guard).await
    }

    async fn update(&self, event: &RemoteEvent, guard: &mut SyncGuard) -> EventSyncResult<SyncOutcome> {
        self.upsert(event, guard).await
    }

    async fn delete(&self, event: &RemoteEvent) -> EventSyncResult<SyncOutcome> {
        let remote_id = event.id;
        let ids = self.resolver.find_local_by_remote_id(remote_id)?;
        if ids.is_empty() {
            tracing::debug!(%remote_id, "deleted remote event has no local counterpart");
            return Ok(SyncOutcome::Skipped(SkipReason::NoCounterpart));
        }

        self.resolver.local().delete(&ids)?;
        tracing::info!(%remote_id, count = ids.len(), "deleted local records");
        Ok(SyncOutcome::Deleted { count: ids.len() })
    }
}
