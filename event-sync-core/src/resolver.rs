//! Identity resolution between the two stores.
//!
//! Two existence checks are kept on purpose. The remote store exposes the
//! back-reference as a queryable custom attribute, while the local store can
//! only query its own cross-reference field efficiently, so each direction
//! asks the store that can answer cheaply.

use serde_json::Value;

use crate::config::FieldMapping;
use crate::error::EventSyncResult;
use crate::event::{LocalId, RemoteEvent, RemoteId, value_is_truthy};
use crate::local::LocalStore;
use crate::remote::{Params, RemoteAction, RemoteGateway, result_values};

pub struct IdentityResolver<'a, R: ?Sized, L: ?Sized> {
    remote: &'a R,
    local: &'a L,
    mapping: &'a FieldMapping,
}

// Only references inside, so copies are free regardless of R and L.
impl<R: ?Sized, L: ?Sized> Clone for IdentityResolver<'_, R, L> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R: ?Sized, L: ?Sized> Copy for IdentityResolver<'_, R, L> {}

impl<'a, R, L> IdentityResolver<'a, R, L>
where
    R: RemoteGateway + ?Sized,
    L: LocalStore + ?Sized,
{
    pub fn new(remote: &'a R, local: &'a L, mapping: &'a FieldMapping) -> Self {
        IdentityResolver {
            remote,
            local,
            mapping,
        }
    }

    pub fn remote(&self) -> &'a R {
        self.remote
    }

    pub fn local(&self) -> &'a L {
        self.local
    }

    pub fn mapping(&self) -> &'a FieldMapping {
        self.mapping
    }

    /// Remote records whose cross-reference attribute equals `local_id`.
    /// Empty means the record does not exist remotely (or the lookup failed).
    pub async fn find_remote_by_local_id(&self, local_id: LocalId) -> Vec<RemoteEvent> {
        let mut params = Params::new();
        params.insert(
            self.mapping.remote_cross_reference_field.clone(),
            local_id.to_value(),
        );

        let result = self
            .remote
            .invoke(&self.mapping.remote_entity, RemoteAction::Get, params)
            .await;

        result_values(&result)
            .into_iter()
            .filter_map(RemoteEvent::from_values)
            .collect()
    }

    /// Local records of the configured kind whose cross-reference field
    /// equals `remote_id`.
    pub fn find_local_by_remote_id(&self, remote_id: RemoteId) -> EventSyncResult<Vec<LocalId>> {
        self.local.query(
            &self.mapping.local_content_kind,
            &self.mapping.local_cross_reference_field,
            &remote_id.to_value(),
        )
    }

    /// The local id stored on the remote record itself.
    pub async fn remote_counterpart_id(&self, remote_id: RemoteId) -> Option<LocalId> {
        let field = &self.mapping.remote_cross_reference_field;
        let record = self.get_single(remote_id, field).await;
        record.get(field).and_then(LocalId::from_value)
    }

    /// Whether the remote record is a template.
    ///
    /// A failed lookup counts as a template: when the flag cannot be read the
    /// record is left alone rather than risk materializing a template.
    pub async fn is_template(&self, remote_id: RemoteId) -> bool {
        let record = self.get_single(remote_id, "is_template").await;
        if record.is_empty() {
            tracing::warn!(%remote_id, "could not read template flag, treating as template");
            return true;
        }
        record.get("is_template").is_some_and(value_is_truthy)
    }

    async fn get_single(&self, remote_id: RemoteId, field: &str) -> Params {
        let mut params = Params::new();
        params.insert("id".into(), remote_id.to_value());
        params.insert("return".into(), Value::from(vec![field.to_string()]));

        self.remote
            .invoke(&self.mapping.remote_entity, RemoteAction::GetSingle, params)
            .await
    }
}
