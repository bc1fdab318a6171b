//! Remote CRM store access.
//!
//! Two layers:
//! - [`RemoteTransport`]: a fallible call against the CRM (subprocess
//!   provider, in-memory store, ...).
//! - [`RemoteGateway`]: the never-failing contract the sync engine uses.
//!   [`ApiGateway`] adapts any transport by logging failures and returning
//!   an empty result.

pub mod protocol;
pub mod provider;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::EventSyncResult;
use crate::event::{RemoteId, value_is_truthy};

pub use provider::ProviderTransport;

/// Parameters and results exchanged with the remote store.
pub type Params = serde_json::Map<String, Value>;

/// Actions understood by the remote store. Updates are a `Create` carrying
/// an `id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteAction {
    Get,
    GetSingle,
    Create,
    Delete,
}

impl RemoteAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemoteAction::Get => "get",
            RemoteAction::GetSingle => "getsingle",
            RemoteAction::Create => "create",
            RemoteAction::Delete => "delete",
        }
    }
}

impl fmt::Display for RemoteAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fallible call against the remote store.
#[async_trait]
pub trait RemoteTransport: Send + Sync {
    async fn call(
        &self,
        entity: &str,
        action: RemoteAction,
        params: Params,
    ) -> EventSyncResult<Params>;
}

/// The gateway contract used by the sync engine.
///
/// Never fails: an empty result means the action did not succeed, and every
/// caller checks for the keys it expects before acting on a result.
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    async fn invoke(&self, entity: &str, action: RemoteAction, params: Params) -> Params;
}

/// Wraps a [`RemoteTransport`], absorbing and logging its failures.
pub struct ApiGateway<T> {
    transport: T,
}

impl<T: RemoteTransport> ApiGateway<T> {
    pub fn new(transport: T) -> Self {
        ApiGateway { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

#[async_trait]
impl<T: RemoteTransport> RemoteGateway for ApiGateway<T> {
    async fn invoke(&self, entity: &str, action: RemoteAction, params: Params) -> Params {
        match self.transport.call(entity, action, params).await {
            Ok(result) if reports_error(&result) => {
                let error_message = result
                    .get("error_message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown error");
                tracing::error!(entity, %action, error_message, "remote call reported an error");
                Params::new()
            }
            Ok(result) => result,
            Err(e) => {
                tracing::error!(entity, %action, error = %e, "remote call failed");
                Params::new()
            }
        }
    }
}

fn reports_error(result: &Params) -> bool {
    result.get("is_error").is_some_and(value_is_truthy)
}

/// True when a result is non-empty and does not flag an error.
pub fn succeeded(result: &Params) -> bool {
    !result.is_empty() && !reports_error(result)
}

/// The `id` of the record a create action produced.
pub fn created_id(result: &Params) -> Option<RemoteId> {
    result.get("id").and_then(RemoteId::from_value)
}

/// The records of a `get` result. The store returns `values` either as a
/// list or as an object keyed by id; both are accepted.
pub fn result_values(result: &Params) -> Vec<&Params> {
    match result.get("values") {
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_object).collect(),
        Some(Value::Object(by_id)) => by_id.values().filter_map(Value::as_object).collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EventSyncError;
    use serde_json::json;

    struct FixedTransport(EventSyncResult<Value>);

    #[async_trait]
    impl RemoteTransport for FixedTransport {
        async fn call(&self, _: &str, _: RemoteAction, _: Params) -> EventSyncResult<Params> {
            match &self.0 {
                Ok(Value::Object(map)) => Ok(map.clone()),
                Ok(_) => Ok(Params::new()),
                Err(e) => Err(EventSyncError::Remote(e.to_string())),
            }
        }
    }

    #[tokio::test]
    async fn test_gateway_passes_through_success() {
        let gateway = ApiGateway::new(FixedTransport(Ok(json!({ "is_error": 0, "id": 9 }))));
        let result = gateway
            .invoke("Event", RemoteAction::Create, Params::new())
            .await;
        assert!(succeeded(&result));
        assert_eq!(created_id(&result), Some(RemoteId(9)));
    }

    #[tokio::test]
    async fn test_gateway_absorbs_transport_errors() {
        let gateway =
            ApiGateway::new(FixedTransport(Err(EventSyncError::Remote("auth".into()))));
        let result = gateway.invoke("Event", RemoteAction::Get, Params::new()).await;
        assert!(result.is_empty());
        assert!(!succeeded(&result));
    }

    #[tokio::test]
    async fn test_gateway_absorbs_reported_errors() {
        let gateway = ApiGateway::new(FixedTransport(Ok(json!({
            "is_error": 1,
            "error_message": "Mandatory key(s) missing",
        }))));
        let result = gateway
            .invoke("Event", RemoteAction::Create, Params::new())
            .await;
        assert!(result.is_empty());
    }

    #[test]
    fn test_result_values_accepts_list_and_map() {
        let list = json!({ "values": [{ "id": 1 }, { "id": 2 }] });
        let by_id = json!({ "values": { "1": { "id": 1 } } });
        assert_eq!(result_values(list.as_object().unwrap()).len(), 2);
        assert_eq!(result_values(by_id.as_object().unwrap()).len(), 1);
        assert!(result_values(&Params::new()).is_empty());
    }

    #[test]
    fn test_action_wire_names() {
        assert_eq!(
            serde_json::to_string(&RemoteAction::GetSingle).unwrap(),
            "\"getsingle\""
        );
        assert_eq!(RemoteAction::Delete.to_string(), "delete");
    }
}
