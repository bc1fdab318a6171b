//! Provider subprocess transport.
//!
//! Remote calls are executed by an external provider binary
//! (e.g. `event-sync-provider-civicrm`) speaking JSON over stdin/stdout.
//! Providers own authentication and request encoding; this side only
//! forwards `{entity, action, params}` and reads the result back.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command as TokioCommand;
use tokio::time::timeout;

use crate::error::{EventSyncError, EventSyncResult};
use crate::remote::protocol::{Request, Response};
use crate::remote::{Params, RemoteAction, RemoteTransport};

const PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Debug)]
pub struct ProviderTransport {
    name: String,
    binary: Option<PathBuf>,
    timeout: Duration,
}

impl ProviderTransport {
    /// A provider looked up on PATH as `event-sync-provider-{name}`.
    pub fn from_name(name: &str) -> Self {
        ProviderTransport {
            name: name.to_string(),
            binary: None,
            timeout: PROVIDER_TIMEOUT,
        }
    }

    /// A provider at an explicit path.
    pub fn from_binary(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        ProviderTransport {
            name,
            binary: Some(path),
            timeout: PROVIDER_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn binary_path(&self) -> EventSyncResult<PathBuf> {
        if let Some(path) = &self.binary {
            return Ok(path.clone());
        }
        let binary_name = format!("event-sync-provider-{}", self.name);
        which::which(&binary_name).map_err(|_| EventSyncError::ProviderNotInstalled(binary_name))
    }

    async fn call_raw(&self, request: Request) -> EventSyncResult<Params> {
        let request_json = serde_json::to_string(&request)?;
        let binary_path = self.binary_path()?;

        let mut child = TokioCommand::new(&binary_path)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                EventSyncError::Remote(format!("Failed to spawn {}: {}", binary_path.display(), e))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| EventSyncError::Remote("Provider stdin unavailable".into()))?;
        stdin
            .write_all(format!("{request_json}\n").as_bytes())
            .await?;
        drop(stdin);

        let output = child.wait_with_output().await?;

        if !output.status.success() {
            return Err(EventSyncError::Remote(format!(
                "Provider exited with status: {}",
                output.status.code().unwrap_or(-1)
            )));
        }

        let response_str = String::from_utf8_lossy(&output.stdout);
        if response_str.trim().is_empty() {
            return Err(EventSyncError::Remote("Provider returned no response".into()));
        }

        let response: Response<Params> = serde_json::from_str(&response_str)
            .map_err(|e| EventSyncError::Remote(format!("Failed to parse response: {}", e)))?;

        match response {
            Response::Success { data } => Ok(data),
            Response::Error { error } => Err(EventSyncError::Remote(error)),
        }
    }
}

#[async_trait]
impl RemoteTransport for ProviderTransport {
    async fn call(
        &self,
        entity: &str,
        action: RemoteAction,
        params: Params,
    ) -> EventSyncResult<Params> {
        let request = Request {
            entity: entity.to_string(),
            action,
            params,
        };
        tracing::debug!(provider = %self.name, entity, %action, "calling provider");

        timeout(self.timeout, self.call_raw(request))
            .await
            .map_err(|_| EventSyncError::ProviderTimeout(self.timeout.as_secs()))?
    }
}
