//! Error types for the event sync engine.

use thiserror::Error;

/// Errors that can occur in event sync operations.
///
/// Remote failures only surface here from a [`RemoteTransport`]; the
/// [`ApiGateway`] absorbs them before they reach the orchestrators.
///
/// [`RemoteTransport`]: crate::remote::RemoteTransport
/// [`ApiGateway`]: crate::remote::ApiGateway
#[derive(Error, Debug)]
pub enum EventSyncError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Local store error: {0}")]
    LocalStore(String),

    #[error("Local record not found: {0}")]
    RecordNotFound(String),

    #[error("Local record of kind '{0}' has not been saved yet")]
    UnsavedRecord(String),

    #[error("Remote error: {0}")]
    Remote(String),

    #[error("Provider '{0}' not found in PATH")]
    ProviderNotInstalled(String),

    #[error("Provider request timed out after {0}s")]
    ProviderTimeout(u64),

    #[error("Unknown origin '{0}' (expected local/drupal/nid or remote/civicrm/cid)")]
    UnknownOrigin(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for EventSyncError {
    fn from(e: serde_json::Error) -> Self {
        EventSyncError::Serialization(e.to_string())
    }
}

/// Result type alias for event sync operations.
pub type EventSyncResult<T> = Result<T, EventSyncError>;
