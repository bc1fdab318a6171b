//! Defines the JSON protocol used for communication between event-sync
//! and remote provider binaries over stdin/stdout.
//!
//! One request per process: a single JSON line on stdin, a single JSON
//! response on stdout.

use serde::{Deserialize, Serialize};

use crate::remote::{Params, RemoteAction};

/// Request sent from event-sync to a provider.
#[derive(Debug, Serialize, Deserialize)]
pub struct Request {
    pub entity: String,
    pub action: RemoteAction,
    #[serde(default)]
    pub params: Params,
}

/// Response sent from a provider back to event-sync.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response<T> {
    Success { data: T },
    Error { error: String },
}
