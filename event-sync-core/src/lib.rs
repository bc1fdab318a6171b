//! Bidirectional event sync between a local content store and a remote CRM.
//!
//! A change on either side arrives as a [`Trigger`]. [`EventSync`] routes it
//! to one of two [`SyncDirection`]s, which create, update or delete the
//! counterpart on the other store and keep the two sides linked through a
//! pair of cross-reference fields.
//!
//! - `remote` talks to the CRM through a [`RemoteGateway`] that never fails
//! - `local` is the content store, whose errors propagate
//! - `xref` is the append-only audit trail of created links
//! - `memory` holds in-memory stores for tests and dry runs

pub mod config;
pub mod error;
pub mod event;
pub mod guard;
pub mod local;
pub mod memory;
pub mod origin;
pub mod remote;
pub mod resolver;
pub mod sync;
pub mod xref;

pub use config::{FieldMapping, SyncConfig};
pub use error::{EventSyncError, EventSyncResult};
pub use event::{LocalId, RemoteEvent, RemoteId, Schedule};
pub use guard::SyncGuard;
pub use local::{FileStore, LocalRecord, LocalStore};
pub use origin::Origin;
pub use remote::{ApiGateway, ProviderTransport, RemoteGateway, RemoteTransport};
pub use resolver::IdentityResolver;
pub use sync::{EventSync, SkipReason, SyncDirection, SyncKind, SyncOutcome, Trigger};
pub use xref::{CrossReferenceEntry, CrossReferenceLog, JsonlCrossReferenceLog};
