//! Configuration types for event sync.

mod mapping;
mod sync_config;

pub use mapping::FieldMapping;
pub use sync_config::SyncConfig;
