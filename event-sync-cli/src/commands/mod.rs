pub mod config;
pub mod local;
pub mod remote;
pub mod xref;

use std::path::{Path, PathBuf};

use anyhow::Result;
use event_sync_core::{
    ApiGateway, EventSync, FileStore, JsonlCrossReferenceLog, ProviderTransport, SyncConfig,
    SyncOutcome, Trigger,
};

use crate::render::Render;

/// Path of the config file in use.
pub fn config_path(path: Option<&Path>) -> Result<PathBuf> {
    match path {
        Some(path) => Ok(path.to_path_buf()),
        None => Ok(SyncConfig::config_path()?),
    }
}

pub fn load_config(path: Option<&Path>) -> Result<SyncConfig> {
    Ok(SyncConfig::load_from(&config_path(path)?)?)
}

/// The stores a trigger runs against, built from the config file.
pub struct Context {
    pub config: SyncConfig,
    pub local: FileStore,
    pub remote: ApiGateway<ProviderTransport>,
    pub xref: JsonlCrossReferenceLog,
}

impl Context {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = load_config(path)?;

        let Some(provider) = config.provider.as_deref() else {
            anyhow::bail!(
                "No remote provider configured.\n\n\
                Set one in {}:\n  \
                provider = \"civicrm\"",
                config_path(path)?.display()
            );
        };

        Ok(Context {
            local: FileStore::new(config.local_dir()),
            remote: ApiGateway::new(ProviderTransport::from_name(provider)),
            xref: JsonlCrossReferenceLog::new(config.xref_log()),
            config,
        })
    }

    /// Handle one trigger and print what happened to the other store.
    pub async fn run(&self, trigger: Trigger) -> Result<SyncOutcome> {
        let sync = EventSync::new(&self.remote, &self.local, &self.config.mapping, &self.xref);

        let outcome = sync.handle(&trigger).await?;
        println!("{}", outcome.render());
        Ok(outcome)
    }
}
