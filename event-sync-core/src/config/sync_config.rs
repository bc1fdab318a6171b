//! Global event sync configuration.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::config::FieldMapping;
use crate::error::{EventSyncError, EventSyncResult};

static DEFAULT_LOCAL_DIR: &str = "~/event-sync/content";
static DEFAULT_XREF_LOG: &str = "~/event-sync/xref.jsonl";

fn default_local_dir() -> PathBuf {
    PathBuf::from(DEFAULT_LOCAL_DIR)
}

fn default_xref_log() -> PathBuf {
    PathBuf::from(DEFAULT_XREF_LOG)
}

fn expand(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned())
}

/// Configuration at ~/.config/event-sync/config.toml
///
/// Every key can be overridden from the environment, e.g.
/// `EVENT_SYNC_PROVIDER=civicrm` or
/// `EVENT_SYNC_MAPPING__LOCAL_CONTENT_KIND=event`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SyncConfig {
    /// Root of the file-backed local content store.
    #[serde(default = "default_local_dir")]
    pub local_dir: PathBuf,

    /// Remote provider name; resolved to `event-sync-provider-{name}` on PATH.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    /// Append-only cross-reference audit log.
    #[serde(default = "default_xref_log")]
    pub xref_log: PathBuf,

    pub mapping: FieldMapping,
}

impl SyncConfig {
    pub fn config_path() -> EventSyncResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| EventSyncError::Config("Could not determine config directory".into()))?
            .join("event-sync");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from the default location, writing a starter file on first run.
    pub fn load() -> EventSyncResult<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> EventSyncResult<Self> {
        if !path.exists() {
            Self::create_default_config(path)?;
        }

        let config: SyncConfig = Config::builder()
            .add_source(File::from(path.to_path_buf()).required(false))
            .add_source(
                Environment::with_prefix("EVENT_SYNC")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| EventSyncError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| EventSyncError::Config(e.to_string()))?;

        config.mapping.validate()?;
        Ok(config)
    }

    /// Local store root with `~` expanded.
    pub fn local_dir(&self) -> PathBuf {
        expand(&self.local_dir)
    }

    /// Audit log path with `~` expanded.
    pub fn xref_log(&self) -> PathBuf {
        expand(&self.xref_log)
    }

    /// The resolved configuration as TOML, environment overrides included.
    pub fn to_toml(&self) -> EventSyncResult<String> {
        toml::to_string_pretty(self).map_err(|e| EventSyncError::Serialization(e.to_string()))
    }

    /// Create a starter config file. The mapping is filled in with the
    /// common field names; everything else is commented out.
    pub fn create_default_config(path: &Path) -> EventSyncResult<()> {
        let contents = format!(
            "\
# event-sync configuration

# Where the local content store keeps its records:
# local_dir = \"{}\"

# Remote provider binary (event-sync-provider-<name> on PATH):
# provider = \"civicrm\"

# Cross-reference audit log:
# xref_log = \"{}\"

[mapping]
local_content_kind = \"event\"
local_cross_reference_field = \"field_event_id\"
remote_cross_reference_field = \"custom_10\"
# remote_entity = \"Event\"
# remote_event_type = \"Conference\"
# local_title_field = \"title\"
# local_start_field = \"field_start_date\"
# local_end_field = \"field_end_date\"
# local_description_field = \"body\"
# push_schedule_on_update = false
",
            DEFAULT_LOCAL_DIR, DEFAULT_XREF_LOG
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                EventSyncError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| EventSyncError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_load_writes_default_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");

        let config = SyncConfig::load_from(&path).unwrap();

        assert!(path.exists());
        assert_eq!(config.mapping.local_content_kind, "event");
        assert_eq!(config.mapping.remote_cross_reference_field, "custom_10");
        assert_eq!(config.local_dir, PathBuf::from(DEFAULT_LOCAL_DIR));
        assert!(config.provider.is_none());
    }

    #[test]
    fn test_load_custom_mapping() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
provider = "civicrm"
local_dir = "/srv/content"

[mapping]
local_content_kind = "session"
local_cross_reference_field = "field_crm_id"
remote_cross_reference_field = "custom_22"
local_start_field = "field_start"
local_end_field = "field_end"
push_schedule_on_update = true
"#,
        )
        .unwrap();

        let config = SyncConfig::load_from(&path).unwrap();
        assert_eq!(config.provider.as_deref(), Some("civicrm"));
        assert_eq!(config.local_dir(), PathBuf::from("/srv/content"));
        assert_eq!(config.mapping.local_content_kind, "session");
        assert_eq!(config.mapping.local_start_field.as_deref(), Some("field_start"));
        assert!(config.mapping.push_schedule_on_update);
    }

    #[test]
    fn test_invalid_mapping_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[mapping]
local_content_kind = ""
local_cross_reference_field = "field_event_id"
remote_cross_reference_field = "custom_10"
"#,
        )
        .unwrap();

        let err = SyncConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, EventSyncError::Config(_)));
    }

    #[test]
    fn test_paths_expand_tilde() {
        let config = SyncConfig {
            local_dir: default_local_dir(),
            provider: None,
            xref_log: default_xref_log(),
            mapping: FieldMapping::new("event", "field_event_id", "custom_10"),
        };
        assert!(config.xref_log().ends_with("event-sync/xref.jsonl"));
        if std::env::var_os("HOME").is_some() {
            assert!(!config.local_dir().to_string_lossy().starts_with('~'));
        }
    }

    #[test]
    fn test_to_toml_round_trips() {
        let config = SyncConfig {
            local_dir: PathBuf::from("/srv/content"),
            provider: Some("civicrm".into()),
            xref_log: default_xref_log(),
            mapping: FieldMapping::new("event", "field_event_id", "custom_10"),
        };

        let rendered = config.to_toml().unwrap();
        assert!(rendered.contains("[mapping]"));

        let parsed: SyncConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.provider.as_deref(), Some("civicrm"));
        assert_eq!(parsed.mapping, config.mapping);
    }
}
