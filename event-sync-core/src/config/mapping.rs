//! Field mapping between the two stores.

use serde::{Deserialize, Serialize};

use crate::error::{EventSyncError, EventSyncResult};

fn default_remote_entity() -> String {
    "Event".to_string()
}

fn default_remote_event_type() -> String {
    "Conference".to_string()
}

fn default_title_field() -> String {
    "title".to_string()
}

/// Which local content kind and which fields on either side carry the
/// cross-reference ids.
///
/// Resolved once per orchestrator construction and read-only afterwards.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FieldMapping {
    /// Local content kind that holds synced events (e.g. `event`).
    pub local_content_kind: String,

    /// Local field storing the remote id.
    pub local_cross_reference_field: String,

    /// Remote attribute storing the local id (e.g. `custom_10`).
    pub remote_cross_reference_field: String,

    #[serde(default = "default_remote_entity")]
    pub remote_entity: String,

    /// Event type sent with every remote create.
    #[serde(default = "default_remote_event_type")]
    pub remote_event_type: String,

    #[serde(default = "default_title_field")]
    pub local_title_field: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_start_field: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_end_field: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_description_field: Option<String>,

    /// Also push the local schedule on remote updates. Off by default so a
    /// stale local value never overwrites the richer remote schedule.
    #[serde(default)]
    pub push_schedule_on_update: bool,
}

impl FieldMapping {
    pub fn new(
        local_content_kind: impl Into<String>,
        local_cross_reference_field: impl Into<String>,
        remote_cross_reference_field: impl Into<String>,
    ) -> Self {
        FieldMapping {
            local_content_kind: local_content_kind.into(),
            local_cross_reference_field: local_cross_reference_field.into(),
            remote_cross_reference_field: remote_cross_reference_field.into(),
            remote_entity: default_remote_entity(),
            remote_event_type: default_remote_event_type(),
            local_title_field: default_title_field(),
            local_start_field: None,
            local_end_field: None,
            local_description_field: None,
            push_schedule_on_update: false,
        }
    }

    pub fn with_schedule_fields(
        mut self,
        start: impl Into<String>,
        end: impl Into<String>,
    ) -> Self {
        self.local_start_field = Some(start.into());
        self.local_end_field = Some(end.into());
        self
    }

    pub fn with_description_field(mut self, field: impl Into<String>) -> Self {
        self.local_description_field = Some(field.into());
        self
    }

    pub fn validate(&self) -> EventSyncResult<()> {
        let required = [
            ("local_content_kind", &self.local_content_kind),
            ("local_cross_reference_field", &self.local_cross_reference_field),
            ("remote_cross_reference_field", &self.remote_cross_reference_field),
            ("remote_entity", &self.remote_entity),
            ("local_title_field", &self.local_title_field),
        ];

        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(EventSyncError::Config(format!(
                    "mapping.{name} must not be empty"
                )));
            }
        }

        if self.local_cross_reference_field == self.local_title_field {
            return Err(EventSyncError::Config(
                "mapping.local_cross_reference_field must differ from the title field".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_toml() {
        let mapping: FieldMapping = toml::from_str(
            r#"
            local_content_kind = "event"
            local_cross_reference_field = "field_event_id"
            remote_cross_reference_field = "custom_10"
            "#,
        )
        .unwrap();

        assert_eq!(mapping.remote_entity, "Event");
        assert_eq!(mapping.remote_event_type, "Conference");
        assert_eq!(mapping.local_title_field, "title");
        assert!(!mapping.push_schedule_on_update);
        assert!(mapping.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_fields() {
        let mapping = FieldMapping::new("event", "", "custom_10");
        let err = mapping.validate().unwrap_err();
        assert!(err.to_string().contains("local_cross_reference_field"));

        let mapping = FieldMapping::new("event", "field_event_id", "  ");
        assert!(mapping.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_title_as_reference() {
        let mapping = FieldMapping::new("event", "title", "custom_10");
        assert!(mapping.validate().is_err());
    }
}
