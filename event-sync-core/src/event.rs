//! Event types shared by both sides of the sync.
//!
//! An Event exists in two physical shapes: a [`LocalRecord`] in the content
//! store and a [`RemoteEvent`] in the CRM. Each side stores the other side's
//! id in a configurable cross-reference field.
//!
//! [`LocalRecord`]: crate::local::LocalRecord

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::remote::Params;

/// Date format used by the remote store (`2025-03-20 15:00:00`).
pub const REMOTE_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Date format used by local schedule fields (`2025-03-20T15:00:00`).
pub const LOCAL_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const ACCEPTED_DATE_FORMATS: &[&str] = &[
    REMOTE_DATE_FORMAT,
    LOCAL_DATE_FORMAT,
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y%m%d%H%M%S",
];

macro_rules! store_id {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Read an id out of a loosely typed field value.
            ///
            /// Missing, null, empty, zero and unparsable values all mean
            /// "no id".
            pub fn from_value(value: &Value) -> Option<Self> {
                let id = match value {
                    Value::Number(n) => n.as_u64()?,
                    Value::String(s) => s.trim().parse::<u64>().ok()?,
                    _ => return None,
                };
                (id > 0).then_some($name(id))
            }

            pub fn to_value(self) -> Value {
                Value::from(self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                $name(id)
            }
        }
    };
}

store_id!(LocalId, "Identifier assigned by the local content store.");
store_id!(RemoteId, "Identifier assigned by the remote CRM store.");

/// Optional start and end of an event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schedule {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

impl Schedule {
    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Parse a date in any of the formats either store is known to emit.
    pub fn parse_date(raw: &str) -> Option<NaiveDateTime> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        ACCEPTED_DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    }

    /// Parse a date field, logging and dropping anything unparsable.
    fn parse_field(event_id: &Value, field: &str, value: Option<&Value>) -> Option<NaiveDateTime> {
        let raw = value?.as_str()?;
        let parsed = Self::parse_date(raw);
        if parsed.is_none() && !raw.trim().is_empty() {
            tracing::warn!(remote_id = %event_id, field, raw, "dropping unparsable date");
        }
        parsed
    }

    pub fn format_local(date: &NaiveDateTime) -> String {
        date.format(LOCAL_DATE_FORMAT).to_string()
    }

    pub fn format_remote(date: &NaiveDateTime) -> String {
        date.format(REMOTE_DATE_FORMAT).to_string()
    }
}

/// A canonical Event entity as held by the remote CRM store.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteEvent {
    pub id: RemoteId,
    pub title: String,
    pub schedule: Schedule,
    pub description: Option<String>,
    /// Templates are boilerplate records and are never synced locally.
    pub is_template: bool,
    /// Everything else on the record, custom attributes included.
    pub attributes: Params,
}

impl RemoteEvent {
    pub fn new(id: RemoteId, title: impl Into<String>) -> Self {
        RemoteEvent {
            id,
            title: title.into(),
            schedule: Schedule::default(),
            description: None,
            is_template: false,
            attributes: Params::new(),
        }
    }

    /// Build an event from a raw remote record. Returns `None` when the
    /// record carries no usable id.
    pub fn from_values(values: &Params) -> Option<Self> {
        let raw_id = values.get("id")?;
        let id = RemoteId::from_value(raw_id)?;

        let title = values
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let schedule = Schedule {
            start: Schedule::parse_field(raw_id, "start_date", values.get("start_date")),
            end: Schedule::parse_field(raw_id, "end_date", values.get("end_date")),
        };

        let description = values
            .get("description")
            .and_then(Value::as_str)
            .filter(|d| !d.is_empty())
            .map(str::to_string);

        let is_template = values.get("is_template").is_some_and(value_is_truthy);

        let attributes = values
            .iter()
            .filter(|(k, _)| {
                !matches!(
                    k.as_str(),
                    "id" | "title" | "start_date" | "end_date" | "description" | "is_template"
                )
            })
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Some(RemoteEvent {
            id,
            title,
            schedule,
            description,
            is_template,
            attributes,
        })
    }
}

impl fmt::Display for RemoteEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (#{})", self.title, self.id)
    }
}

/// Interpret the loosely typed booleans the remote store returns
/// (`1`, `"1"`, `true`, `"true"`).
pub fn value_is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_i64().is_some_and(|n| n != 0),
        Value::String(s) => matches!(s.trim(), "1" | "true" | "TRUE" | "yes"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Params {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_id_from_value() {
        assert_eq!(LocalId::from_value(&json!(7)), Some(LocalId(7)));
        assert_eq!(LocalId::from_value(&json!("7")), Some(LocalId(7)));
        assert_eq!(LocalId::from_value(&json!(" 12 ")), Some(LocalId(12)));
        assert_eq!(LocalId::from_value(&json!(0)), None);
        assert_eq!(LocalId::from_value(&json!("")), None);
        assert_eq!(LocalId::from_value(&json!(null)), None);
        assert_eq!(RemoteId::from_value(&json!("abc")), None);
        assert_eq!(RemoteId::from_value(&json!(-3)), None);
    }

    #[test]
    fn test_remote_event_from_values() {
        let values = params(json!({
            "id": "42",
            "title": "Annual Gala",
            "start_date": "2025-06-01 19:00:00",
            "end_date": "2025-06-01 23:30:00",
            "description": "<p>Black tie</p>",
            "is_template": "0",
            "custom_10": "7",
        }));

        let event = RemoteEvent::from_values(&values).unwrap();
        assert_eq!(event.id, RemoteId(42));
        assert_eq!(event.title, "Annual Gala");
        assert!(!event.is_template);
        assert_eq!(event.description.as_deref(), Some("<p>Black tie</p>"));
        assert_eq!(
            event.schedule.start.map(|d| Schedule::format_local(&d)),
            Some("2025-06-01T19:00:00".to_string())
        );
        assert_eq!(event.attributes["custom_10"], "7");
        assert!(!event.attributes.contains_key("title"));
    }

    #[test]
    fn test_remote_event_without_id_is_rejected() {
        let values = params(json!({ "title": "No id" }));
        assert!(RemoteEvent::from_values(&values).is_none());
    }

    #[test]
    fn test_unparsable_dates_are_dropped() {
        let values = params(json!({
            "id": 1,
            "title": "Broken",
            "start_date": "next tuesday",
        }));
        let event = RemoteEvent::from_values(&values).unwrap();
        assert!(event.schedule.is_empty());
    }

    #[test]
    fn test_value_is_truthy() {
        assert!(value_is_truthy(&json!(1)));
        assert!(value_is_truthy(&json!("1")));
        assert!(value_is_truthy(&json!(true)));
        assert!(!value_is_truthy(&json!(0)));
        assert!(!value_is_truthy(&json!("0")));
        assert!(!value_is_truthy(&json!(null)));
    }
}
