//! Which side of the sync initiated a change.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EventSyncError;

/// The store a change originated from.
///
/// Parsed once at the boundary from the tags external callers use; anything
/// unrecognised is rejected rather than routed to a default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// The local content store.
    Local,
    /// The remote CRM store.
    Remote,
}

impl Origin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Origin::Local => "local",
            Origin::Remote => "remote",
        }
    }

    pub fn opposite(&self) -> Origin {
        match self {
            Origin::Local => Origin::Remote,
            Origin::Remote => Origin::Local,
        }
    }
}

impl FromStr for Origin {
    type Err = EventSyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "drupal" | "nid" => Ok(Origin::Local),
            "remote" | "civicrm" | "cid" => Ok(Origin::Remote),
            _ => Err(EventSyncError::UnknownOrigin(s.to_string())),
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        for tag in ["local", "Drupal", "NID", " nid "] {
            assert_eq!(tag.parse::<Origin>().unwrap(), Origin::Local, "{tag}");
        }
        for tag in ["remote", "CiviCRM", "cid"] {
            assert_eq!(tag.parse::<Origin>().unwrap(), Origin::Remote, "{tag}");
        }
    }

    #[test]
    fn test_unknown_tag_fails_closed() {
        let err = "node".parse::<Origin>().unwrap_err();
        assert!(matches!(err, EventSyncError::UnknownOrigin(tag) if tag == "node"));
        assert!("".parse::<Origin>().is_err());
    }

    #[test]
    fn test_serde_uses_canonical_names() {
        assert_eq!(serde_json::to_string(&Origin::Remote).unwrap(), "\"remote\"");
        let parsed: Origin = serde_json::from_str("\"local\"").unwrap();
        assert_eq!(parsed, Origin::Local);
    }
}
