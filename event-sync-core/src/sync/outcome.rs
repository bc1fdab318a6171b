use std::fmt;

use serde::{Deserialize, Serialize};

use crate::event::{LocalId, RemoteId};

/// What a counterpart change did to the other store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncKind {
    Create,
    Update,
    Delete,
}

impl SyncKind {
    pub fn symbol(&self) -> &'static str {
        match self {
            SyncKind::Create => "+",
            SyncKind::Update => "~",
            SyncKind::Delete => "-",
        }
    }
}

impl fmt::Display for SyncKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Why a trigger left the other store untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// The remote record is a template.
    Template,
    /// This trigger already propagated its one update.
    GuardSpent,
    /// The remote store did not return what the step needed.
    RemoteFailed,
    /// There is no counterpart to delete.
    NoCounterpart,
    /// The local record is not of the synced content kind.
    OtherKind,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            SkipReason::Template => "remote record is a template",
            SkipReason::GuardSpent => "update already propagated for this trigger",
            SkipReason::RemoteFailed => "remote store call did not succeed",
            SkipReason::NoCounterpart => "no counterpart exists",
            SkipReason::OtherKind => "record is not a synced content kind",
        };
        f.write_str(reason)
    }
}

/// Result of handling one trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncOutcome {
    Created { local_id: LocalId, remote_id: RemoteId },
    Updated { local_id: LocalId, remote_id: RemoteId },
    Deleted { count: usize },
    Skipped(SkipReason),
}

impl SyncOutcome {
    pub fn kind(&self) -> Option<SyncKind> {
        match self {
            SyncOutcome::Created { .. } => Some(SyncKind::Create),
            SyncOutcome::Updated { .. } => Some(SyncKind::Update),
            SyncOutcome::Deleted { .. } => Some(SyncKind::Delete),
            SyncOutcome::Skipped(_) => None,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, SyncOutcome::Skipped(_))
    }
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncOutcome::Created {
                local_id,
                remote_id,
            }
            | SyncOutcome::Updated {
                local_id,
                remote_id,
            } => {
                let kind = self.kind().map(|k| k.symbol()).unwrap_or_default();
                write!(f, "{kind} local #{local_id} <-> remote #{remote_id}")
            }
            SyncOutcome::Deleted { count } => {
                let noun = if *count == 1 { "record" } else { "records" };
                write!(f, "- {count} {noun}")
            }
            SyncOutcome::Skipped(reason) => write!(f, "= skipped: {reason}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let created = SyncOutcome::Created {
            local_id: LocalId(5),
            remote_id: RemoteId(42),
        };
        assert_eq!(created.to_string(), "+ local #5 <-> remote #42");
        assert_eq!(SyncOutcome::Deleted { count: 2 }.to_string(), "- 2 records");
        assert_eq!(
            SyncOutcome::Skipped(SkipReason::Template).to_string(),
            "= skipped: remote record is a template"
        );
    }

    #[test]
    fn test_kind() {
        assert_eq!(SyncOutcome::Deleted { count: 0 }.kind(), Some(SyncKind::Delete));
        assert!(SyncOutcome::Skipped(SkipReason::GuardSpent).is_skipped());
        assert_eq!(SyncKind::Update.to_string(), "~");
    }
}
