//! Colored terminal rendering for sync results.

use event_sync_core::{CrossReferenceEntry, Origin, SyncKind, SyncOutcome};
use owo_colors::OwoColorize;

pub trait Render {
    fn render(&self) -> String;
}

impl Render for SyncKind {
    fn render(&self) -> String {
        let symbol = self.symbol();
        match self {
            SyncKind::Create => symbol.green().to_string(),
            SyncKind::Update => symbol.yellow().to_string(),
            SyncKind::Delete => symbol.red().to_string(),
        }
    }
}

impl Render for SyncOutcome {
    fn render(&self) -> String {
        match self {
            SyncOutcome::Created {
                local_id,
                remote_id,
            }
            | SyncOutcome::Updated {
                local_id,
                remote_id,
            } => {
                let kind = self.kind().map(|k| k.render()).unwrap_or_default();
                format!("{kind} local #{local_id} <-> remote #{remote_id}")
            }
            SyncOutcome::Deleted { .. } => {
                let text = self.to_string();
                let rest = text.trim_start_matches("- ");
                format!("{} {}", SyncKind::Delete.render(), rest.red())
            }
            SyncOutcome::Skipped(reason) => format!("skipped: {reason}").dimmed().to_string(),
        }
    }
}

impl Render for Origin {
    fn render(&self) -> String {
        match self {
            Origin::Local => self.as_str().cyan().to_string(),
            Origin::Remote => self.as_str().magenta().to_string(),
        }
    }
}

impl Render for CrossReferenceEntry {
    fn render(&self) -> String {
        format!(
            "local #{} <-> remote #{}  {} {}",
            self.local_id,
            self.remote_id,
            self.origin.render(),
            self.recorded_at
                .format("%Y-%m-%d %H:%M:%S UTC")
                .to_string()
                .dimmed()
        )
    }
}
