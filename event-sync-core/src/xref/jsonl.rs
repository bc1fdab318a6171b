//! JSON-lines cross-reference log: one entry per line, append only.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::EventSyncResult;
use crate::origin::Origin;
use crate::xref::{CrossReferenceEntry, CrossReferenceLog};

pub struct JsonlCrossReferenceLog {
    path: PathBuf,
}

impl JsonlCrossReferenceLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonlCrossReferenceLog { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn try_append(&self, entry: &CrossReferenceEntry) -> EventSyncResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let line = serde_json::to_string(entry)?;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{line}")?;
        Ok(())
    }

    /// Entries referencing `id` on the given side, oldest first.
    /// Unreadable lines are skipped with a warning.
    pub fn lookup(&self, side: Origin, id: u64) -> EventSyncResult<Vec<CrossReferenceEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let contents = std::fs::read_to_string(&self.path)?;

        let entries = contents
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .filter_map(|(n, line)| match serde_json::from_str::<CrossReferenceEntry>(line) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!(path = %self.path.display(), line = n + 1, error = %e, "skipping unreadable cross-reference entry");
                    None
                }
            })
            .filter(|entry| entry.references(side, id))
            .collect();

        Ok(entries)
    }
}

impl CrossReferenceLog for JsonlCrossReferenceLog {
    fn append(&self, entry: CrossReferenceEntry) {
        if let Err(e) = self.try_append(&entry) {
            tracing::error!(
                path = %self.path.display(),
                local_id = %entry.local_id,
                remote_id = %entry.remote_id,
                error = %e,
                "failed to record cross-reference"
            );
        }
    }
}
