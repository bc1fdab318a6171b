//! File-backed local content store.
//!
//! Layout: one JSON document per record at `{root}/{kind}/{id}.json`.
//! Ids are unique across kinds and never reused: the last id handed out is
//! kept in `{root}/.next_id`.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::{EventSyncError, EventSyncResult};
use crate::event::LocalId;
use crate::local::{LocalRecord, LocalStore, field_matches};

const ID_MARK_FILE: &str = ".next_id";

pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FileStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn kind_dir(&self, kind: &str) -> PathBuf {
        self.root.join(kind)
    }

    fn record_path(&self, kind: &str, id: LocalId) -> PathBuf {
        self.kind_dir(kind).join(format!("{id}.json"))
    }

    fn kind_dirs(&self) -> EventSyncResult<Vec<PathBuf>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut dirs = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.is_dir() {
                dirs.push(path);
            }
        }
        Ok(dirs)
    }

    /// All record files as (id, path) pairs within one kind directory.
    fn records_in(dir: &Path) -> EventSyncResult<Vec<(LocalId, PathBuf)>> {
        let mut records = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().is_none_or(|e| e != "json") {
                continue;
            }
            let id = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<u64>().ok());
            if let Some(id) = id {
                records.push((LocalId(id), path));
            }
        }
        records.sort_by_key(|(id, _)| *id);
        Ok(records)
    }

    fn find_path(&self, id: LocalId) -> EventSyncResult<Option<PathBuf>> {
        for dir in self.kind_dirs()? {
            let path = dir.join(format!("{id}.json"));
            if path.exists() {
                return Ok(Some(path));
            }
        }
        Ok(None)
    }

    fn last_issued_id(&self) -> EventSyncResult<u64> {
        let path = self.root.join(ID_MARK_FILE);
        match std::fs::read_to_string(&path) {
            Ok(contents) => contents.trim().parse().map_err(|e| {
                EventSyncError::LocalStore(format!("Invalid id mark in {}: {}", path.display(), e))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    /// One past the highest id ever issued, including deleted records.
    /// Stores created before the mark existed fall back to scanning.
    fn next_id(&self) -> EventSyncResult<LocalId> {
        let mut max = self.last_issued_id()?;
        for dir in self.kind_dirs()? {
            for (id, _) in Self::records_in(&dir)? {
                max = max.max(id.0);
            }
        }
        let id = LocalId(max + 1);
        Self::write_atomic(&self.root.join(ID_MARK_FILE), &id.to_string())?;
        Ok(id)
    }

    fn read(path: &Path) -> EventSyncResult<LocalRecord> {
        let contents = std::fs::read_to_string(path)?;
        serde_json::from_str(&contents).map_err(|e| {
            EventSyncError::LocalStore(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    fn write(path: &Path, record: &LocalRecord) -> EventSyncResult<()> {
        let contents = serde_json::to_string_pretty(record)?;
        Self::write_atomic(path, &contents)
    }

    /// Write via temp file + rename so a crash never leaves half a file.
    fn write_atomic(path: &Path, contents: &str) -> EventSyncResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut temp_path = path.as_os_str().to_owned();
        temp_path.push(".tmp");
        std::fs::write(&temp_path, contents)?;
        std::fs::rename(&temp_path, path)?;
        Ok(())
    }
}

impl LocalStore for FileStore {
    fn load(&self, id: LocalId) -> EventSyncResult<Option<LocalRecord>> {
        match self.find_path(id)? {
            Some(path) => Ok(Some(Self::read(&path)?)),
            None => Ok(None),
        }
    }

    fn query(&self, kind: &str, field: &str, value: &Value) -> EventSyncResult<Vec<LocalId>> {
        let dir = self.kind_dir(kind);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut ids = Vec::new();
        for (id, path) in Self::records_in(&dir)? {
            let record = Self::read(&path)?;
            if field_matches(record.get(field), value) {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    fn save(&self, record: &mut LocalRecord) -> EventSyncResult<LocalId> {
        if record.kind().trim().is_empty() {
            return Err(EventSyncError::LocalStore("record kind must not be empty".into()));
        }

        let id = match record.id() {
            Some(id) => id,
            None => {
                let id = self.next_id()?;
                record.assign_id(id);
                id
            }
        };

        Self::write(&self.record_path(record.kind(), id), record)?;
        tracing::debug!(%id, kind = record.kind(), "saved local record");
        Ok(id)
    }

    fn delete(&self, ids: &[LocalId]) -> EventSyncResult<()> {
        for id in ids {
            if let Some(path) = self.find_path(*id)? {
                std::fs::remove_file(&path).map_err(|e| {
                    EventSyncError::LocalStore(format!(
                        "Failed to delete {}: {}",
                        path.display(),
                        e
                    ))
                })?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_save_assigns_sequential_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        let mut first = store.create("event");
        first.set("title", "First");
        let mut second = store.create("page");
        second.set("title", "Second");

        assert_eq!(store.save(&mut first).unwrap(), LocalId(1));
        assert_eq!(store.save(&mut second).unwrap(), LocalId(2));
        assert_eq!(first.id(), Some(LocalId(1)));
        assert!(dir.path().join("event/1.json").exists());
        assert!(dir.path().join("page/2.json").exists());
    }

    #[test]
    fn test_load_round_trips_fields() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        let mut record = store.create("event");
        record.set("title", "Annual Gala");
        record.set("field_event_id", 42);
        let id = store.save(&mut record).unwrap();

        let loaded = store.load(id).unwrap().unwrap();
        assert_eq!(loaded, record);
        assert!(store.load(LocalId(99)).unwrap().is_none());
    }

    #[test]
    fn test_resave_keeps_id() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        let mut record = store.create("event");
        let id = store.save(&mut record).unwrap();
        record.set("title", "Renamed");
        assert_eq!(store.save(&mut record).unwrap(), id);
        assert_eq!(
            store.load(id).unwrap().unwrap().get_str("title"),
            Some("Renamed")
        );
    }

    #[test]
    fn test_query_filters_by_kind_and_field() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        for (kind, reference) in [("event", "42"), ("event", "43"), ("page", "42")] {
            let mut record = store.create(kind);
            record.set("field_event_id", reference);
            store.save(&mut record).unwrap();
        }

        let ids = store
            .query("event", "field_event_id", &json!(42))
            .unwrap();
        assert_eq!(ids, vec![LocalId(1)]);
        assert!(store.query("session", "field_event_id", &json!(42)).unwrap().is_empty());
    }

    #[test]
    fn test_delete_removes_records() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        let mut a = store.create("event");
        let mut b = store.create("event");
        let a_id = store.save(&mut a).unwrap();
        let b_id = store.save(&mut b).unwrap();

        store.delete(&[a_id, LocalId(77)]).unwrap();
        assert!(store.load(a_id).unwrap().is_none());
        assert!(store.load(b_id).unwrap().is_some());
    }

    #[test]
    fn test_deleted_ids_are_not_reused() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        let mut first = store.create("event");
        let first_id = store.save(&mut first).unwrap();
        store.delete(&[first_id]).unwrap();

        let mut second = store.create("event");
        let second_id = store.save(&mut second).unwrap();
        assert_eq!(first_id, LocalId(1));
        assert_eq!(second_id, LocalId(2));

        store.delete(&[second_id]).unwrap();
        let reopened = FileStore::new(dir.path());
        let mut third = reopened.create("event");
        assert_eq!(reopened.save(&mut third).unwrap(), LocalId(3));
        assert_eq!(
            std::fs::read_to_string(dir.path().join(".next_id")).unwrap(),
            "3"
        );
    }

    #[test]
    fn test_id_mark_never_runs_behind_existing_records() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("event")).unwrap();
        std::fs::write(dir.path().join("event/5.json"), r#"{"kind":"event","id":5}"#).unwrap();
        std::fs::write(dir.path().join(".next_id"), "2").unwrap();

        let store = FileStore::new(dir.path());
        let mut record = store.create("event");
        assert_eq!(store.save(&mut record).unwrap(), LocalId(6));
    }

    #[test]
    fn test_corrupt_record_is_a_store_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("event")).unwrap();
        std::fs::write(dir.path().join("event/3.json"), "{ not json").unwrap();

        let store = FileStore::new(dir.path());
        let err = store.load(LocalId(3)).unwrap_err();
        assert!(matches!(err, EventSyncError::LocalStore(_)));
    }
}
