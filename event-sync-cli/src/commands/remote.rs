use std::path::Path;

use anyhow::{Context as _, Result};
use event_sync_core::{RemoteEvent, RemoteId, Trigger};
use serde_json::Value;

use super::Context;

/// Read a remote event from a JSON file holding its values.
fn read_payload(path: &Path) -> Result<RemoteEvent> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Could not read payload {}", path.display()))?;

    let Value::Object(values) = serde_json::from_str(&contents)? else {
        anyhow::bail!("Payload {} is not a JSON object", path.display());
    };

    RemoteEvent::from_values(&values)
        .with_context(|| format!("Payload {} has no usable id", path.display()))
}

pub async fn saved(config: Option<&Path>, payload: &Path, is_new: bool) -> Result<()> {
    let event = read_payload(payload)?;
    let ctx = Context::load(config)?;

    ctx.run(Trigger::RemoteSaved { event, is_new }).await?;
    Ok(())
}

pub async fn deleted(config: Option<&Path>, id: u64) -> Result<()> {
    let ctx = Context::load(config)?;

    ctx.run(Trigger::RemoteDeleted(RemoteEvent::new(RemoteId(id), "")))
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_payload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("event.json");
        std::fs::write(
            &path,
            r#"{"id": "42", "title": "Annual Gala", "start_date": "2025-06-01 19:00:00"}"#,
        )
        .unwrap();

        let event = read_payload(&path).unwrap();
        assert_eq!(event.id, RemoteId(42));
        assert_eq!(event.title, "Annual Gala");
        assert!(event.schedule.start.is_some());
    }

    #[test]
    fn test_read_payload_rejects_bad_input() {
        let dir = tempfile::tempdir().unwrap();

        let list = dir.path().join("list.json");
        std::fs::write(&list, "[1, 2]").unwrap();
        assert!(read_payload(&list).is_err());

        let no_id = dir.path().join("no_id.json");
        std::fs::write(&no_id, r#"{"title": "Orphan"}"#).unwrap();
        assert!(read_payload(&no_id).is_err());

        assert!(read_payload(&dir.path().join("missing.json")).is_err());
    }
}
