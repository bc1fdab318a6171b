use std::path::Path;

use anyhow::Result;
use event_sync_core::{EventSyncError, LocalId, LocalRecord, LocalStore, Trigger};

use super::Context;

fn load_record(ctx: &Context, id: LocalId) -> Result<LocalRecord> {
    ctx.local
        .load(id)?
        .ok_or_else(|| EventSyncError::RecordNotFound(format!("#{id}")).into())
}

pub async fn saved(config: Option<&Path>, id: u64, is_new: bool) -> Result<()> {
    let ctx = Context::load(config)?;
    let record = load_record(&ctx, LocalId(id))?;

    ctx.run(Trigger::LocalSaved { record, is_new }).await?;
    Ok(())
}

pub async fn deleted(config: Option<&Path>, id: u64) -> Result<()> {
    let ctx = Context::load(config)?;
    let id = LocalId(id);
    let record = load_record(&ctx, id)?;

    // The record is still needed to find its counterpart, so it goes last.
    ctx.run(Trigger::LocalDeleted(record)).await?;
    ctx.local.delete(&[id])?;
    Ok(())
}
