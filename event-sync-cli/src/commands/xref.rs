use std::path::Path;

use anyhow::Result;
use event_sync_core::{JsonlCrossReferenceLog, Origin};
use owo_colors::OwoColorize;

use super::load_config;
use crate::render::Render;

pub fn run(config: Option<&Path>, side: &str, id: u64) -> Result<()> {
    let side: Origin = side.parse()?;
    let config = load_config(config)?;
    let log = JsonlCrossReferenceLog::new(config.xref_log());

    let entries = log.lookup(side, id)?;
    if entries.is_empty() {
        println!("{}", format!("No links recorded for {side} #{id}").dimmed());
        return Ok(());
    }

    for entry in &entries {
        println!("{}", entry.render());
    }

    Ok(())
}
