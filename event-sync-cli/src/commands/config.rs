use std::path::Path;

use anyhow::Result;
use owo_colors::OwoColorize;

use super::{config_path, load_config};

pub fn run(path: Option<&Path>) -> Result<()> {
    let config_path = config_path(path)?;
    let config = load_config(path)?;

    println!("{}", "Paths".bold());
    println!("  Config:     {}", config_path.display());
    println!("  Content:    {}", config.local_dir().display());
    println!("  Xref log:   {}", config.xref_log().display());
    println!(
        "  Provider:   {}",
        config
            .provider
            .as_deref()
            .map(|p| format!("event-sync-provider-{p}"))
            .unwrap_or_else(|| "(none)".dimmed().to_string())
    );

    println!();
    println!("{}", "Resolved".bold());
    for line in config.to_toml()?.lines() {
        println!("  {line}");
    }

    Ok(())
}
