//! CLI `reset` command: delete every stored session after user confirmation.

use anyhow::{bail, Result};
use std::io::Write;

use recall::RecallConfig;

/// Delete all sessions after user confirmation.
pub async fn reset(config: &RecallConfig) -> Result<()> {
    let root = config.resolved_root_dir();

    println!("WARNING: This will permanently delete ALL stored conversation history.");
    println!("Storage root: {}", root.display());
    print!("\nType YES to confirm: ");
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;

    if input.trim() != "YES" {
        bail!("reset cancelled");
    }

    let manager = recall::SessionMemoryManager::from_config(config)?;
    manager.clear_all().await;

    println!("All sessions deleted. Storage reset complete.");
    Ok(())
}
