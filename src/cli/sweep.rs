//! CLI `sweep` command: run one eviction pass over the stored sessions.
//!
//! Sessions loaded from disk start with a fresh access time, so a one-shot sweep
//! only ever evicts for capacity. Age-based eviction needs a long-running process.

use anyhow::Result;

use recall::RecallConfig;

pub async fn sweep(config: &RecallConfig, json: bool) -> Result<()> {
    let manager = super::open_manager(config).await?;
    let report = manager.sweep().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Sweep complete");
    println!("  Expired:        {}", report.expired);
    println!("  Over capacity:  {}", report.over_capacity);
    println!("  Removed:        {}", report.removed.len());
    for id in &report.removed {
        println!("    - {id}");
    }
    Ok(())
}
