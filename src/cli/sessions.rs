use anyhow::Result;

use recall::RecallConfig;

/// List every stored session with its bookkeeping.
pub async fn sessions(config: &RecallConfig) -> Result<()> {
    let manager = super::open_manager(config).await?;
    let ids = manager.list_sessions().await;

    if ids.is_empty() {
        println!("No sessions under {}", config.resolved_root_dir().display());
        return Ok(());
    }

    println!("{:<36}  {:>7}  {:<20}", "SESSION", "TURNS", "LOADED AT");
    for id in &ids {
        if let Some(info) = manager.get_session_info(id).await {
            println!(
                "{:<36}  {:>7}  {:<20}",
                super::preview(id, 33),
                info.indexed_turns,
                info.created_at.format("%Y-%m-%d %H:%M:%S"),
            );
        }
    }
    println!();
    println!("{} session(s)", ids.len());
    Ok(())
}
