//! CLI `store` command: feed a JSON turn list into a session.

use std::path::Path;

use anyhow::Result;

use recall::RecallConfig;

pub async fn store(config: &RecallConfig, session_id: &str, file: &Path) -> Result<()> {
    let turns = super::read_turns(file)?;
    let manager = recall::SessionMemoryManager::from_config(config)?;

    manager.store(session_id, &turns).await;

    match manager.get_session_info(session_id).await {
        Some(info) => println!(
            "Stored {} turn(s) in {session_id}; index now holds {}.",
            turns.len(),
            info.indexed_turns
        ),
        None => println!("Nothing to store."),
    }
    Ok(())
}
