use anyhow::{bail, Result};

use recall::db::is_valid_session_id;
use recall::RecallConfig;

/// Delete one session from memory and disk.
pub async fn remove(config: &RecallConfig, session_id: &str) -> Result<()> {
    if !is_valid_session_id(session_id) {
        bail!("invalid session id {session_id:?}");
    }
    let dir = config.resolved_root_dir().join(session_id);
    let existed = dir.exists();

    let manager = recall::SessionMemoryManager::from_config(config)?;
    manager.remove_session(session_id).await;

    if existed {
        println!("Removed session {session_id} ({})", dir.display());
    } else {
        println!("No stored session {session_id}");
    }
    Ok(())
}
