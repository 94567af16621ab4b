use anyhow::Result;

use recall::RecallConfig;

/// Run a similarity search against one session from the terminal.
pub async fn search(
    config: &RecallConfig,
    session_id: &str,
    query: &str,
    k: Option<usize>,
) -> Result<()> {
    let manager = recall::SessionMemoryManager::from_config(config)?;
    let k = k.unwrap_or(config.limits.retrieve_k);

    let results = manager.retrieve(session_id, query, k).await;
    if results.is_empty() {
        println!("No results found.");
        return Ok(());
    }

    println!("Top {} match(es) in {session_id}:\n", results.len());
    for (i, text) in results.iter().enumerate() {
        println!("  {}. {}", i + 1, super::preview(text, 160));
    }

    Ok(())
}
