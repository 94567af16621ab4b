//! CLI `inspect` command: show one session's index file and its stored turns.

use anyhow::{Context, Result};

use recall::db::PersistenceLayer;
use recall::RecallConfig;

/// Print index-file details and every stored turn for a session.
pub fn inspect(config: &RecallConfig, session_id: &str, json: bool) -> Result<()> {
    let store = super::open_store(config);
    let report = store
        .describe(session_id)
        .with_context(|| format!("cannot inspect session {session_id}"))?;
    let index = store.load(session_id)?;

    if json {
        let out = serde_json::json!({
            "report": report,
            "entries": index.entries(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("Session: {session_id}");
    println!("{}", "=".repeat(50));
    println!("  Index file:      {}", report.path.display());
    println!("  File size:       {}", super::format_bytes(report.file_size));
    println!("  Schema version:  {}", report.schema_version);
    println!(
        "  Embedding model: {}",
        report.embedding_model.as_deref().unwrap_or("(not set)")
    );
    println!("  Dimensions:      {}", index.dimensions());
    println!("  Entries:         {}", index.len());
    println!();
    println!("Turns:");
    for (i, entry) in index.entries().iter().enumerate() {
        println!(
            "  {:>3}. [{}] {}",
            i + 1,
            entry.role,
            super::preview(&entry.content, 100)
        );
    }

    Ok(())
}
