//! CLI `doctor` command: check the storage root and every index file in it.

use anyhow::Result;

use recall::db::PersistenceLayer;
use recall::RecallConfig;

/// Run storage diagnostics and print a health report.
pub fn doctor(config: &RecallConfig) -> Result<()> {
    let root = config.resolved_root_dir();

    println!("Recall Health Report");
    println!("====================");
    println!();
    println!("Storage root:      {}", root.display());
    println!(
        "Embedding:         {} / {} ({} dims)",
        config.embedding.provider, config.embedding.model, config.embedding.dimensions
    );
    if config.embedding.provider == "openai" && config.embedding.api_key.is_none() {
        println!("  WARNING: no API key set (embedding.api_key or RECALL_EMBEDDING_API_KEY)");
    }
    println!();

    if !root.exists() {
        println!("Storage root does not exist yet. It is created on first store.");
        return Ok(());
    }

    let store = super::open_store(config);
    let ids = store.list_sessions()?;
    println!("Sessions:          {}", ids.len());
    println!();

    let mut problems = 0;
    let mut total_size = 0;
    for id in &ids {
        match store.describe(id) {
            Ok(report) => {
                total_size += report.file_size;
                let mut notes = Vec::new();
                if !report.integrity_ok {
                    notes.push(format!("integrity FAILED ({})", report.integrity_details));
                }
                if report.dimensions.is_some_and(|d| d != config.embedding.dimensions) {
                    notes.push(format!(
                        "dimensions {} != configured {}",
                        report.dimensions.unwrap_or_default(),
                        config.embedding.dimensions
                    ));
                }
                if report
                    .embedding_model
                    .as_deref()
                    .is_some_and(|m| m != config.embedding.model)
                {
                    notes.push("built with a different embedding model".to_string());
                }

                if notes.is_empty() {
                    println!("  {id}: OK ({} entries)", report.entry_count);
                } else {
                    problems += 1;
                    println!("  {id}: {}", notes.join("; "));
                }
            }
            Err(e) => {
                problems += 1;
                println!("  {id}: unreadable ({e})");
            }
        }
    }

    println!();
    println!("Total index size:  {}", super::format_bytes(total_size));
    if problems == 0 {
        println!("Status:            PASSED");
    } else {
        println!("Status:            {problems} session(s) need attention");
        println!();
        println!("Recovery: delete the affected session with `recall remove <id>`;");
        println!("it is rebuilt from the next full history stored for it.");
    }

    Ok(())
}
