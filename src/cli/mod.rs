pub mod doctor;
pub mod inspect;
pub mod remove;
pub mod reset;
pub mod search;
pub mod sessions;
pub mod store;
pub mod sweep;
pub mod trim;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use recall::db::SqliteSessionStore;
use recall::{RecallConfig, SessionMemoryManager, Turn};

/// Manager with every session under the storage root loaded.
pub(crate) async fn open_manager(config: &RecallConfig) -> Result<Arc<SessionMemoryManager>> {
    let manager = SessionMemoryManager::from_config(config)?;
    manager.load_all().await;
    Ok(manager)
}

/// Direct handle on the on-disk store, for commands that read index files
/// without going through a manager.
pub(crate) fn open_store(config: &RecallConfig) -> SqliteSessionStore {
    SqliteSessionStore::new(
        config.resolved_root_dir(),
        config.embedding.model.as_str(),
        config.embedding.dimensions,
    )
}

/// Read a JSON array of `{"role": ..., "content": ...}` objects.
pub(crate) fn read_turns(path: &Path) -> Result<Vec<Turn>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("{} is not a JSON list of turns", path.display()))
}

pub(crate) fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}

pub(crate) fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_counts_characters() {
        assert_eq!(preview("héllo", 10), "héllo");
        assert_eq!(preview("héllo wörld", 5), "héllo...");
    }

    #[test]
    fn format_bytes_picks_unit() {
        assert_eq!(format_bytes(12), "12 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }

    #[test]
    fn read_turns_accepts_role_aliases() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("turns.json");
        std::fs::write(
            &path,
            r#"[{"role":"user","content":"hi"},{"role":"ai","content":"hello"},{"role":"system"}]"#,
        )
        .unwrap();

        let turns = read_turns(&path).unwrap();
        assert_eq!(
            turns,
            vec![Turn::human("hi"), Turn::assistant("hello"), Turn::system("")]
        );
    }
}
