//! On-disk persistence for session indexes.
//!
//! Layout is one directory per session under the storage root:
//! `<root>/<session_id>/index.db`. Every save writes a complete snapshot to a
//! temporary file next to the index and renames it into place, so readers only
//! ever see a whole index.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection};
use serde::Serialize;

use crate::memory::index::{IndexEntry, SimilarityIndex};
use crate::memory::types::Role;

const INDEX_FILE: &str = "index.db";
const SNAPSHOT_FILE: &str = "index.db.tmp";

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("no stored index for session {0}")]
    NotFound(String),
    #[error("invalid session id {0:?}")]
    InvalidSessionId(String),
    #[error("stored index has {found} dimensions, expected {expected}")]
    DimensionMismatch { found: usize, expected: usize },
    #[error("corrupt index: {0}")]
    Corrupt(String),
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Save/load capability for per-session indexes.
///
/// Methods block on disk I/O; async callers run them via
/// `tokio::task::spawn_blocking`.
pub trait PersistenceLayer: Send + Sync {
    fn save(&self, session_id: &str, index: &SimilarityIndex) -> Result<(), PersistError>;

    /// Returns [`PersistError::NotFound`] when nothing is stored for the session.
    fn load(&self, session_id: &str) -> Result<SimilarityIndex, PersistError>;

    /// Delete everything stored for the session. Returns whether anything existed.
    fn remove(&self, session_id: &str) -> Result<bool, PersistError>;

    /// Delete every session and leave an empty root behind.
    fn clear(&self) -> Result<(), PersistError>;

    /// Session ids that have a directory under the root, sorted.
    fn list_sessions(&self) -> Result<Vec<String>, PersistError>;
}

/// Health summary of one stored index, used by `recall doctor` and `recall inspect`.
#[derive(Debug, Serialize)]
pub struct IndexReport {
    pub session_id: String,
    pub path: PathBuf,
    pub file_size: u64,
    pub schema_version: u32,
    pub embedding_model: Option<String>,
    pub dimensions: Option<usize>,
    pub entry_count: usize,
    pub integrity_ok: bool,
    pub integrity_details: String,
}

/// SQLite-backed [`PersistenceLayer`].
pub struct SqliteSessionStore {
    root: PathBuf,
    embedding_model: String,
    dimensions: usize,
}

impl SqliteSessionStore {
    pub fn new(root: impl Into<PathBuf>, embedding_model: impl Into<String>, dimensions: usize) -> Self {
        Self {
            root: root.into(),
            embedding_model: embedding_model.into(),
            dimensions,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the root directory if it is missing. Safe to race with other callers.
    pub fn ensure_root(&self) -> Result<(), PersistError> {
        std::fs::create_dir_all(&self.root)?;
        Ok(())
    }

    pub fn session_dir(&self, session_id: &str) -> Result<PathBuf, PersistError> {
        if !is_valid_session_id(session_id) {
            return Err(PersistError::InvalidSessionId(session_id.to_string()));
        }
        Ok(self.root.join(session_id))
    }

    pub fn index_path(&self, session_id: &str) -> Result<PathBuf, PersistError> {
        Ok(self.session_dir(session_id)?.join(INDEX_FILE))
    }

    /// Open a stored index without loading its vectors and report on its health.
    pub fn describe(&self, session_id: &str) -> Result<IndexReport, PersistError> {
        let path = self.index_path(session_id)?;
        if !path.is_file() {
            return Err(PersistError::NotFound(session_id.to_string()));
        }
        let file_size = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        let conn = Connection::open(&path)?;

        let integrity_details: String =
            conn.query_row("PRAGMA integrity_check", [], |row| row.get(0))?;
        let schema_version = migrations::get_schema_version(&conn)
            .map_err(|e| PersistError::Corrupt(format!("missing schema_meta: {e}")))?;
        let entry_count: i64 = conn.query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))?;

        Ok(IndexReport {
            session_id: session_id.to_string(),
            path,
            file_size,
            schema_version,
            embedding_model: migrations::get_embedding_model(&conn)?,
            dimensions: migrations::get_dimensions(&conn)?,
            entry_count: usize::try_from(entry_count).unwrap_or(0),
            integrity_ok: integrity_details == "ok",
            integrity_details,
        })
    }

    fn write_snapshot(&self, path: &Path, index: &SimilarityIndex) -> Result<(), PersistError> {
        remove_file_if_exists(path)?;

        let mut conn = Connection::open(path)?;
        schema::init_schema(&conn)?;
        migrations::run_migrations(&mut conn)?;
        migrations::set_embedding_model(&conn, &self.embedding_model)?;
        migrations::set_dimensions(&conn, index.dimensions())?;

        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO entries (id, role, content, embedding) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for entry in index.entries() {
                stmt.execute(params![
                    entry.id,
                    entry.role.as_str(),
                    entry.content,
                    embedding_to_bytes(&entry.embedding),
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}

impl PersistenceLayer for SqliteSessionStore {
    fn save(&self, session_id: &str, index: &SimilarityIndex) -> Result<(), PersistError> {
        let dir = self.session_dir(session_id)?;
        std::fs::create_dir_all(&dir)?;

        let snapshot = dir.join(SNAPSHOT_FILE);
        self.write_snapshot(&snapshot, index)?;
        std::fs::rename(&snapshot, dir.join(INDEX_FILE))?;

        tracing::debug!(
            session_id,
            entries = index.len(),
            dir = %dir.display(),
            "session index saved"
        );
        Ok(())
    }

    fn load(&self, session_id: &str) -> Result<SimilarityIndex, PersistError> {
        let path = self.index_path(session_id)?;
        if !path.is_file() {
            return Err(PersistError::NotFound(session_id.to_string()));
        }

        let mut conn = Connection::open(&path)?;
        migrations::get_schema_version(&conn)
            .map_err(|e| PersistError::Corrupt(format!("{}: {e}", path.display())))?;
        migrations::run_migrations(&mut conn)?;

        if let Some(stored) = migrations::get_embedding_model(&conn)? {
            if stored != self.embedding_model {
                tracing::warn!(
                    session_id,
                    stored = %stored,
                    configured = %self.embedding_model,
                    "session index was built with a different embedding model"
                );
            }
        }

        let found = migrations::get_dimensions(&conn)?.unwrap_or(self.dimensions);
        if found != self.dimensions {
            return Err(PersistError::DimensionMismatch {
                found,
                expected: self.dimensions,
            });
        }

        let rows: Vec<(String, String, String, Vec<u8>)> = {
            let mut stmt =
                conn.prepare("SELECT id, role, content, embedding FROM entries ORDER BY seq")?;
            let collected = stmt
                .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)))?
                .collect::<Result<Vec<_>, _>>()?;
            collected
        };

        let mut entries = Vec::with_capacity(rows.len());
        for (id, role, content, blob) in rows {
            let role: Role = role.parse().map_err(PersistError::Corrupt)?;
            let embedding = bytes_to_embedding(&blob)
                .ok_or_else(|| PersistError::Corrupt(format!("entry {id} has a truncated embedding")))?;
            entries.push(IndexEntry {
                id,
                role,
                content,
                embedding,
            });
        }

        let index = SimilarityIndex::from_entries(self.dimensions, entries)
            .map_err(|e| PersistError::Corrupt(e.to_string()))?;
        tracing::debug!(session_id, entries = index.len(), "session index loaded");
        Ok(index)
    }

    fn remove(&self, session_id: &str) -> Result<bool, PersistError> {
        let dir = self.session_dir(session_id)?;
        match std::fs::remove_dir_all(&dir) {
            Ok(()) => {
                tracing::info!(session_id, dir = %dir.display(), "session storage deleted");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn clear(&self) -> Result<(), PersistError> {
        match std::fs::remove_dir_all(&self.root) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        self.ensure_root()
    }

    fn list_sessions(&self) -> Result<Vec<String>, PersistError> {
        let read_dir = match std::fs::read_dir(&self.root) {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut ids = Vec::new();
        for entry in read_dir {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) if is_valid_session_id(&name) => ids.push(name),
                Ok(name) => tracing::warn!(dir = %name, "skipping directory with unusable session id"),
                Err(name) => tracing::warn!(dir = ?name, "skipping non-UTF-8 session directory"),
            }
        }
        ids.sort();
        Ok(ids)
    }
}

/// A session id must be usable as a single path component.
pub fn is_valid_session_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 255
        && id != "."
        && id != ".."
        && !id.contains(['/', '\\', '\0'])
}

/// Encode an embedding as little-endian f32 bytes.
pub fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|x| x.to_le_bytes()).collect()
}

/// Decode little-endian f32 bytes. `None` if the length is not a multiple of 4.
pub fn bytes_to_embedding(bytes: &[u8]) -> Option<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return None;
    }
    Some(
        bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect(),
    )
}

fn remove_file_if_exists(path: &Path) -> std::io::Result<()> {
    match std::fs::remove_file(path) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}
