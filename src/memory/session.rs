//! Per-session state slot.
//!
//! Everything the manager knows about one session lives in a [`SessionState`]
//! behind that session's own async mutex: the similarity index, the metadata
//! record, and the cached raw turn list.

use chrono::{DateTime, Utc};

use super::index::SimilarityIndex;
use super::types::{SessionInfo, Turn};

/// Creation/access bookkeeping for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionMetadata {
    pub created_at: DateTime<Utc>,
    pub last_accessed: DateTime<Utc>,
    pub message_count: u64,
}

impl SessionMetadata {
    /// A fresh record with no stores counted, as created by a disk load.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            created_at: now,
            last_accessed: now,
            message_count: 0,
        }
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_accessed = now;
    }

    pub fn record_store(&mut self, now: DateTime<Utc>) {
        self.last_accessed = now;
        self.message_count += 1;
    }

    /// Whole days elapsed since the last access, rounded down.
    pub fn idle_days(&self, now: DateTime<Utc>) -> i64 {
        (now - self.last_accessed).num_days()
    }
}

#[derive(Debug, Default)]
pub struct SessionState {
    pub index: Option<SimilarityIndex>,
    pub metadata: Option<SessionMetadata>,
    pub cache: Option<Vec<Turn>>,
    /// The in-memory index has changes the last save did not write.
    pub dirty: bool,
    /// Set once the slot has been removed from the session table. A caller that
    /// acquires a retired slot must look the session up again.
    pub retired: bool,
}

impl SessionState {
    pub fn is_empty(&self) -> bool {
        self.index.is_none() && self.metadata.is_none() && self.cache.is_none()
    }

    pub fn clear(&mut self) {
        self.index = None;
        self.metadata = None;
        self.cache = None;
        self.dirty = false;
    }

    /// Mark an access without counting a store, starting a record if needed.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        match self.metadata.as_mut() {
            Some(meta) => meta.touch(now),
            None => self.metadata = Some(SessionMetadata::new(now)),
        }
    }

    /// Count a store: start a record on first use, bump it afterwards.
    pub fn record_store(&mut self, now: DateTime<Utc>) {
        match self.metadata.as_mut() {
            Some(meta) => meta.record_store(now),
            None => {
                let mut meta = SessionMetadata::new(now);
                meta.message_count = 1;
                self.metadata = Some(meta);
            }
        }
    }

    pub fn info(&self, session_id: &str) -> Option<SessionInfo> {
        self.metadata.as_ref().map(|meta| SessionInfo {
            session_id: session_id.to_string(),
            created_at: meta.created_at,
            last_accessed: meta.last_accessed,
            message_count: meta.message_count,
            indexed_turns: self.index.as_ref().map_or(0, SimilarityIndex::len),
            cached_turns: self.cache.as_ref().map(Vec::len),
        })
    }
}
