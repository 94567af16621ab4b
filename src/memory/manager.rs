//! Session memory orchestration.
//!
//! [`SessionMemoryManager`] owns every session's state and exposes the store,
//! retrieve, trim, and eviction operations. State is kept in a table of
//! per-session async mutexes. The table lock is only held long enough to look up
//! or insert a slot. Embedding
//! calls run with no lock held; disk I/O runs on the blocking pool while holding
//! only the affected session's lock.
//!
//! Session operations never return errors. Embedding failures degrade to zero
//! vectors and storage failures are logged.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex, PoisonError, RwLock};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::index::SimilarityIndex;
use super::session::{SessionMetadata, SessionState};
use super::trim::trim;
use super::types::{SessionInfo, Turn};
use crate::config::{LimitsConfig, RecallConfig};
use crate::db::{PersistError, PersistenceLayer, SqliteSessionStore};
use crate::embedding::{self, Embedder};

/// Prefix placed before retrieved snippets by [`SessionMemoryManager::format_history_context`].
pub const HISTORY_DELIMITER: &str = "\n\nRelevant conversation history:\n";

type Slot = Arc<Mutex<SessionState>>;

/// Outcome of one eviction sweep.
#[derive(Debug, Default, Serialize)]
pub struct SweepReport {
    /// Sessions idle for longer than `max_age_days`.
    pub expired: usize,
    /// Oldest-accessed sessions beyond `max_sessions`.
    pub over_capacity: usize,
    /// Distinct sessions removed, in removal order.
    pub removed: Vec<String>,
}

pub struct SessionMemoryManager {
    embedder: Embedder,
    persistence: Arc<dyn PersistenceLayer>,
    limits: LimitsConfig,
    sessions: RwLock<HashMap<String, Slot>>,
    loaded: AtomicBool,
    sweeper: StdMutex<Option<JoinHandle<()>>>,
}

impl SessionMemoryManager {
    pub fn new(
        embedder: Embedder,
        persistence: Arc<dyn PersistenceLayer>,
        limits: LimitsConfig,
    ) -> Self {
        Self {
            embedder,
            persistence,
            limits,
            sessions: RwLock::new(HashMap::new()),
            loaded: AtomicBool::new(false),
            sweeper: StdMutex::new(None),
        }
    }

    /// Build the embedding provider and on-disk store described by `config`.
    pub fn from_config(config: &RecallConfig) -> Result<Arc<Self>> {
        config.validate()?;
        let provider = embedding::create_provider(&config.embedding)?;
        let embedder = Embedder::new(provider);

        let root = config.resolved_root_dir();
        let store = SqliteSessionStore::new(
            root.clone(),
            config.embedding.model.as_str(),
            embedder.dimensions(),
        );
        store
            .ensure_root()
            .with_context(|| format!("failed to create storage root {}", root.display()))?;
        tracing::info!(
            root = %root.display(),
            provider = embedder.provider_name(),
            dimensions = embedder.dimensions(),
            "session memory ready"
        );

        Ok(Arc::new(Self::new(embedder, Arc::new(store), config.limits.clone())))
    }

    pub fn limits(&self) -> &LimitsConfig {
        &self.limits
    }

    // ── Store / retrieve ────────────────────────────────────────────────────

    /// Record the full running history of a session.
    ///
    /// Non-empty turns not yet indexed are embedded and added to the session's
    /// index, which is then saved to disk. Turns indexed with a fallback vector
    /// during an embedding outage are embedded again and repaired in place. A save
    /// that failed earlier is retried. The cached turn list is replaced by a copy
    /// of `turns` (empty turns included), and the metadata record is updated.
    pub async fn store(&self, session_id: &str, turns: &[Turn]) {
        if turns.is_empty() {
            return;
        }

        // Phase 1: work out what is new, under the session lock.
        let pending: Vec<&Turn> = {
            let (_slot, mut state) = self.lock_session(session_id).await;
            self.ensure_index_loaded(session_id, &mut state).await;
            match state.index.as_ref() {
                Some(index) => index.missing(turns),
                None => SimilarityIndex::new(self.embedder.dimensions()).missing(turns),
            }
        };

        // Phase 2: embed with no lock held.
        let texts: Vec<String> = pending.iter().map(|t| t.index_text()).collect();
        let vectors = self.embedder.embed_documents(&texts).await;

        // Phase 3: apply, cache, count, persist.
        let (_slot, mut state) = self.lock_session(session_id).await;
        let mut changed = 0;
        if !pending.is_empty() {
            let dimensions = self.embedder.dimensions();
            let index = state
                .index
                .get_or_insert_with(|| SimilarityIndex::new(dimensions));
            match index.add(&pending, vectors) {
                Ok(n) => changed = n,
                Err(e) => {
                    tracing::error!(session_id, error = %e, "failed to index conversation turns");
                }
            }
        }

        state.cache = Some(turns.to_vec());
        state.record_store(Utc::now());

        if changed > 0 || state.dirty {
            if let Some(snapshot) = state.index.clone() {
                state.dirty = !self.persist(session_id, snapshot).await;
            }
        }

        tracing::debug!(
            session_id,
            turns = turns.len(),
            changed,
            indexed = state.index.as_ref().map_or(0, SimilarityIndex::len),
            degraded = state.index.as_ref().map_or(0, SimilarityIndex::degraded_count),
            "conversation history stored"
        );
    }

    /// The `k` stored turns most similar to `query`, most similar first, as
    /// `"{role}:{content}"` strings. Loads the session from disk if needed.
    pub async fn retrieve(&self, session_id: &str, query: &str, k: usize) -> Vec<String> {
        {
            let (slot, mut state) = self.lock_session(session_id).await;
            self.ensure_index_loaded(session_id, &mut state).await;
            if state.index.is_none() {
                self.prune_if_empty(session_id, &slot, &mut state);
                return Vec::new();
            }
            if let Some(meta) = state.metadata.as_mut() {
                meta.touch(Utc::now());
            }
        }

        let query_vector = self.embedder.embed_query(query).await;

        let (_slot, state) = self.lock_session(session_id).await;
        let hits = state
            .index
            .as_ref()
            .map(|index| index.search(&query_vector, k))
            .unwrap_or_default();
        tracing::debug!(session_id, k, hits = hits.len(), "history retrieved");
        hits.into_iter().map(|hit| hit.text).collect()
    }

    /// Retrieved history wrapped for prompt assembly, or `""` when there is none.
    pub async fn format_history_context(&self, session_id: &str, query: &str) -> String {
        let snippets = self.retrieve(session_id, query, self.limits.retrieve_k).await;
        if snippets.is_empty() {
            String::new()
        } else {
            format!("{HISTORY_DELIMITER}{}", snippets.join("\n"))
        }
    }

    // ── Trimming and cache ──────────────────────────────────────────────────

    /// [`trim`] bound to the configured round and token limits.
    pub fn trim_for_model(&self, turns: &[Turn]) -> Vec<Turn> {
        trim(
            turns,
            self.limits.max_rounds_per_session,
            self.limits.max_tokens_per_session,
        )
    }

    /// Trim the session's cached turn list. Empty if nothing is cached.
    pub async fn trim_cached(&self, session_id: &str) -> Vec<Turn> {
        self.cached_turns(session_id)
            .await
            .map(|turns| self.trim_for_model(&turns))
            .unwrap_or_default()
    }

    /// Replace the cached turn list without touching the index. Counts as an
    /// access, so cache-only sessions are tracked and evicted like any other.
    pub async fn cache_turns(&self, session_id: &str, turns: &[Turn]) {
        let (_slot, mut state) = self.lock_session(session_id).await;
        state.cache = Some(turns.to_vec());
        state.touch(Utc::now());
    }

    pub async fn cached_turns(&self, session_id: &str) -> Option<Vec<Turn>> {
        let slot = self.existing_slot(session_id)?;
        let state = slot.lock().await;
        state.cache.clone()
    }

    // ── Session bookkeeping ─────────────────────────────────────────────────

    /// Metadata for a tracked session. Does not count as an access.
    pub async fn get_session_info(&self, session_id: &str) -> Option<SessionInfo> {
        let slot = self.existing_slot(session_id)?;
        let state = slot.lock().await;
        state.info(session_id)
    }

    /// Ids of all sessions with a metadata record, sorted.
    pub async fn list_sessions(&self) -> Vec<String> {
        let mut ids = Vec::new();
        for (id, slot) in self.snapshot_slots() {
            if slot.lock().await.metadata.is_some() {
                ids.push(id);
            }
        }
        ids.sort();
        ids
    }

    /// Drop all in-memory state for a session and delete its directory on disk.
    pub async fn remove_session(&self, session_id: &str) {
        let (slot, mut state) = self.lock_session(session_id).await;
        state.clear();

        let persistence = Arc::clone(&self.persistence);
        let id = session_id.to_string();
        match tokio::task::spawn_blocking(move || persistence.remove(&id)).await {
            Ok(Ok(_)) => {}
            Ok(Err(PersistError::InvalidSessionId(_))) => {}
            Ok(Err(e)) => {
                tracing::error!(session_id, error = %e, "failed to delete session storage");
            }
            Err(e) => {
                tracing::error!(session_id, error = %e, "session delete task failed");
            }
        }

        state.retired = true;
        self.detach(session_id, &slot);
        tracing::info!(session_id, "session removed");
    }

    /// Remove every session, in memory and on disk.
    pub async fn clear_all(&self) {
        let drained: Vec<(String, Slot)> = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
            .collect();

        for (_, slot) in &drained {
            let mut state = slot.lock().await;
            state.clear();
            state.retired = true;
        }

        let persistence = Arc::clone(&self.persistence);
        match tokio::task::spawn_blocking(move || persistence.clear()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!(error = %e, "failed to clear session storage"),
            Err(e) => tracing::error!(error = %e, "storage clear task failed"),
        }
        tracing::info!(sessions = drained.len(), "all sessions cleared");
    }

    /// Load every session found under the storage root. Runs once; later calls
    /// return 0. Loaded sessions start with fresh metadata (access time = now,
    /// count = 0).
    pub async fn load_all(&self) -> usize {
        if self
            .loaded
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::info!("session stores already loaded, skipping");
            return 0;
        }

        let persistence = Arc::clone(&self.persistence);
        let ids = match tokio::task::spawn_blocking(move || persistence.list_sessions()).await {
            Ok(Ok(ids)) => ids,
            Ok(Err(e)) => {
                tracing::error!(error = %e, "failed to scan session storage");
                self.loaded.store(false, Ordering::SeqCst);
                return 0;
            }
            Err(e) => {
                tracing::error!(error = %e, "session scan task failed");
                self.loaded.store(false, Ordering::SeqCst);
                return 0;
            }
        };

        let mut loaded = 0;
        for id in ids {
            let (slot, mut state) = self.lock_session(&id).await;
            if state.index.is_some() {
                continue;
            }
            match self.load_from_disk(&id, true).await {
                Some(index) => {
                    state.index = Some(index);
                    state
                        .metadata
                        .get_or_insert_with(|| SessionMetadata::new(Utc::now()));
                    loaded += 1;
                    tracing::debug!(session_id = %id, "session store found");
                }
                None => self.prune_if_empty(&id, &slot, &mut state),
            }
        }

        tracing::info!(loaded, "session stores loaded");
        loaded
    }

    // ── Eviction ────────────────────────────────────────────────────────────

    /// Evict sessions that are idle too long or beyond the session cap.
    pub async fn sweep(&self) -> SweepReport {
        self.sweep_at(Utc::now()).await
    }

    /// [`Self::sweep`] evaluated as if the current time were `now`.
    pub async fn sweep_at(&self, now: DateTime<Utc>) -> SweepReport {
        let mut tracked: Vec<(String, DateTime<Utc>, i64)> = Vec::new();
        for (id, slot) in self.snapshot_slots() {
            let state = slot.lock().await;
            if let Some(meta) = state.metadata.as_ref() {
                tracked.push((id, meta.last_accessed, meta.idle_days(now)));
            }
        }

        let mut doomed: BTreeSet<String> = BTreeSet::new();
        let mut report = SweepReport::default();

        for (id, _, idle_days) in &tracked {
            if *idle_days > self.limits.max_age_days {
                report.expired += 1;
                doomed.insert(id.clone());
            }
        }

        if tracked.len() > self.limits.max_sessions {
            tracked.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
            let excess = tracked.len() - self.limits.max_sessions;
            report.over_capacity = excess;
            doomed.extend(tracked.into_iter().take(excess).map(|(id, _, _)| id));
        }

        for id in doomed {
            self.remove_session(&id).await;
            report.removed.push(id);
        }

        tracing::info!(
            expired = report.expired,
            over_capacity = report.over_capacity,
            removed = report.removed.len(),
            "session sweep finished"
        );
        report
    }

    /// Start the periodic sweep task. Returns `false` if one is already running.
    ///
    /// The task holds only a weak reference and stops once the manager is dropped.
    pub fn start_sweeper(self: &Arc<Self>) -> bool {
        let mut guard = self.sweeper.lock().unwrap_or_else(PoisonError::into_inner);
        if guard.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return false;
        }

        let weak = Arc::downgrade(self);
        let period = Duration::from_secs(self.limits.sweep_interval_secs);
        *guard = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(manager) = weak.upgrade() else {
                    break;
                };
                manager.sweep().await;
            }
            tracing::debug!("session sweeper exited");
        }));

        tracing::info!(interval_secs = period.as_secs(), "session sweeper started");
        true
    }

    /// Stop the periodic sweep task, abandoning any sweep in flight.
    pub fn stop_sweeper(&self) {
        if let Some(handle) = self
            .sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
            tracing::info!("session sweeper stopped");
        }
    }

    pub fn sweeper_running(&self) -> bool {
        self.sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    // ── Internals ───────────────────────────────────────────────────────────

    /// Lock the live slot for `session_id`, creating it if needed. Retired slots
    /// (removed while we waited) are skipped by looking the session up again.
    async fn lock_session(&self, session_id: &str) -> (Slot, OwnedMutexGuard<SessionState>) {
        loop {
            let slot = self.slot(session_id);
            let guard = Arc::clone(&slot).lock_owned().await;
            if !guard.retired {
                return (slot, guard);
            }
        }
    }

    fn slot(&self, session_id: &str) -> Slot {
        if let Some(slot) = self.existing_slot(session_id) {
            return slot;
        }
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(sessions.entry(session_id.to_string()).or_default())
    }

    fn existing_slot(&self, session_id: &str) -> Option<Slot> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(session_id)
            .cloned()
    }

    fn snapshot_slots(&self) -> Vec<(String, Slot)> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(id, slot)| (id.clone(), Arc::clone(slot)))
            .collect()
    }

    /// Remove `slot` from the table if it is still the live slot for the session.
    fn detach(&self, session_id: &str, slot: &Slot) {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        if sessions
            .get(session_id)
            .is_some_and(|live| Arc::ptr_eq(live, slot))
        {
            sessions.remove(session_id);
        }
    }

    /// Drop a slot that holds nothing, so lookups of unknown ids leave no trace.
    fn prune_if_empty(&self, session_id: &str, slot: &Slot, state: &mut SessionState) {
        if state.is_empty() {
            state.retired = true;
            self.detach(session_id, slot);
        }
    }

    /// Load the index from disk if the session has none in memory. A successful
    /// load starts a fresh metadata record when the session has none.
    async fn ensure_index_loaded(&self, session_id: &str, state: &mut SessionState) {
        if state.index.is_some() {
            return;
        }
        if let Some(index) = self.load_from_disk(session_id, false).await {
            state.index = Some(index);
            state
                .metadata
                .get_or_insert_with(|| SessionMetadata::new(Utc::now()));
        }
    }

    /// Load a session's index. `expect_index` is set when the session directory is
    /// known to exist, so a missing index file is worth a warning.
    async fn load_from_disk(
        &self,
        session_id: &str,
        expect_index: bool,
    ) -> Option<SimilarityIndex> {
        let persistence = Arc::clone(&self.persistence);
        let id = session_id.to_string();
        match tokio::task::spawn_blocking(move || persistence.load(&id)).await {
            Ok(Ok(index)) => {
                tracing::info!(session_id, entries = index.len(), "session index loaded from disk");
                Some(index)
            }
            Ok(Err(PersistError::NotFound(_))) if expect_index => {
                tracing::warn!(session_id, "session directory has no index file, skipping");
                None
            }
            Ok(Err(PersistError::NotFound(_) | PersistError::InvalidSessionId(_))) => None,
            Ok(Err(e)) => {
                tracing::error!(session_id, error = %e, "failed to load session index");
                None
            }
            Err(e) => {
                tracing::error!(session_id, error = %e, "session load task failed");
                None
            }
        }
    }

    /// Save a snapshot. Returns `false` when the save failed and should be retried
    /// on the next store.
    async fn persist(&self, session_id: &str, snapshot: SimilarityIndex) -> bool {
        let persistence = Arc::clone(&self.persistence);
        let id = session_id.to_string();
        match tokio::task::spawn_blocking(move || persistence.save(&id, &snapshot)).await {
            Ok(Ok(())) => {
                tracing::info!(session_id, "session index saved");
                true
            }
            Ok(Err(e @ PersistError::InvalidSessionId(_))) => {
                tracing::warn!(session_id, error = %e, "session kept in memory only");
                true
            }
            Ok(Err(e)) => {
                tracing::error!(session_id, error = %e, "failed to save session index");
                false
            }
            Err(e) => {
                tracing::error!(session_id, error = %e, "session save task failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::hash::HashEmbeddingProvider;
    use tempfile::TempDir;

    fn manager(root: &std::path::Path, limits: LimitsConfig) -> SessionMemoryManager {
        let embedder = Embedder::new(Arc::new(HashEmbeddingProvider::new(256)));
        let store = SqliteSessionStore::new(root, "hash", 256);
        SessionMemoryManager::new(embedder, Arc::new(store), limits)
    }

    fn conversation() -> Vec<Turn> {
        vec![
            Turn::system("you answer travel questions"),
            Turn::human("what is the weather in paris"),
            Turn::assistant("sunny and warm in paris"),
            Turn::human("and the trains to lyon"),
            Turn::assistant(""),
        ]
    }

    #[tokio::test]
    async fn store_indexes_non_empty_turns_and_caches_everything() {
        let tmp = TempDir::new().unwrap();
        let mgr = manager(tmp.path(), LimitsConfig::default());
        mgr.store("s1", &conversation()).await;

        let info = mgr.get_session_info("s1").await.unwrap();
        assert_eq!(info.indexed_turns, 4);
        assert_eq!(info.cached_turns, Some(5));
        assert_eq!(info.message_count, 1);
        assert!(tmp.path().join("s1/index.db").is_file());
    }

    #[tokio::test]
    async fn store_with_only_empty_turns_builds_no_index() {
        let tmp = TempDir::new().unwrap();
        let mgr = manager(tmp.path(), LimitsConfig::default());
        mgr.store("s1", &[Turn::human("")]).await;

        let info = mgr.get_session_info("s1").await.unwrap();
        assert_eq!(info.indexed_turns, 0);
        assert!(!tmp.path().join("s1").exists());
        assert!(mgr.retrieve("s1", "anything", 3).await.is_empty());
    }

    #[tokio::test]
    async fn store_of_empty_list_is_a_no_op() {
        let tmp = TempDir::new().unwrap();
        let mgr = manager(tmp.path(), LimitsConfig::default());
        mgr.store("s1", &[]).await;
        assert!(mgr.get_session_info("s1").await.is_none());
        assert!(mgr.list_sessions().await.is_empty());
    }

    #[tokio::test]
    async fn retrieve_returns_best_match_first() {
        let tmp = TempDir::new().unwrap();
        let mgr = manager(tmp.path(), LimitsConfig::default());
        mgr.store("s1", &conversation()).await;

        let hits = mgr.retrieve("s1", "trains to lyon", 1).await;
        assert_eq!(hits, vec!["human:and the trains to lyon".to_string()]);
    }

    #[tokio::test]
    async fn retrieve_unknown_session_leaves_no_state() {
        let tmp = TempDir::new().unwrap();
        let mgr = manager(tmp.path(), LimitsConfig::default());
        assert!(mgr.retrieve("ghost", "hello", 3).await.is_empty());
        assert!(mgr.existing_slot("ghost").is_none());
        assert_eq!(mgr.format_history_context("ghost", "hello").await, "");
    }

    #[tokio::test]
    async fn format_history_context_wraps_snippets() {
        let tmp = TempDir::new().unwrap();
        let mgr = manager(tmp.path(), LimitsConfig::default());
        mgr.store("s1", &conversation()).await;

        let context = mgr.format_history_context("s1", "weather in paris").await;
        assert!(context.starts_with(HISTORY_DELIMITER));
        assert_eq!(context.trim_start_matches(HISTORY_DELIMITER).lines().count(), 3);
    }

    #[tokio::test]
    async fn trim_cached_uses_configured_limits() {
        let tmp = TempDir::new().unwrap();
        let limits = LimitsConfig {
            max_rounds_per_session: 1,
            ..LimitsConfig::default()
        };
        let mgr = manager(tmp.path(), limits);
        assert!(mgr.trim_cached("s1").await.is_empty());

        mgr.cache_turns("s1", &conversation()).await;
        let trimmed = mgr.trim_cached("s1").await;
        assert_eq!(
            trimmed,
            vec![Turn::human("and the trains to lyon"), Turn::assistant("")]
        );
    }

    #[tokio::test]
    async fn load_all_runs_once() {
        let tmp = TempDir::new().unwrap();
        {
            let mgr = manager(tmp.path(), LimitsConfig::default());
            mgr.store("a", &conversation()).await;
            mgr.store("b", &conversation()).await;
        }

        let mgr = manager(tmp.path(), LimitsConfig::default());
        assert_eq!(mgr.load_all().await, 2);
        assert_eq!(mgr.load_all().await, 0);
        assert_eq!(mgr.list_sessions().await, vec!["a", "b"]);

        let info = mgr.get_session_info("a").await.unwrap();
        assert_eq!(info.message_count, 0);
        assert_eq!(info.indexed_turns, 4);
    }

    #[tokio::test]
    async fn load_all_skips_directories_without_an_index() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("husk")).unwrap();
        let mgr = manager(tmp.path(), LimitsConfig::default());

        assert_eq!(mgr.load_all().await, 0);
        assert!(mgr.existing_slot("husk").is_none());
        assert!(mgr.list_sessions().await.is_empty());
    }

    #[tokio::test]
    async fn cache_only_sessions_are_tracked_and_evicted() {
        let tmp = TempDir::new().unwrap();
        let mgr = manager(tmp.path(), LimitsConfig::default());
        mgr.cache_turns("scratch", &conversation()).await;

        let info = mgr.get_session_info("scratch").await.unwrap();
        assert_eq!(info.message_count, 0);
        assert_eq!(info.indexed_turns, 0);
        assert_eq!(info.cached_turns, Some(5));

        let report = mgr.sweep_at(Utc::now() + chrono::Duration::days(30)).await;
        assert_eq!(report.removed, vec!["scratch"]);
        assert!(mgr.existing_slot("scratch").is_none());
    }

    #[tokio::test]
    async fn sweeper_start_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let mgr = Arc::new(manager(tmp.path(), LimitsConfig::default()));
        assert!(mgr.start_sweeper());
        assert!(!mgr.start_sweeper());
        assert!(mgr.sweeper_running());

        mgr.stop_sweeper();
        tokio::task::yield_now().await;
        assert!(mgr.start_sweeper());
        mgr.stop_sweeper();
    }
}
