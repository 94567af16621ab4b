//! Per-conversation memory for chat applications.
//!
//! Recall keeps, for each conversation session, a similarity index of every
//! non-empty turn, a cached copy of the raw turn list, and creation/access
//! metadata. Given a new query it returns the most semantically similar earlier
//! turns, and it trims long histories to a round and token budget before they go
//! back to a model.
//!
//! | Piece | Role |
//! |-------|------|
//! | [`memory::SessionMemoryManager`] | Store, retrieve, trim, evict, persist |
//! | [`memory::index::SimilarityIndex`] | Cosine k-NN over one session's turns |
//! | [`memory::trim`] | Round window then token-budget window |
//! | [`embedding::Embedder`] | Provider front that never fails (zero-vector fallback) |
//! | [`db::SqliteSessionStore`] | One SQLite index file per session directory |
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from TOML files and environment variables
//! - [`db`]: Session index files: schema, migrations, save/load/remove
//! - [`embedding`]: Text-to-vector providers (OpenAI-compatible HTTP, offline hashing)
//! - [`memory`]: Turn types, similarity index, trimming, and the session manager

pub mod config;
pub mod db;
pub mod embedding;
pub mod memory;

pub use config::RecallConfig;
pub use memory::{Role, SessionInfo, SessionMemoryManager, SweepReport, Turn};
