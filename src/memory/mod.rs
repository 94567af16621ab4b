//! Conversation memory engine: turn types, the per-session similarity index,
//! context trimming, and the session manager that ties them together.

pub mod index;
pub mod manager;
pub mod session;
pub mod trim;
pub mod types;

pub use manager::{SessionMemoryManager, SweepReport, HISTORY_DELIMITER};
pub use types::{Role, SessionInfo, Turn};
