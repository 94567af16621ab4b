//! Core conversation type definitions.
//!
//! Defines [`Role`] (the closed set of speaker roles), [`Turn`] (one message in a
//! conversation), and [`SessionInfo`] (the public view of a session's metadata).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Instructions framing the conversation. Always survives trimming.
    System,
    /// A human-initiated turn. Every round starts with one.
    #[serde(alias = "user")]
    Human,
    /// Model output, tool results, and anything else not written by the human.
    #[serde(alias = "ai", alias = "other", alias = "tool")]
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Human => "human",
            Self::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "system" => Ok(Self::System),
            "human" | "user" => Ok(Self::Human),
            "assistant" | "ai" | "other" | "tool" => Ok(Self::Assistant),
            _ => Err(format!("unknown role: {s}")),
        }
    }
}

/// One message in a conversation. Order is given by position in the turn list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    /// May be empty; empty turns are never indexed but stay in the raw history.
    #[serde(default)]
    pub content: String,
}

impl Turn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn human(content: impl Into<String>) -> Self {
        Self::new(Role::Human, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// The `"{role}:{content}"` form stored in the similarity index.
    pub fn index_text(&self) -> String {
        format!("{}:{}", self.role, self.content)
    }

    /// Cheap token proxy: number of characters in the content.
    pub fn token_count(&self) -> usize {
        self.content.chars().count()
    }
}

/// Snapshot of a session's bookkeeping, as returned by `get_session_info`.
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub last_accessed: DateTime<Utc>,
    /// Number of store calls since the record was created (or loaded).
    pub message_count: u64,
    /// Turns currently held in the similarity index.
    pub indexed_turns: usize,
    /// Length of the cached raw turn list, if one is cached.
    pub cached_turns: Option<usize>,
}
