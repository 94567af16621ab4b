use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct RecallConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub embedding: EmbeddingConfig,
    pub limits: LimitsConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    /// One subdirectory per session lives under this root.
    pub root_dir: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// `"openai"` (any OpenAI-compatible endpoint) or `"hash"` (offline).
    pub provider: String,
    pub model: String,
    pub base_url: String,
    pub api_key: Option<String>,
    pub dimensions: usize,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_age_days: i64,
    pub max_sessions: usize,
    pub max_rounds_per_session: usize,
    pub max_tokens_per_session: usize,
    pub sweep_interval_secs: u64,
    pub retrieve_k: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let root_dir = default_recall_dir()
            .join("conversation_history")
            .to_string_lossy()
            .into_owned();
        Self { root_dir }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "openai".into(),
            model: "text-embedding-v4".into(),
            base_url: "https://dashscope.aliyuncs.com/compatible-mode/v1".into(),
            api_key: None,
            dimensions: 1024,
            timeout_secs: 30,
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_age_days: 7,
            max_sessions: 1000,
            max_rounds_per_session: 5,
            max_tokens_per_session: 30_000,
            sweep_interval_secs: 3600,
            retrieve_k: 3,
        }
    }
}

/// Embedding providers understood by [`crate::embedding::create_provider`].
pub const EMBEDDING_PROVIDERS: &[&str] = &["openai", "hash"];

/// Returns `~/.recall/`, or `./.recall/` when there is no home directory.
pub fn default_recall_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".recall")
}

/// Returns the default config file path: `~/.recall/config.toml`
pub fn default_config_path() -> PathBuf {
    default_recall_dir().join("config.toml")
}

impl RecallConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides and validate.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            RecallConfig::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("RECALL_STORAGE_DIR") {
            self.storage.root_dir = val;
        }
        if let Ok(val) = std::env::var("RECALL_LOG_LEVEL") {
            self.server.log_level = val;
        }
        if let Ok(val) = std::env::var("RECALL_EMBEDDING_PROVIDER") {
            self.embedding.provider = val;
        }
        if let Ok(val) = std::env::var("RECALL_EMBEDDING_MODEL") {
            self.embedding.model = val;
        }
        if let Ok(val) = std::env::var("RECALL_EMBEDDING_BASE_URL") {
            self.embedding.base_url = val;
        }
        if let Ok(val) = std::env::var("RECALL_EMBEDDING_API_KEY") {
            self.embedding.api_key = Some(val);
        }
        override_number("RECALL_MAX_AGE_DAYS", &mut self.limits.max_age_days);
        override_number("RECALL_MAX_SESSIONS", &mut self.limits.max_sessions);
        override_number("RECALL_MAX_ROUNDS", &mut self.limits.max_rounds_per_session);
        override_number("RECALL_MAX_TOKENS", &mut self.limits.max_tokens_per_session);
    }

    /// Reject settings the memory manager cannot run with.
    pub fn validate(&self) -> Result<()> {
        if !EMBEDDING_PROVIDERS.contains(&self.embedding.provider.as_str()) {
            bail!(
                "unknown embedding provider: {}. Supported: {}",
                self.embedding.provider,
                EMBEDDING_PROVIDERS.join(", ")
            );
        }
        if self.embedding.dimensions == 0 {
            bail!("embedding.dimensions must be at least 1");
        }
        if self.limits.max_sessions == 0 {
            bail!("limits.max_sessions must be at least 1");
        }
        if self.limits.max_rounds_per_session == 0 {
            bail!("limits.max_rounds_per_session must be at least 1");
        }
        if self.limits.sweep_interval_secs == 0 {
            bail!("limits.sweep_interval_secs must be at least 1");
        }
        if self.limits.max_age_days < 0 {
            bail!("limits.max_age_days must not be negative");
        }
        Ok(())
    }

    /// Resolve the storage root, expanding `~` if needed.
    pub fn resolved_root_dir(&self) -> PathBuf {
        expand_tilde(&self.storage.root_dir)
    }
}

fn override_number<T: std::str::FromStr>(var: &str, target: &mut T) {
    if let Ok(val) = std::env::var(var) {
        match val.trim().parse() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(var, value = %val, "ignoring non-numeric override"),
        }
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
