#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use recall::config::LimitsConfig;
use recall::db::SqliteSessionStore;
use recall::embedding::{Embedder, EmbeddingProvider};
use recall::{SessionMemoryManager, Turn};
use tokio::sync::Notify;

pub const KEYWORDS: &[&str] = &["weather", "train", "hotel", "museum", "food", "budget"];

/// Deterministic provider: one axis per keyword in [`KEYWORDS`], plus a final
/// axis for text that mentions none of them. Counts every text it embeds.
#[derive(Default)]
pub struct KeywordProvider {
    pub documents_embedded: AtomicUsize,
    pub queries_embedded: AtomicUsize,
}

impl KeywordProvider {
    pub fn dims() -> usize {
        KEYWORDS.len() + 1
    }

    pub fn vector(text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        let mut v = vec![0.0f32; Self::dims()];
        for (i, kw) in KEYWORDS.iter().enumerate() {
            if lower.contains(kw) {
                v[i] = 1.0;
            }
        }
        if v.iter().all(|x| *x == 0.0) {
            v[KEYWORDS.len()] = 1.0;
        }
        v
    }

    pub fn documents(&self) -> usize {
        self.documents_embedded.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for KeywordProvider {
    fn name(&self) -> &'static str {
        "keyword"
    }

    fn dimensions(&self) -> usize {
        Self::dims()
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.documents_embedded.fetch_add(texts.len(), Ordering::SeqCst);
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.queries_embedded.fetch_add(1, Ordering::SeqCst);
        Ok(Self::vector(text))
    }
}

/// Provider whose every call fails, as an unreachable embedding service would.
pub struct FailingProvider;

#[async_trait]
impl EmbeddingProvider for FailingProvider {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn dimensions(&self) -> usize {
        KeywordProvider::dims()
    }

    async fn embed_documents(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        anyhow::bail!("connection refused")
    }
}

/// Keyword vectors, but any batch mentioning "parked" waits on `gate` after
/// signalling `entered`.
#[derive(Default)]
pub struct GatedProvider {
    pub entered: Notify,
    pub gate: Notify,
}

#[async_trait]
impl EmbeddingProvider for GatedProvider {
    fn name(&self) -> &'static str {
        "gated"
    }

    fn dimensions(&self) -> usize {
        KeywordProvider::dims()
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.iter().any(|t| t.contains("parked")) {
            self.entered.notify_one();
            self.gate.notified().await;
        }
        Ok(texts.iter().map(|t| KeywordProvider::vector(t)).collect())
    }
}

/// Manager over `root` backed by `provider`.
pub fn manager_with(
    provider: Arc<dyn EmbeddingProvider>,
    root: &Path,
    limits: LimitsConfig,
) -> SessionMemoryManager {
    let dims = provider.dimensions();
    let store = SqliteSessionStore::new(root, "keyword-test", dims);
    SessionMemoryManager::new(Embedder::new(provider), Arc::new(store), limits)
}

/// Manager over `root` with a fresh [`KeywordProvider`], which is also returned
/// so tests can inspect its call counts.
pub fn keyword_manager(
    root: &Path,
    limits: LimitsConfig,
) -> (SessionMemoryManager, Arc<KeywordProvider>) {
    let provider = Arc::new(KeywordProvider::default());
    let manager = manager_with(provider.clone(), root, limits);
    (manager, provider)
}

/// A short travel-planning conversation touching several keywords.
pub fn travel_conversation() -> Vec<Turn> {
    vec![
        Turn::system("You are a helpful travel assistant."),
        Turn::human("What will the weather be like in Kyoto next week?"),
        Turn::assistant("Mild weather, around 18C with some rain."),
        Turn::human("Which train gets me there from Tokyo?"),
        Turn::assistant("Take the Nozomi shinkansen train, about two hours."),
        Turn::human("Can you suggest a hotel near the station?"),
        Turn::assistant("Hotel Granvia sits right above Kyoto station."),
    ]
}
