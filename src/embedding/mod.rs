//! Text-to-vector embedding pipeline.
//!
//! Provides the [`EmbeddingProvider`] trait, the [`Embedder`] wrapper the memory
//! manager embeds through, and two providers created via [`create_provider`]:
//! an OpenAI-compatible HTTP client and an offline feature-hashing embedder.

pub mod hash;
pub mod openai;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::config::EmbeddingConfig;

/// Trait for embedding text into vectors of a fixed dimensionality.
///
/// Implementations may fail; callers that need the zero-vector fallback go
/// through [`Embedder`] instead of calling a provider directly.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Number of dimensions every returned vector must have.
    fn dimensions(&self) -> usize;

    /// Embed a batch of documents, one vector per input, in input order.
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single search query.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_documents(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| anyhow::anyhow!("provider returned no vector for query"))
    }
}

/// Create an embedding provider from config.
pub fn create_provider(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "openai" => Ok(Arc::new(openai::OpenAiEmbeddingProvider::new(config)?)),
        "hash" => Ok(Arc::new(hash::HashEmbeddingProvider::new(config.dimensions))),
        other => anyhow::bail!("unknown embedding provider: {other}. Supported: openai, hash"),
    }
}

/// Infallible front for an [`EmbeddingProvider`].
///
/// Any provider error, or a vector of the wrong length, is logged and replaced
/// with a zero vector of the provider's dimensionality. Downstream index code
/// therefore always receives well-shaped input.
#[derive(Clone)]
pub struct Embedder {
    provider: Arc<dyn EmbeddingProvider>,
}

impl Embedder {
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self { provider }
    }

    pub fn dimensions(&self) -> usize {
        self.provider.dimensions()
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    pub fn zero_vector(&self) -> Vec<f32> {
        vec![0.0; self.dimensions()]
    }

    pub async fn embed_documents(&self, texts: &[String]) -> Vec<Vec<f32>> {
        if texts.is_empty() {
            return Vec::new();
        }

        match self.provider.embed_documents(texts).await {
            Ok(vectors) if vectors.len() == texts.len() => vectors
                .into_iter()
                .map(|v| self.checked(v))
                .collect(),
            Ok(vectors) => {
                tracing::error!(
                    provider = self.provider.name(),
                    expected = texts.len(),
                    got = vectors.len(),
                    "embedding batch size mismatch, using zero vectors"
                );
                vec![self.zero_vector(); texts.len()]
            }
            Err(e) => {
                tracing::error!(
                    provider = self.provider.name(),
                    count = texts.len(),
                    error = %e,
                    "document embedding failed, using zero vectors"
                );
                vec![self.zero_vector(); texts.len()]
            }
        }
    }

    pub async fn embed_query(&self, text: &str) -> Vec<f32> {
        match self.provider.embed_query(text).await {
            Ok(vector) => self.checked(vector),
            Err(e) => {
                tracing::error!(
                    provider = self.provider.name(),
                    error = %e,
                    "query embedding failed, using zero vector"
                );
                self.zero_vector()
            }
        }
    }

    fn checked(&self, vector: Vec<f32>) -> Vec<f32> {
        if vector.len() == self.dimensions() {
            vector
        } else {
            tracing::warn!(
                provider = self.provider.name(),
                expected = self.dimensions(),
                got = vector.len(),
                "embedding has wrong dimensionality, using zero vector"
            );
            self.zero_vector()
        }
    }
}

/// L2-normalize a vector. Returns a zero vector if the input norm is zero.
pub fn l2_normalize(v: &[f32]) -> Vec<f32> {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        v.iter().map(|x| x / norm).collect()
    } else {
        v.to_vec()
    }
}
