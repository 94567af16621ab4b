//! Per-session similarity index.
//!
//! A [`SimilarityIndex`] holds every non-empty turn stored for one session together
//! with its embedding, and answers k-nearest-neighbor queries by cosine similarity.
//! Dedup is keyed on the exact `(role, content)` pair rather than on text containment.
//! An entry whose vector is all zeros (the embedder's failure fallback) counts as
//! degraded: it is offered for embedding again and repaired in place.

use std::collections::{HashMap, HashSet};

use anyhow::{ensure, Result};
use serde::Serialize;

use super::types::{Role, Turn};

/// One embedded turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexEntry {
    /// UUID v7, so ids sort in insertion order.
    pub id: String,
    pub role: Role,
    pub content: String,
    #[serde(skip)]
    pub embedding: Vec<f32>,
}

impl IndexEntry {
    /// The `"{role}:{content}"` text returned by searches.
    pub fn text(&self) -> String {
        format!("{}:{}", self.role, self.content)
    }
}

/// A scored search hit.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub text: String,
    pub score: f32,
}

#[derive(Debug, Clone)]
pub struct SimilarityIndex {
    dimensions: usize,
    entries: Vec<IndexEntry>,
    /// `(role, content)` to position in `entries`.
    keys: HashMap<(Role, String), usize>,
}

impl SimilarityIndex {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            entries: Vec::new(),
            keys: HashMap::new(),
        }
    }

    /// Rebuild an index from persisted entries. Later duplicates are dropped.
    pub fn from_entries(dimensions: usize, entries: Vec<IndexEntry>) -> Result<Self> {
        let mut index = Self::new(dimensions);
        for entry in entries {
            ensure!(
                entry.embedding.len() == dimensions,
                "entry {} has {} dimensions, expected {dimensions}",
                entry.id,
                entry.embedding.len()
            );
            let key = (entry.role, entry.content.clone());
            if !index.keys.contains_key(&key) {
                index.keys.insert(key, index.entries.len());
                index.entries.push(entry);
            }
        }
        Ok(index)
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn contains(&self, role: Role, content: &str) -> bool {
        self.position(role, content).is_some()
    }

    fn position(&self, role: Role, content: &str) -> Option<usize> {
        self.keys.get(&(role, content.to_string())).copied()
    }

    /// Entries still holding a zero fallback vector.
    pub fn degraded_count(&self) -> usize {
        self.entries.iter().filter(|e| is_zero(&e.embedding)).count()
    }

    /// Turns from `turns` that need embedding, in order: non-empty turns not yet
    /// indexed, plus indexed turns whose vector is degraded. Repeats inside
    /// `turns` itself collapse to the first occurrence.
    pub fn missing<'a>(&self, turns: &'a [Turn]) -> Vec<&'a Turn> {
        let mut seen: HashSet<(Role, &str)> = HashSet::new();
        turns
            .iter()
            .filter(|t| !t.content.is_empty())
            .filter(|t| match self.position(t.role, &t.content) {
                Some(i) => is_zero(&self.entries[i].embedding),
                None => true,
            })
            .filter(|t| seen.insert((t.role, t.content.as_str())))
            .collect()
    }

    /// Add turns with their embeddings. A pair already present is never added
    /// twice; if its stored vector is degraded and the new one is not, the vector
    /// is replaced in place. Returns how many entries were added or repaired.
    pub fn add(&mut self, turns: &[&Turn], embeddings: Vec<Vec<f32>>) -> Result<usize> {
        ensure!(
            turns.len() == embeddings.len(),
            "got {} embeddings for {} turns",
            embeddings.len(),
            turns.len()
        );
        if let Some(bad) = embeddings.iter().find(|e| e.len() != self.dimensions) {
            anyhow::bail!(
                "embedding has {} dimensions, index expects {}",
                bad.len(),
                self.dimensions
            );
        }

        let mut changed = 0;
        for (turn, embedding) in turns.iter().zip(embeddings) {
            if turn.content.is_empty() {
                continue;
            }
            match self.position(turn.role, &turn.content) {
                Some(i) => {
                    let entry = &mut self.entries[i];
                    if is_zero(&entry.embedding) && !is_zero(&embedding) {
                        entry.embedding = embedding;
                        changed += 1;
                    }
                }
                None => {
                    self.keys
                        .insert((turn.role, turn.content.clone()), self.entries.len());
                    self.entries.push(IndexEntry {
                        id: uuid::Uuid::now_v7().to_string(),
                        role: turn.role,
                        content: turn.content.clone(),
                        embedding,
                    });
                    changed += 1;
                }
            }
        }
        Ok(changed)
    }

    /// The `k` entries most similar to `query`, best first. Ties keep insertion order.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<SearchHit> {
        if k == 0 || self.entries.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| (i, cosine_similarity(query, &e.embedding)))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

        scored
            .into_iter()
            .take(k)
            .map(|(i, score)| SearchHit {
                text: self.entries[i].text(),
                score,
            })
            .collect()
    }

    /// All stored texts in insertion order.
    pub fn texts(&self) -> Vec<String> {
        self.entries.iter().map(IndexEntry::text).collect()
    }
}

fn is_zero(v: &[f32]) -> bool {
    v.iter().all(|x| *x == 0.0)
}

/// Cosine similarity. Zero-norm vectors and length mismatches score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}
