//! In-memory vector index with brute-force cosine similarity search.
//!
//! Chunks are appended at startup and searched on every question. All
//! operations are O(n) for search, which is acceptable for the corpus
//! sizes a single mentoring instance serves.

use std::sync::{Arc, RwLock};

use mentor_core::error::{MentorError, Result};
use mentor_core::types::ContextChunk;

/// A chunk stored in the vector index.
#[derive(Debug, Clone)]
struct IndexEntry {
    embedding: Vec<f32>,
    text: String,
    source: String,
}

/// In-memory vector index using brute-force cosine similarity.
///
/// Thread-safe via interior RwLock so the index can be shared between
/// the startup loader and request handlers.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    entries: Arc<RwLock<Vec<IndexEntry>>>,
}

impl VectorIndex {
    /// Create a new empty vector index.
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Append a chunk with its embedding to the index.
    pub fn insert(&self, text: String, source: String, embedding: Vec<f32>) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| MentorError::Retrieval(format!("Lock poisoned: {}", e)))?;
        entries.push(IndexEntry {
            embedding,
            text,
            source,
        });
        Ok(())
    }

    /// Search for the k nearest chunks to the query vector by cosine similarity.
    ///
    /// Returns results sorted by descending similarity score.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<ContextChunk>> {
        let entries = self
            .entries
            .read()
            .map_err(|e| MentorError::Retrieval(format!("Lock poisoned: {}", e)))?;

        let mut scored: Vec<ContextChunk> = entries
            .iter()
            .map(|entry| ContextChunk {
                text: entry.text.clone(),
                source: entry.source.clone(),
                score: cosine_similarity(query, &entry.embedding) as f32,
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(k);

        Ok(scored)
    }

    /// Return the number of chunks currently stored in the index.
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    /// Return true if the index contains no chunks.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for VectorIndex {
    fn default() -> Self {
        Self::new()
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude or the lengths differ.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| (*x as f64) * (*y as f64))
        .sum();

    let mag_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let mag_b: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    dot / (mag_a * mag_b)
}
