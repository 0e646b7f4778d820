//! Embedding service trait and the hash-based implementation.
//!
//! `HashEmbedding` maps each lowercase token to a dimension via feature
//! hashing, with a hash-derived sign to reduce collision bias, then
//! L2-normalizes the result. Identical inputs always produce identical
//! vectors, and texts that share tokens score higher under cosine
//! similarity than texts with none in common.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use mentor_core::error::Result;

/// Service for generating text embeddings.
///
/// Implementations convert text into fixed-dimensional vectors used for
/// both indexing document chunks and embedding search queries.
pub trait EmbeddingService: Send + Sync {
    /// Generate an embedding vector for the given text.
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Return the dimensionality of vectors produced by this service.
    fn dimensions(&self) -> usize;
}

/// Deterministic token-hash embedding.
#[derive(Debug, Clone)]
pub struct HashEmbedding {
    dimensions: usize,
}

impl HashEmbedding {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];

        for token in tokenize(text) {
            let mut hasher = DefaultHasher::new();
            token.hash(&mut hasher);
            let h = hasher.finish();

            let idx = (h % self.dimensions as u64) as usize;
            let sign = if (h >> 63) & 1 == 1 { 1.0 } else { -1.0 };
            vector[idx] += sign;
        }

        // L2-normalize so cosine similarity reduces to a dot product.
        let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for val in &mut vector {
                *val /= norm;
            }
        }

        vector
    }
}

impl Default for HashEmbedding {
    fn default() -> Self {
        Self::new(384)
    }
}

impl EmbeddingService for HashEmbedding {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.vectorize(text))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Split text into lowercase alphanumeric tokens.
fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}
