//! Retriever trait, the corpus-backed implementation, and a static double.
//!
//! `CorpusRetriever` loads a directory of `.txt`/`.md` documents at
//! startup, chunks and embeds them, and answers queries with the top-k
//! most similar chunks.

use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use mentor_core::config::RetrievalConfig;
use mentor_core::error::Result;
use mentor_core::types::ContextChunk;

use crate::chunk::TextChunker;
use crate::embedding::{EmbeddingService, HashEmbedding};
use crate::index::VectorIndex;

// =============================================================================
// Trait
// =============================================================================

/// Service for retrieving document context relevant to a question.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Return the chunks most relevant to the query, best first.
    async fn retrieve(&self, query: &str) -> Result<Vec<ContextChunk>>;
}

// =============================================================================
// Corpus retriever
// =============================================================================

/// Retriever backed by an in-memory index over a document directory.
pub struct CorpusRetriever {
    index: VectorIndex,
    embedder: Box<dyn EmbeddingService>,
    chunker: TextChunker,
    top_k: usize,
}

impl CorpusRetriever {
    /// Create a retriever with an explicit embedding service.
    pub fn new(
        embedder: impl EmbeddingService + 'static,
        chunker: TextChunker,
        top_k: usize,
    ) -> Self {
        Self {
            index: VectorIndex::new(),
            embedder: Box::new(embedder),
            chunker,
            top_k,
        }
    }

    /// Create a retriever from configuration, using hash embeddings.
    pub fn from_config(config: &RetrievalConfig) -> Self {
        Self::new(
            HashEmbedding::new(config.embedding_dim),
            TextChunker::new(config.chunk_size, config.chunk_overlap),
            config.top_k,
        )
    }

    /// Chunk, embed, and index a single document.
    ///
    /// Returns the number of chunks added.
    pub fn index_document(&self, source: &str, text: &str) -> Result<usize> {
        let chunks = self.chunker.split(text);
        let count = chunks.len();

        for chunk in chunks {
            let embedding = self.embedder.embed(&chunk)?;
            self.index.insert(chunk, source.to_string(), embedding)?;
        }

        debug!(source = %source, chunks = count, "Document indexed");
        Ok(count)
    }

    /// Load every `.txt` and `.md` file in the directory into the index.
    ///
    /// A missing directory is not fatal: the retriever starts empty and
    /// every question proceeds without document context.
    pub fn load_directory(&self, dir: &Path) -> Result<usize> {
        if !dir.is_dir() {
            warn!(
                "Document directory {} not found, starting with an empty index",
                dir.display()
            );
            return Ok(0);
        }

        let mut files = 0usize;
        let mut total_chunks = 0usize;

        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let is_text = matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("txt") | Some("md") | Some("markdown")
            );
            if !is_text {
                continue;
            }

            let text = match std::fs::read_to_string(&path) {
                Ok(text) => text,
                Err(e) => {
                    warn!("Skipping unreadable document {}: {}", path.display(), e);
                    continue;
                }
            };

            let source = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("unknown")
                .to_string();
            total_chunks += self.index_document(&source, &text)?;
            files += 1;
        }

        info!(
            files = files,
            chunks = total_chunks,
            "Document corpus loaded from {}",
            dir.display()
        );
        Ok(total_chunks)
    }

    /// Number of chunks currently indexed.
    pub fn chunk_count(&self) -> usize {
        self.index.len()
    }
}

#[async_trait]
impl Retriever for CorpusRetriever {
    async fn retrieve(&self, query: &str) -> Result<Vec<ContextChunk>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let query_vec = self.embedder.embed(query)?;
        self.index.search(&query_vec, self.top_k)
    }
}

// =============================================================================
// Static double
// =============================================================================

/// Retriever double that returns a fixed set of chunks for every query.
#[derive(Debug, Clone, Default)]
pub struct StaticRetriever {
    chunks: Vec<ContextChunk>,
}

impl StaticRetriever {
    pub fn new(chunks: Vec<ContextChunk>) -> Self {
        Self { chunks }
    }

    /// A retriever that never finds any context.
    pub fn empty() -> Self {
        Self { chunks: Vec::new() }
    }
}

#[async_trait]
impl Retriever for StaticRetriever {
    async fn retrieve(&self, _query: &str) -> Result<Vec<ContextChunk>> {
        Ok(self.chunks.clone())
    }
}

// =============================================================================
// Tests
// =============================================================================
