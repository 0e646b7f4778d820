//! Mentor retrieval crate - document chunking, embedding, and context search.
//!
//! Indexes a directory of plain-text documents at startup and serves the
//! top-k most similar chunks for each mentoring question. Embeddings are
//! deterministic token-hash vectors, so the index needs no model files
//! and behaves identically across runs.

pub mod chunk;
pub mod embedding;
pub mod index;
pub mod retriever;

pub use chunk::TextChunker;
pub use embedding::{EmbeddingService, HashEmbedding};
pub use index::VectorIndex;
pub use retriever::{CorpusRetriever, Retriever, StaticRetriever};
