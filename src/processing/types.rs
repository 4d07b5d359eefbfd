//! Core data types and error definitions for the processing pipeline.

use crate::vector::VectorStoreError;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use super::extract::ExtractError;

/// Errors produced while turning raw text into word-window chunks.
#[derive(Debug, Error)]
pub enum ChunkingError {
    /// Chunk window must hold at least one word.
    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,
    /// Overlap must leave a positive stride between windows.
    #[error("chunk overlap ({overlap}) must be smaller than chunk size ({size})")]
    InvalidOverlap {
        /// Configured window size in words.
        size: usize,
        /// Configured overlap in words.
        overlap: usize,
    },
}

/// Errors emitted by the document processing pipeline.
#[derive(Debug, Error)]
pub enum ProcessingError {
    /// Indexing was requested with zero chunks.
    #[error("No chunks to process")]
    EmptyBatch,
    /// Chunking step failed to segment the document.
    #[error("Failed to chunk document: {0}")]
    Chunking(#[from] ChunkingError),
    /// Text extraction rejected the uploaded document.
    #[error("Failed to extract document text: {0}")]
    Extract(#[from] ExtractError),
    /// Embedding provider failed to produce vectors for the input text.
    #[error("Failed to generate embeddings: {0}")]
    Embedding(#[from] crate::embedding::EmbeddingClientError),
    /// Vector store interaction failed during ingestion or metadata queries.
    #[error("Vector store request failed: {0}")]
    VectorStore(#[from] VectorStoreError),
}

/// Errors emitted while orchestrating similarity searches.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Embedding provider failed to return vectors for the query text.
    #[error("Failed to generate embeddings: {0}")]
    Embedding(#[from] crate::embedding::EmbeddingClientError),
    /// Vector store search request returned an error response.
    #[error("Vector store request failed: {0}")]
    VectorStore(#[from] VectorStoreError),
    /// Returned embedding dimension does not match configuration.
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected embedding dimension configured on the server.
        expected: usize,
        /// Actual embedding dimension produced by the provider.
        actual: usize,
    },
    /// Embedding provider returned no vectors.
    #[error("Embedding provider returned no vectors for the query")]
    EmptyEmbedding,
}

/// A word-window slice of a document, the unit of embedding and retrieval.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Content-derived id of the owning document.
    pub document_id: String,
    /// `{document_id}_{index}` identifier for this chunk.
    pub chunk_id: String,
    /// Word-window text content.
    pub content: String,
    /// Zero-based position within the document's chunk sequence.
    pub chunk_index: usize,
    /// Total number of chunks produced for the document.
    pub total_chunks: usize,
    /// Original filename of the document.
    pub filename: String,
    /// Format label of the source document.
    pub document_type: String,
    /// RFC3339 timestamp recorded at ingestion.
    pub created_at: String,
}

/// Parameters supplied to the retrieval pipeline.
///
/// Unset fields fall back to configured defaults downstream.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    /// Natural language query text to embed.
    pub query: String,
    /// Maximum number of results to return.
    pub max_results: Option<usize>,
    /// Optional restriction to a set of document ids.
    pub document_ids: Option<Vec<String>>,
    /// Minimum acceptable cosine similarity.
    pub similarity_threshold: Option<f32>,
}

/// A ranked retrieval hit, reconstructed per query and never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    /// Id of the owning document.
    pub document_id: String,
    /// Filename of the owning document.
    pub filename: String,
    /// Id of the matched chunk.
    pub chunk_id: String,
    /// Stored chunk text.
    pub content: String,
    /// Cosine similarity in `[0, 1]`, higher is better.
    pub similarity_score: f32,
    /// Remaining stored payload fields.
    pub metadata: Map<String, Value>,
}

/// Summary of a completed ingestion.
#[derive(Debug, Clone, Serialize)]
pub struct IndexOutcome {
    /// Content-derived id of the indexed document.
    pub document_id: String,
    /// Number of chunks written to the vector store.
    pub chunks_added: usize,
}

/// Result of a document deletion.
#[derive(Debug, Clone, Serialize)]
pub struct DeleteOutcome {
    /// Id of the targeted document.
    pub document_id: String,
    /// Number of chunks removed; zero when the document was never indexed.
    pub chunks_deleted: usize,
}

impl DeleteOutcome {
    /// Status label derived from the deletion count.
    pub fn status(&self) -> &'static str {
        if self.chunks_deleted > 0 {
            "success"
        } else {
            "not_found"
        }
    }
}

/// A stored document, reconstructed by grouping chunk payloads by document id.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentSummary {
    /// Content-derived document id.
    pub document_id: String,
    /// Original filename.
    pub filename: String,
    /// Number of chunks currently stored for the document.
    pub chunk_count: usize,
    /// Ingestion timestamp of the document.
    pub created_at: String,
}

/// Aggregate index statistics for status reporting.
#[derive(Debug, Clone, Serialize)]
pub struct IndexStats {
    /// Number of distinct documents currently stored.
    pub total_documents: usize,
    /// Total chunk count in the collection.
    pub total_chunks: usize,
    /// Name of the backing collection.
    pub collection_name: String,
}
