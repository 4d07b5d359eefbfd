//! Document processing pipeline: chunking, identity, extraction, indexing, and retrieval.

pub mod chunking;
pub mod extract;
pub mod identity;
mod mappers;
mod service;
pub mod types;

pub use extract::{DocumentKind, ExtractError, PlainTextExtractor, TextExtractor};
pub use service::{ProcessingApi, ProcessingService};
pub use types::{
    Chunk, ChunkingError, DeleteOutcome, DocumentSummary, IndexOutcome, IndexStats,
    ProcessingError, SearchError, SearchOptions, SearchResult,
};
