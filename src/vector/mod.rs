//! Qdrant vector store integration.

pub mod client;
pub mod filters;
pub mod payload;
pub mod types;

pub use client::VectorStoreService;
pub use filters::{document_filter, document_ids_filter};
pub use payload::{current_timestamp_rfc3339, point_id_for_chunk};
pub use types::{PointInsert, ScoredPoint, VectorStoreError};
