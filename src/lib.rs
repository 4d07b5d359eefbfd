#![deny(missing_docs)]

//! Core library for the kbsearch knowledge-base server.

/// HTTP routing and REST handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Embedding client abstraction and adapters.
pub mod embedding;
/// Structured logging and tracing setup.
pub mod logging;
/// Ingestion metrics helpers.
pub mod metrics;
/// Document processing pipeline: chunking, identity, indexing, retrieval.
pub mod processing;
/// Extractive question answering and topic coverage analysis.
pub mod qa;
/// Qdrant vector store integration.
pub mod vector;
